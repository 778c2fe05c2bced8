//! Binary entry point for the moonclub-web server.

#[tokio::main]
async fn main() {
    moonclub::web::run().await;
}

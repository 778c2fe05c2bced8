//! moonclub-web: REST API server for the moonclub community core.
//!
//! Resolves wallet-linked profiles against the hosted store, caches them in
//! SQLite, and serves the community feed.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;

use crate::cache::{cache_db_path, ProfileCache};
use crate::mlog;
use crate::session::{Session, SessionConfig};
use crate::store::{CommunityStore, MemoryStore, RestConfig, RestStore};
use crate::wallet::{AnnouncedConnector, DEFAULT_CHAIN_ID};

use config::{Cli, Config};
use state::{AppState, SharedState};

/// Entry point: parse CLI, open the cache, pick a store, start the server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::load(cli);

    crate::logging::init();

    mlog!("moonclub-web starting");
    mlog!("  data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");

    let cache = ProfileCache::open(&cache_db_path(&config.data_dir), config.cache_ttl_seconds)
        .expect("failed to open profile cache");
    mlog!("  cache: {} (ttl {}s)", cache_db_path(&config.data_dir).display(), config.cache_ttl_seconds);

    let (store, store_descr): (Arc<dyn CommunityStore>, String) =
        match (&config.store_url, &config.store_key) {
            (Some(url), Some(key)) => {
                mlog!("  store: {}", url);
                (
                    Arc::new(RestStore::new(RestConfig::new(url, key))),
                    url.clone(),
                )
            }
            _ => {
                mlog!("  store: none configured, using in-process memory store");
                (Arc::new(MemoryStore::new()), "memory".to_string())
            }
        };

    let session = Session::new(
        cache,
        SessionConfig {
            cache_empty_results: config.cache_empty_results,
        },
    );

    let state: SharedState = Arc::new(tokio::sync::Mutex::new(AppState {
        session,
        store,
        connector: AnnouncedConnector::new(DEFAULT_CHAIN_ID),
        store_descr,
    }));

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    mlog!("moonclub-web listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}

//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::session::Session;
use crate::store::CommunityStore;
use crate::wallet::AnnouncedConnector;

pub struct AppState {
    pub session: Session,
    pub store: Arc<dyn CommunityStore>,
    pub connector: AnnouncedConnector,
    /// Human-readable store description for the health endpoint.
    pub store_descr: String,
}

pub type SharedState = Arc<Mutex<AppState>>;

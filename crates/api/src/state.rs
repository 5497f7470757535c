use std::sync::Arc;

use tokengate_db::UserStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// User store. Read/write access to users and their session fields.
    pub store: Arc<dyn UserStore>,
    /// Server configuration, including the immutable signing secret.
    pub config: Arc<ServerConfig>,
}

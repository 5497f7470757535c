use axum::routing::get;
use axum::Router;

use crate::handlers::access;
use crate::state::AppState;

/// Token-gated probe routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api-1", get(access::api_1))
        .route("/api-2", get(access::api_2))
}

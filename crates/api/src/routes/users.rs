//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`. Callers must already be authenticated.
///
/// ```text
/// GET /              -> list_users (admin)
/// GET /{user_id}     -> get_user (self or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route("/{user_id}", get(users::get_user))
}

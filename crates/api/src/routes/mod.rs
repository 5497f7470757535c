pub mod access;
pub mod auth;
pub mod health;
pub mod users;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::middleware::auth::authenticate;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/signup                                    signup (public)
/// /users/login                                     login (public)
///
/// /users                                           list (token + admin)
/// /users/{user_id}                                 get (token + self or admin)
/// /api-1                                           probe (token)
/// /api-2                                           probe (token)
/// ```
///
/// Everything outside the public group sits behind [`authenticate`], so an
/// unauthenticated request never reaches its handler.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/users", users::router())
        .merge(access::router())
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        // Signup and login (public).
        .nest("/users", auth::router())
        .merge(protected)
}

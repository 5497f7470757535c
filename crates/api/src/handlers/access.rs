//! Token-gated probe endpoints.

use axum::Json;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;

/// GET /api/v1/api-1
pub async fn api_1(user: AuthUser) -> Json<Value> {
    tracing::debug!(user_id = %user.user_id, "api-1 accessed");
    Json(json!({ "success": "Access granted for api-1" }))
}

/// GET /api/v1/api-2
pub async fn api_2(user: AuthUser) -> Json<Value> {
    tracing::debug!(user_id = %user.user_id, "api-2 accessed");
    Json(json!({ "success": "Access granted for api-2" }))
}

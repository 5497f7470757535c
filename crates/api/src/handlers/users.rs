//! Handlers for reading user records.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use tokengate_core::error::CoreError;
use tokengate_core::roles::Role;
use tokengate_db::models::user::UserResponse;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_self_or_role, RequireAdmin};
use crate::query::PageParams;
use crate::state::AppState;

/// One page of users as returned by [`list_users`].
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub total_count: u64,
    pub user_items: Vec<UserResponse>,
}

/// GET /api/v1/users
///
/// Paginated list of all users. Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<PageParams>,
) -> AppResult<Json<UserListResponse>> {
    let (offset, limit) = params.resolve();
    tracing::debug!(admin_id = %admin.user_id, offset, limit, "Listing users");

    let page = state.store.list_users(offset, limit).await?;
    Ok(Json(UserListResponse {
        total_count: page.total_count,
        user_items: page.users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/users/{user_id}
///
/// A user may read their own record; admins may read any record.
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    require_self_or_role(&caller, &user_id, Role::Admin)?;

    let user = state
        .store
        .find_by_user_id(&user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            field: "user_id",
            value: user_id,
        })?;

    Ok(Json(UserResponse::from(user)))
}

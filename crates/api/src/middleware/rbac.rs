//! Role-based access control (RBAC).
//!
//! [`require_role`] and [`require_self_or_role`] are plain checks on an
//! [`AuthUser`]; [`RequireAdmin`] lifts the admin check into an extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokengate_core::error::CoreError;
use tokengate_core::roles::Role;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

const FORBIDDEN_MESSAGE: &str = "unauthorized to access this resource";

/// Succeeds only when the caller holds exactly `role`.
pub fn require_role(user: &AuthUser, role: Role) -> Result<(), CoreError> {
    if user.role != role {
        return Err(CoreError::Forbidden(FORBIDDEN_MESSAGE.into()));
    }
    Ok(())
}

/// Succeeds when the caller owns `target_user_id`; otherwise falls back to
/// [`require_role`] with `role`.
pub fn require_self_or_role(
    user: &AuthUser,
    target_user_id: &str,
    role: Role,
) -> Result<(), CoreError> {
    if user.user_id == target_user_id {
        return Ok(());
    }
    require_role(user, role)
}

/// Requires the `ADMIN` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     // user is guaranteed to be an admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(RequireAdmin(user))
    }
}

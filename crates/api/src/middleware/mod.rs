//! Authentication and authorization middleware.
//!
//! - [`auth::authenticate`] -- Route layer that rejects requests without a valid token.
//! - [`auth::AuthUser`] -- Extracts the authenticated identity inside handlers.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN` role.
//! - [`rbac::require_self_or_role`] -- Owner-or-role check for per-user resources.

pub mod auth;
pub mod rbac;

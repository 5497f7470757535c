//! Request handlers.
//!
//! Handlers unpack the request, delegate to [`crate::auth::flow`] or the
//! user store, and map failures via [`crate::error::AppError`].

pub mod access;
pub mod auth;
pub mod users;

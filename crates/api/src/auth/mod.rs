//! Authentication primitives and flows.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed access/refresh token generation and validation.
//! - [`session`] -- persisting the latest token pair on a user.
//! - [`flow`] -- signup and login orchestration.

pub mod flow;
pub mod jwt;
pub mod password;
pub mod session;

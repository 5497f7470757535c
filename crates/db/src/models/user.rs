//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use tokengate_core::roles::Role;
use tokengate_core::types::{Timestamp, UserId};

use crate::error::StoreError;

/// Full user record, including the latest session tokens.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Raw row as read from `users LEFT JOIN user_sessions`.
///
/// `role` is stored as text; conversion into [`User`] rejects unknown values.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Corrupt(format!("user {}: {e}", row.user_id)))?;
        Ok(User {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            token: row.token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Safe user representation for API responses (no password hash, no tokens).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            user_id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for inserting a new user together with its first token pair.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub token: String,
    pub refresh_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One page of users plus the total number of users in the store.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub total_count: u64,
    pub users: Vec<User>,
}

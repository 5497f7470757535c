//! Session fields mutated on every token issuance.

use tokengate_core::types::Timestamp;

/// The latest token pair issued to a user.
///
/// Stored one-per-user; writing it again replaces the previous pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFields {
    pub token: String,
    pub refresh_token: String,
    pub updated_at: Timestamp,
}

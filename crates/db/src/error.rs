use std::time::Duration;

/// Failures reported by a [`UserStore`](crate::store::UserStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (`field` is `email`,
    /// `phone` or `user_id`).
    #[error("Duplicate value for {field}")]
    Duplicate { field: &'static str },

    /// The referenced user does not exist.
    #[error("Unknown user {0}")]
    UnknownUser(String),

    /// The call did not complete within the configured bound.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backing store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A persisted row could not be mapped back into a model.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

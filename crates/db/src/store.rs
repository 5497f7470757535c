//! The store interface consumed by the auth flows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::models::session::SessionFields;
use crate::models::user::{CreateUser, User, UserPage};

/// Operations the auth core requires of a user store.
///
/// Implementations must enforce uniqueness of `email`, `phone` and `user_id`
/// on [`insert_user`](UserStore::insert_user) and report a violation as
/// [`StoreError::Duplicate`]. That is what closes the gap between the
/// duplicate checks and the insert when two signups race.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<User>>;

    async fn count_by_email(&self, email: &str) -> StoreResult<u64>;

    async fn count_by_phone(&self, phone: &str) -> StoreResult<u64>;

    /// Insert a new user and its first token pair, returning the user id.
    async fn insert_user(&self, input: &CreateUser) -> StoreResult<String>;

    /// Create or overwrite the session fields of an existing user.
    async fn upsert_session_fields(&self, user_id: &str, session: &SessionFields)
        -> StoreResult<()>;

    /// Users ordered by creation time, skipping `offset` and returning at
    /// most `limit`.
    async fn list_users(&self, offset: u64, limit: u64) -> StoreResult<UserPage>;

    async fn health_check(&self) -> StoreResult<()>;
}

/// Wraps another store and fails any call that outlives `timeout` with
/// [`StoreError::Timeout`]. Timed-out calls are not retried.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn UserStore>,
    timeout: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = StoreResult<T>> + Send) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "Store operation timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl UserStore for TimeoutStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.bounded(self.inner.find_by_email(email)).await
    }

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.bounded(self.inner.find_by_user_id(user_id)).await
    }

    async fn count_by_email(&self, email: &str) -> StoreResult<u64> {
        self.bounded(self.inner.count_by_email(email)).await
    }

    async fn count_by_phone(&self, phone: &str) -> StoreResult<u64> {
        self.bounded(self.inner.count_by_phone(phone)).await
    }

    async fn insert_user(&self, input: &CreateUser) -> StoreResult<String> {
        self.bounded(self.inner.insert_user(input)).await
    }

    async fn upsert_session_fields(
        &self,
        user_id: &str,
        session: &SessionFields,
    ) -> StoreResult<()> {
        self.bounded(self.inner.upsert_session_fields(user_id, session))
            .await
    }

    async fn list_users(&self, offset: u64, limit: u64) -> StoreResult<UserPage> {
        self.bounded(self.inner.list_users(offset, limit)).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.bounded(self.inner.health_check()).await
    }
}

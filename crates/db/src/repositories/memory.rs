//! In-process [`UserStore`] used by tests and by local runs without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::models::session::SessionFields;
use crate::models::user::{CreateUser, User, UserPage};
use crate::store::UserStore;

#[derive(Default)]
struct State {
    /// Insertion order doubles as creation order for listing.
    users: Vec<User>,
    sessions: HashMap<String, SessionFields>,
}

impl State {
    fn merged(&self, user: &User) -> User {
        let mut user = user.clone();
        if let Some(session) = self.sessions.get(&user.user_id) {
            user.token = Some(session.token.clone());
            user.refresh_token = Some(session.refresh_token.clone());
            user.updated_at = session.updated_at;
        }
        user
    }
}

/// Keeps users and sessions in memory, mirroring the Postgres layout.
///
/// Uniqueness of `user_id`, `email` and `phone` is checked under the write
/// lock, so concurrent inserts cannot both succeed.
#[derive(Default)]
pub struct MemoryUserStore {
    state: RwLock<State>,
    writes: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes (inserts and session upserts) so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate an outage: while set, every call fails with
    /// [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| state.merged(u)))
    }

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.user_id == user_id)
            .map(|u| state.merged(u)))
    }

    async fn count_by_email(&self, email: &str) -> StoreResult<u64> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| u.email == email).count() as u64)
    }

    async fn count_by_phone(&self, phone: &str) -> StoreResult<u64> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.users.iter().filter(|u| u.phone == phone).count() as u64)
    }

    async fn insert_user(&self, input: &CreateUser) -> StoreResult<String> {
        self.ensure_available()?;
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.user_id == input.user_id) {
            return Err(StoreError::Duplicate { field: "user_id" });
        }
        if state.users.iter().any(|u| u.email == input.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        if state.users.iter().any(|u| u.phone == input.phone) {
            return Err(StoreError::Duplicate { field: "phone" });
        }

        state.users.push(User {
            user_id: input.user_id.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            token: None,
            refresh_token: None,
            created_at: input.created_at,
            updated_at: input.updated_at,
        });
        state.sessions.insert(
            input.user_id.clone(),
            SessionFields {
                token: input.token.clone(),
                refresh_token: input.refresh_token.clone(),
                updated_at: input.updated_at,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(input.user_id.clone())
    }

    async fn upsert_session_fields(
        &self,
        user_id: &str,
        session: &SessionFields,
    ) -> StoreResult<()> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.user_id == user_id) {
            return Err(StoreError::UnknownUser(user_id.to_string()));
        }
        state.sessions.insert(user_id.to_string(), session.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_users(&self, offset: u64, limit: u64) -> StoreResult<UserPage> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let users = state
            .users
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|u| state.merged(u))
            .collect();
        Ok(UserPage {
            total_count: state.users.len() as u64,
            users,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.ensure_available()
    }
}

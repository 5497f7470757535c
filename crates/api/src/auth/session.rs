//! Persisting the latest issued token pair against a user.

use tokengate_core::types::Timestamp;
use tokengate_db::models::session::SessionFields;
use tokengate_db::{StoreResult, UserStore};

use super::jwt::TokenPair;

/// Upsert `pair` as the user's current session, stamped with `updated_at`.
///
/// Writing the same arguments twice leaves the record unchanged. Store
/// failures are returned to the caller untouched.
pub async fn persist_tokens(
    store: &dyn UserStore,
    user_id: &str,
    pair: &TokenPair,
    updated_at: Timestamp,
) -> StoreResult<()> {
    let session = SessionFields {
        token: pair.token.clone(),
        refresh_token: pair.refresh_token.clone(),
        updated_at,
    };
    store.upsert_session_fields(user_id, &session).await?;
    tracing::debug!(user_id, "Persisted session tokens");
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use tokengate_core::roles::Role;
    use tokengate_db::models::user::CreateUser;
    use tokengate_db::repositories::MemoryUserStore;
    use tokengate_db::StoreError;

    use super::*;

    async fn seeded_store() -> MemoryUserStore {
        let store = MemoryUserStore::new();
        let now = Utc::now();
        store
            .insert_user(&CreateUser {
                user_id: "u1".into(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "a@x.com".into(),
                phone: "123".into(),
                password_hash: "$argon2id$stub".into(),
                role: Role::User,
                token: "old-access".into(),
                refresh_token: "old-refresh".into(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn persist_is_idempotent() {
        let store = seeded_store().await;
        let pair = TokenPair {
            token: "new-access".into(),
            refresh_token: "new-refresh".into(),
        };
        let at = Utc::now();

        persist_tokens(&store, "u1", &pair, at).await.unwrap();
        let once = store.find_by_user_id("u1").await.unwrap().unwrap();
        persist_tokens(&store, "u1", &pair, at).await.unwrap();
        let twice = store.find_by_user_id("u1").await.unwrap().unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.token.as_deref(), Some("new-access"));
        assert_eq!(twice.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(twice.updated_at, at);
    }

    #[tokio::test]
    async fn store_failure_is_propagated() {
        let store = seeded_store().await;
        store.set_unavailable(true);
        let pair = TokenPair {
            token: "t".into(),
            refresh_token: "r".into(),
        };

        let result = persist_tokens(&store, "u1", &pair, Utc::now()).await;
        assert_matches!(result, Err(StoreError::Unavailable(_)));
    }
}

//! Postgres-backed [`UserStore`] over the `users` and `user_sessions` tables.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};
use crate::models::session::SessionFields;
use crate::models::user::{CreateUser, User, UserPage, UserRow};
use crate::store::UserStore;

/// Column list shared across queries to avoid repetition.
///
/// `updated_at` reflects the latest session write when one exists.
const COLUMNS: &str = "u.user_id, u.first_name, u.last_name, u.email, u.phone, \
                        u.password_hash, u.role, s.token, s.refresh_token, u.created_at, \
                        COALESCE(s.updated_at, u.updated_at) AS updated_at";

const FROM: &str = "users u LEFT JOIN user_sessions s ON s.user_id = u.user_id";

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE u.{column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn count(&self, column: &str, value: &str) -> StoreResult<u64> {
        let query = format!("SELECT COUNT(*) FROM users WHERE {column} = $1");
        let count: i64 = sqlx::query_scalar(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// Map constraint violations onto store-level errors.
fn classify(err: sqlx::Error, user_id: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let field = match db_err.constraint() {
                    Some("uq_users_email") => "email",
                    Some("uq_users_phone") => "phone",
                    _ => "user_id",
                };
                return StoreError::Duplicate { field };
            }
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::UnknownUser(user_id.to_string()),
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.find_one("user_id", user_id).await
    }

    async fn count_by_email(&self, email: &str) -> StoreResult<u64> {
        self.count("email", email).await
    }

    async fn count_by_phone(&self, phone: &str) -> StoreResult<u64> {
        self.count("phone", phone).await
    }

    async fn insert_user(&self, input: &CreateUser) -> StoreResult<String> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users
                (user_id, first_name, last_name, email, phone, password_hash, role,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&input.user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .bind(input.created_at)
        .bind(input.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, &input.user_id))?;

        sqlx::query(
            "INSERT INTO user_sessions (user_id, token, refresh_token, updated_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&input.user_id)
        .bind(&input.token)
        .bind(&input.refresh_token)
        .bind(input.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, &input.user_id))?;

        tx.commit().await?;
        Ok(input.user_id.clone())
    }

    async fn upsert_session_fields(
        &self,
        user_id: &str,
        session: &SessionFields,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_sessions (user_id, token, refresh_token, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE SET
                token = EXCLUDED.token,
                refresh_token = EXCLUDED.refresh_token,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(&session.token)
        .bind(&session.refresh_token)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, user_id))?;
        Ok(())
    }

    async fn list_users(&self, offset: u64, limit: u64) -> StoreResult<UserPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM {FROM}
             ORDER BY u.created_at, u.user_id
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(UserPage {
            total_count: total as u64,
            users,
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

//! Signup and login orchestration.
//!
//! Each flow walks `Received → Validated → CredentialChecked → TokenIssued →
//! Persisted → Responded` and stops at the first failing step. The last stage
//! reached is logged when a flow is rejected.

use std::fmt;

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tokengate_core::error::CoreError;
use tokengate_core::roles::Role;
use tokengate_core::types::UserId;
use tokengate_db::models::user::{CreateUser, UserResponse};
use tokengate_db::UserStore;
use uuid::Uuid;
use validator::Validate;

use super::jwt::{generate_all_tokens, JwtConfig, TokenSubject};
use super::password::{hash_password, validate_password_strength, verify_password};
use super::session::persist_tokens;
use crate::error::{AppError, AppResult};

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Progress of one signup or login request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    CredentialChecked,
    TokenIssued,
    Persisted,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::CredentialChecked => "credential_checked",
            Stage::TokenIssued => "token_issued",
            Stage::Persisted => "persisted",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /users/signup`.
///
/// Fields are optional at the serde level so that a missing field is reported
/// as a validation error rather than a body parse failure.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(alias = "firstName")]
    #[validate(required, length(min = 2, max = 100))]
    pub first_name: Option<String>,

    #[serde(alias = "lastName")]
    #[validate(required, length(min = 2, max = 100))]
    pub last_name: Option<String>,

    #[validate(required)]
    pub password: Option<String>,

    #[validate(required, email)]
    pub email: Option<String>,

    #[validate(required, length(min = 1))]
    pub phone: Option<String>,

    #[serde(alias = "userType", alias = "user_type")]
    #[validate(required)]
    pub role: Option<Role>,
}

/// A signup request that passed validation.
struct NewAccount {
    first_name: String,
    last_name: String,
    password: String,
    email: String,
    phone: String,
    role: Role,
}

impl SignupRequest {
    fn into_account(self) -> Result<NewAccount, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let (
            Some(first_name),
            Some(last_name),
            Some(password),
            Some(email),
            Some(phone),
            Some(role),
        ) = (
            self.first_name,
            self.last_name,
            self.password,
            self.email,
            self.phone,
            self.role,
        )
        else {
            return Err(CoreError::Validation("missing required field".into()));
        };
        validate_password_strength(&password, MIN_PASSWORD_LENGTH).map_err(CoreError::Validation)?;

        Ok(NewAccount {
            first_name,
            last_name,
            password,
            email,
            phone,
            role,
        })
    }
}

/// Response body for a successful signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

/// Request body for `POST /users/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// The logged-in user's record together with the freshly issued tokens.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Create a user, issue its first token pair, and store both.
///
/// Duplicate email or phone stops the flow with a conflict before anything is
/// hashed or written.
pub async fn signup(
    store: &dyn UserStore,
    jwt: &JwtConfig,
    input: SignupRequest,
) -> AppResult<SignupResponse> {
    let mut stage = Stage::Received;
    let result = signup_steps(store, jwt, input, &mut stage).await;
    log_outcome("signup", stage, &result);
    result
}

async fn signup_steps(
    store: &dyn UserStore,
    jwt: &JwtConfig,
    input: SignupRequest,
    stage: &mut Stage,
) -> AppResult<SignupResponse> {
    let account = input.into_account()?;
    *stage = Stage::Validated;

    if store.count_by_email(&account.email).await? > 0 {
        return Err(CoreError::Conflict("this email already exists".into()).into());
    }
    if store.count_by_phone(&account.phone).await? > 0 {
        return Err(CoreError::Conflict("this phone number already exists".into()).into());
    }

    let password_hash = hash_password(&account.password)?;
    *stage = Stage::CredentialChecked;

    let now = Utc::now().trunc_subsecs(0);
    let user_id = Uuid::new_v4().to_string();
    let subject = TokenSubject {
        uid: user_id.clone(),
        email: account.email.clone(),
        first_name: account.first_name.clone(),
        last_name: account.last_name.clone(),
        role: account.role,
    };
    let pair = generate_all_tokens(&subject, jwt)?;
    *stage = Stage::TokenIssued;

    let user_id = store
        .insert_user(&CreateUser {
            user_id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            phone: account.phone,
            password_hash,
            role: account.role,
            token: pair.token,
            refresh_token: pair.refresh_token,
            created_at: now,
            updated_at: now,
        })
        .await?;
    *stage = Stage::Persisted;

    tracing::info!(%user_id, "User signed up");
    *stage = Stage::Responded;
    Ok(SignupResponse { user_id })
}

/// Check credentials, issue and persist a new token pair, and return the
/// stored record as re-read after the write.
pub async fn login(
    store: &dyn UserStore,
    jwt: &JwtConfig,
    input: LoginRequest,
) -> AppResult<LoginResponse> {
    let mut stage = Stage::Received;
    let result = login_steps(store, jwt, input, &mut stage).await;
    log_outcome("login", stage, &result);
    result
}

async fn login_steps(
    store: &dyn UserStore,
    jwt: &JwtConfig,
    input: LoginRequest,
    stage: &mut Stage,
) -> AppResult<LoginResponse> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    *stage = Stage::Validated;

    let user = store
        .find_by_email(&input.email)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "User",
            field: "email",
            value: input.email.clone(),
        })?;

    verify_password(&input.password, &user.password_hash)?;
    *stage = Stage::CredentialChecked;

    let pair = generate_all_tokens(&TokenSubject::from(&user), jwt)?;
    *stage = Stage::TokenIssued;

    persist_tokens(store, &user.user_id, &pair, Utc::now().trunc_subsecs(0)).await?;
    *stage = Stage::Persisted;

    let user = store
        .find_by_user_id(&user.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "User",
            field: "user_id",
            value: user.user_id.clone(),
        })?;

    let (Some(token), Some(refresh_token)) = (user.token.clone(), user.refresh_token.clone())
    else {
        return Err(AppError::InternalError(format!(
            "session for user {} missing after persist",
            user.user_id
        )));
    };

    tracing::info!(user_id = %user.user_id, "User logged in");
    *stage = Stage::Responded;
    Ok(LoginResponse {
        user: UserResponse::from(user),
        token,
        refresh_token,
    })
}

fn log_outcome<T>(flow: &'static str, stage: Stage, result: &AppResult<T>) {
    match result {
        Ok(_) => tracing::debug!(flow, %stage, "Flow completed"),
        Err(e) => tracing::warn!(flow, last_stage = %stage, error = %e, "Flow rejected"),
    }
}

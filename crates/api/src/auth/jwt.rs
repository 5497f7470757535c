//! Signed access/refresh token generation and validation.
//!
//! Both tokens are HS256-signed JWTs. Access tokens carry the user's identity
//! ([`TokenSubject`]) plus an expiry; refresh tokens carry only an expiry and
//! are validated for signature and expiry alone.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokengate_core::roles::Role;
use tokengate_core::types::UserId;
use tokengate_db::models::user::User;

use crate::config::ConfigError;

/// Identity fields copied into every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSubject {
    pub uid: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        TokenSubject {
            uid: user.user_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub subject: TokenSubject,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// JWT claims of a refresh token. Expiry only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// An access token and its refresh token, issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Malformed, tampered with, or signed with another key.
    #[error("the token is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// `now + ttl` does not fit in a timestamp.
    #[error("token lifetime of {0} is out of range")]
    ExpiryOutOfRange(Duration),
}

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in hours (default: 24).
    pub access_token_expiry_hours: i64,
    /// Refresh token lifetime in hours (default: 168).
    pub refresh_token_expiry_hours: i64,
}

/// Default access token expiry in hours.
const DEFAULT_ACCESS_EXPIRY_HOURS: i64 = 24;
/// Default refresh token expiry in hours.
const DEFAULT_REFRESH_EXPIRY_HOURS: i64 = 168;

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `SECRET_KEY` / `JWT_SECRET` | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_HOURS`   | no       | `24`    |
    /// | `JWT_REFRESH_EXPIRY_HOURS`  | no       | `168`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = lookup("SECRET_KEY")
            .or_else(|| lookup("JWT_SECRET"))
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;

        let access_token_expiry_hours = crate::config::parse_var(
            &lookup,
            "JWT_ACCESS_EXPIRY_HOURS",
            DEFAULT_ACCESS_EXPIRY_HOURS,
        )?;
        let refresh_token_expiry_hours = crate::config::parse_var(
            &lookup,
            "JWT_REFRESH_EXPIRY_HOURS",
            DEFAULT_REFRESH_EXPIRY_HOURS,
        )?;

        for (name, hours) in [
            ("JWT_ACCESS_EXPIRY_HOURS", access_token_expiry_hours),
            ("JWT_REFRESH_EXPIRY_HOURS", refresh_token_expiry_hours),
        ] {
            let reason = if hours <= 0 {
                "must be positive"
            } else if Duration::try_hours(hours)
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
                .is_none()
            {
                "is too large"
            } else {
                continue;
            };
            return Err(ConfigError::Invalid {
                name,
                value: hours.to_string(),
                reason: reason.into(),
            });
        }

        Ok(Self {
            secret,
            access_token_expiry_hours,
            refresh_token_expiry_hours,
        })
    }

    /// Access token lifetime. Saturates at [`Duration::MAX`] for hour counts
    /// that do not fit, which token generation then rejects.
    pub fn access_ttl(&self) -> Duration {
        Duration::try_hours(self.access_token_expiry_hours).unwrap_or(Duration::MAX)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::try_hours(self.refresh_token_expiry_hours).unwrap_or(Duration::MAX)
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry_hours", &self.access_token_expiry_hours)
            .field("refresh_token_expiry_hours", &self.refresh_token_expiry_hours)
            .finish()
    }
}

/// Unix timestamp `ttl` from now.
fn expiry_after(ttl: Duration) -> Result<i64, TokenError> {
    Utc::now()
        .checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or(TokenError::ExpiryOutOfRange(ttl))
}

fn sign<T: Serialize>(claims: &T, config: &JwtConfig) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

/// Signature is checked before expiry; a token that is both tampered with and
/// expired reports [`TokenError::InvalidSignature`].
fn verify<T: DeserializeOwned>(token: &str, config: &JwtConfig) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    decode::<T>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidSignature,
    })
}

/// Generate an access token for `subject` that expires `ttl` from now.
pub fn generate_token(
    subject: &TokenSubject,
    ttl: Duration,
    config: &JwtConfig,
) -> Result<String, TokenError> {
    let claims = Claims {
        subject: subject.clone(),
        exp: expiry_after(ttl)?,
    };
    sign(&claims, config)
}

/// Generate the access/refresh pair issued on every signup and login.
pub fn generate_all_tokens(
    subject: &TokenSubject,
    config: &JwtConfig,
) -> Result<TokenPair, TokenError> {
    let token = generate_token(subject, config.access_ttl(), config)?;
    let refresh_claims = RefreshClaims {
        exp: expiry_after(config.refresh_ttl())?,
    };
    let refresh_token = sign(&refresh_claims, config)?;
    Ok(TokenPair {
        token,
        refresh_token,
    })
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    verify(token, config)
}

/// Validate a refresh token's signature and expiry.
pub fn validate_refresh_token(
    token: &str,
    config: &JwtConfig,
) -> Result<RefreshClaims, TokenError> {
    verify(token, config)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_hours: 24,
            refresh_token_expiry_hours: 168,
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            uid: "6650f1c2".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::User,
        }
    }

    /// Replace the character at `idx` with a different one.
    fn tamper(token: &str, idx: usize) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let token = generate_token(&subject(), Duration::hours(1), &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.subject, subject());

        let expected_exp = (Utc::now() + Duration::hours(1)).timestamp();
        assert!((claims.exp - expected_exp).abs() <= 2);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();
        let claims = Claims {
            subject: subject(),
            exp: Utc::now().timestamp() - 5,
        };
        let token = sign(&claims, &config).expect("encoding should succeed");

        assert_matches!(validate_token(&token, &config), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_without_exp_is_invalid() {
        let config = test_config();
        let token = sign(&subject(), &config).expect("encoding should succeed");

        assert_matches!(
            validate_token(&token, &config),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_token_fails_signature() {
        let config = test_config();
        let token = generate_token(&subject(), Duration::hours(1), &config).unwrap();

        let first_dot = token.find('.').unwrap();
        let second_dot = token.rfind('.').unwrap();
        for idx in [3, first_dot + 10, (first_dot + second_dot) / 2, second_dot + 5] {
            let tampered = tamper(&token, idx);
            assert_ne!(tampered, token);
            assert_matches!(
                validate_token(&tampered, &config),
                Err(TokenError::InvalidSignature),
                "tampering at byte {idx} must be detected"
            );
        }
    }

    #[test]
    fn test_tampered_and_expired_reports_signature() {
        let config = test_config();
        let claims = Claims {
            subject: subject(),
            exp: Utc::now().timestamp() - 600,
        };
        let token = sign(&claims, &config).unwrap();
        let second_dot = token.rfind('.').unwrap();
        let tampered = tamper(&token, second_dot + 5);

        assert_matches!(
            validate_token(&tampered, &config),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };

        let token = generate_token(&subject(), Duration::hours(1), &config_a).unwrap();

        assert_matches!(
            validate_token(&token, &config_b),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_pair_uses_both_expiry_classes() {
        let config = test_config();
        let pair = generate_all_tokens(&subject(), &config).unwrap();
        let now = Utc::now();

        let access = validate_token(&pair.token, &config).unwrap();
        assert!((access.exp - (now + Duration::hours(24)).timestamp()).abs() <= 2);

        let refresh = validate_refresh_token(&pair.refresh_token, &config).unwrap();
        assert!((refresh.exp - (now + Duration::hours(168)).timestamp()).abs() <= 2);
    }

    #[test]
    fn test_refresh_token_carries_no_identity() {
        let config = test_config();
        let pair = generate_all_tokens(&subject(), &config).unwrap();

        // A refresh token cannot stand in for an access token.
        assert_matches!(
            validate_token(&pair.refresh_token, &config),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_config_requires_secret() {
        let err = JwtConfig::from_lookup(|_| None).unwrap_err();
        assert_matches!(err, ConfigError::Missing("SECRET_KEY"));

        let err = JwtConfig::from_lookup(|name| (name == "SECRET_KEY").then(String::new))
            .unwrap_err();
        assert_matches!(err, ConfigError::Missing("SECRET_KEY"));
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let config = JwtConfig::from_lookup(|name| match name {
            "JWT_SECRET" => Some("s3cret".to_string()),
            "JWT_ACCESS_EXPIRY_HOURS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.access_token_expiry_hours, 2);
        assert_eq!(config.refresh_token_expiry_hours, 168);
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn test_config_rejects_non_positive_ttl() {
        let err = JwtConfig::from_lookup(|name| match name {
            "SECRET_KEY" => Some("s".to_string()),
            "JWT_REFRESH_EXPIRY_HOURS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { name: "JWT_REFRESH_EXPIRY_HOURS", .. });
    }

    #[test]
    fn test_config_rejects_oversized_ttl() {
        for hours in ["10000000000", "2600000000000", "9223372036854775807"] {
            let err = JwtConfig::from_lookup(|name| match name {
                "SECRET_KEY" => Some("s".to_string()),
                "JWT_ACCESS_EXPIRY_HOURS" => Some(hours.to_string()),
                _ => None,
            })
            .unwrap_err();
            assert_matches!(
                err,
                ConfigError::Invalid { name: "JWT_ACCESS_EXPIRY_HOURS", ref reason, .. } if reason == "is too large"
            );
        }
    }

    #[test]
    fn test_oversized_ttl_is_an_error_not_a_panic() {
        let config = JwtConfig {
            access_token_expiry_hours: 10_000_000_000,
            ..test_config()
        };
        assert_matches!(
            generate_all_tokens(&subject(), &config),
            Err(TokenError::ExpiryOutOfRange(_))
        );

        let config = JwtConfig {
            refresh_token_expiry_hours: i64::MAX,
            ..test_config()
        };
        assert_matches!(
            generate_all_tokens(&subject(), &config),
            Err(TokenError::ExpiryOutOfRange(_))
        );

        assert_matches!(
            generate_token(&subject(), Duration::MAX, &test_config()),
            Err(TokenError::ExpiryOutOfRange(_))
        );
    }
}

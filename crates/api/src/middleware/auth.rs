//! Token authentication for protected routes.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tokengate_core::error::CoreError;
use tokengate_core::roles::Role;
use tokengate_core::types::UserId;

use crate::auth::jwt::{validate_token, Claims, JwtConfig};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the raw access token.
pub const TOKEN_HEADER: &str = "token";

/// Identity recovered from a valid access token.
///
/// The [`authenticate`] layer stores it in the request extensions; handlers
/// take it as an extractor parameter:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let subject = claims.subject;
        AuthUser {
            user_id: subject.uid,
            email: subject.email,
            first_name: subject.first_name,
            last_name: subject.last_name,
            role: subject.role,
        }
    }
}

/// Pull the raw token out of the `token` header, falling back to
/// `Authorization: Bearer <token>` when that header is absent or blank.
fn raw_token(headers: &HeaderMap) -> Option<&str> {
    let from_token_header = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if from_token_header.is_some() {
        return from_token_header;
    }

    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .trim_start();
    let (scheme, token) = authorization.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Validate the token carried by `headers` and return the caller's identity.
pub fn authenticate_headers(headers: &HeaderMap, jwt: &JwtConfig) -> AppResult<AuthUser> {
    let token = raw_token(headers).ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "no authorization header provided".into(),
        ))
    })?;

    let claims = validate_token(token, jwt).inspect_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
    })?;

    Ok(AuthUser::from(claims))
}

/// Route layer: reject unauthenticated requests before the handler runs.
///
/// On success the caller's [`AuthUser`] is attached to the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate_headers(request.headers(), &state.config.jwt)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        authenticate_headers(&parts.headers, &state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    use super::*;
    use crate::auth::jwt::{generate_token, TokenSubject};

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret".into(),
            access_token_expiry_hours: 24,
            refresh_token_expiry_hours: 168,
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            uid: "u1".into(),
            email: "a@x.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            role: Role::Admin,
        }
    }

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn token_header_is_accepted() {
        let token = generate_token(&subject(), chrono::Duration::hours(1), &jwt()).unwrap();
        let user = authenticate_headers(&headers_with(TOKEN_HEADER, &token), &jwt()).unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email, "a@x.com");
    }

    #[test]
    fn bearer_header_is_accepted() {
        let token = generate_token(&subject(), chrono::Duration::hours(1), &jwt()).unwrap();
        let headers = headers_with("authorization", &format!("Bearer {token}"));
        let user = authenticate_headers(&headers, &jwt()).unwrap();
        assert_eq!(user.user_id, "u1");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = authenticate_headers(&HeaderMap::new(), &jwt()).unwrap_err();
        assert_matches!(
            err,
            AppError::Core(CoreError::Unauthorized(msg)) if msg == "no authorization header provided"
        );
    }

    #[test]
    fn empty_token_counts_as_missing() {
        let err = authenticate_headers(&headers_with(TOKEN_HEADER, "  "), &jwt()).unwrap_err();
        assert_matches!(
            err,
            AppError::Core(CoreError::Unauthorized(msg)) if msg == "no authorization header provided"
        );
    }

    #[test]
    fn blank_token_header_falls_back_to_bearer() {
        let token = generate_token(&subject(), chrono::Duration::hours(1), &jwt()).unwrap();
        let mut headers = headers_with(TOKEN_HEADER, " ");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let user = authenticate_headers(&headers, &jwt()).unwrap();
        assert_eq!(user.user_id, "u1");
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let token = generate_token(&subject(), chrono::Duration::hours(1), &jwt()).unwrap();
        for scheme in ["bearer", "BEARER", "BeArEr"] {
            let headers = headers_with("authorization", &format!("{scheme} {token}"));
            let user = authenticate_headers(&headers, &jwt()).unwrap();
            assert_eq!(user.user_id, "u1");
        }

        let headers = headers_with("authorization", &format!("Basic {token}"));
        assert!(authenticate_headers(&headers, &jwt()).is_err());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let token = generate_token(&subject(), chrono::Duration::hours(-1), &jwt()).unwrap();
        let err = authenticate_headers(&headers_with(TOKEN_HEADER, &token), &jwt()).unwrap_err();
        assert_matches!(
            err,
            AppError::Core(CoreError::Unauthorized(msg)) if msg == "token is expired"
        );
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let other = JwtConfig {
            secret: "someone-else".into(),
            ..jwt()
        };
        let token = generate_token(&subject(), chrono::Duration::hours(1), &other).unwrap();
        let err = authenticate_headers(&headers_with(TOKEN_HEADER, &token), &jwt()).unwrap_err();
        assert_matches!(
            err,
            AppError::Core(CoreError::Unauthorized(msg)) if msg == "the token is invalid"
        );
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use tokengate_api::auth::jwt::JwtConfig;
use tokengate_api::config::ServerConfig;
use tokengate_api::middleware::auth::TOKEN_HEADER;
use tokengate_api::routes;
use tokengate_api::state::AppState;
use tokengate_db::repositories::MemoryUserStore;
use tokengate_db::UserStore;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Token settings shared by the app under test and by tests minting tokens.
pub fn test_jwt() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_expiry_hours: 24,
        refresh_token_expiry_hours: 168,
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_timeout_secs: 5,
        database_url: None,
        jwt: test_jwt(),
    }
}

/// Build the full application router with all middleware layers over `store`.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack that production uses.
pub fn build_test_app(store: Arc<dyn UserStore>) -> Router {
    let state = AppState {
        store,
        config: Arc::new(test_config()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(TOKEN_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes(&state))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Fresh in-memory store plus an app wired to it.
pub fn memory_app() -> (Arc<MemoryUserStore>, Router) {
    let store = Arc::new(MemoryUserStore::new());
    let app = build_test_app(store.clone());
    (store, app)
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// GET with the access token in the `token` header.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header(TOKEN_HEADER, token)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Signup payload with the given identity fields.
pub fn signup_body(email: &str, phone: &str, role: &str) -> serde_json::Value {
    serde_json::json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": email,
        "phone": phone,
        "password": "longenough1",
        "user_type": role,
    })
}

/// Sign up then log in; returns `(user_id, access_token)`.
pub async fn signup_and_login(app: &Router, email: &str, phone: &str, role: &str) -> (String, String) {
    let response = post_json(
        app.clone(),
        "/api/v1/users/signup",
        signup_body(email, phone, role),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["user_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = post_json(
        app.clone(),
        "/api/v1/users/login",
        serde_json::json!({ "email": email, "password": "longenough1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let token = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    (user_id, token)
}

//! In-process service fixture for integration tests
//!
//! Serves the identity service's wire contracts on an ephemeral port so the
//! full pipeline can be exercised without a real deployment. Handlers mirror
//! the documented shapes exactly: form-encoded login, JSON bodies, bearer
//! validation on protected targets.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation,
    decode, encode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

use warden_client::{ClientConfig, SessionContext, SessionStore};

pub const FIXTURE_SECRET: &[u8] = b"fixture-signing-secret";

#[derive(Debug, Serialize, Deserialize)]
struct FixtureClaims {
    sub: String,
    exp: i64,
    iat: i64,
}

/// Shared fixture state the tests can poke at.
#[derive(Default)]
pub struct FixtureState {
    /// When set, every protected target answers 401
    pub revoke_all: AtomicBool,
    /// Hits on the identity endpoint
    pub me_hits: AtomicUsize,
    /// Hits on the code-exchange endpoint
    pub exchange_hits: AtomicUsize,
}

pub struct Fixture {
    pub base_url: String,
    pub state: Arc<FixtureState>,
}

/// Spawn the fixture service on an ephemeral port.
pub async fn spawn() -> Fixture {
    let state = Arc::new(FixtureState::default());

    let app = Router::new()
        .route("/", get(root))
        .route("/auth/token", post(token))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/users/", post(create_user))
        .route("/users/me", get(users_me))
        .route("/protected/ping", get(protected_ping))
        .route("/echo/auth", get(echo_auth))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server");
    });

    Fixture {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Session context wired to the fixture, with its store in a temp dir.
pub fn context_for(fixture: &Fixture, dir: &TempDir) -> SessionContext {
    let store =
        SessionStore::with_cache_path(dir.path().join("session_cache.json"));
    SessionContext::with_store(
        ClientConfig::with_base_url(fixture.base_url.clone()),
        store,
    )
    .expect("session context")
}

fn mint_token(subject: &str, seconds_from_now: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = FixtureClaims {
        sub: subject.to_string(),
        exp: now + seconds_from_now,
        iat: now,
    };
    encode(
        &JwtHeader::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(FIXTURE_SECRET),
    )
    .expect("fixture JWT encodes")
}

fn token_body(subject: &str) -> serde_json::Value {
    json!({
        "access_token": mint_token(subject, 3600),
        "token_type": "bearer",
    })
}

fn bearer_ok(state: &FixtureState, headers: &HeaderMap) -> bool {
    if state.revoke_all.load(Ordering::SeqCst) {
        return false;
    }
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return false;
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<FixtureClaims>(
        token,
        &DecodingKey::from_secret(FIXTURE_SECRET),
        &validation,
    )
    .is_ok()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Could not validate credentials"})),
    )
        .into_response()
}

async fn root(headers: HeaderMap) -> Response {
    Json(json!({
        "message": "ok",
        "had_authorization": headers.contains_key(header::AUTHORIZATION),
    }))
    .into_response()
}

#[derive(Deserialize)]
struct TokenForm {
    username: String,
    password: String,
}

async fn token(Form(form): Form<TokenForm>) -> Response {
    match (form.username.as_str(), form.password.as_str()) {
        ("alice", "correct-horse") => {
            Json(token_body("alice")).into_response()
        }
        ("throttled", _) => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "120")],
            Json(json!({"detail": "Too many login attempts"})),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Incorrect username or password"})),
        )
            .into_response(),
    }
}

async fn google_login() -> Response {
    Json(json!({
        "authorization_url":
            "https://accounts.google.com/o/oauth2/auth?client_id=fixture&response_type=code",
        "message": "Redirect to this URL to authenticate with Google",
    }))
    .into_response()
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

async fn google_callback(
    State(state): State<Arc<FixtureState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    state.exchange_hits.fetch_add(1, Ordering::SeqCst);
    match query.code.as_deref() {
        Some("valid-code") => Json(token_body("oauth-user")).into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "detail": "Failed to exchange authorization code for token"
            })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct CreateUser {
    username: String,
    email: String,
    password: String,
}

async fn create_user(Json(user): Json<CreateUser>) -> Response {
    if user.username == "taken" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"detail": "Username already exists"})),
        )
            .into_response();
    }
    if user.password.len() < 8 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "detail": [
                    {
                        "loc": ["body", "password"],
                        "msg": "Password must be at least 8 characters long",
                        "type": "value_error",
                    }
                ]
            })),
        )
            .into_response();
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "id": 42,
            "username": user.username,
            "email": user.email,
            "is_active": true,
            "is_verified": false,
        })),
    )
        .into_response()
}

async fn users_me(
    State(state): State<Arc<FixtureState>>,
    headers: HeaderMap,
) -> Response {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    state.me_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "id": 7,
        "username": "alice",
        "email": "alice@example.com",
        "first_name": "Alice",
        "last_name": "Smith",
        "is_active": true,
        "is_verified": true,
    }))
    .into_response()
}

async fn protected_ping(
    State(state): State<Arc<FixtureState>>,
    headers: HeaderMap,
) -> Response {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    Json(json!({"message": "pong"})).into_response()
}

async fn echo_auth(headers: HeaderMap) -> Response {
    let values: Vec<String> = headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    Json(json!({
        "authorization_count": values.len(),
        "authorization": values.first(),
    }))
    .into_response()
}

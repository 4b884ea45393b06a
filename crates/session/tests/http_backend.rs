//! Exercises `HttpAuthBackend` and the session manager against a local mock backend.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{Duration, Utc};
use futures::future::join_all;
use serde_json::json;
use session::{
    AuthBackend, ErrorKind, GuardDecision, HttpAuthBackend, RouteGuard, RouteTable, Session,
    SessionManager, SessionPolicy, SignInProof, TokenSet,
};
use shared_types::{LoginRequest, User};
use tokio_test::assert_ok;

#[derive(Clone, Default)]
struct MockState {
    refresh_calls: Arc<AtomicUsize>,
    reject_refresh: bool,
}

fn user_json(email: &str) -> serde_json::Value {
    json!({
        "id": "u-1",
        "email": email,
        "displayName": "Juan Dela Cruz",
        "isAdmin": false
    })
}

async fn login(Json(body): Json<LoginRequest>) -> Response {
    if body.password != "correct-horse" {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "user": user_json(&body.email),
        "accessToken": "login-access",
        "refreshToken": "r-1",
        "expiresIn": 120
    }))
    .into_response()
}

async fn google_callback(Json(body): Json<serde_json::Value>) -> Response {
    if body["googleAccessToken"] != "g-access" || body["googleIdToken"] != "g-id" {
        return StatusCode::BAD_REQUEST.into_response();
    }
    Json(json!({
        "user": user_json("juan@addu.edu.ph"),
        "accessToken": "oauth-access",
        "refreshToken": "r-1"
    }))
    .into_response()
}

async fn refresh(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let call = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    tokio::time::sleep(StdDuration::from_millis(50)).await;

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if state.reject_refresh || bearer != Some("Bearer r-1") {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "accessToken": format!("refreshed-{}", call),
        "refreshToken": "r-2",
        "expiresIn": 900
    }))
    .into_response()
}

async fn spawn_mock(state: MockState) -> SocketAddr {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/google/callback", post(google_callback))
        .route("/auth/refresh", post(refresh))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn backend(addr: SocketAddr) -> Arc<HttpAuthBackend> {
    Arc::new(HttpAuthBackend::new(format!("http://{}/", addr), StdDuration::from_secs(5)).unwrap())
}

fn manager(backend: Arc<HttpAuthBackend>) -> SessionManager {
    SessionManager::new(
        backend,
        Arc::new(SessionPolicy::new("@addu.edu.ph")),
        Duration::zero(),
        StdDuration::from_secs(5),
    )
}

fn stale_session() -> Session {
    Session {
        user: User {
            id: "u-1".to_string(),
            email: "juan@addu.edu.ph".to_string(),
            display_name: "Juan Dela Cruz".to_string(),
            picture_url: None,
            is_admin: false,
            admin_role: None,
        },
        tokens: TokenSet {
            access_token: "stale".to_string(),
            refresh_token: "r-1".to_string(),
            expires_at: Utc::now() - Duration::seconds(30),
        },
        error: None,
    }
}

#[tokio::test]
async fn test_credentials_login_over_http() {
    let addr = spawn_mock(MockState::default()).await;
    let manager = manager(backend(addr));

    let session = assert_ok!(
        manager
            .sign_in(SignInProof::Credentials {
                email: "juan@addu.edu.ph".to_string(),
                password: "correct-horse".to_string(),
            })
            .await
    );

    assert_eq!(session.tokens.access_token, "login-access");
    assert!(session.tokens.expires_at <= Utc::now() + Duration::seconds(121));
}

#[tokio::test]
async fn test_rejected_login_is_invalid_credentials() {
    let addr = spawn_mock(MockState::default()).await;
    let result = backend(addr)
        .login(&LoginRequest {
            email: "juan@addu.edu.ph".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert_eq!(result.unwrap_err(), ErrorKind::InvalidCredentials);
}

#[tokio::test]
async fn test_unreachable_backend_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = backend(addr)
        .login(&LoginRequest {
            email: "juan@addu.edu.ph".to_string(),
            password: "correct-horse".to_string(),
        })
        .await;

    assert_eq!(result.unwrap_err(), ErrorKind::BackendUnavailable);
}

#[tokio::test]
async fn test_oauth_sign_in_over_http() {
    let addr = spawn_mock(MockState::default()).await;
    let manager = manager(backend(addr));

    let session = manager
        .sign_in(SignInProof::OAuth {
            access_token: "g-access".to_string(),
            id_token: "g-id".to_string(),
            email: Some("juan@addu.edu.ph".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(session.tokens.access_token, "oauth-access");
    assert!(session.tokens.expires_at >= Utc::now() + Duration::seconds(3590));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_refresh_for_concurrent_callers() {
    let state = MockState::default();
    let addr = spawn_mock(state.clone()).await;
    let manager = Arc::new(manager(backend(addr)));
    manager.restore(stale_session());

    let calls: Vec<_> = (0..5)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.ensure_fresh().await })
        })
        .collect();

    let tokens: Vec<TokenSet> = join_all(calls)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    assert!(tokens.iter().all(|t| t.access_token == "refreshed-1"));
    assert!(tokens.iter().all(|t| t.refresh_token == "r-2"));
    assert_eq!(manager.current().unwrap().tokens.access_token, "refreshed-1");
}

#[tokio::test]
async fn test_refresh_rejection_forces_login() {
    let state = MockState {
        reject_refresh: true,
        ..MockState::default()
    };
    let addr = spawn_mock(state.clone()).await;
    let manager = manager(backend(addr));
    manager.restore(stale_session());

    assert_eq!(
        manager.ensure_fresh().await,
        Err(ErrorKind::RefreshAccessTokenError)
    );
    assert_eq!(
        manager.current().unwrap().error,
        Some(ErrorKind::RefreshAccessTokenError)
    );

    let guard = RouteGuard::new(RouteTable::default(), SessionPolicy::new("@addu.edu.ph"));
    assert_eq!(
        guard.check("/", manager.current().as_ref()),
        GuardDecision::RedirectToLogin {
            callback_url: "/".to_string()
        }
    );
    assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
}

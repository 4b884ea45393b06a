//! Fixtures shared by the gateway's unit tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Form, Json, Router,
};
use chrono::{Duration, Utc};
use serde_json::json;
use session::{AuthBackend, AuthConfig, ErrorKind, GoogleConfig, GoogleProvider, Session, TokenSet};
use shared_types::{AuthTokenResponse, GoogleCallbackRequest, LoginRequest, RefreshResponse, User};

use crate::state::AppState;

pub fn user(is_admin: bool) -> User {
    User {
        id: "u-1".to_string(),
        email: "juan@addu.edu.ph".to_string(),
        display_name: "Juan Dela Cruz".to_string(),
        picture_url: None,
        is_admin,
        admin_role: None,
    }
}

pub fn stale_session(is_admin: bool) -> Session {
    Session {
        user: user(is_admin),
        tokens: TokenSet {
            access_token: "stale".to_string(),
            refresh_token: "r-1".to_string(),
            expires_at: Utc::now() - Duration::seconds(30),
        },
        error: None,
    }
}

/// Accepts password `pw`; `admin@...` signs in as an admin. Google sign-in
/// succeeds for the Google access token `g-good-code`.
#[derive(Default)]
pub struct StubBackend {
    pub refresh_calls: AtomicUsize,
    pub google_calls: AtomicUsize,
    pub reject_refresh: bool,
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthTokenResponse, ErrorKind> {
        if request.password != "pw" {
            return Err(ErrorKind::InvalidCredentials);
        }
        let mut user = user(request.email.starts_with("admin@"));
        user.email = request.email.clone();
        Ok(AuthTokenResponse {
            user,
            access_token: "login-access".to_string(),
            refresh_token: "r-1".to_string(),
            expires_in: Some(900),
        })
    }

    async fn google_callback(
        &self,
        request: &GoogleCallbackRequest,
    ) -> Result<AuthTokenResponse, ErrorKind> {
        self.google_calls.fetch_add(1, Ordering::SeqCst);
        if request.google_access_token != "g-good-code" {
            return Err(ErrorKind::BackendUnavailable);
        }
        Ok(AuthTokenResponse {
            user: user(false),
            access_token: "oauth-access".to_string(),
            refresh_token: "r-1".to_string(),
            expires_in: None,
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshResponse, ErrorKind> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_refresh {
            return Err(ErrorKind::RefreshAccessTokenError);
        }
        Ok(RefreshResponse {
            access_token: "refreshed".to_string(),
            refresh_token: None,
            expires_in: Some(900),
            user: None,
        })
    }
}

pub fn test_config() -> AuthConfig {
    AuthConfig {
        allowed_domain: "@addu.edu.ph".to_string(),
        backend_url: "http://127.0.0.1:9".to_string(),
        google: None,
        session_secret: "test-secret-key-for-testing-only".to_string(),
        session_max_age_days: 30,
        refresh_skew_secs: 60,
        backend_timeout_secs: 5,
        cookie_name: "session_token".to_string(),
        secure_cookies: false,
    }
}

pub fn test_state_with(backend: Arc<StubBackend>) -> AppState {
    AppState::new(test_config(), backend, None, reqwest::Client::new())
}

/// State whose pass-through calls and Google round-trips go to local mocks.
pub fn test_state_against(
    backend: Arc<StubBackend>,
    upstream: Option<SocketAddr>,
    google: Option<SocketAddr>,
) -> AppState {
    let mut config = test_config();
    if let Some(addr) = upstream {
        config.backend_url = format!("http://{}", addr);
    }
    let http = reqwest::Client::new();
    let google = google.map(|addr| {
        let google_config = GoogleConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/api/auth/callback/google".to_string(),
        };
        GoogleProvider::new(google_config, http.clone()).with_endpoints(
            format!("http://{}/token", addr),
            format!("http://{}/userinfo", addr),
        )
    });
    AppState::new(config, backend, google, http)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Backend stand-in that echoes the path, query and bearer token it received.
pub async fn spawn_upstream(calls: Arc<AtomicUsize>) -> SocketAddr {
    async fn echo(
        State(calls): State<Arc<AtomicUsize>>,
        Path(path): Path<String>,
        RawQuery(query): RawQuery,
        headers: HeaderMap,
    ) -> Json<serde_json::Value> {
        calls.fetch_add(1, Ordering::SeqCst);
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        Json(json!({ "path": path, "query": query, "authorization": authorization }))
    }

    serve(Router::new().route("/*path", any(echo)).with_state(calls)).await
}

/// Google stand-in. The code is echoed back as `g-<code>`; code `outsider`
/// belongs to a profile outside the allowed domain.
pub async fn spawn_google() -> SocketAddr {
    async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
        match form.get("code") {
            Some(code) => Json(json!({
                "access_token": format!("g-{}", code),
                "id_token": "g-id",
            }))
            .into_response(),
            None => StatusCode::BAD_REQUEST.into_response(),
        }
    }

    async fn userinfo(headers: HeaderMap) -> Response {
        let email = match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some("Bearer g-outsider") => "juan@gmail.com",
            Some(_) => "juan@addu.edu.ph",
            None => return StatusCode::UNAUTHORIZED.into_response(),
        };
        Json(json!({ "email": email, "name": "Juan Dela Cruz" })).into_response()
    }

    serve(
        Router::new()
            .route("/token", post(token))
            .route("/userinfo", get(userinfo)),
    )
    .await
}

pub fn test_state() -> AppState {
    test_state_with(Arc::new(StubBackend::default()))
}

//! In-memory backend double and fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    AuthTokenResponse, GoogleCallbackRequest, LoginRequest, RefreshResponse, User,
};

use crate::backend::AuthBackend;
use crate::error::ErrorKind;
use crate::types::{Session, TokenSet};

pub fn user(is_admin: bool) -> User {
    User {
        id: "u-1".to_string(),
        email: "juan@addu.edu.ph".to_string(),
        display_name: "Juan Dela Cruz".to_string(),
        picture_url: None,
        is_admin,
        admin_role: is_admin.then(|| "superadmin".to_string()),
    }
}

pub fn tokens_expiring_in(access_token: &str, secs: i64) -> TokenSet {
    TokenSet {
        access_token: access_token.to_string(),
        refresh_token: "refresh-0".to_string(),
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(secs),
    }
}

pub fn session_expiring_in(user: User, secs: i64) -> Session {
    Session {
        user,
        tokens: tokens_expiring_in("access-0", secs),
        error: None,
    }
}

#[derive(Default)]
pub struct MockBackend {
    login_calls: AtomicUsize,
    google_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    login_error: Mutex<Option<ErrorKind>>,
    google_error: Mutex<Option<ErrorKind>>,
    refresh_error: Mutex<Option<ErrorKind>>,
    login_expires_in: Mutex<Option<i64>>,
    refresh_expires_in: Mutex<Option<i64>>,
    refresh_delay: Mutex<Duration>,
    last_refresh_token: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        *backend.refresh_expires_in.lock() = Some(3600);
        backend
    }

    pub fn fail_login(&self, kind: ErrorKind) {
        *self.login_error.lock() = Some(kind);
    }

    pub fn fail_google(&self, kind: ErrorKind) {
        *self.google_error.lock() = Some(kind);
    }

    pub fn fail_refresh(&self, kind: ErrorKind) {
        *self.refresh_error.lock() = Some(kind);
    }

    pub fn set_login_expires_in(&self, expires_in: Option<i64>) {
        *self.login_expires_in.lock() = expires_in;
    }

    pub fn set_refresh_expires_in(&self, expires_in: Option<i64>) {
        *self.refresh_expires_in.lock() = expires_in;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock() = delay;
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn google_calls(&self) -> usize {
        self.google_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().clone()
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthTokenResponse, ErrorKind> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = *self.login_error.lock() {
            return Err(kind);
        }
        let mut user = user(false);
        user.email = request.email.clone();
        Ok(AuthTokenResponse {
            user,
            access_token: "login-access".to_string(),
            refresh_token: "login-refresh".to_string(),
            expires_in: *self.login_expires_in.lock(),
        })
    }

    async fn google_callback(
        &self,
        _request: &GoogleCallbackRequest,
    ) -> Result<AuthTokenResponse, ErrorKind> {
        self.google_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = *self.google_error.lock() {
            return Err(kind);
        }
        Ok(AuthTokenResponse {
            user: user(false),
            access_token: "google-access".to_string(),
            refresh_token: "google-refresh".to_string(),
            expires_in: None,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ErrorKind> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_refresh_token.lock() = Some(refresh_token.to_string());

        let delay = *self.refresh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(kind) = *self.refresh_error.lock() {
            return Err(kind);
        }
        Ok(RefreshResponse {
            access_token: format!("access-{}", call),
            refresh_token: None,
            expires_in: *self.refresh_expires_in.lock(),
            user: None,
        })
    }
}

//! HTTP client for the auth backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared_types::{
    AuthTokenResponse, GoogleCallbackRequest, LoginRequest, RefreshResponse,
};

use crate::error::{Error, ErrorKind, Result};

/// The three backend endpoints the session manager depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<AuthTokenResponse, ErrorKind>;

    /// `POST /auth/google/callback`
    async fn google_callback(
        &self,
        request: &GoogleCallbackRequest,
    ) -> Result<AuthTokenResponse, ErrorKind>;

    /// `POST /auth/refresh` with `Authorization: Bearer <refresh_token>`
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ErrorKind>;
}

pub struct HttpAuthBackend {
    client: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthTokenResponse, ErrorKind> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Login request failed: {}", e);
                ErrorKind::BackendUnavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Login rejected by backend: {} - {}", status, body);
            return Err(ErrorKind::InvalidCredentials);
        }

        response.json().await.map_err(|e| {
            tracing::error!("Invalid login response: {}", e);
            ErrorKind::BackendUnavailable
        })
    }

    async fn google_callback(
        &self,
        request: &GoogleCallbackRequest,
    ) -> Result<AuthTokenResponse, ErrorKind> {
        let response = self
            .client
            .post(self.url("/auth/google/callback"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google callback exchange failed: {}", e);
                ErrorKind::BackendUnavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google callback rejected by backend: {} - {}", status, body);
            return Err(ErrorKind::BackendUnavailable);
        }

        response.json().await.map_err(|e| {
            tracing::error!("Invalid Google callback response: {}", e);
            ErrorKind::BackendUnavailable
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, ErrorKind> {
        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .bearer_auth(refresh_token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Refresh request failed: {}", e);
                ErrorKind::RefreshAccessTokenError
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Refresh rejected by backend with status {}", status);
            return Err(ErrorKind::RefreshAccessTokenError);
        }

        response.json().await.map_err(|e| {
            tracing::warn!("Invalid refresh response: {}", e);
            ErrorKind::RefreshAccessTokenError
        })
    }
}

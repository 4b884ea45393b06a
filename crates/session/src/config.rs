//! Auth configuration loaded from environment.

use chrono::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_ALLOWED_DOMAIN: &str = "@addu.edu.ph";

/// Google OAuth client settings. Absent when the Google flow is disabled.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    /// Organizational email suffix, e.g. `@addu.edu.ph`
    pub allowed_domain: String,
    pub backend_url: String,
    pub google: Option<GoogleConfig>,
    pub session_secret: String,
    pub session_max_age_days: i64,
    pub refresh_skew_secs: i64,
    pub backend_timeout_secs: u64,
    pub cookie_name: String,
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Required env vars:
    /// - `BACKEND_URL`: Base URL of the auth backend
    /// - `SESSION_SECRET`: Secret key for signing session artifacts
    ///
    /// Optional:
    /// - `AUTH_ALLOWED_DOMAIN` (default `@addu.edu.ph`)
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `AUTH_REDIRECT_URI`
    /// - `SESSION_MAX_AGE_DAYS` (default 30)
    /// - `REFRESH_SKEW_SECS` (default 60)
    /// - `BACKEND_TIMEOUT_SECS` (default 10)
    /// - `SESSION_COOKIE_NAME` (default `session_token`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let backend_url = std::env::var("BACKEND_URL")
            .map_err(|_| Error::missing_env("BACKEND_URL"))?
            .trim_end_matches('/')
            .to_string();

        let session_secret =
            std::env::var("SESSION_SECRET").map_err(|_| Error::missing_env("SESSION_SECRET"))?;
        if session_secret.is_empty() {
            return Err(Error::Config("SESSION_SECRET cannot be empty".to_string()));
        }

        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
            std::env::var("AUTH_REDIRECT_URI"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(redirect_uri)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri,
            }),
            _ => {
                tracing::warn!("Google OAuth not configured, only credential sign-in is available");
                None
            }
        };

        Ok(Self {
            allowed_domain: std::env::var("AUTH_ALLOWED_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_DOMAIN.to_string()),
            backend_url,
            google,
            session_secret,
            session_max_age_days: parse_env("SESSION_MAX_AGE_DAYS", 30)?,
            refresh_skew_secs: parse_env("REFRESH_SKEW_SECS", 60)?,
            backend_timeout_secs: parse_env("BACKEND_TIMEOUT_SECS", 10)?,
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "session_token".to_string()),
            secure_cookies: std::env::var("RUST_ENV").unwrap_or_default() == "production",
        })
    }

    pub fn refresh_skew(&self) -> Duration {
        Duration::seconds(self.refresh_skew_secs)
    }

    pub fn backend_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::days(self.session_max_age_days)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
        allowed_domain: DEFAULT_ALLOWED_DOMAIN.to_string(),
        backend_url: "http://localhost:4000".to_string(),
        google: Some(GoogleConfig {
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            redirect_uri: "http://localhost:3000/api/auth/callback/google".to_string(),
        }),
        session_secret: "test-secret-key-for-testing-only".to_string(),
        session_max_age_days: 30,
        refresh_skew_secs: 60,
        backend_timeout_secs: 10,
        cookie_name: "session_token".to_string(),
        secure_cookies: false,
    }
}

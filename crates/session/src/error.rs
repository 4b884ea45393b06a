//! Error types for sign-in, refresh and session artifacts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy for sign-in and refresh.
///
/// This is also the value stored in `Session::error` when a refresh fails, so
/// it is `Copy` and serializes to its variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed sign-in request; no network call was made
    #[error("email and password are required")]
    InvalidInput,

    /// OAuth profile outside the organizational domain; no backend call was made
    #[error("email domain is not allowed")]
    DomainRejected,

    /// Backend rejected the password login
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Network failure or unusable response during a sign-in exchange
    #[error("authentication backend unavailable")]
    BackendUnavailable,

    /// The refresh RPC failed; the session must re-authenticate
    #[error("failed to refresh access token")]
    RefreshAccessTokenError,

    /// Operation needs a session and there is none
    #[error("no active session")]
    NoSession,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::DomainRejected => "DomainRejected",
            ErrorKind::InvalidCredentials => "InvalidCredentials",
            ErrorKind::BackendUnavailable => "BackendUnavailable",
            ErrorKind::RefreshAccessTokenError => "RefreshAccessTokenError",
            ErrorKind::NoSession => "NoSession",
        }
    }
}

/// Infrastructure errors outside the sign-in/refresh taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session artifact could not be signed or verified
    #[error("Session artifact error: {0}")]
    Artifact(#[from] jsonwebtoken::errors::Error),

    /// OAuth provider round-trip failed
    #[error("Provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Auth(#[from] ErrorKind),
}

impl Error {
    /// Create a config error for missing env vars
    pub fn missing_env(var_name: &str) -> Self {
        Error::Config(format!("{} environment variable must be set", var_name))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Session data model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_types::User;

use crate::error::ErrorKind;

/// Lifetime applied when the Google callback response omits `expiresIn`.
pub const DEFAULT_OAUTH_EXPIRES_IN: i64 = 3600;
/// Lifetime applied when the credential login response omits `expiresIn`.
pub const DEFAULT_CREDENTIALS_EXPIRES_IN: i64 = 900;
/// Lifetime applied when the refresh response omits `expiresIn`.
pub const DEFAULT_REFRESH_EXPIRES_IN: i64 = 3600;
/// Longest access token lifetime accepted from the backend (30 days).
pub const MAX_EXPIRES_IN: i64 = 30 * 24 * 60 * 60;

/// Backend-issued token pair with its computed expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Build a token set expiring `expires_in` seconds from now.
    ///
    /// The lifetime is clamped to `0..=MAX_EXPIRES_IN`, so a negative value
    /// yields an already expired token. `None` when no expiry can be computed.
    pub fn issue(
        access_token: String,
        refresh_token: String,
        expires_in: Option<i64>,
        default_expires_in: i64,
    ) -> Option<Self> {
        let expires_in = expires_in
            .unwrap_or(default_expires_in)
            .clamp(0, MAX_EXPIRES_IN);
        let expires_at = Utc::now().checked_add_signed(Duration::try_seconds(expires_in)?)?;
        Some(TokenSet {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// True iff `now >= expires_at - skew`.
    pub fn is_stale(&self, skew: Duration) -> bool {
        match self.expires_at.checked_sub_signed(skew) {
            Some(deadline) => Utc::now() >= deadline,
            None => true,
        }
    }
}

/// The single live session of one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub tokens: TokenSet,
    /// Set by a failed refresh, cleared only by a new sign-in
    pub error: Option<ErrorKind>,
}

/// Provider-specific proof handed to the credential exchanger.
#[derive(Debug, Clone)]
pub enum SignInProof {
    /// Email/password login against the backend
    Credentials { email: String, password: String },
    /// Provider token pair plus the provider profile email used for the domain check
    OAuth {
        access_token: String,
        id_token: String,
        email: Option<String>,
    },
}

impl SignInProof {
    pub fn method(&self) -> &'static str {
        match self {
            SignInProof::Credentials { .. } => "credentials",
            SignInProof::OAuth { .. } => "oauth",
        }
    }
}

/// Mutation applied to the store by its single owner.
#[derive(Debug, Clone)]
pub enum TokenUpdate {
    Refreshed {
        tokens: TokenSet,
        user: Option<User>,
    },
    Failed(ErrorKind),
}

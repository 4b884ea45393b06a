//! Signed session artifact (JWT) carrying the session's token fields.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_types::User;

use crate::config::AuthConfig;
use crate::error::{ErrorKind, Result};
use crate::types::{Session, TokenSet};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id, keys the in-process session manager
    pub sid: String,
    /// Subject (user id)
    pub sub: String,
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (unix seconds), unrelated to `exp`
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Issued at timestamp
    pub iat: i64,
    /// Artifact expiration timestamp
    pub exp: i64,
}

/// Sign a session artifact for `sid`.
pub fn encode_session(config: &AuthConfig, sid: &str, session: &Session) -> Result<String> {
    let now = Utc::now();
    let exp = now + config.session_max_age();

    let claims = SessionClaims {
        sid: sid.to_string(),
        sub: session.user.id.clone(),
        user: session.user.clone(),
        access_token: session.tokens.access_token.clone(),
        refresh_token: session.tokens.refresh_token.clone(),
        expires_at: session.tokens.expires_at.timestamp(),
        error: session.error,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )?)
}

/// Verify a session artifact and return its session id and session.
pub fn decode_session(config: &AuthConfig, token: &str) -> Result<(String, Session)> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &Validation::default(),
    )?;

    let claims = token_data.claims;
    let session = Session {
        user: claims.user,
        tokens: TokenSet {
            access_token: claims.access_token,
            refresh_token: claims.refresh_token,
            expires_at: from_timestamp(claims.expires_at),
        },
        error: claims.error,
    };
    Ok((claims.sid, session))
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or_else(|| Utc::now() - Duration::seconds(1))
}

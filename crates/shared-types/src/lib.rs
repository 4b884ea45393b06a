use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile as issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_role: Option<String>,
}

// Backend request/response bodies

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /auth/google/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCallbackRequest {
    pub google_access_token: String,
    pub google_id_token: String,
}

/// Success body shared by the login and Google callback endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Success body of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Present only when the backend re-issues the profile on refresh
    #[serde(default)]
    pub user: Option<User>,
}

// Consumer-facing types

/// Read model of the current session handed to page/API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_admin: bool,
    /// Error kind name, e.g. `"RefreshAccessTokenError"`
    pub error: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionView {
    pub fn anonymous() -> Self {
        SessionView {
            user: None,
            is_authenticated: false,
            is_admin: false,
            error: None,
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInitResponse {
    pub auth_url: String,
}

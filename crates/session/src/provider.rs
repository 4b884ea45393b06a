//! Google OAuth provider round-trips.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GoogleConfig;
use crate::error::{Error, Result};
use crate::types::SignInProof;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Tokens returned by Google's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokens {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleProvider {
    client: Client,
    config: GoogleConfig,
    token_url: String,
    userinfo_url: String,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig, client: Client) -> Self {
        Self {
            client,
            config,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }

    /// Point the token and userinfo calls somewhere else, e.g. a local mock.
    pub fn with_endpoints(mut self, token_url: String, userinfo_url: String) -> Self {
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }

    /// URL the browser is sent to for consent.
    pub fn authorize_url(&self, state: &str) -> String {
        let scopes = ["openid", "email", "profile"].join(" ");

        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             prompt=consent&\
             state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for Google tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokens> {
        #[derive(Serialize)]
        struct TokenRequest<'a> {
            code: &'a str,
            client_id: &'a str,
            client_secret: &'a str,
            redirect_uri: &'a str,
            grant_type: &'a str,
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&TokenRequest {
                code,
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                redirect_uri: &self.config.redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Google token exchange failed: {} - {}", status, body);
            return Err(Error::Provider(format!("Token exchange returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Invalid token response: {}", e)))
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Failed to get user info: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "User info returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Invalid user info response: {}", e)))
    }

    /// Run the code exchange and profile lookup, producing sign-in proof.
    pub async fn proof_from_code(&self, code: &str) -> Result<SignInProof> {
        let tokens = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        tracing::info!(
            "OAuth login attempt from: {}",
            profile.email.as_deref().unwrap_or("<no email>")
        );

        Ok(SignInProof::OAuth {
            access_token: tokens.access_token,
            id_token: tokens.id_token.unwrap_or_default(),
            email: profile.email,
        })
    }
}

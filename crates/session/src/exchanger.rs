//! Turns sign-in proof into backend-issued tokens.

use std::sync::Arc;

use shared_types::{AuthTokenResponse, GoogleCallbackRequest, LoginRequest, User};

use crate::backend::AuthBackend;
use crate::error::ErrorKind;
use crate::policy::SessionPolicy;
use crate::types::{
    SignInProof, TokenSet, DEFAULT_CREDENTIALS_EXPIRES_IN, DEFAULT_OAUTH_EXPIRES_IN,
};

/// Performs the sign-in exchange. Never touches a session.
#[derive(Clone)]
pub struct CredentialExchanger {
    backend: Arc<dyn AuthBackend>,
    policy: Arc<SessionPolicy>,
}

impl CredentialExchanger {
    pub fn new(backend: Arc<dyn AuthBackend>, policy: Arc<SessionPolicy>) -> Self {
        Self { backend, policy }
    }

    pub async fn exchange(&self, proof: SignInProof) -> Result<(User, TokenSet), ErrorKind> {
        match proof {
            SignInProof::Credentials { email, password } => {
                let email = email.trim().to_string();
                if email.is_empty() || password.is_empty() {
                    return Err(ErrorKind::InvalidInput);
                }

                let response = self.backend.login(&LoginRequest { email, password }).await?;
                into_session_parts(response, DEFAULT_CREDENTIALS_EXPIRES_IN)
            }
            SignInProof::OAuth {
                access_token,
                id_token,
                email,
            } => {
                let email = email.unwrap_or_default();
                if !self.policy.admit_oauth_profile(&email) {
                    tracing::warn!("Rejected OAuth sign-in outside allowed domain: {}", email);
                    return Err(ErrorKind::DomainRejected);
                }

                let response = self
                    .backend
                    .google_callback(&GoogleCallbackRequest {
                        google_access_token: access_token,
                        google_id_token: id_token,
                    })
                    .await?;
                into_session_parts(response, DEFAULT_OAUTH_EXPIRES_IN)
            }
        }
    }
}

fn into_session_parts(
    response: AuthTokenResponse,
    default_expires_in: i64,
) -> Result<(User, TokenSet), ErrorKind> {
    let tokens = TokenSet::issue(
        response.access_token,
        response.refresh_token,
        response.expires_in,
        default_expires_in,
    )
    .ok_or_else(|| {
        tracing::error!("Backend returned an unusable token lifetime: {:?}", response.expires_in);
        ErrorKind::BackendUnavailable
    })?;
    Ok((response.user, tokens))
}

//! Per-principal session manager.

use std::sync::Arc;

use chrono::Duration;
use reqwest::RequestBuilder;
use shared_types::SessionView;

use crate::backend::AuthBackend;
use crate::error::ErrorKind;
use crate::exchanger::CredentialExchanger;
use crate::policy::{SessionFlags, SessionPolicy};
use crate::refresh::RefreshCoordinator;
use crate::store::SessionStore;
use crate::types::{Session, SignInProof, TokenSet};

/// Owns one session store and the refresh coordinator guarding it.
///
/// Create one per browser session or principal; managers share nothing, so
/// refreshes of unrelated sessions never wait on each other.
pub struct SessionManager {
    store: Arc<SessionStore>,
    exchanger: CredentialExchanger,
    coordinator: RefreshCoordinator,
    policy: Arc<SessionPolicy>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        policy: Arc<SessionPolicy>,
        skew: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        let store = Arc::new(SessionStore::new());
        Self {
            exchanger: CredentialExchanger::new(backend.clone(), policy.clone()),
            coordinator: RefreshCoordinator::new(backend, store.clone(), skew, timeout),
            store,
            policy,
        }
    }

    /// Exchange the proof and start a new session lineage.
    ///
    /// A failed sign-in leaves any existing session untouched.
    pub async fn sign_in(&self, proof: SignInProof) -> Result<Session, ErrorKind> {
        let method = proof.method();
        match self.exchanger.exchange(proof).await {
            Ok((user, tokens)) => {
                tracing::info!("Successful {} sign-in for: {}", method, user.email);
                Ok(self.store.initialize(user, tokens))
            }
            Err(kind) => {
                tracing::warn!("{} sign-in failed: {}", method, kind);
                Err(kind)
            }
        }
    }

    /// Rehydrate from a decoded session artifact.
    pub fn restore(&self, session: Session) {
        self.store.restore(session);
    }

    pub fn sign_out(&self) -> Option<Session> {
        let session = self.store.clear();
        if let Some(session) = &session {
            tracing::info!("Signed out: {}", session.user.email);
        }
        session
    }

    pub fn current(&self) -> Option<Session> {
        self.store.current()
    }

    pub fn flags(&self) -> SessionFlags {
        self.policy.derive_flags(self.store.current().as_ref())
    }

    pub fn view(&self) -> SessionView {
        session_view(&self.policy, self.store.current().as_ref())
    }

    pub async fn ensure_fresh(&self) -> Result<TokenSet, ErrorKind> {
        self.coordinator.ensure_fresh().await
    }

    /// Attach a fresh bearer token to an outgoing request.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ErrorKind> {
        let tokens = self.ensure_fresh().await?;
        Ok(request.bearer_auth(tokens.access_token))
    }
}

pub fn session_view(policy: &SessionPolicy, session: Option<&Session>) -> SessionView {
    let Some(session) = session else {
        return SessionView::anonymous();
    };
    let flags = policy.derive_flags(Some(session));
    SessionView {
        user: Some(session.user.clone()),
        is_authenticated: flags.is_authenticated,
        is_admin: flags.is_admin,
        error: session.error.map(|kind| kind.as_str().to_string()),
        expires_at: Some(session.tokens.expires_at),
    }
}

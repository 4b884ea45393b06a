//! Shared application state.

use std::sync::Arc;

use session::{
    AuthBackend, AuthConfig, GoogleProvider, RouteGuard, RouteTable, SessionManager,
    SessionPolicy,
};

use crate::registry::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub backend: Arc<dyn AuthBackend>,
    pub policy: Arc<SessionPolicy>,
    pub guard: Arc<RouteGuard>,
    pub google: Option<GoogleProvider>,
    pub registry: SessionRegistry,
    /// Client for pass-through calls to the backend
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: AuthConfig,
        backend: Arc<dyn AuthBackend>,
        google: Option<GoogleProvider>,
        http: reqwest::Client,
    ) -> Self {
        let policy = SessionPolicy::new(config.allowed_domain.clone());
        Self {
            guard: Arc::new(RouteGuard::new(RouteTable::default(), policy.clone())),
            policy: Arc::new(policy),
            config: Arc::new(config),
            backend,
            google,
            registry: SessionRegistry::default(),
            http,
        }
    }

    /// A manager for a new browser session, sharing nothing with other sessions.
    pub fn new_manager(&self) -> SessionManager {
        SessionManager::new(
            self.backend.clone(),
            self.policy.clone(),
            self.config.refresh_skew(),
            self.config.backend_timeout(),
        )
    }
}

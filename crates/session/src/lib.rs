//! Session and token lifecycle for backend-issued credentials.
//!
//! This crate provides:
//! - Sign-in exchange for Google OAuth and email/password credentials
//! - An in-memory session store with serialized updates
//! - Single-flight access token refresh
//! - Organizational domain admission and role flags
//! - A pure route guard over `(path, session)`
//! - Signed JWT session artifacts

pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod exchanger;
pub mod guard;
pub mod manager;
pub mod policy;
pub mod provider;
pub mod refresh;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use config::{AuthConfig, GoogleConfig};
pub use error::{Error, ErrorKind, Result};
pub use guard::{GuardDecision, RouteClass, RouteGuard, RouteTable};
pub use manager::{session_view, SessionManager};
pub use policy::{SessionFlags, SessionPolicy};
pub use provider::GoogleProvider;
pub use types::{Session, SignInProof, TokenSet, TokenUpdate};

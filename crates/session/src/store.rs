//! In-memory holder of the current session.

use chrono::Duration;
use parking_lot::RwLock;
use shared_types::User;

use crate::types::{Session, TokenSet, TokenUpdate};

/// Owns the one live [`Session`] of a principal.
///
/// All mutations go through this type under a write lock, so readers see either
/// the session before an update or after it, never a mix. Every sign-in, restore
/// or sign-out starts a new lineage; refresh results are only applied to the
/// lineage they were requested for.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    session: Option<Session>,
    lineage: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.read().session.clone()
    }

    /// Current session together with its lineage id.
    pub fn snapshot(&self) -> Option<(u64, Session)> {
        let slot = self.inner.read();
        slot.session.clone().map(|session| (slot.lineage, session))
    }

    /// Id of the current lineage, bumped by every sign-in, restore and sign-out.
    pub fn lineage(&self) -> u64 {
        self.inner.read().lineage
    }

    /// Replace whatever session was here with a freshly signed-in one.
    pub fn initialize(&self, user: User, tokens: TokenSet) -> Session {
        let session = Session {
            user,
            tokens,
            error: None,
        };
        self.inner.write().replace(Some(session.clone()));
        session
    }

    /// Put back a session decoded from a session artifact.
    pub fn restore(&self, session: Session) {
        self.inner.write().replace(Some(session));
    }

    /// False when there is no session: nothing to refresh.
    pub fn needs_refresh(&self, skew: Duration) -> bool {
        self.inner
            .read()
            .session
            .as_ref()
            .is_some_and(|session| session.tokens.is_stale(skew))
    }

    pub fn apply(&self, update: TokenUpdate) {
        let mut slot = self.inner.write();
        let lineage = slot.lineage;
        slot.apply(lineage, update);
    }

    /// Apply an update only if the session still belongs to `lineage`.
    pub fn apply_to(&self, lineage: u64, update: TokenUpdate) -> bool {
        self.inner.write().apply(lineage, update)
    }

    pub fn clear(&self) -> Option<Session> {
        self.inner.write().replace(None)
    }
}

impl Slot {
    fn replace(&mut self, session: Option<Session>) -> Option<Session> {
        self.lineage += 1;
        std::mem::replace(&mut self.session, session)
    }

    fn apply(&mut self, lineage: u64, update: TokenUpdate) -> bool {
        if lineage != self.lineage {
            tracing::debug!("Dropping token update for a superseded session");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("Dropping token update for a session that was signed out");
            return false;
        };

        match update {
            TokenUpdate::Refreshed { mut tokens, user } => {
                // expiry never moves backwards within one session lineage
                if tokens.expires_at < session.tokens.expires_at {
                    tokens.expires_at = session.tokens.expires_at;
                }
                session.tokens = tokens;
                if let Some(user) = user {
                    session.user = user;
                }
                session.error = None;
            }
            TokenUpdate::Failed(kind) => {
                session.error = Some(kind);
            }
        }
        true
    }
}

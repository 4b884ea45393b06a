//! Single-flight access token refresh.
//!
//! A coordinator owns one slot holding the refresh currently in flight. The
//! first caller that finds the session stale fills the slot and spawns the
//! refresh RPC; every caller arriving while the slot is full awaits the same
//! shared future, so a backend that rotates refresh tokens on use never sees
//! two refreshes from the same session. The spawned task applies the outcome
//! to the [`SessionStore`] and then empties the slot, whether it succeeded or
//! not, so the next stale check can start a new refresh.
//!
//! The RPC runs on its own task: callers that stop awaiting do not cancel it,
//! and the store is still updated for everyone else.

use std::sync::Arc;

use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::backend::AuthBackend;
use crate::error::ErrorKind;
use crate::store::SessionStore;
use crate::types::{Session, TokenSet, TokenUpdate, DEFAULT_REFRESH_EXPIRES_IN};

type RefreshFuture = Shared<BoxFuture<'static, Result<TokenSet, ErrorKind>>>;
type Slot = Arc<Mutex<Option<InFlight>>>;

/// A refresh started for one session lineage.
struct InFlight {
    lineage: u64,
    refresh: RefreshFuture,
}

pub struct RefreshCoordinator {
    backend: Arc<dyn AuthBackend>,
    store: Arc<SessionStore>,
    skew: Duration,
    timeout: std::time::Duration,
    in_flight: Slot,
}

impl RefreshCoordinator {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        store: Arc<SessionStore>,
        skew: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            backend,
            store,
            skew,
            timeout,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// True while a refresh RPC is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().is_some()
    }

    /// Return a usable token set for the current session, refreshing it first
    /// if it is stale.
    ///
    /// An errored session fails with its recorded error without another RPC;
    /// only a new sign-in clears it. If the session is replaced while a refresh
    /// is pending, the outcome of that refresh is discarded and the new session
    /// is checked again.
    pub async fn ensure_fresh(&self) -> Result<TokenSet, ErrorKind> {
        loop {
            let session = self.store.current().ok_or(ErrorKind::NoSession)?;
            if let Some(kind) = session.error {
                return Err(kind);
            }
            if !session.tokens.is_stale(self.skew) {
                return Ok(session.tokens);
            }

            let (lineage, refresh) = {
                let mut slot = self.in_flight.lock();
                // re-read under the slot: a refresh or a new sign-in may have landed
                let (lineage, session) = self.store.snapshot().ok_or(ErrorKind::NoSession)?;
                if let Some(kind) = session.error {
                    return Err(kind);
                }
                if !session.tokens.is_stale(self.skew) {
                    return Ok(session.tokens);
                }

                match slot.as_ref() {
                    Some(pending) if pending.lineage == lineage => {
                        tracing::debug!("Joining in-flight token refresh");
                        (lineage, pending.refresh.clone())
                    }
                    pending => {
                        if pending.is_some() {
                            tracing::debug!("Session replaced during refresh, refreshing again");
                        }
                        let refresh = self.spawn_refresh(lineage, session);
                        *slot = Some(InFlight {
                            lineage,
                            refresh: refresh.clone(),
                        });
                        (lineage, refresh)
                    }
                }
            };

            let outcome = refresh.await;
            if self.store.lineage() == lineage {
                return outcome;
            }
        }
    }

    /// Spawn the refresh RPC. Must be called with the slot locked.
    fn spawn_refresh(&self, lineage: u64, session: Session) -> RefreshFuture {
        let backend = self.backend.clone();
        let store = self.store.clone();
        let timeout = self.timeout;
        let clear_on_exit = ClearSlot {
            slot: self.in_flight.clone(),
            lineage,
        };

        tracing::info!("Refreshing access token for {}", session.user.email);

        let task = tokio::spawn(async move {
            let _clear_on_exit = clear_on_exit;
            let previous_refresh_token = session.tokens.refresh_token;

            let response =
                match tokio::time::timeout(timeout, backend.refresh(&previous_refresh_token)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Token refresh timed out after {:?}", timeout);
                        Err(ErrorKind::RefreshAccessTokenError)
                    }
                };

            let refreshed = response.and_then(|response| {
                let tokens = TokenSet::issue(
                    response.access_token,
                    response
                        .refresh_token
                        .unwrap_or(previous_refresh_token),
                    response.expires_in,
                    DEFAULT_REFRESH_EXPIRES_IN,
                )
                .ok_or(ErrorKind::RefreshAccessTokenError)?;
                Ok((tokens, response.user))
            });

            match refreshed {
                Ok((tokens, user)) => {
                    store.apply_to(
                        lineage,
                        TokenUpdate::Refreshed {
                            tokens: tokens.clone(),
                            user,
                        },
                    );
                    tracing::info!("Access token refreshed, expires at {}", tokens.expires_at);
                    Ok(stored_tokens(&store, lineage).unwrap_or(tokens))
                }
                Err(_) => {
                    store.apply_to(
                        lineage,
                        TokenUpdate::Failed(ErrorKind::RefreshAccessTokenError),
                    );
                    tracing::warn!("Access token refresh failed, session requires sign-in");
                    Err(ErrorKind::RefreshAccessTokenError)
                }
            }
        });

        let store = self.store.clone();
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Token refresh task aborted: {}", e);
                    store.apply_to(
                        lineage,
                        TokenUpdate::Failed(ErrorKind::RefreshAccessTokenError),
                    );
                    Err(ErrorKind::RefreshAccessTokenError)
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Tokens as stored for `lineage`, which may differ from the issued ones by the
/// monotonic expiry adjustment.
fn stored_tokens(store: &SessionStore, lineage: u64) -> Option<TokenSet> {
    store
        .snapshot()
        .filter(|(current, _)| *current == lineage)
        .map(|(_, session)| session.tokens)
}

/// Empties the in-flight slot when the refresh task finishes or unwinds,
/// unless a refresh for a newer lineage has taken it over.
struct ClearSlot {
    slot: Slot,
    lineage: u64,
}

impl Drop for ClearSlot {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|pending| pending.lineage == self.lineage) {
            slot.take();
        }
    }
}

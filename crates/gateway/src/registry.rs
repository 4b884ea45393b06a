//! Live session managers keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use session::{Session, SessionManager};
use tokio::sync::RwLock;

struct Entry {
    manager: Arc<SessionManager>,
    last_seen: Instant,
}

impl Entry {
    fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            last_seen: Instant::now(),
        }
    }

    /// Signed out, errored or unused for longer than `idle_ttl`.
    fn is_evictable(&self, idle_ttl: Duration) -> bool {
        match self.manager.current() {
            None => true,
            Some(session) => session.error.is_some() || self.last_seen.elapsed() >= idle_ttl,
        }
    }
}

/// Maps the `sid` carried in a session artifact to its manager.
///
/// There is exactly one manager per `sid`, so every request of a browser
/// session goes through the same refresh coordinator. Entries are dropped by
/// [`SessionRegistry::sweep`]; an evicted session is rehydrated from its
/// cookie on the next request.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    managers: Arc<RwLock<HashMap<String, Entry>>>,
}

impl SessionRegistry {
    /// Look up `sid` and mark it as seen.
    pub async fn get(&self, sid: &str) -> Option<Arc<SessionManager>> {
        let mut managers = self.managers.write().await;
        let entry = managers.get_mut(sid)?;
        entry.last_seen = Instant::now();
        Some(entry.manager.clone())
    }

    pub async fn insert(&self, sid: String, manager: Arc<SessionManager>) {
        self.managers.write().await.insert(sid, Entry::new(manager));
    }

    pub async fn remove(&self, sid: &str) -> Option<Arc<SessionManager>> {
        self.managers
            .write()
            .await
            .remove(sid)
            .map(|entry| entry.manager)
    }

    pub async fn len(&self) -> usize {
        self.managers.read().await.len()
    }

    /// Return the manager for `sid`, rehydrating it from the artifact's session
    /// when this process has none (e.g. after a restart or an eviction).
    pub async fn get_or_restore(
        &self,
        sid: &str,
        session: Session,
        make: impl FnOnce() -> SessionManager,
    ) -> Arc<SessionManager> {
        let mut managers = self.managers.write().await;
        let entry = managers.entry(sid.to_string()).or_insert_with(|| {
            tracing::debug!("Restoring session {} from artifact", sid);
            let manager = make();
            manager.restore(session);
            Entry::new(Arc::new(manager))
        });
        entry.last_seen = Instant::now();
        entry.manager.clone()
    }

    /// Drop managers that are signed out, errored or idle past `idle_ttl`.
    /// Returns how many were removed.
    pub async fn sweep(&self, idle_ttl: Duration) -> usize {
        let mut managers = self.managers.write().await;
        let before = managers.len();
        managers.retain(|_, entry| !entry.is_evictable(idle_ttl));
        before - managers.len()
    }
}

/// Periodically evict stale session managers.
pub async fn start_sweep_task(registry: SessionRegistry, idle_ttl: Duration, interval: Duration) {
    tracing::info!(
        "Session sweep task started (interval: {:?}, idle ttl: {:?})",
        interval,
        idle_ttl
    );

    loop {
        tokio::time::sleep(interval).await;
        let evicted = registry.sweep(idle_ttl).await;
        if evicted > 0 {
            tracing::debug!(
                "Evicted {} session managers, {} live",
                evicted,
                registry.len().await
            );
        }
    }
}

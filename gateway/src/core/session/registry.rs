//! Process-wide index of live sessions.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use super::phase::CloseReason;
use super::state::{Session, SessionKey};

/// Storage for live sessions keyed by [`SessionKey`].
pub trait SessionRegistry: Send + Sync {
    /// Return the session for `key`, creating it with `init` if absent.
    /// The flag is true when this call created the entry.
    fn create_or_get(
        &self,
        key: &SessionKey,
        init: Box<dyn FnOnce() -> Session + Send + '_>,
    ) -> (Arc<Session>, bool);

    fn get(&self, key: &SessionKey) -> Option<Arc<Session>>;

    /// Remove the entry for `key`. Concurrent callers see at most one `Some`.
    fn remove(&self, key: &SessionKey) -> Option<Arc<Session>>;

    /// Remove the entry only if it still refers to `session`.
    fn remove_session(&self, session: &Arc<Session>) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<SessionKey, Arc<Session>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn create_or_get(
        &self,
        key: &SessionKey,
        init: Box<dyn FnOnce() -> Session + Send + '_>,
    ) -> (Arc<Session>, bool) {
        match self.sessions.entry(key.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let session = Arc::new(init());
                entry.insert(session.clone());
                debug!(session = %key, "Session registered");
                (session, true)
            }
        }
    }

    fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    fn remove(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.remove(key).map(|(_, session)| session)
    }

    fn remove_session(&self, session: &Arc<Session>) -> bool {
        self.sessions
            .remove_if(session.key(), |_, current| Arc::ptr_eq(current, session))
            .is_some()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Close `session` and drop it from `registry`.
///
/// Safe to call from every close and error path: the phase transition admits
/// one winner, and only that caller removes the registry entry.
pub async fn teardown(
    registry: &dyn SessionRegistry,
    session: &Arc<Session>,
    reason: CloseReason,
) -> bool {
    if !session.close(reason).await {
        return false;
    }
    let removed = registry.remove_session(session);
    info!(
        session = %session.key(),
        removed,
        active_sessions = registry.len(),
        "Session torn down"
    );
    true
}

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{domain::SessionKey, errors::Error, Result};

use super::ModalSession;

/// Process-wide registry of in-progress multi-page submissions.
///
/// The lock only guards the map itself. Discord serializes submissions of a
/// single open form, so one key is never mutated by two interactions at once.
/// Sessions never expire on their own; an abandoned flow stays until the same
/// key is overwritten or the process restarts.
#[derive(Debug, Default)]
pub struct ModalSessionStore {
    sessions: RwLock<HashMap<SessionKey, ModalSession>>,
}

impl ModalSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any previous one under the same key.
    pub async fn create(&self, session: ModalSession) {
        let mut map = self.sessions.write().await;
        map.insert(session.key.clone(), session);
    }

    pub async fn get(&self, key: &SessionKey) -> Option<ModalSession> {
        self.sessions.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.read().await.contains_key(key)
    }

    /// Run `f` against the stored session under the write lock.
    pub async fn update<R>(
        &self,
        key: &SessionKey,
        f: impl FnOnce(&mut ModalSession) -> R,
    ) -> Result<R> {
        let mut map = self.sessions.write().await;
        map.get_mut(key)
            .map(f)
            .ok_or_else(|| Error::SessionNotFound(key.to_string()))
    }

    pub async fn delete(&self, key: &SessionKey) -> Option<ModalSession> {
        self.sessions.write().await.remove(key)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

//! In-memory session store — sessions live for the lifetime of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use concierge_core::error::SessionError;
use concierge_core::session::{Session, SessionStore};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get(&self, user: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(user).cloned())
    }

    async fn put(&self, mut session: Session) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(&session.user).map_or(0, |s| s.version);
        session.version = current + 1;
        let version = session.version;
        sessions.insert(session.user.clone(), session);
        Ok(version)
    }

    async fn compare_and_swap(&self, mut session: Session) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(&session.user).map_or(0, |s| s.version);
        if current != session.version {
            return Err(SessionError::Conflict {
                user: session.user,
                expected: session.version,
                actual: current,
            });
        }
        session.version = current + 1;
        let version = session.version;
        debug!(user = %session.user, version, "Session saved");
        sessions.insert(session.user.clone(), session);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::session::Turn;

    #[tokio::test]
    async fn load_or_new_creates_lazily() {
        let store = InMemorySessionStore::new();
        let session = store.load_or_new("ana@example.com").await.unwrap();
        assert_eq!(session.version, 0);
        assert!(session.history.is_empty());
        // Nothing is stored until the session is written.
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn compare_and_swap_bumps_version() {
        let store = InMemorySessionStore::new();
        let mut session = store.load_or_new("ana@example.com").await.unwrap();
        session.push_turn(Turn::customer("hi"), 10);

        assert_eq!(store.compare_and_swap(session).await.unwrap(), 1);
        let stored = store.get("ana@example.com").await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.history.len(), 1);
    }

    #[tokio::test]
    async fn stale_write_is_a_conflict() {
        let store = InMemorySessionStore::new();
        let first = store.load_or_new("ana@example.com").await.unwrap();
        let second = first.clone();

        store.compare_and_swap(first).await.unwrap();
        let err = store.compare_and_swap(second).await.unwrap_err();
        match err {
            SessionError::Conflict { expected, actual, .. } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_user() {
        let store = InMemorySessionStore::new();
        let mut ana = Session::new("ana@example.com");
        ana.push_turn(Turn::customer("where is my order"), 10);
        store.put(ana).await.unwrap();

        let bo = store.load_or_new("bo@example.com").await.unwrap();
        assert!(bo.history.is_empty());
        assert_eq!(store.len().await, 1);
    }
}

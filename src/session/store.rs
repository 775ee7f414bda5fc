//! Session storage and per-user serialization.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::model::Session;

/// Backend-agnostic session store keyed by user id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a copy of the user's session, if one exists.
    async fn get(&self, user: &str) -> Option<Session>;

    /// Insert or replace the user's session.
    async fn put(&self, user: &str, session: Session);

    /// Drop the user's session.
    async fn remove(&self, user: &str) -> Option<Session>;
}

/// Process-local store. Sessions are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
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
    async fn get(&self, user: &str) -> Option<Session> {
        self.sessions.read().await.get(user).cloned()
    }

    async fn put(&self, user: &str, session: Session) {
        self.sessions.write().await.insert(user.to_string(), session);
    }

    async fn remove(&self, user: &str) -> Option<Session> {
        self.sessions.write().await.remove(user)
    }
}

/// One async mutex per user, so events for the same user run one at a time
/// while different users proceed in parallel.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `user`'s session.
    pub async fn acquire(&self, user: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

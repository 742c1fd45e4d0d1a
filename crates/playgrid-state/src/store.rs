//! In-memory session credential registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::retention::{RetainForever, RetentionPolicy};
use crate::types::*;

/// Thread-safe credential store.
#[derive(Clone)]
pub struct CredentialStore {
    entries: Arc<RwLock<HashMap<SessionId, StoredCredentials>>>,
    retention: Arc<dyn RetentionPolicy>,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Empty store that never evicts.
    pub fn new() -> Self {
        Self::with_retention(Arc::new(RetainForever))
    }

    /// Empty store that evicts according to `retention` when pruned.
    pub fn with_retention(retention: Arc<dyn RetentionPolicy>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Record credentials for a new session.
    pub async fn put(&self, session_id: &str, credentials: Credentials) -> StateResult<()> {
        self.put_at(session_id, credentials, epoch_secs()).await
    }

    async fn put_at(
        &self,
        session_id: &str,
        credentials: Credentials,
        created_at: u64,
    ) -> StateResult<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(session_id) {
            return Err(StateError::AlreadyExists(session_id.to_string()));
        }
        entries.insert(
            session_id.to_string(),
            StoredCredentials {
                session_id: session_id.to_string(),
                credentials,
                created_at,
            },
        );
        debug!(%session_id, "credentials stored");
        Ok(())
    }

    /// Credentials for a session, if recorded.
    pub async fn get(&self, session_id: &str) -> Option<Credentials> {
        self.entries
            .read()
            .await
            .get(session_id)
            .map(|e| e.credentials.clone())
    }

    /// True only when the session exists and both fields match.
    pub async fn verify(&self, session_id: &str, username: &str, password: &str) -> bool {
        self.entries
            .read()
            .await
            .get(session_id)
            .is_some_and(|e| {
                e.credentials.username == username && e.credentials.password == password
            })
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.entries.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Apply the retention policy at the current time. Returns the number of
    /// evicted entries.
    pub async fn prune(&self) -> usize {
        self.prune_at(epoch_secs()).await
    }

    /// Apply the retention policy as if the clock read `now`.
    pub async fn prune_at(&self, now: u64) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !self.retention.should_evict(e, now));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = entries.len(), "credentials pruned");
        }
        evicted
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! In-memory cluster.
//!
//! Accepts objects into an ordered log. Like a real API server it refuses a
//! second object with the same kind, namespace, and name. A failure can be
//! scheduled for the n-th call (0-based, counting every call) to exercise
//! partial-provisioning paths.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use playgrid_core::manifest::{ObjectName, PersistentVolumeClaim, StatefulSet};

use crate::client::{ClusterClient, ObjectKind};
use crate::error::{ClusterError, ClusterResult};

/// An object the cluster accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    StorageClaim {
        namespace: String,
        claim: PersistentVolumeClaim,
    },
    StatefulWorkload {
        namespace: String,
        workload: StatefulSet,
    },
}

impl Submission {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Submission::StorageClaim { .. } => ObjectKind::PersistentVolumeClaim,
            Submission::StatefulWorkload { .. } => ObjectKind::StatefulSet,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Submission::StorageClaim { claim, .. } => claim.object_name(),
            Submission::StatefulWorkload { workload, .. } => workload.object_name(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Submission::StorageClaim { namespace, .. }
            | Submission::StatefulWorkload { namespace, .. } => namespace,
        }
    }
}

#[derive(Default)]
struct Inner {
    accepted: Vec<Submission>,
    calls: usize,
    failures: HashMap<usize, String>,
}

#[derive(Clone, Default)]
pub struct InMemoryCluster {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make call number `call` (0-based) fail with `reason`.
    pub async fn fail_call(&self, call: usize, reason: impl Into<String>) {
        self.inner.lock().await.failures.insert(call, reason.into());
    }

    /// Accepted objects, in submission order.
    pub async fn submissions(&self) -> Vec<Submission> {
        self.inner.lock().await.accepted.clone()
    }

    /// Number of create calls received, accepted or not.
    pub async fn calls(&self) -> usize {
        self.inner.lock().await.calls
    }

    pub async fn claims(&self) -> Vec<PersistentVolumeClaim> {
        self.inner
            .lock()
            .await
            .accepted
            .iter()
            .filter_map(|s| match s {
                Submission::StorageClaim { claim, .. } => Some(claim.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn workloads(&self) -> Vec<StatefulSet> {
        self.inner
            .lock()
            .await
            .accepted
            .iter()
            .filter_map(|s| match s {
                Submission::StatefulWorkload { workload, .. } => Some(workload.clone()),
                _ => None,
            })
            .collect()
    }

    async fn accept(&self, submission: Submission) -> ClusterResult<()> {
        let mut inner = self.inner.lock().await;
        let call = inner.calls;
        inner.calls += 1;

        let kind = submission.kind();
        let name = submission.name().to_string();

        if let Some(reason) = inner.failures.remove(&call) {
            debug!(call, %kind, %name, "injected failure");
            return Err(ClusterError::Rejected {
                kind,
                name,
                code: 500,
                message: format!("injected failure on call {call}"),
                reason,
            });
        }

        let exists = inner.accepted.iter().any(|s| {
            s.kind() == kind && s.namespace() == submission.namespace() && s.name() == name
        });
        if exists {
            return Err(ClusterError::Rejected {
                message: format!("{kind} \"{name}\" already exists"),
                kind,
                name,
                code: 409,
                reason: "AlreadyExists".to_string(),
            });
        }

        debug!(call, %kind, %name, namespace = submission.namespace(), "object accepted");
        inner.accepted.push(submission);
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn create_storage_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClusterResult<()> {
        self.accept(Submission::StorageClaim {
            namespace: namespace.to_string(),
            claim: claim.clone(),
        })
        .await
    }

    async fn create_stateful_workload(
        &self,
        namespace: &str,
        workload: &StatefulSet,
    ) -> ClusterResult<()> {
        self.accept(Submission::StatefulWorkload {
            namespace: namespace.to_string(),
            workload: workload.clone(),
        })
        .await
    }
}

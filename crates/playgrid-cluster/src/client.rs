//! The cluster client seam.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use playgrid_core::manifest::{PersistentVolumeClaim, StatefulSet};

use crate::error::ClusterResult;

/// Kinds of object provisioning creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    PersistentVolumeClaim,
    StatefulSet,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::PersistentVolumeClaim => f.write_str("PersistentVolumeClaim"),
            ObjectKind::StatefulSet => f.write_str("StatefulSet"),
        }
    }
}

/// Object creation calls against a cluster. No call is retried and there
/// is no transaction across calls.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_storage_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClusterResult<()>;

    async fn create_stateful_workload(
        &self,
        namespace: &str,
        workload: &StatefulSet,
    ) -> ClusterResult<()>;
}

//! Kubernetes API server adapter.
//!
//! Manifests are already `k8s-openapi` objects and are posted as-is with
//! `Api::create`. The API server's status response becomes
//! [`ClusterError::Rejected`]; everything else is a transport error.

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, PostParams};
use tracing::debug;

use playgrid_core::manifest::{ObjectName, PersistentVolumeClaim, StatefulSet};

use crate::client::{ClusterClient, ObjectKind};
use crate::error::{ClusterError, ClusterResult};

pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient kubeconfig or in-cluster service
    /// account.
    pub async fn try_default() -> ClusterResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn create_storage_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> ClusterResult<()> {
        let name = claim.object_name();
        let api: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), claim)
            .await
            .map_err(|e| from_kube(ObjectKind::PersistentVolumeClaim, name, e))?;
        debug!(%namespace, name, "storage claim created");
        Ok(())
    }

    async fn create_stateful_workload(
        &self,
        namespace: &str,
        workload: &StatefulSet,
    ) -> ClusterResult<()> {
        let name = workload.object_name();
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), workload)
            .await
            .map_err(|e| from_kube(ObjectKind::StatefulSet, name, e))?;
        debug!(%namespace, name, "stateful workload created");
        Ok(())
    }
}

fn from_kube(kind: ObjectKind, name: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(status) => ClusterError::Rejected {
            kind,
            name: name.to_string(),
            code: status.code,
            reason: status.reason,
            message: status.message,
        },
        other => ClusterError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    #[test]
    fn api_status_becomes_rejection() {
        let err = from_kube(
            ObjectKind::StatefulSet,
            "steam-k8s1",
            kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "exceeded quota: gaming-quota".into(),
                reason: "Forbidden".into(),
                code: 403,
            }),
        );
        assert!(err.is_rejection());
        assert_eq!(err.reason(), "Forbidden");
        assert_eq!(
            err,
            ClusterError::Rejected {
                kind: ObjectKind::StatefulSet,
                name: "steam-k8s1".into(),
                code: 403,
                reason: "Forbidden".into(),
                message: "exceeded quota: gaming-quota".into(),
            }
        );
    }

    #[test]
    fn conflict_keeps_object_identity() {
        let err = from_kube(
            ObjectKind::PersistentVolumeClaim,
            "steam-k8s1-home",
            kube::Error::Api(ErrorResponse {
                status: "Failure".into(),
                message: "persistentvolumeclaims \"steam-k8s1-home\" already exists".into(),
                reason: "AlreadyExists".into(),
                code: 409,
            }),
        );
        assert_eq!(
            err.to_string(),
            "PersistentVolumeClaim steam-k8s1-home rejected (409 AlreadyExists): \
             persistentvolumeclaims \"steam-k8s1-home\" already exists"
        );
    }
}

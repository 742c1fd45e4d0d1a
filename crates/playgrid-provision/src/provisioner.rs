//! Maps a package request onto cluster objects.
//!
//! One call to [`Provisioner::provision`]:
//! - validates the package against the tier catalog
//! - generates the session identity and builds all three manifests
//! - records the credentials
//! - creates the home claim, then the games claim, then the workload
//!
//! Cluster calls are sequential and never retried.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use playgrid_cluster::{ClusterClient, ClusterError, ObjectKind};
use playgrid_core::identity::{Credentials, IdentityGenerator, RandomIdentityGenerator};
use playgrid_core::manifest::{self, ObjectName, WorkloadTemplate};
use playgrid_core::tier::{self, ResourceProfile};
use playgrid_state::CredentialStore;

use crate::error::{ProvisionError, ProvisionResult};
use crate::saga::{Compensator, CreatedObject, NoCompensation, PhaseTracker, ProvisionPhase};

/// A session whose objects were all accepted by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedSession {
    pub session_id: String,
    pub profile: ResourceProfile,
    pub credentials: Credentials,
}

pub struct Provisioner {
    cluster: Arc<dyn ClusterClient>,
    store: CredentialStore,
    identities: Arc<dyn IdentityGenerator>,
    compensator: Arc<dyn Compensator>,
    namespace: String,
    template: WorkloadTemplate,
}

impl Provisioner {
    /// Create a provisioner with random identities and no compensation.
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        store: CredentialStore,
        namespace: impl Into<String>,
        template: WorkloadTemplate,
    ) -> Self {
        Self {
            cluster,
            store,
            identities: Arc::new(RandomIdentityGenerator),
            compensator: Arc::new(NoCompensation),
            namespace: namespace.into(),
            template,
        }
    }

    pub fn with_identity_generator(mut self, identities: Arc<dyn IdentityGenerator>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_compensator(mut self, compensator: Arc<dyn Compensator>) -> Self {
        self.compensator = compensator;
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Provision a new session for `tier_name`.
    pub async fn provision(&self, tier_name: &str) -> ProvisionResult<ProvisionedSession> {
        let mut tracker = PhaseTracker::new();

        let profile = match tier::lookup(tier_name) {
            Ok(profile) => profile,
            Err(e) => {
                tracker.advance(ProvisionPhase::Rejected);
                info!(tier = %tier_name, "provision rejected: unknown package");
                return Err(e.into());
            }
        };

        tracker.advance(ProvisionPhase::Generating);
        let identity = self.identities.generate();
        let session_id = identity.session_id.clone();
        let objects = match manifest::build_object_set(&identity, &profile, &self.template) {
            Ok(objects) => objects,
            Err(e) => {
                tracker.advance(ProvisionPhase::Failed);
                warn!(%session_id, error = %e, "manifest build failed");
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .store
            .put(&session_id, identity.credentials.clone())
            .await
        {
            tracker.advance(ProvisionPhase::Failed);
            warn!(%session_id, error = %e, "credentials not recorded");
            return Err(e.into());
        }

        let mut created = Vec::with_capacity(3);

        tracker.advance(ProvisionPhase::ClaimsCreating);
        for claim in [&objects.home_claim, &objects.games_claim] {
            if let Err(e) = self.cluster.create_storage_claim(&self.namespace, claim).await {
                return Err(self.fail(&mut tracker, &session_id, created, e).await);
            }
            created.push(self.created(ObjectKind::PersistentVolumeClaim, claim.object_name()));
        }

        tracker.advance(ProvisionPhase::WorkloadCreating);
        if let Err(e) = self
            .cluster
            .create_stateful_workload(&self.namespace, &objects.workload)
            .await
        {
            return Err(self.fail(&mut tracker, &session_id, created, e).await);
        }

        tracker.advance(ProvisionPhase::Succeeded);
        info!(
            %session_id,
            tier = %tier_name,
            namespace = %self.namespace,
            "session provisioned"
        );

        Ok(ProvisionedSession {
            session_id,
            profile,
            credentials: identity.credentials,
        })
    }

    /// Credentials recorded for a session.
    pub async fn credentials(&self, session_id: &str) -> Option<Credentials> {
        self.store.get(session_id).await
    }

    /// Check a login pair against a session's recorded credentials.
    pub async fn verify(&self, session_id: &str, username: &str, password: &str) -> bool {
        self.store.verify(session_id, username, password).await
    }

    fn created(&self, kind: ObjectKind, name: &str) -> CreatedObject {
        CreatedObject {
            kind,
            namespace: self.namespace.clone(),
            name: name.to_string(),
        }
    }

    async fn fail(
        &self,
        tracker: &mut PhaseTracker,
        session_id: &str,
        created: Vec<CreatedObject>,
        source: ClusterError,
    ) -> ProvisionError {
        let phase = tracker.phase();
        tracker.advance(ProvisionPhase::Failed);
        warn!(
            %session_id,
            %phase,
            created = created.len(),
            error = %source,
            "cluster call failed"
        );
        self.compensator.compensate(session_id, &created).await;
        ProvisionError::Cluster {
            session_id: session_id.to_string(),
            phase,
            created,
            source,
        }
    }
}

//! Provisioning error types.

use thiserror::Error;

use playgrid_cluster::ClusterError;
use playgrid_core::{ManifestError, TierError};
use playgrid_state::StateError;

use crate::saga::{CreatedObject, ProvisionPhase};

/// Errors that can end a provisioning request.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The requested package is not in the catalog. Nothing was created.
    #[error(transparent)]
    UnknownTier(#[from] TierError),

    /// The manifests for the session could not be built. Nothing was created.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("credential store error: {0}")]
    State(#[from] StateError),

    /// A cluster call failed. `created` lists what earlier calls in the same
    /// request left behind.
    #[error("{phase} failed for session {session_id}: {source}")]
    Cluster {
        session_id: String,
        phase: ProvisionPhase,
        created: Vec<CreatedObject>,
        #[source]
        source: ClusterError,
    },
}

impl ProvisionError {
    /// Caller input was invalid; no side effect happened.
    pub fn is_validation(&self) -> bool {
        matches!(self, ProvisionError::UnknownTier(_))
    }

    /// The platform refused an object. Transport and encoding failures do
    /// not count.
    pub fn platform_reason(&self) -> Option<&str> {
        match self {
            ProvisionError::Cluster { source, .. } if source.is_rejection() => {
                Some(source.reason())
            }
            _ => None,
        }
    }
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

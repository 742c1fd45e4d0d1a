//! Request-scoped provisioning phases and the compensation hook.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use playgrid_cluster::ObjectKind;

/// Phase of a single provisioning request. Nothing outlives the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisionPhase {
    Validating,
    Generating,
    ClaimsCreating,
    WorkloadCreating,
    Succeeded,
    /// Invalid input, before any side effect.
    Rejected,
    /// Manifest building, the credential write, or a cluster call failed.
    Failed,
}

impl ProvisionPhase {
    /// Whether `self -> next` is a legal step.
    pub fn can_advance_to(self, next: ProvisionPhase) -> bool {
        use ProvisionPhase::*;
        matches!(
            (self, next),
            (Validating, Generating)
                | (Validating, Rejected)
                | (Generating, ClaimsCreating)
                | (Generating, Failed)
                | (ClaimsCreating, WorkloadCreating)
                | (ClaimsCreating, Failed)
                | (WorkloadCreating, Succeeded)
                | (WorkloadCreating, Failed)
        )
    }
}

impl fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvisionPhase::Validating => "validating",
            ProvisionPhase::Generating => "generating",
            ProvisionPhase::ClaimsCreating => "claims-creating",
            ProvisionPhase::WorkloadCreating => "workload-creating",
            ProvisionPhase::Succeeded => "succeeded",
            ProvisionPhase::Rejected => "rejected",
            ProvisionPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Tracks the phase of one request and logs each transition.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    phase: ProvisionPhase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            phase: ProvisionPhase::Validating,
        }
    }

    pub(crate) fn phase(&self) -> ProvisionPhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: ProvisionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, "provision phase");
        self.phase = next;
    }
}

/// An object a request managed to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for CreatedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Called once when a request fails after creating objects.
///
/// Implementations may delete what was created. The request's error is
/// returned to the caller regardless of what the compensator does.
#[async_trait]
pub trait Compensator: Send + Sync {
    async fn compensate(&self, session_id: &str, created: &[CreatedObject]);
}

/// Leaves everything in place and logs what was orphaned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompensation;

#[async_trait]
impl Compensator for NoCompensation {
    async fn compensate(&self, session_id: &str, created: &[CreatedObject]) {
        if created.is_empty() {
            return;
        }
        let orphaned: Vec<String> = created.iter().map(ToString::to_string).collect();
        warn!(
            %session_id,
            orphaned = ?orphaned,
            "provisioning failed part way; created objects left in place"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        use ProvisionPhase::*;
        let path = [Validating, Generating, ClaimsCreating, WorkloadCreating, Succeeded];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn failure_only_after_validation() {
        use ProvisionPhase::*;
        assert!(Generating.can_advance_to(Failed));
        assert!(ClaimsCreating.can_advance_to(Failed));
        assert!(WorkloadCreating.can_advance_to(Failed));
        assert!(!Validating.can_advance_to(Failed));
        assert!(Validating.can_advance_to(Rejected));
        assert!(!ClaimsCreating.can_advance_to(Rejected));
    }

    #[test]
    fn terminal_phases_go_nowhere() {
        use ProvisionPhase::*;
        let all = [
            Validating,
            Generating,
            ClaimsCreating,
            WorkloadCreating,
            Succeeded,
            Rejected,
            Failed,
        ];
        for from in [Succeeded, Rejected, Failed] {
            for to in all {
                assert!(!from.can_advance_to(to));
            }
        }
    }

    #[test]
    fn tracker_follows_transitions() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(tracker.phase(), ProvisionPhase::Validating);
        tracker.advance(ProvisionPhase::Generating);
        tracker.advance(ProvisionPhase::ClaimsCreating);
        assert_eq!(tracker.phase(), ProvisionPhase::ClaimsCreating);
    }

    #[test]
    fn created_object_display() {
        let obj = CreatedObject {
            kind: ObjectKind::PersistentVolumeClaim,
            namespace: "default".into(),
            name: "steam-ab12-home".into(),
        };
        assert_eq!(obj.to_string(), "PersistentVolumeClaim/default/steam-ab12-home");
    }
}

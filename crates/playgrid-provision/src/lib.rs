//! playgrid-provision — turns a package request into a running session.
//!
//! The `Provisioner` runs one request as a linear sequence against the
//! cluster:
//!
//! ```text
//! Validating ─► Generating ─► ClaimsCreating ─► WorkloadCreating ─► Succeeded
//!     │                             │                  │
//!     ▼                             └──────┬───────────┘
//!  Rejected                                ▼
//!                                        Failed ─► Compensator
//! ```
//!
//! Credentials are recorded before the first cluster call. A failure part
//! way through leaves the objects created so far, and the credential
//! entry, in place. The installed [`Compensator`] is told what was created;
//! the default one only logs it.

pub mod error;
pub mod provisioner;
pub mod saga;

pub use error::{ProvisionError, ProvisionResult};
pub use provisioner::{ProvisionedSession, Provisioner};
pub use saga::{Compensator, CreatedObject, NoCompensation, ProvisionPhase};

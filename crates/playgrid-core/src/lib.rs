//! playgrid-core — the pure half of session provisioning.
//!
//! Nothing in this crate performs I/O. It maps a tier name to a resource
//! profile, generates session identities, and turns both into the
//! declarative cluster objects that back a gaming session.

pub mod config;
pub mod identity;
pub mod manifest;
pub mod tier;

pub use config::{ConfigError, ServiceConfig};
pub use identity::{Credentials, IdentityGenerator, RandomIdentityGenerator, SessionIdentity};
pub use manifest::{ManifestError, ObjectName, ObjectSet, WorkloadTemplate};
pub use tier::{ResourceProfile, TierError};

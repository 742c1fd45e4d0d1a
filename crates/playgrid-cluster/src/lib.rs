//! playgrid-cluster — the cluster object API used by provisioning.
//!
//! Provisioning only needs two calls: create a storage claim and create a
//! stateful workload. [`ClusterClient`] captures exactly that, each call
//! either succeeding or failing with a [`ClusterError`] that carries the
//! platform's reason.
//!
//! Two implementations ship:
//!
//! - [`KubeClusterClient`] talks to a real API server through `kube`.
//! - [`InMemoryCluster`] records submissions, rejects duplicate names like
//!   a real API server would, and can be told to fail a given call. Used by
//!   tests and by the daemon's dry-run mode.

pub mod client;
pub mod error;
pub mod kubernetes;
pub mod memory;

pub use client::{ClusterClient, ObjectKind};
pub use error::{ClusterError, ClusterResult};
pub use kubernetes::KubeClusterClient;
pub use memory::{InMemoryCluster, Submission};

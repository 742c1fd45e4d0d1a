//! Stored record types.

use serde::{Deserialize, Serialize};

pub use playgrid_core::Credentials;

/// Session identifier, e.g. `steam-ab12`.
pub type SessionId = String;

/// One credential entry plus the bookkeeping retention policies need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub session_id: SessionId,
    pub credentials: Credentials,
    /// Unix timestamp (seconds) when the entry was written.
    pub created_at: u64,
}

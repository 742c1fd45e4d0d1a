//! Tier catalog: the fixed set of packages a caller can request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resources granted to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// CPU in millicores (requests == limits).
    pub cpu_millis: u32,
    /// Memory in MiB (requests == limits).
    pub memory_mib: u32,
    /// Capacity of the user-home claim in GiB.
    pub home_storage_gib: u32,
    /// Capacity of the game-library claim in GiB.
    pub games_storage_gib: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierError {
    #[error("unknown package '{name}', expected one of: {}", TIER_NAMES.join(", "))]
    Unknown { name: String },
}

const TIER_NAMES: [&str; 3] = ["small", "medium", "large"];

const SMALL: ResourceProfile = ResourceProfile {
    cpu_millis: 6000,
    memory_mib: 24576,
    home_storage_gib: 50,
    games_storage_gib: 400,
};

const MEDIUM: ResourceProfile = ResourceProfile {
    cpu_millis: 8000,
    memory_mib: 32768,
    home_storage_gib: 100,
    games_storage_gib: 800,
};

const LARGE: ResourceProfile = ResourceProfile {
    cpu_millis: 12000,
    memory_mib: 49152,
    home_storage_gib: 200,
    games_storage_gib: 1600,
};

/// Look up the profile for a tier name. Names are case-sensitive.
pub fn lookup(name: &str) -> Result<ResourceProfile, TierError> {
    match name {
        "small" => Ok(SMALL),
        "medium" => Ok(MEDIUM),
        "large" => Ok(LARGE),
        _ => Err(TierError::Unknown {
            name: name.to_string(),
        }),
    }
}

/// Every catalog entry, in ascending size.
pub fn all() -> [(&'static str, ResourceProfile); 3] {
    [("small", SMALL), ("medium", MEDIUM), ("large", LARGE)]
}

/// Catalog keys.
pub fn names() -> &'static [&'static str] {
    &TIER_NAMES
}

//! playgrid-state — process-lifetime credential store.
//!
//! Maps a session id to the credentials generated for it. Entries are
//! written once at provisioning time and read by the lookup endpoints.
//! Nothing is persisted; a restart forgets every session's credentials.
//!
//! The `CredentialStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<RwLock<..>>`) and can be shared across request tasks. Growth is
//! unbounded unless a [`RetentionPolicy`] is installed and
//! [`CredentialStore::prune`] is called.

pub mod error;
pub mod retention;
pub mod store;
pub mod types;

pub use error::{StateError, StateResult};
pub use retention::{MaxAge, RetainForever, RetentionPolicy};
pub use store::CredentialStore;
pub use types::*;

//! Persistence Module
//!
//! Durable snapshots of the entry store. The engine writes one through a
//! [`Persistence`] substrate after every mutation and reads it back once at
//! startup.

mod file;
mod memory;
mod snapshot;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;
pub use snapshot::Snapshot;

use crate::error::Result;

/// Name of the single record a snapshot is stored under
pub const SNAPSHOT_KEY: &str = "api-cache";

// == Persistence Trait ==
/// A durable substrate for cache snapshots.
///
/// Calls are synchronous and made while the store lock is held, so
/// implementations should be quick.
pub trait Persistence: Send + Sync {
    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Reads the stored snapshot. `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>>;
}

//! In-memory substrate of named text records.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{Persistence, Snapshot, SNAPSHOT_KEY};
use crate::error::Result;

/// Keeps the encoded snapshot as a string record, the way a browser-style
/// key-value storage would.
///
/// Survives as long as the value does; share it through an `Arc` to simulate
/// a restart against the same storage.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text stored under `name`.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Overwrites the record under `name` with arbitrary text.
    pub fn put_raw(&self, name: impl Into<String>, raw: impl Into<String>) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), raw.into());
    }
}

impl Persistence for MemoryPersistence {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let encoded = serde_json::to_string(snapshot)?;
        self.put_raw(SNAPSHOT_KEY, encoded);
        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        match self.raw(SNAPSHOT_KEY) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

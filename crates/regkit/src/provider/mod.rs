//! Provider abstraction for the live registry.
//!
//! The [`Provider`] trait is the boundary to whatever actually reads and
//! writes registry data, allowing for different implementations (the native
//! registry API, an in-memory store for tests and dry runs).
//!
//! Provider failures are reported as [`anyhow::Error`]; they are apply-time
//! failures of a single resource, not validation errors.

pub mod memory;

pub use memory::{MemoryProvider, Snapshot, SnapshotKey, SnapshotValue};

use crate::converge::{Action, Observed};
use crate::path::{KeyPath, RegistryPath, ValuePath};
use crate::resource::Resource;
use crate::value::ValueData;
use anyhow::{Result, bail};

/// Backend trait for registry reads and writes.
pub trait Provider: Send + Sync {
    /// Observe a key or a value.
    fn read(&self, path: &RegistryPath) -> Result<Observed>;

    /// Create a key, including any missing ancestors.
    fn create_key(&self, path: &KeyPath) -> Result<()>;

    /// Create or replace a value. The containing key must exist.
    fn write_value(&self, path: &ValuePath, data: &ValueData) -> Result<()>;

    /// Delete a key (with its subtree) or a value.
    fn delete(&self, path: &RegistryPath) -> Result<()>;

    /// Immediate subkeys of a key.
    fn list_child_keys(&self, path: &KeyPath) -> Result<Vec<KeyPath>>;

    /// Perform `action` for `resource`.
    fn apply(&self, resource: &Resource, action: Action) -> Result<()> {
        match (action, resource.path()) {
            (Action::Noop, _) => Ok(()),
            (Action::Delete, path) => self.delete(path),
            (Action::Create | Action::Update, RegistryPath::Key(key)) => self.create_key(key),
            (Action::Create | Action::Update, RegistryPath::Value(value)) => {
                match resource.desired() {
                    Some(data) => self.write_value(value, data),
                    None => bail!("{} has no data to write", resource.id()),
                }
            }
        }
    }
}

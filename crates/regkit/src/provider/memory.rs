//! In-memory registry provider backed by a JSON snapshot.
//!
//! Keys and value names are matched case-insensitively and keep the case they
//! were first created with. Hive roots always exist. The 32-bit view is a
//! separate namespace.

use super::Provider;
use crate::converge::Observed;
use crate::error::{Error, Result as RegResult};
use crate::path::{KeyPath, RegistryPath, ValuePath, names_match};
use crate::value::{self, RawData, ValueData, ValueType};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Serialized form of a [`MemoryProvider`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub keys: Vec<SnapshotKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub path: KeyPath,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<SnapshotValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotValue {
    /// Empty for the default value
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub data: RawData,
}

#[derive(Debug, Clone)]
struct Node {
    path: KeyPath,
    values: Vec<(String, ValueData)>,
}

impl Node {
    fn new(path: KeyPath) -> Self {
        Self {
            path,
            values: Vec::new(),
        }
    }

    fn value(&self, name: &str) -> Option<&ValueData> {
        self.values
            .iter()
            .find(|(existing, _)| names_match(existing, name))
            .map(|(_, data)| data)
    }
}

/// Registry provider that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    keys: RwLock<HashMap<KeyPath, Node>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a provider from a snapshot, validating every value.
    pub fn from_snapshot(snapshot: &Snapshot) -> RegResult<Self> {
        let provider = Self::new();
        {
            let mut keys = provider.write_keys();
            for entry in &snapshot.keys {
                insert_key(&mut keys, &entry.path);
                let node = keys
                    .entry(entry.path.clone())
                    .or_insert_with(|| Node::new(entry.path.clone()));
                for value in &entry.values {
                    if node.value(&value.name).is_some() {
                        return Err(Error::Snapshot {
                            message: format!(
                                "value '{}' appears twice under {}",
                                value.name, entry.path
                            ),
                        });
                    }
                    let data = value::encode(value.value_type, &value.data)?;
                    node.values.push((value.name.clone(), data));
                }
            }
        }
        Ok(provider)
    }

    /// Current contents, ordered by path.
    pub fn to_snapshot(&self) -> Snapshot {
        let keys = self.read_keys();
        let mut nodes: Vec<&Node> = keys.values().collect();
        nodes.sort_by_key(|node| node.path.to_string());
        Snapshot {
            keys: nodes
                .into_iter()
                .map(|node| SnapshotKey {
                    path: node.path.clone(),
                    values: node
                        .values
                        .iter()
                        .map(|(name, data)| SnapshotValue {
                            name: name.clone(),
                            value_type: data.value_type(),
                            data: data.to_raw(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Load a snapshot file; a missing file is an empty registry.
    pub fn load(path: &Path) -> RegResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        Self::from_snapshot(&snapshot)
    }

    /// Write the current contents as a snapshot file.
    pub fn save(&self, path: &Path) -> RegResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(&self.to_snapshot())?;
        fs::write(path, content)?;
        Ok(())
    }

    fn read_keys(&self) -> RwLockReadGuard<'_, HashMap<KeyPath, Node>> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_keys(&self) -> RwLockWriteGuard<'_, HashMap<KeyPath, Node>> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Insert a key and its missing ancestors; hive roots are implicit.
fn insert_key(keys: &mut HashMap<KeyPath, Node>, path: &KeyPath) {
    let mut chain: Vec<KeyPath> = path.ascend().filter(|p| !p.is_root()).collect();
    chain.reverse();
    if !path.is_root() {
        chain.push(path.clone());
    }
    for key in chain {
        keys.entry(key.clone()).or_insert_with(|| Node::new(key));
    }
}

fn key_exists(keys: &HashMap<KeyPath, Node>, path: &KeyPath) -> bool {
    path.is_root() || keys.contains_key(path)
}

impl Provider for MemoryProvider {
    fn read(&self, path: &RegistryPath) -> Result<Observed> {
        let keys = self.read_keys();
        let observed = match path {
            RegistryPath::Key(key) if key_exists(&keys, key) => Observed::key(),
            RegistryPath::Key(_) => Observed::NotFound,
            RegistryPath::Value(value) => keys
                .get(value.key())
                .and_then(|node| node.value(value.name()))
                .map_or(Observed::NotFound, |data| Observed::value(data.clone())),
        };
        Ok(observed)
    }

    fn create_key(&self, path: &KeyPath) -> Result<()> {
        insert_key(&mut self.write_keys(), path);
        Ok(())
    }

    fn write_value(&self, path: &ValuePath, data: &ValueData) -> Result<()> {
        let mut keys = self.write_keys();
        let key = path.key();
        if !key_exists(&keys, key) {
            bail!("cannot write {path}: key {key} does not exist");
        }
        let node = keys
            .entry(key.clone())
            .or_insert_with(|| Node::new(key.clone()));
        match node
            .values
            .iter_mut()
            .find(|(existing, _)| names_match(existing, path.name()))
        {
            Some((_, current)) => *current = data.clone(),
            None => node.values.push((path.name().to_string(), data.clone())),
        }
        Ok(())
    }

    fn delete(&self, path: &RegistryPath) -> Result<()> {
        let mut keys = self.write_keys();
        match path {
            RegistryPath::Key(key) if key.is_root() => {
                bail!("cannot delete hive root {key}")
            }
            RegistryPath::Key(key) => {
                keys.retain(|existing, _| existing != key && !key.is_ancestor_of(existing));
            }
            RegistryPath::Value(value) => {
                if let Some(node) = keys.get_mut(value.key()) {
                    node.values
                        .retain(|(existing, _)| !names_match(existing, value.name()));
                }
            }
        }
        Ok(())
    }

    fn list_child_keys(&self, path: &KeyPath) -> Result<Vec<KeyPath>> {
        let keys = self.read_keys();
        if !key_exists(&keys, path) {
            bail!("key {path} does not exist");
        }
        let mut children: Vec<KeyPath> = keys
            .values()
            .filter(|node| node.path.parent().as_ref() == Some(path))
            .map(|node| node.path.clone())
            .collect();
        children.sort_by_key(ToString::to_string);
        Ok(children)
    }
}

//! Registry resources: validated declarations of desired state.
//!
//! A [`Declaration`] is what a user wrote. [`Resource::from_declaration`]
//! parses its path and encodes its data once; the resulting [`Resource`] is
//! immutable and only ever holds canonical forms.

use crate::error::{Error, Result};
use crate::path::{KeyPath, RegistryPath, ValuePath};
use crate::value::{self, RawData, ValueData, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Desired lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => f.write_str("present"),
            Ensure::Absent => f.write_str("absent"),
        }
    }
}

/// Whether a resource manages a key or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Key,
    Value,
}

impl ResourceKind {
    /// Type name used in resource references, e.g. `registry_key[...]`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Key => "registry_key",
            ResourceKind::Value => "registry_value",
        }
    }
}

/// Stable reference to a declared resource: its kind and declared title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub title: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.type_name(), self.title)
    }
}

/// A resource as declared, before validation.
///
/// `value_type` and `data` are only read for value declarations. A missing
/// type means `string`; missing data means the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: ResourceKind,
    /// Title; defaults to the raw path
    pub title: Option<String>,
    pub path: String,
    pub ensure: Ensure,
    pub value_type: Option<String>,
    pub data: Option<RawData>,
}

impl Declaration {
    /// A key declaration with `ensure => present`.
    pub fn key(path: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Key,
            title: None,
            path: path.into(),
            ensure: Ensure::Present,
            value_type: None,
            data: None,
        }
    }

    /// A value declaration with `ensure => present`.
    pub fn value(path: impl Into<String>, value_type: ValueType, data: impl Into<RawData>) -> Self {
        Self {
            kind: ResourceKind::Value,
            title: None,
            path: path.into(),
            ensure: Ensure::Present,
            value_type: Some(value_type.name().to_string()),
            data: Some(data.into()),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// The title this declaration will be known by.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.path)
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.kind, self.title())
    }
}

/// A validated resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    path: RegistryPath,
    ensure: Ensure,
    desired: Option<ValueData>,
}

impl Resource {
    /// Validate a declaration.
    pub fn from_declaration(declaration: &Declaration) -> Result<Self> {
        let id = declaration.id();
        match declaration.kind {
            ResourceKind::Key => Ok(Self {
                id,
                path: RegistryPath::Key(KeyPath::parse(&declaration.path)?),
                ensure: declaration.ensure,
                desired: None,
            }),
            ResourceKind::Value => {
                let path = ValuePath::parse(&declaration.path)?;
                let value_type = match &declaration.value_type {
                    Some(name) => name.parse()?,
                    None => ValueType::default(),
                };
                let raw = declaration.data.clone().unwrap_or_default();
                let data = value::encode(value_type, &raw)?;
                Ok(Self {
                    id,
                    path: RegistryPath::Value(path),
                    ensure: declaration.ensure,
                    desired: Some(data),
                })
            }
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.id.kind
    }

    pub fn title(&self) -> &str {
        &self.id.title
    }

    pub fn path(&self) -> &RegistryPath {
        &self.path
    }

    /// The key itself, or the key containing the value.
    pub fn key_path(&self) -> &KeyPath {
        self.path.key()
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Desired data; `None` for keys.
    pub fn desired(&self) -> Option<&ValueData> {
        self.desired.as_ref()
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.desired.as_ref().map(ValueData::value_type)
    }
}

/// A declaration that failed validation.
#[derive(Debug)]
pub struct Failure {
    pub id: ResourceId,
    pub error: Error,
}

/// Outcome of validating a whole set of declarations.
#[derive(Debug, Default)]
pub struct Validated {
    pub resources: Vec<Resource>,
    pub failures: Vec<Failure>,
}

impl Validated {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validate every declaration independently.
///
/// A declaration that fails never prevents the others from validating. A
/// declaration reusing the kind and title of an earlier one fails; the first
/// one stays valid.
pub fn validate_all<'a>(declarations: impl IntoIterator<Item = &'a Declaration>) -> Validated {
    let mut validated = Validated::default();
    let mut titles: HashSet<ResourceId> = HashSet::new();
    for declaration in declarations {
        let id = declaration.id();
        if titles.contains(&id) {
            validated.failures.push(Failure {
                error: Error::DuplicateTitle { id: id.to_string() },
                id,
            });
            continue;
        }
        titles.insert(id);
        match Resource::from_declaration(declaration) {
            Ok(resource) => validated.resources.push(resource),
            Err(error) => validated.failures.push(Failure {
                id: declaration.id(),
                error,
            }),
        }
    }
    validated
}

/// Pairs of resources of the same kind whose canonical paths match.
///
/// Each pair is `(first declared, later duplicate)`.
pub fn find_duplicates(resources: &[Resource]) -> Vec<(ResourceId, ResourceId)> {
    let mut seen: HashMap<&RegistryPath, &ResourceId> = HashMap::new();
    let mut duplicates = Vec::new();
    for resource in resources {
        match seen.get(resource.path()) {
            Some(first) => duplicates.push(((*first).clone(), resource.id().clone())),
            None => {
                seen.insert(resource.path(), resource.id());
            }
        }
    }
    duplicates
}

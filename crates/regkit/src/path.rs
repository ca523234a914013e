//! Registry key and value paths.
//!
//! Paths are case-preserving but compared case-insensitively. The grammar is
//!
//! ```text
//! path  := ["32:"] hive ("\" segment)*
//! ```
//!
//! A value path names a value inside a key. The value name follows the last
//! separator, or everything after the first doubled separator (`\\`) when one
//! is present, which allows value names that contain a backslash. A path
//! ending in `\\` names the key's unnamed default value.
//!
//! ```
//! use regkit::path::{KeyPath, ValuePath};
//!
//! let key: KeyPath = "32:HKEY_LOCAL_MACHINE\\Software\\Vendor".parse().unwrap();
//! assert_eq!(key.to_string(), "32:HKLM\\Software\\Vendor");
//!
//! let default: ValuePath = "HKLM\\Software\\Vendor\\\\".parse().unwrap();
//! assert!(default.is_default());
//! ```

use crate::error::{Error, Result};
use crate::hive::Hive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const SEPARATOR: char = '\\';
const DEFAULT_MARKER: &str = "\\\\";
const VIEW_32_PREFIX: &str = "32";

/// Which registry view a path addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitView {
    /// The native view of the platform
    #[default]
    Default,
    /// The 32-bit view, selected with a `32:` prefix
    #[serde(rename = "32")]
    Bit32,
}

impl BitView {
    fn prefix(&self) -> &'static str {
        match self {
            BitView::Default => "",
            BitView::Bit32 => "32:",
        }
    }
}

/// Whether a raw path names a key or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Key,
    Value,
}

/// Case-insensitive name comparison used for every path segment.
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Path to a registry key.
///
/// Equality and hashing ignore the case of subkey names but never the view:
/// `HKLM\Software` and `32:HKLM\Software` are different keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath {
    view: BitView,
    hive: Hive,
    segments: Vec<String>,
}

impl KeyPath {
    /// The root key of a hive.
    pub fn root(view: BitView, hive: Hive) -> Self {
        Self {
            view,
            hive,
            segments: Vec::new(),
        }
    }

    /// Parse a raw key path.
    pub fn parse(raw: &str) -> Result<Self> {
        parse_key(raw, raw)
    }

    pub fn view(&self) -> BitView {
        self.view
    }

    pub fn hive(&self) -> Hive {
        self.hive
    }

    /// Subkey names below the hive, case preserved as written.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the root key of its hive.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the last subkey, or `None` for a hive root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Immediate parent, or `None` for a hive root.
    pub fn parent(&self) -> Option<KeyPath> {
        self.ascend().next()
    }

    /// Child key with the given name.
    pub fn join(&self, name: &str) -> Result<KeyPath> {
        if name.is_empty() || name.contains(SEPARATOR) {
            return Err(Error::invalid_path(
                &format!("{self}\\{name}"),
                "subkey names must be non-empty and cannot contain '\\'",
            ));
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self {
            view: self.view,
            hive: self.hive,
            segments,
        })
    }

    /// Enumerate ancestors from the immediate parent up to the hive root.
    ///
    /// A key with N subkey segments yields exactly N ancestors. The sequence
    /// is lazy and can be re-derived any number of times.
    pub fn ascend(&self) -> Ascend<'_> {
        Ascend {
            path: self,
            remaining: self.segments.len(),
        }
    }

    /// Whether `self` is a strict ancestor of `other` in the same view and hive.
    pub fn is_ancestor_of(&self, other: &KeyPath) -> bool {
        self.view == other.view
            && self.hive == other.hive
            && self.segments.len() < other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| names_match(a, b))
    }

    fn truncated(&self, len: usize) -> KeyPath {
        Self {
            view: self.view,
            hive: self.hive,
            segments: self.segments[..len].to_vec(),
        }
    }
}

impl PartialEq for KeyPath {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
            && self.hive == other.hive
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| names_match(a, b))
    }
}

impl Eq for KeyPath {}

impl Hash for KeyPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.view.hash(state);
        self.hive.hash(state);
        self.segments.len().hash(state);
        for segment in &self.segments {
            segment.to_lowercase().hash(state);
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.view.prefix(), self.hive)?;
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<KeyPath> for String {
    fn from(path: KeyPath) -> Self {
        path.to_string()
    }
}

/// Iterator over the ancestors of a [`KeyPath`], nearest first.
#[derive(Debug, Clone)]
pub struct Ascend<'a> {
    path: &'a KeyPath,
    remaining: usize,
}

impl Iterator for Ascend<'_> {
    type Item = KeyPath;

    fn next(&mut self) -> Option<KeyPath> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.path.truncated(self.remaining))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Ascend<'_> {}

/// Path to a value inside a key.
///
/// An empty `name` is the key's unnamed default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValuePath {
    key: KeyPath,
    name: String,
}

impl ValuePath {
    pub fn new(key: KeyPath, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
        }
    }

    /// The unnamed default value of a key.
    pub fn default_of(key: KeyPath) -> Self {
        Self::new(key, "")
    }

    /// Parse a raw value path.
    pub fn parse(raw: &str) -> Result<Self> {
        let (key_part, name) = if let Some(idx) = raw.find(DEFAULT_MARKER) {
            (&raw[..idx], &raw[idx + DEFAULT_MARKER.len()..])
        } else if let Some(idx) = raw.rfind(SEPARATOR) {
            let name = &raw[idx + 1..];
            if name.is_empty() {
                return Err(Error::invalid_path(
                    raw,
                    "trailing separator; end the path with '\\\\' to address the default value",
                ));
            }
            (&raw[..idx], name)
        } else {
            return Err(Error::invalid_path(raw, "missing value name"));
        };

        let key = parse_key(key_part, raw)?;
        Ok(Self::new(key, name))
    }

    /// Containing key.
    pub fn key(&self) -> &KeyPath {
        &self.key
    }

    /// Value name, case preserved; empty for the default value.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for ValuePath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && names_match(&self.name, &other.name)
    }
}

impl Eq for ValuePath {}

impl Hash for ValuePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.name.to_lowercase().hash(state);
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() || self.name.contains(SEPARATOR) {
            write!(f, "{}{DEFAULT_MARKER}{}", self.key, self.name)
        } else {
            write!(f, "{}{SEPARATOR}{}", self.key, self.name)
        }
    }
}

impl FromStr for ValuePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ValuePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ValuePath> for String {
    fn from(path: ValuePath) -> Self {
        path.to_string()
    }
}

/// Either kind of registry path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RegistryPath {
    Key(KeyPath),
    Value(ValuePath),
}

impl RegistryPath {
    pub fn kind(&self) -> PathKind {
        match self {
            RegistryPath::Key(_) => PathKind::Key,
            RegistryPath::Value(_) => PathKind::Value,
        }
    }

    /// The key itself, or the key containing the value.
    pub fn key(&self) -> &KeyPath {
        match self {
            RegistryPath::Key(key) => key,
            RegistryPath::Value(value) => value.key(),
        }
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryPath::Key(key) => key.fmt(f),
            RegistryPath::Value(value) => value.fmt(f),
        }
    }
}

/// Parse a raw path as the given kind.
pub fn parse(raw: &str, kind: PathKind) -> Result<RegistryPath> {
    match kind {
        PathKind::Key => KeyPath::parse(raw).map(RegistryPath::Key),
        PathKind::Value => ValuePath::parse(raw).map(RegistryPath::Value),
    }
}

/// Canonical spelling of a raw path: hive alias rewritten, everything else kept.
pub fn canonical(raw: &str, kind: PathKind) -> Result<String> {
    parse(raw, kind).map(|path| path.to_string())
}

/// Parse `raw` as a key path, reporting errors against `full`.
fn parse_key(raw: &str, full: &str) -> Result<KeyPath> {
    let (view, rest) = split_view(raw, full)?;

    let mut parts = rest.split(SEPARATOR);
    let hive_part = parts.next().unwrap_or_default();
    if hive_part.is_empty() {
        return Err(Error::invalid_path(full, "missing hive"));
    }
    let hive = Hive::from_alias(hive_part)
        .ok_or_else(|| Error::invalid_path(full, format!("unknown hive '{hive_part}'")))?;

    let mut segments = Vec::new();
    for part in parts {
        if part.is_empty() {
            return Err(Error::invalid_path(
                full,
                "empty key name (stray or doubled separator)",
            ));
        }
        segments.push(part.to_string());
    }

    Ok(KeyPath {
        view,
        hive,
        segments,
    })
}

/// Split an optional `32:` prefix off the hive component.
fn split_view<'a>(raw: &'a str, full: &str) -> Result<(BitView, &'a str)> {
    let first = raw.split(SEPARATOR).next().unwrap_or_default();
    match first.split_once(':') {
        None => Ok((BitView::Default, raw)),
        Some((VIEW_32_PREFIX, _)) => Ok((BitView::Bit32, &raw[VIEW_32_PREFIX.len() + 1..])),
        Some((prefix, _)) => Err(Error::invalid_path(
            full,
            format!("unsupported view prefix '{prefix}:' (only '32:' is recognized)"),
        )),
    }
}

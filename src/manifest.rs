//! TOML manifest of registry declarations
//!
//! ```toml
//! [[key]]
//! path = 'HKLM\Software\Vendor'
//!
//! [[value]]
//! title = "greeting"
//! path = 'HKLM\Software\Vendor\Greeting'
//! type = "string"
//! data = "hello"
//! ```

use anyhow::{Context, Result};
use regkit::{Declaration, Ensure, RawData, ResourceKind};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    key: Vec<KeyEntry>,
    #[serde(default)]
    value: Vec<ValueEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyEntry {
    title: Option<String>,
    path: String,
    #[serde(default)]
    ensure: Ensure,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValueEntry {
    title: Option<String>,
    path: String,
    #[serde(default)]
    ensure: Ensure,
    #[serde(rename = "type")]
    value_type: Option<String>,
    data: Option<RawData>,
}

impl From<KeyEntry> for Declaration {
    fn from(entry: KeyEntry) -> Self {
        Self {
            kind: ResourceKind::Key,
            title: entry.title,
            path: entry.path,
            ensure: entry.ensure,
            value_type: None,
            data: None,
        }
    }
}

impl From<ValueEntry> for Declaration {
    fn from(entry: ValueEntry) -> Self {
        Self {
            kind: ResourceKind::Value,
            title: entry.title,
            path: entry.path,
            ensure: entry.ensure,
            value_type: entry.value_type,
            data: entry.data,
        }
    }
}

/// Parse manifest text. Keys come first, then values, each in file order.
pub fn parse(content: &str) -> Result<Vec<Declaration>> {
    let manifest: Manifest = toml::from_str(content).context("Invalid manifest format")?;
    Ok(manifest
        .key
        .into_iter()
        .map(Declaration::from)
        .chain(manifest.value.into_iter().map(Declaration::from))
        .collect())
}

/// Read and parse a manifest file.
pub fn load(path: &Path) -> Result<Vec<Declaration>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read manifest: {}", path.display()))?;
    let declarations =
        parse(&content).with_context(|| format!("Failed to load {}", path.display()))?;
    log::debug!(
        "Loaded {} declarations from {}",
        declarations.len(),
        path.display()
    );
    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regkit::{ValueType, validate_all};
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[key]]
path = 'HKLM\Software\Vendor'

[[key]]
path = '32:HKLM\Software\Vendor'
ensure = "absent"

[[value]]
title = "greeting"
path = 'HKLM\Software\Vendor\Greeting'
data = "hello"

[[value]]
path = 'HKLM\Software\Vendor\Count'
type = "REG_DWORD"
data = 42

[[value]]
path = 'HKLM\Software\Vendor\List'
type = "array"
data = ["a", "b"]

[[value]]
path = 'HKLM\Software\Vendor\\'
"#;

    #[test]
    fn test_parse_sample() {
        let declarations = parse(SAMPLE).unwrap();
        assert_eq!(declarations.len(), 6);
        assert_eq!(declarations[0].kind, ResourceKind::Key);
        assert_eq!(declarations[1].ensure, Ensure::Absent);
        assert_eq!(declarations[2].title(), "greeting");
        assert_eq!(declarations[3].data, Some(RawData::Integer(42)));
        assert_eq!(
            declarations[4].data,
            Some(RawData::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(declarations[5].data, None);

        let validated = validate_all(&declarations);
        assert!(validated.is_ok());
        assert_eq!(validated.resources[3].value_type(), Some(ValueType::Dword));
        assert_eq!(validated.resources[5].path().to_string(), "HKLM\\Software\\Vendor\\\\");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse("[[key]]\npath = 'HKLM\\Software'\ndata = 1\n").unwrap_err();
        assert!(format!("{err:#}").contains("data"));
    }

    #[test]
    fn test_empty_manifest() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read manifest"));
    }

    #[test]
    fn test_load_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(load(&path).unwrap().len(), 6);
    }
}

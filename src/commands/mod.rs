//! Command implementations for the regstate CLI

pub mod apply;
pub mod check;
pub mod deps;
pub mod path;
pub mod plan;

use anyhow::{Result, bail};
use regkit::{Failure, KeyPath, Resource, ResolveObserver, ResourceId, find_duplicates, validate_all};
use std::path::Path;

use crate::manifest;
use crate::ui;

/// Resolver observer that reports each scanned ancestor level to the log.
pub struct LogObserver;

impl ResolveObserver for LogObserver {
    fn on_level(&mut self, resource: &ResourceId, ancestor: &KeyPath, matches: &[&ResourceId]) {
        if matches.is_empty() {
            log::trace!("{resource}: no declared key at {ancestor}");
        } else {
            let names: Vec<String> = matches.iter().map(ToString::to_string).collect();
            log::debug!("{resource}: requires {} at {ancestor}", names.join(", "));
        }
    }

    fn on_unresolved(&mut self, resource: &ResourceId) {
        log::debug!("{resource}: no declared ancestor");
    }
}

/// A validated manifest. Declarations that failed validation are left out.
pub struct Loaded {
    pub resources: Vec<Resource>,
    pub failures: Vec<Failure>,
}

impl Loaded {
    /// Error for the failed declarations, once the valid ones were handled.
    pub fn finish(&self) -> Result<()> {
        let Some(first) = self.failures.first() else {
            return Ok(());
        };
        bail!(
            "{} failed validation. {}",
            ui::count(self.failures.len(), "declaration"),
            first.error.category().advice()
        );
    }
}

/// Load a manifest and validate it.
///
/// Validation failures are printed and kept so the caller can finish with an
/// error; duplicates are only warned about.
pub fn load_resources(manifest_path: &Path) -> Result<Loaded> {
    let declarations = manifest::load(manifest_path)?;
    let validated = validate_all(&declarations);

    for failure in &validated.failures {
        ui::error(&format!("{}: {}", failure.id, failure.error));
    }
    if !validated.is_ok() {
        log::warn!(
            "Continuing with {} out of {}",
            ui::count(validated.resources.len(), "valid declaration"),
            declarations.len()
        );
    }

    warn_duplicates(&validated.resources);
    Ok(Loaded {
        resources: validated.resources,
        failures: validated.failures,
    })
}

/// Warn about declarations that manage the same path under different spellings.
pub fn warn_duplicates(resources: &[Resource]) -> usize {
    let duplicates = find_duplicates(resources);
    for (first, duplicate) in &duplicates {
        ui::warn(&format!(
            "{duplicate} manages the same path as {first} (paths are case-insensitive)"
        ));
    }
    duplicates.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regkit::{ErrorCategory, ResourceKind};
    use std::fs;
    use tempfile::TempDir;

    const MIXED: &str = r#"
[[key]]
path = 'HKLM\Software\Good'

[[key]]
path = 'HKXX\Software\Bad'

[[value]]
path = 'HKLM\Software\Good\Count'
type = "dword"
data = "not a number"

[[value]]
path = 'HKLM\Software\Good\Name'
data = "ok"
"#;

    #[test]
    fn test_load_keeps_valid_declarations() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        fs::write(&path, MIXED).unwrap();

        let loaded = load_resources(&path).unwrap();
        let titles: Vec<&str> = loaded.resources.iter().map(Resource::title).collect();
        assert_eq!(
            titles,
            vec!["HKLM\\Software\\Good", "HKLM\\Software\\Good\\Name"]
        );
        assert_eq!(loaded.failures.len(), 2);
        assert_eq!(loaded.failures[0].id.kind, ResourceKind::Key);
        assert_eq!(loaded.failures[1].id.kind, ResourceKind::Value);

        let err = loaded.finish().unwrap_err().to_string();
        assert!(err.starts_with("2 declarations failed validation."));
        assert!(err.contains(ErrorCategory::Path.advice()));
    }

    #[test]
    fn test_finish_without_failures() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        fs::write(&path, "[[key]]\npath = 'HKCU\\Software'\n").unwrap();

        let loaded = load_resources(&path).unwrap();
        assert_eq!(loaded.resources.len(), 1);
        assert!(loaded.finish().is_ok());
    }
}

//! `regstate check` - validate a manifest without touching any state

use anyhow::{Result, bail};
use regkit::{ResourceKind, validate_all};
use std::path::Path;

use crate::Context;
use crate::manifest;
use crate::ui;

pub fn run(ctx: &Context, manifest_path: &Path) -> Result<()> {
    let declarations = manifest::load(manifest_path)?;
    let validated = validate_all(&declarations);

    if !ctx.quiet {
        ui::header(&format!("Checking {}", manifest_path.display()));
    }

    for failure in &validated.failures {
        let category = failure.error.category();
        ui::error(&format!("{}: {}", failure.id, failure.error));
        ui::dim(&format!("{}: {}", category.description(), category.advice()));
    }

    if ctx.verbose > 0 {
        for resource in &validated.resources {
            ui::kv(&resource.id().to_string(), &resource.path().to_string());
        }
    }

    let duplicates = super::warn_duplicates(&validated.resources);

    if !validated.is_ok() {
        bail!(
            "{} of {} failed validation",
            ui::count(validated.failures.len(), "declaration"),
            declarations.len()
        );
    }

    if !ctx.quiet {
        let keys = validated
            .resources
            .iter()
            .filter(|r| r.kind() == ResourceKind::Key)
            .count();
        let values = validated.resources.len() - keys;
        let mut msg = format!(
            "{} and {} are valid",
            ui::count(keys, "key"),
            ui::count(values, "value")
        );
        if duplicates > 0 {
            msg.push_str(&format!(" ({})", ui::count(duplicates, "duplicate")));
        }
        ui::success(&msg);
    }
    Ok(())
}

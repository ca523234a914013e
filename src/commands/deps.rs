//! `regstate deps` - show the implicit dependency edges of a manifest

use anyhow::Result;
use colored::Colorize;
use regkit::resolve_with;
use std::path::Path;

use crate::Context;
use crate::ui;

use super::LogObserver;

pub fn run(ctx: &Context, manifest_path: &Path, json: bool) -> Result<()> {
    let loaded = super::load_resources(manifest_path)?;
    let resources = &loaded.resources;
    let edges = resolve_with(resources, &mut LogObserver);

    if json {
        println!("{}", serde_json::to_string_pretty(&edges)?);
        return loaded.finish();
    }

    if edges.is_empty() {
        ui::info("No dependencies between declarations");
        return loaded.finish();
    }

    if !ctx.quiet {
        ui::header("Dependencies");
    }
    for edge in &edges {
        println!("  {} {} {}", edge.dependent, "→".cyan(), edge.dependency);
    }
    if !ctx.quiet {
        println!();
        ui::dim(&format!(
            "{} across {}",
            ui::count(edges.len(), "edge"),
            ui::count(resources.len(), "resource")
        ));
    }
    loaded.finish()
}

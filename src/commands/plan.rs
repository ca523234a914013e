//! `regstate plan` - preview what apply would change

use anyhow::{Context as AnyhowContext, Result};
use regkit::{MemoryProvider, compute_plan};
use std::path::Path;

use crate::Context;
use crate::engine::differ::display_plan;

pub fn run(
    ctx: &Context,
    manifest_path: &Path,
    state: Option<&Path>,
    jobs: Option<usize>,
    json: bool,
) -> Result<()> {
    let loaded = super::load_resources(manifest_path)?;
    let state_file = ctx.config.state_file(state)?;
    log::info!("Planning against {}", state_file.display());
    let provider = MemoryProvider::load(&state_file)
        .with_context(|| format!("Could not load registry state from {}", state_file.display()))?;

    let plan = compute_plan(&loaded.resources, &provider, ctx.config.jobs(jobs))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        display_plan(&plan, ctx.verbose > 0);
    }
    loaded.finish()
}

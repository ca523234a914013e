//! `regstate apply` - converge the registry state to a manifest

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use regkit::{
    ApplyResult, ExecuteOptions, MemoryProvider, ProgressCallback, ResourceId, compute_plan,
    execute, resolve_with,
};
use std::path::Path;

use crate::Context;
use crate::engine::differ::{display_plan, print_summary};

use super::LogObserver;

/// Arguments for [`run`]
pub struct ApplyOptions<'a> {
    pub state: Option<&'a Path>,
    pub dry_run: bool,
    pub jobs: Option<usize>,
    pub yes: bool,
}

/// Progress bar over all resources, with a log line per result.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: usize, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }
}

impl ProgressCallback for BarProgress {
    fn on_level_start(&mut self, level: usize, count: usize) {
        log::debug!("Level {level}: {count} resources");
    }

    fn on_resource_complete(&mut self, id: &ResourceId, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::NoChange => "○",
            ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => "✓",
            ApplyResult::Failed { .. } => "✗",
            ApplyResult::Skipped { .. } => "⊘",
        };
        match result {
            ApplyResult::Failed { error } => {
                self.bar
                    .println(format!("  {} {id}: {error}", symbol.red()));
            }
            ApplyResult::Skipped { reason } => log::info!("{symbol} {id}: {reason}"),
            _ => log::info!("{symbol} {id}: {result:?}"),
        }
        self.bar.set_message(id.to_string());
        self.bar.inc(1);
    }
}

pub fn run(ctx: &Context, manifest_path: &Path, opts: &ApplyOptions<'_>) -> Result<()> {
    let loaded = super::load_resources(manifest_path)?;
    let resources = &loaded.resources;
    let state_file = ctx.config.state_file(opts.state)?;
    let jobs = ctx.config.jobs(opts.jobs);
    log::info!("Applying to {}", state_file.display());

    let provider = MemoryProvider::load(&state_file)
        .with_context(|| format!("Could not load registry state from {}", state_file.display()))?;

    // 1. Display what will change
    let plan = compute_plan(resources, &provider, jobs)?;
    display_plan(&plan, ctx.verbose > 0);

    if !plan.has_changes() && plan.failures().next().is_none() {
        return loaded.finish();
    }

    // 2. Confirm (unless --yes)
    if !opts.yes && !opts.dry_run && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return loaded.finish();
    }

    // 3. Converge in dependency order
    let edges = resolve_with(resources, &mut LogObserver);
    let exec_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        jobs,
    };
    let mut progress = BarProgress::new(resources.len(), ctx.quiet);
    let summary = execute(resources, &edges, &provider, &exec_opts, &mut progress)?;
    progress.bar.finish_and_clear();

    // 4. Persist
    if !opts.dry_run && summary.total_changes() > 0 {
        provider
            .save(&state_file)
            .with_context(|| format!("Could not save registry state to {}", state_file.display()))?;
        log::info!("Saved registry state to {}", state_file.display());
    }

    print_summary(&summary, opts.dry_run);

    if !summary.is_success() {
        bail!("{} resources failed to converge", summary.failed);
    }
    loaded.finish()
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

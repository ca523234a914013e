//! Plan display - what apply would change, grouped by resource kind

use colored::Colorize;
use regkit::{Action, ExecuteSummary, Plan, PlanEntry, PlanOutcome, ResourceKind};

/// One-line description of a planned entry, without the symbol.
pub fn describe(entry: &PlanEntry) -> String {
    match &entry.outcome {
        PlanOutcome::Failed { error } => format!("(cannot read state: {error})"),
        PlanOutcome::Decided(decision) => match decision.action {
            Action::Noop => "(in sync)".to_string(),
            Action::Create => "(will create)".to_string(),
            Action::Delete => "(will remove)".to_string(),
            Action::Update => decision
                .changes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        },
    }
}

fn symbol(entry: &PlanEntry) -> colored::ColoredString {
    match entry.action() {
        Some(Action::Create) => "+".green(),
        Some(Action::Delete) => "-".red(),
        Some(Action::Update) => "~".yellow(),
        Some(Action::Noop) => "○".dimmed(),
        None => "✗".red(),
    }
}

/// Display a plan in a user-friendly format
///
/// Entries that are already in sync are only listed when `show_noop` is set.
pub fn display_plan(plan: &Plan, show_noop: bool) {
    let shown: Vec<&PlanEntry> = plan
        .entries
        .iter()
        .filter(|e| show_noop || e.is_change() || e.action().is_none())
        .collect();

    if shown.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Registry Plan".bold()
    );
    println!("│");

    for (kind, heading) in [(ResourceKind::Key, "Keys"), (ResourceKind::Value, "Values")] {
        let entries: Vec<&&PlanEntry> = shown.iter().filter(|e| e.id.kind == kind).collect();
        if entries.is_empty() {
            continue;
        }
        println!("│ {}", heading.bold());
        for entry in entries {
            let title = if entry.id.title == entry.path.to_string() {
                entry.id.title.clone()
            } else {
                format!("{} ({})", entry.id.title, entry.path)
            };
            println!(
                "│   {} {:<40} {}",
                symbol(entry),
                title,
                describe(entry).dimmed()
            );
        }
        println!("│");
    }

    let changes = plan.changes().count();
    let failures = plan.failures().count();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} create, {} update, {} delete), {} unreadable",
        changes.to_string().bold(),
        plan.count(Action::Create).to_string().green(),
        plan.count(Action::Update).to_string().yellow(),
        plan.count(Action::Delete).to_string().red(),
        failures
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.is_success() {
        println!("  {} Registry state converged!", "✓".green().bold());
    } else {
        println!("  {} Registry state applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

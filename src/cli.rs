use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regstate")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative registry state - validate, plan and converge keys and values", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate every declaration in a manifest
    Check(ManifestArgs),

    /// Show the canonical form of a registry path
    Path(PathArgs),

    /// Show inferred dependencies between declarations
    Deps(DepsArgs),

    /// Show what apply would change
    Plan(PlanArgs),

    /// Converge the registry state to the manifest
    Apply(ApplyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest file (TOML)
    pub manifest: PathBuf,
}

#[derive(Args)]
pub struct PathArgs {
    /// Path as written in a declaration
    pub raw: String,

    /// Treat the path as a value path
    #[arg(long)]
    pub value: bool,
}

#[derive(Args)]
pub struct DepsArgs {
    /// Manifest file (TOML)
    pub manifest: PathBuf,

    /// Print edges as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Manifest file (TOML)
    pub manifest: PathBuf,

    /// Registry snapshot to plan against (defaults to the configured state file)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Number of parallel reads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Manifest file (TOML)
    pub manifest: PathBuf,

    /// Registry snapshot to converge (defaults to the configured state file)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel jobs per dependency level
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::parse_from([
            "regstate", "-vv", "apply", "site.toml", "--dry-run", "--jobs", "8", "--state", "s.json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.dry_run);
        assert!(!args.yes);
        assert_eq!(args.jobs, Some(8));
        assert_eq!(args.state, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn test_parse_path_value() {
        let cli = Cli::parse_from(["regstate", "path", "--value", "HKLM\\Software\\\\"]);
        let Command::Path(args) = cli.command else {
            panic!("expected path");
        };
        assert!(args.value);
        assert_eq!(args.raw, "HKLM\\Software\\\\");
    }
}

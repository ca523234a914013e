mod cli;
mod commands;
mod config;
mod engine;
mod manifest;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

use config::RegstateConfig;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: RegstateConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let config = RegstateConfig::load()?;
    if !config.color {
        colored::control::set_override(false);
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Command::Check(args) => commands::check::run(&ctx, &args.manifest),
        Command::Path(args) => commands::path::run(&ctx, &args.raw, args.value),
        Command::Deps(args) => commands::deps::run(&ctx, &args.manifest, args.json),
        Command::Plan(args) => commands::plan::run(
            &ctx,
            &args.manifest,
            args.state.as_deref(),
            args.jobs,
            args.json,
        ),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            &args.manifest,
            &commands::apply::ApplyOptions {
                state: args.state.as_deref(),
                dry_run: args.dry_run,
                jobs: args.jobs,
                yes: args.yes,
            },
        ),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "regstate", &mut io::stdout());
            Ok(())
        }
    }
}

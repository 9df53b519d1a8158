// ABOUTME: Entry point for the hookd CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hookd::config::{self, Config};
use hookd::error::Result;
use hookd::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose picks debug.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { force } => {
            let path = config::init_config(&cwd, force)?;
            println!("Created {}", path.display());
            Ok(())
        }
        Commands::Deploy {
            project,
            commit,
            target,
            output,
        } => {
            let config = Config::discover(&cwd)?;
            let output = Output::new(OutputMode::from_flags(output.json, output.quiet));
            commands::deploy(&config, &project, &commit, &target, output).await
        }
        Commands::Hook {
            event,
            payload,
            target,
            output,
        } => {
            let config = Config::discover(&cwd)?;
            let output = Output::new(OutputMode::from_flags(output.json, output.quiet));
            commands::hook(&config, &event, &payload, &target, output).await
        }
        Commands::Status { project, output } => {
            let config = Config::discover(&cwd)?;
            let output = Output::new(OutputMode::from_flags(output.json, output.quiet));
            commands::status(&config, &project, output).await
        }
    }
}

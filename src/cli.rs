// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookd")]
#[command(about = "Build and run a repository commit as a container when a push arrives")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a hookd.yml template into the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Fetch, build, and run one commit of a project
    Deploy {
        /// Project reference, e.g. github.com/owner/name
        project: String,

        /// Commit hash to deploy
        commit: String,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Handle a webhook delivery stored in a file
    Hook {
        /// Event name as sent by the source host (push, ping, ...)
        #[arg(long)]
        event: String,

        /// Path to the JSON payload, or - for stdin
        #[arg(long)]
        payload: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the containers of a project
    Status {
        /// Project reference, e.g. github.com/owner/name
        project: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// How the deployed container is published and how the source is fetched.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Port mapping hostPort:containerPort (repeatable)
    #[arg(short = 'p', long = "port", value_name = "HOST:CONTAINER")]
    pub ports: Vec<String>,

    /// URL-safe base64 of basic://user:pass or token://value
    #[arg(long)]
    pub auth: Option<String>,

    /// Return once the container has started instead of waiting for it to exit
    #[arg(long)]
    pub detach: bool,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Emit JSON lines
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,

    /// Only print the final result
    #[arg(short, long)]
    pub quiet: bool,
}

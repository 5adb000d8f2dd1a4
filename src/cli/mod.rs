//! Command-line interface.

pub mod commands;
pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use display::{output, CommandOutput};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "covloop")]
#[command(about = "Coverage-driven test generation and refinement loop", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Extra configuration file merged over .covloop/config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// covloop subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the refinement loop for one target file
    Run(commands::run::RunArgs),

    /// Run several targets from a YAML manifest concurrently
    Batch(commands::batch::BatchArgs),

    /// Show a persisted run
    Show(commands::show::ShowArgs),
}

/// Print a command error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1)
}

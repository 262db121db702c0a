//! Gantry - build, test, and deploy through provider actions
//!
//! The `gantry` command runs one command against the project's provider and
//! prints its result as JSON.
//!
//! ## Commands
//!
//! - `config get|set|delete`: provider-held configuration values
//! - `env status|prepare|cleanup`: environment lifecycle
//! - `build` / `test`: build modules and run their tests
//! - `logs` / `exec`: inspect running services
//! - `run task`: run a task
//! - `describe-type`: module type documentation
//! - `help <command>`: usage of one command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gantry_dispatch::{ProjectConfig, PROJECT_FILE};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(author = "Gantry Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, test, and deploy through provider actions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Project file
    #[arg(long, env = "GANTRY_PROJECT", default_value = PROJECT_FILE)]
    project: PathBuf,

    /// Command words followed by its arguments, e.g. `config get db.password`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gantry_core::init_tracing(cli.json, level);

    let registry = gantry_cli::commands::builtin();
    if cli.command.is_empty() {
        println!("Usage: gantry [OPTIONS] <COMMAND> [ARGS]...\n\nCommands:");
        println!("{}", registry.help_text());
        return Ok(());
    }
    if let Some(("help", words)) = cli.command.split_first().map(|(w, r)| (w.as_str(), r)) {
        println!("{}", registry.command_help(words)?);
        return Ok(());
    }

    let project = ProjectConfig::load(&cli.project)
        .with_context(|| format!("Failed to load project {}", cli.project.display()))?;
    debug!(project = %project.name, provider = %project.provider, "loaded project");
    let ctx = gantry_cli::local_context(project).context("Failed to set up provider")?;

    let result = registry
        .run(&ctx, &cli.command)
        .await
        .with_context(|| format!("gantry {} failed", cli.command.join(" ")))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

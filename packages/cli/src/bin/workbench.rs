use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;

mod cli;

use workbench_cli::{init_logging, Overrides};

#[derive(Parser)]
#[command(name = "workbench")]
#[command(about = "Workbench - run assistant actions against a sandboxed project")]
#[command(version)]
struct Cli {
    /// Host directory backing the sandbox (overrides WORKBENCH_SANDBOX_DIR)
    #[arg(long, global = true)]
    sandbox_dir: Option<PathBuf>,

    /// What to do with file targets outside the project root: relocate or reject
    #[arg(long, global = true)]
    path_policy: Option<String>,

    /// Serialize writes to the same file across artifacts
    #[arg(long, global = true)]
    serialize_writes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay parser events from a JSON Lines file
    Run {
        /// Event log, one JSON event per line
        events: PathBuf,
        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Check paths against the project root containment rules
    Validate {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Load a host directory into the sandbox as a project
    Load {
        /// Directory to read files from
        dir: PathBuf,
        #[arg(long)]
        project_id: String,
        #[arg(long)]
        project_name: Option<String>,
        /// Empty the sandbox before loading
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let overrides = Overrides {
        sandbox_dir: cli.sandbox_dir,
        path_policy: cli.path_policy,
        serialize_writes: cli.serialize_writes,
    };

    if let Err(e) = handle_command(cli.command, &overrides).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands, overrides: &Overrides) -> anyhow::Result<()> {
    let config = cli::load_config(overrides)?;
    match command {
        Commands::Run { events, table } => cli::run::run_events(&config, &events, table).await,
        Commands::Validate { paths } => {
            cli::paths::validate_paths(&config, &paths);
            Ok(())
        }
        Commands::Load {
            dir,
            project_id,
            project_name,
            reset,
        } => {
            let name = project_name.as_deref();
            cli::load::load_directory(&config, &dir, &project_id, name, reset).await
        }
    }
}

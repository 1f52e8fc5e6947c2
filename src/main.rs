use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod error;
mod infrastructure;
mod process;
mod tools;
mod ui;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            previous_sha,
            current_sha,
            repo_path,
        } => commands::build::execute(repo_path, previous_sha, current_sha).await,
        Commands::Push {
            previous_sha,
            current_sha,
            repo_path,
        } => commands::push::execute(repo_path, previous_sha, current_sha).await,
    }
}

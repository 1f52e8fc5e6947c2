//! CLI definitions for foundry
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "foundry",
    version,
    about = "Build and push container images for changed monorepo services",
    long_about = "Detects which service directories changed between two commits,\nand builds/pushes the container image declared in each directory's manifest.yml.\nRefuses to overwrite a registry tag that already exists."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build images for units changed since a commit
    Build {
        /// Commit to diff against (the last released commit)
        previous_sha: String,

        /// Commit to diff to (defaults to HEAD)
        current_sha: Option<String>,

        /// Path to the monorepo
        #[arg(long, default_value = ".")]
        repo_path: String,
    },

    /// Build and push images for units changed since a commit
    Push {
        /// Commit to diff against (the last released commit)
        previous_sha: String,

        /// Commit to diff to (defaults to HEAD)
        current_sha: Option<String>,

        /// Path to the monorepo
        #[arg(long, default_value = ".")]
        repo_path: String,
    },
}

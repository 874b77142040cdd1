//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Save command arguments.
#[derive(Debug, Args)]
pub struct SaveCommand {
    /// Note title
    #[arg(short, long)]
    pub title: String,

    /// Note content (reads stdin when neither this nor --file is given)
    #[arg(short = 'b', long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read note content from a file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Download command arguments.
#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Object name of the note (as shown by `list`)
    pub name: String,

    /// Directory to write the note into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Print the content instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Object name of the note (as shown by `list`)
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides configuration)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

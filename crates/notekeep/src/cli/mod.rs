//! Command-line interface for notekeep.
//!
//! This module provides the CLI structure for the `notekeep` binary: the
//! archive commands (`save`, `list`, `download`, `delete`), the ingest
//! server (`serve`), and configuration helpers.

mod commands;
mod output;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::archive::Confirm;

pub use commands::{
    ConfigCommand, DeleteCommand, DownloadCommand, ListCommand, SaveCommand, ServeCommand,
};
pub use output::Reporter;

/// notekeep - keep short text notes
///
/// Saves, lists, downloads and deletes notes in an object container, and
/// serves an HTTP endpoint that ingests notes into a document store.
#[derive(Debug, Parser)]
#[command(name = "notekeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress status messages and logs other than errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a new note
    Save(SaveCommand),

    /// List notes, newest first
    List(ListCommand),

    /// Download a note
    Download(DownloadCommand),

    /// Delete a note
    Delete(DeleteCommand),

    /// Run the note ingest endpoint
    Serve(ServeCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// Asks for confirmation with a y/N prompt.
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: std::cell::RefCell<R>,
    output: std::cell::RefCell<W>,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    /// Prompt on `output` and read the answer from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: std::cell::RefCell::new(input),
            output: std::cell::RefCell::new(output),
        }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&self, prompt: &str) -> bool {
        let mut output = self.output.borrow_mut();
        if write!(output, "{prompt} [y/N] ").and_then(|()| output.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        if self.input.borrow_mut().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::List(ListCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "notekeep");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_save() {
        let cli =
            Cli::try_parse_from(["notekeep", "save", "-t", "Shopping", "-b", "milk"]).unwrap();
        match cli.command {
            Command::Save(cmd) => {
                assert_eq!(cmd.title, "Shopping");
                assert_eq!(cmd.content.as_deref(), Some("milk"));
                assert!(cmd.file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_save_content_conflicts_with_file() {
        let result = Cli::try_parse_from([
            "notekeep", "save", "-t", "x", "--content", "y", "--file", "z.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_save_with_global_config() {
        let cli = Cli::try_parse_from([
            "notekeep", "save", "-c", "/tmp/notekeep.toml", "-t", "t", "--content", "c",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/notekeep.toml")));
        match cli.command {
            Command::Save(cmd) => assert_eq!(cmd.content.as_deref(), Some("c")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_download_defaults_to_cwd() {
        let cli = Cli::try_parse_from(["notekeep", "download", "a.txt"]).unwrap();
        match cli.command {
            Command::Download(cmd) => {
                assert_eq!(cmd.name, "a.txt");
                assert_eq!(cmd.output, PathBuf::from("."));
                assert!(!cmd.stdout);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_delete_yes() {
        let cli = Cli::try_parse_from(["notekeep", "delete", "a.txt", "--yes"]).unwrap();
        assert!(matches!(cli.command, Command::Delete(DeleteCommand { yes: true, .. })));
    }

    #[test]
    fn test_parse_serve_bind() {
        let cli = Cli::try_parse_from(["notekeep", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["notekeep", "-c", "/custom/config.toml", "list"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_prompt_confirm_answers() {
        for (answer, expected) in [
            ("y\n", true),
            ("YES\n", true),
            ("n\n", false),
            ("\n", false),
            ("", false),
        ] {
            let mut out = Vec::new();
            let confirmed = PromptConfirm::new(answer.as_bytes(), &mut out).confirm("Delete?");
            assert_eq!(confirmed, expected, "answer {answer:?}");
            assert_eq!(String::from_utf8(out).unwrap(), "Delete? [y/N] ");
        }
    }
}

//! Command-line interface for handsample.
//!
//! This module provides the CLI structure for the `handsample` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, RecordsCommand, ServeCommand, StatusCommand};

/// handsample - Collect handwriting samples for OCR training
///
/// Serves a short questionnaire and a photo upload form, and records each
/// contribution alongside the uploaded image.
#[derive(Debug, Parser)]
#[command(name = "handsample")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server
    Serve(ServeCommand),

    /// Show storage locations and submission totals
    Status(StatusCommand),

    /// Inspect recorded submissions
    #[command(subcommand)]
    Records(RecordsCommand),

    /// View or validate configuration
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "handsample");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(2, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["handsample", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve(ServeCommand {
                host: None,
                port: None
            })
        ));
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "handsample",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
        ])
        .unwrap();
        let Command::Serve(serve) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(serve.port, Some(8080));
    }

    #[test]
    fn test_parse_status_json() {
        let cli = Cli::try_parse_from(["handsample", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Status(StatusCommand { json: true })
        ));
    }

    #[test]
    fn test_parse_records_count() {
        let cli = Cli::try_parse_from(["handsample", "records", "count"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Records(RecordsCommand::Count)
        ));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["handsample", "config", "validate", "-f", "alt.toml"]).unwrap();
        let Command::Config(ConfigCommand::Validate { file }) = cli.command else {
            panic!("expected config validate");
        };
        assert_eq!(file, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn test_parse_with_global_flags() {
        let cli = Cli::try_parse_from(["handsample", "status", "-c", "/etc/hs.toml", "-vv"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/hs.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["handsample"]).is_err());
    }
}

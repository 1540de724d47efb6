//! Command-line interface for fleetlog.
//!
//! This module provides the CLI structure for the `fleetlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, OutputFormat, ReportCommand, ReportListCommand, StatusCommand,
    TemplateCommand, VesselCommand,
};

/// fleetlog - Vessel registry and voyage reports
///
/// Keep a company's vessels, define report templates, and fill in and submit
/// voyage reports for review.
#[derive(Debug, Parser)]
#[command(name = "fleetlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Company to act as
    #[arg(long, global = true, env = "FLEETLOG_COMPANY")]
    pub company: Option<String>,

    /// Company password
    #[arg(long, global = true, env = "FLEETLOG_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a company using --password
    Register {
        /// Company name
        name: String,
    },

    /// Check the company credentials
    Login,

    /// Manage vessels
    #[command(subcommand)]
    Vessel(VesselCommand),

    /// Manage report templates
    #[command(subcommand)]
    Template(TemplateCommand),

    /// Fill in, submit and browse reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Show database status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Company name and password, if both were given.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.company.as_deref()?, self.password.as_deref()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "fleetlog");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(
            parse(&["fleetlog", "-q", "status"]).verbosity(),
            crate::logging::Verbosity::Quiet
        );
        assert_eq!(
            parse(&["fleetlog", "status"]).verbosity(),
            crate::logging::Verbosity::Normal
        );
        assert_eq!(
            parse(&["fleetlog", "-v", "status"]).verbosity(),
            crate::logging::Verbosity::Verbose
        );
        assert_eq!(
            parse(&["fleetlog", "-vv", "status"]).verbosity(),
            crate::logging::Verbosity::Trace
        );
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["fleetlog", "-c", "/custom/config.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_credentials() {
        let cli = parse(&[
            "fleetlog",
            "vessel",
            "list",
            "--company",
            "Acme",
            "--password",
            "abc123!",
        ]);
        assert_eq!(cli.credentials(), Some(("Acme", "abc123!")));
    }

    #[test]
    fn test_parse_vessel_add() {
        let cli = parse(&[
            "fleetlog", "vessel", "add", "V1", "--imo", "9321483", "--mmsi", "477995900",
        ]);
        assert!(matches!(
            cli.command,
            Command::Vessel(VesselCommand::Add { ref name, .. }) if name == "V1"
        ));
    }

    #[test]
    fn test_parse_vessel_delete_with_token() {
        let cli = parse(&["fleetlog", "vessel", "delete", "3", "--confirm", "ABCD"]);
        let Command::Vessel(VesselCommand::Delete { id, confirm }) = cli.command else {
            panic!("expected vessel delete");
        };
        assert_eq!(id, 3);
        assert_eq!(confirm.unwrap().as_str(), "abcd");
    }

    #[test]
    fn test_parse_report_save_values() {
        let cli = parse(&[
            "fleetlog",
            "report",
            "save",
            "7",
            "--set",
            "A=x",
            "-s",
            "average speed=12",
        ]);
        let Command::Report(ReportCommand::Save { id, values }) = cli.command else {
            panic!("expected report save");
        };
        assert_eq!(id, 7);
        assert_eq!(
            values,
            vec![
                ("A".to_string(), "x".to_string()),
                ("average speed".to_string(), "12".to_string())
            ]
        );
    }

    #[test]
    fn test_report_save_requires_values() {
        assert!(Cli::try_parse_from(["fleetlog", "report", "save", "7"]).is_err());
    }

    #[test]
    fn test_parse_report_list_filters() {
        let cli = parse(&[
            "fleetlog",
            "report",
            "list",
            "--vessel",
            "2",
            "-t",
            "noon report",
            "--format",
            "json",
        ]);
        let Command::Report(ReportCommand::List(list)) = cli.command else {
            panic!("expected report list");
        };
        assert_eq!(list.vessel, Some(2));
        assert_eq!(list.report_type.as_deref(), Some("noon report"));
        assert_eq!(list.limit, 20);
        assert_eq!(list.format, OutputFormat::Json);
    }
}

//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::confirm::ConfirmationToken;

/// Vessel registry commands.
#[derive(Debug, Subcommand)]
pub enum VesselCommand {
    /// Register a vessel
    Add {
        /// Vessel name
        name: String,

        /// IMO number
        #[arg(long)]
        imo: String,

        /// MMSI
        #[arg(long)]
        mmsi: String,
    },

    /// List the company's vessels
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a vessel (asks for confirmation first)
    Delete {
        /// Vessel id
        id: i64,

        /// Token printed by the first attempt
        #[arg(long, value_name = "TOKEN", value_parser = parse_token)]
        confirm: Option<ConfirmationToken>,
    },
}

/// Report template commands.
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Define the fields of a report type
    Define {
        /// Report type, e.g. "noon report"
        report_type: String,

        /// Comma-separated field names (defaults to the standard voyage fields)
        #[arg(short, long)]
        fields: Option<String>,

        /// Token printed by the first attempt when replacing a template
        #[arg(long, value_name = "TOKEN", value_parser = parse_token)]
        confirm: Option<ConfirmationToken>,
    },

    /// List the company's templates
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a template (asks for confirmation first)
    Delete {
        /// Template id
        id: i64,

        /// Token printed by the first attempt
        #[arg(long, value_name = "TOKEN", value_parser = parse_token)]
        confirm: Option<ConfirmationToken>,
    },

    /// Show the fields of a report type
    Fields {
        /// Report type
        report_type: String,
    },
}

/// Report commands.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Open a new draft for a vessel
    Open {
        /// Vessel id
        vessel: i64,

        /// Report type, e.g. "morning report"
        report_type: String,

        /// Initial values
        #[arg(short = 's', long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },

    /// Save values into a draft
    Save {
        /// Report id
        id: i64,

        /// Values to store
        #[arg(
            short = 's',
            long = "set",
            value_name = "FIELD=VALUE",
            value_parser = parse_assignment,
            required = true
        )]
        values: Vec<(String, String)>,
    },

    /// Submit a draft and notify a reviewer
    Submit {
        /// Report id
        id: i64,

        /// Reviewer mail address
        #[arg(short, long)]
        to: String,
    },

    /// List submitted reports, newest first
    List(ReportListCommand),

    /// Show one report
    Show {
        /// Report id
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// List open drafts
    Drafts {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Report listing arguments.
#[derive(Debug, Args)]
pub struct ReportListCommand {
    /// Only reports about this vessel
    #[arg(long)]
    pub vessel: Option<i64>,

    /// Only reports of this type
    #[arg(short = 't', long = "type")]
    pub report_type: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

/// Parse `FIELD=VALUE`. The value may be empty or contain `=`.
fn parse_assignment(text: &str) -> Result<(String, String), String> {
    let (field, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{text}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{text}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

#[allow(clippy::unnecessary_wraps)]
fn parse_token(text: &str) -> Result<ConfirmationToken, String> {
    Ok(ConfirmationToken::from_string(text))
}

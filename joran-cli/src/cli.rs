//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Joran -- interpret log4j-style XML configuration documents.
///
/// Use `joran <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "joran", version, about, long_about = None)]
pub struct Cli {
    /// Path to the joran.toml configuration file.
    #[arg(short, long, default_value = "joran.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interpret a configuration document and report errors.
    Check(CheckArgs),

    /// Show the default rule table.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- check ----

/// Interpret a configuration document against a fresh logger repository.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration document (log4j.xml style).
    pub file: PathBuf,

    /// Extra substitution property, e.g. `-D log_dir=/tmp/logs` (repeatable).
    #[arg(short = 'D', long = "define", value_parser = parse_key_value)]
    pub defines: Vec<(String, String)>,

    /// Exit 0 even when recoverable errors were recorded.
    #[arg(long)]
    pub allow_errors: bool,
}

/// Parse a `name=value` pair.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

// ---- rules ----

/// Show the default rule table.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Also list the registered component classes.
    #[arg(long)]
    pub classes: bool,
}

// ---- config ----

/// Manage joran configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, interpreter, substitution).
        #[arg(long)]
        section: Option<String>,
    },
}

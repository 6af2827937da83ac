//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the conformance checker.
#[derive(Parser, Debug)]
#[command(
    name = "conformance",
    about = "Evaluate conformance expressions and check cluster feature compliance",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a conformance expression
    Eval(EvalOpts),
    /// Check what toggling one feature of a cluster profile requires
    Check(CheckOpts),
    /// Report compliance warnings for cluster profiles
    Scan(ScanOpts),
    /// Translate a structured conformance node (JSON) into an expression
    Translate(TranslateOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eval(_) => "eval",
            Self::Check(_) => "check",
            Self::Scan(_) => "scan",
            Self::Translate(_) => "translate",
            Self::Version => "version",
        }
    }
}

/// Options for the `eval` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct EvalOpts {
    /// Conformance expression, e.g. "LT & !DF, [OO]"
    pub expression: String,

    /// Operand state as NAME=BOOL (repeatable)
    #[arg(long = "set", value_name = "NAME=BOOL", value_parser = parse_assignment)]
    pub set: Vec<(String, bool)>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Cluster profile (TOML)
    pub profile: PathBuf,

    /// Code of the feature to toggle
    #[arg(short, long)]
    pub feature: String,

    /// Turn the feature on (default: flip its current bit)
    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    /// Turn the feature off (default: flip its current bit)
    #[arg(long)]
    pub disable: bool,

    /// Write the new featureMap and element states back to the profile
    #[arg(long)]
    pub apply: bool,

    /// Notification store to record warnings in (JSON)
    #[arg(long, value_name = "FILE")]
    pub notifications: Option<PathBuf>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckOpts {
    /// The requested bit, or `None` to flip the current one.
    #[must_use]
    pub const fn requested_bit(&self) -> Option<bool> {
        if self.enable {
            Some(true)
        } else if self.disable {
            Some(false)
        } else {
            None
        }
    }
}

/// Options for the `scan` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ScanOpts {
    /// Cluster profiles (TOML)
    #[arg(required = true)]
    pub profiles: Vec<PathBuf>,

    /// Check profiles one at a time (parallel is enabled by default)
    #[arg(long = "no-parallel", action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Options for the `translate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct TranslateOpts {
    /// JSON file holding one conformance node, or `-` for stdin
    pub node: PathBuf,
}

/// Parse a `NAME=BOOL` operand assignment.
fn parse_assignment(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing operand name in '{s}'"));
    }
    let enabled = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => true,
        "false" | "0" | "off" | "no" => false,
        other => return Err(format!("'{other}' is not a boolean")),
    };
    Ok((name.to_string(), enabled))
}

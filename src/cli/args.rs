//! Command-line argument parsing for netpilot
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::errors::{NetError, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// netpilot - describe a network change, watch it get planned, checked, and deployed
#[derive(Parser, Debug)]
#[command(name = "netpilot")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Natural-language network change orchestration", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Completion provider override (demo | ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except final result)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Simulated devices to create before the run
#[derive(ClapArgs, Debug, Clone)]
pub struct DeviceArgs {
    /// Target device as NAME=MGMT_ADDRESS (repeatable)
    #[arg(short, long = "device", value_name = "NAME=ADDR", required = true)]
    pub devices: Vec<String>,
}

impl DeviceArgs {
    /// Parsed `(name, address)` pairs
    pub fn parsed(&self) -> Result<Vec<(String, String)>> {
        self.devices.iter().map(|entry| parse_device(entry)).collect()
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan, generate, validate, and deploy a configuration change
    Deploy {
        /// What should change, in plain language
        #[arg(value_name = "INTENT")]
        intent: String,

        #[command(flatten)]
        targets: DeviceArgs,
    },

    /// Discover devices, extract configuration, and analyse it
    Retrieve {
        #[command(flatten)]
        targets: DeviceArgs,
    },

    /// Run one command or configuration on every device
    Bulk {
        #[command(flatten)]
        targets: DeviceArgs,

        /// CLI command to run
        #[arg(long, conflicts_with = "config_file", required_unless_present = "config_file")]
        command: Option<String>,

        /// File holding configuration text to apply
        #[arg(long)]
        config_file: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log filter for this verbosity; `None` defers to the configured level
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("debug"),
            Verbosity::VeryVerbose => Some("trace"),
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should print per-stage and per-device detail
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

/// `NAME=ADDR`
pub fn parse_device(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((name, addr)) if !name.trim().is_empty() && !addr.trim().is_empty() => {
            Ok((name.trim().to_string(), addr.trim().to_string()))
        }
        _ => Err(NetError::InvalidInput(format!(
            "Device must be NAME=ADDR, got '{}'",
            entry
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy() {
        let args = Args::parse_from([
            "netpilot",
            "deploy",
            "enable ssh only",
            "--device",
            "r1=10.0.0.1",
            "-d",
            "r2=10.0.0.2",
            "-v",
        ]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);
        match args.command {
            Commands::Deploy { intent, targets } => {
                assert_eq!(intent, "enable ssh only");
                assert_eq!(
                    targets.parsed().unwrap(),
                    vec![
                        ("r1".to_string(), "10.0.0.1".to_string()),
                        ("r2".to_string(), "10.0.0.2".to_string())
                    ]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bulk_requires_payload() {
        assert!(Args::try_parse_from(["netpilot", "bulk", "-d", "r1=10.0.0.1"]).is_err());
        assert!(Args::try_parse_from([
            "netpilot",
            "bulk",
            "-d",
            "r1=10.0.0.1",
            "--command",
            "show run",
            "--config-file",
            "x.cfg"
        ])
        .is_err());
        assert!(Args::try_parse_from([
            "netpilot",
            "bulk",
            "-d",
            "r1=10.0.0.1",
            "--command",
            "show version"
        ])
        .is_ok());
    }

    #[test]
    fn test_quiet_wins() {
        let args = Args::parse_from(["netpilot", "-q", "-vv", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert_eq!(args.verbosity().log_level(), Some("error"));
    }

    #[test]
    fn test_parse_device_rejects_malformed() {
        assert!(parse_device("r1").is_err());
        assert!(parse_device("=10.0.0.1").is_err());
        assert!(parse_device("r1=").is_err());
    }
}

//! CLI argument parsing for fsprobe

use crate::chaos::ChaosConfig;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// Output format for the probe report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fsprobe")]
#[command(version)]
#[command(about = "Write a payload to a file, read it back through a new handle and compare", long_about = None)]
pub struct Cli {
    /// Load settings from a TOML file (flags override it)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Probe file path (default: tmptmp)
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Payload as text (default: "This is a temporary file")
    #[arg(long = "payload", value_name = "TEXT", conflicts_with = "payload_hex")]
    pub payload: Option<String>,

    /// Payload as hex bytes
    #[arg(long = "payload-hex", value_name = "HEX")]
    pub payload_hex: Option<String>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Inject a short write: accept at most N bytes per write call
    #[arg(long = "chaos-write-limit", value_name = "N")]
    pub chaos_write_limit: Option<usize>,

    /// Inject a write error
    #[arg(long = "chaos-write-error")]
    pub chaos_write_error: bool,

    /// Inject a short read: report EOF after N bytes
    #[arg(long = "chaos-read-limit", value_name = "N")]
    pub chaos_read_limit: Option<usize>,

    /// Inject a read error
    #[arg(long = "chaos-read-error")]
    pub chaos_read_error: bool,

    /// Corrupt the byte at OFFSET between the write and read phases
    #[arg(long = "chaos-corrupt-offset", value_name = "OFFSET")]
    pub chaos_corrupt_offset: Option<u64>,
}

impl Cli {
    /// Fault injection requested on the command line
    pub fn chaos_config(&self) -> ChaosConfig {
        let mut config = ChaosConfig::new()
            .with_write_error(self.chaos_write_error)
            .with_read_error(self.chaos_read_error);
        if let Some(limit) = self.chaos_write_limit {
            config = config.with_write_limit(limit);
        }
        if let Some(limit) = self.chaos_read_limit {
            config = config.with_read_limit(limit);
        }
        if let Some(offset) = self.chaos_corrupt_offset {
            config = config.with_corruption(offset);
        }
        config.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["fsprobe"]);
        assert!(cli.config.is_none());
        assert!(cli.path.is_none());
        assert!(cli.payload.is_none());
        assert!(cli.format.is_none());
        assert!(!cli.debug);
        assert!(!cli.chaos_config().is_active());
    }

    #[test]
    fn test_cli_path_and_payload() {
        let cli = Cli::parse_from(["fsprobe", "-p", "/tmp/x", "--payload", "hello"]);
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.payload.as_deref(), Some("hello"));
    }

    #[test]
    fn test_cli_payload_conflicts_with_hex() {
        let result =
            Cli::try_parse_from(["fsprobe", "--payload", "a", "--payload-hex", "61"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_format_json() {
        let cli = Cli::parse_from(["fsprobe", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_chaos_flags() {
        let cli = Cli::parse_from([
            "fsprobe",
            "--chaos-write-limit",
            "3",
            "--chaos-read-error",
            "--chaos-corrupt-offset",
            "7",
        ]);
        let chaos = cli.chaos_config();
        assert_eq!(chaos.write_limit, Some(3));
        assert!(chaos.read_error);
        assert!(!chaos.write_error);
        assert_eq!(chaos.corrupt_offset, Some(7));
        assert!(chaos.is_active());
    }
}

//! Probe configuration
//!
//! Defaults reproduce the `open` fixture (`tmptmp`, "This is a temporary
//! file"). A TOML file can override them and CLI flags override the file:
//!
//! ```toml
//! path = "/scratch/probe.bin"
//! payload_hex = "deadbeef"
//! format = "json"
//! ```

use crate::cli::OutputFormat;
use crate::payload::{Payload, PayloadError, DEFAULT_PAYLOAD};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Probe file name used by the original fixture
pub const DEFAULT_PATH: &str = "tmptmp";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Specify either payload or payload_hex, not both")]
    ConflictingPayload,

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Where the payload bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Text(String),
    Hex(String),
}

impl PayloadSource {
    pub fn resolve(&self) -> Result<Payload, PayloadError> {
        match self {
            PayloadSource::Text(text) => Ok(Payload::from(text.as_str())),
            PayloadSource::Hex(hex) => Payload::from_hex(hex),
        }
    }
}

impl Default for PayloadSource {
    fn default() -> Self {
        PayloadSource::Text(DEFAULT_PAYLOAD.to_string())
    }
}

/// Resolved probe settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub path: PathBuf,
    pub payload: PayloadSource,
    pub format: OutputFormat,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            payload: PayloadSource::default(),
            format: OutputFormat::Text,
        }
    }
}

/// On-disk shape of the config file, every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    path: Option<PathBuf>,
    payload: Option<String>,
    payload_hex: Option<String>,
    format: Option<OutputFormat>,
}

impl ProbeConfig {
    /// Parse TOML, filling missing keys from the defaults
    ///
    /// # Example
    /// ```
    /// use fsprobe::config::{PayloadSource, ProbeConfig};
    ///
    /// let config = ProbeConfig::from_toml_str("payload = \"hi\"").unwrap();
    /// assert_eq!(config.payload, PayloadSource::Text("hi".to_string()));
    /// assert_eq!(config.path.to_str(), Some("tmptmp"));
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;
        let mut config = Self::default();

        if let Some(path) = file.path {
            config.path = path;
        }
        config.set_payload(file.payload, file.payload_hex)?;
        if let Some(format) = file.format {
            config.format = format;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(config = %path.display(), "loaded probe config");
        Self::from_toml_str(&input)
    }

    /// Replace the payload source; at most one of the two may be given
    pub fn set_payload(
        &mut self,
        text: Option<String>,
        hex: Option<String>,
    ) -> Result<(), ConfigError> {
        match (text, hex) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingPayload),
            (Some(text), None) => self.payload = PayloadSource::Text(text),
            (None, Some(hex)) => self.payload = PayloadSource::Hex(hex),
            (None, None) => {}
        }
        Ok(())
    }

    pub fn payload(&self) -> Result<Payload, ConfigError> {
        Ok(self.payload.resolve()?)
    }
}

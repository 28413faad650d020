//! Report output for a probe run
//!
//! Text output follows the lines the `open` fixture printed; JSON output is a
//! versioned document for machine parsing.

use crate::payload::Payload;
use crate::verifier::{Stage, VerificationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome section of the JSON report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JsonResult {
    Success { bytes_read: usize },
    Failure { stage: Stage, detail: String },
}

impl From<&VerificationResult> for JsonResult {
    fn from(result: &VerificationResult) -> Self {
        match result {
            VerificationResult::Success { bytes_read } => JsonResult::Success {
                bytes_read: *bytes_read,
            },
            VerificationResult::Failure { stage, detail } => JsonResult::Failure {
                stage: *stage,
                detail: detail.clone(),
            },
        }
    }
}

/// Complete JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    /// Probe file path
    pub path: String,
    /// Payload length in bytes
    pub payload_len: usize,
    /// Hex SHA-256 of the payload
    pub payload_sha256: String,
    pub result: JsonResult,
}

impl JsonReport {
    pub fn new(path: &Path, payload: &Payload, result: &VerificationResult) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "fsprobe-json-v1".to_string(),
            path: path.display().to_string(),
            payload_len: payload.len(),
            payload_sha256: payload.sha256_hex(),
            result: result.into(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Text report; `readback` is the content read from disk on success
pub fn render_text(
    path: &Path,
    payload: &Payload,
    result: &VerificationResult,
    readback: Option<&[u8]>,
) -> String {
    match result {
        VerificationResult::Success { bytes_read } => {
            let content = readback
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default();
            format!(
                "opened new file {}\nwrote {} bytes.\nFile content is {} bytes: {}\n",
                path.display(),
                payload.len(),
                bytes_read,
                content
            )
        }
        VerificationResult::Failure { stage, detail } => {
            // Progress lines for the stages that completed before the failure
            let mut text = String::new();
            if matches!(stage, Stage::Write | Stage::Read) {
                text.push_str(&format!("opened new file {}\n", path.display()));
            }
            if *stage == Stage::Read {
                text.push_str(&format!("wrote {} bytes.\n", payload.len()));
            }
            let verb = match stage {
                Stage::Create => "create",
                Stage::Write => "write to",
                Stage::Read => "read",
            };
            text.push_str(&format!("Failed to {} {}: {}\n", verb, path.display(), detail));
            text
        }
    }
}

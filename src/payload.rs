//! Probe payload: the immutable bytes written to and expected back from disk

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Content written by the original `open` fixture
pub const DEFAULT_PAYLOAD: &str = "This is a temporary file";

/// Errors produced while building a payload from user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),
}

/// Immutable byte sequence for one verification run
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Box<[u8]>,
}

impl Payload {
    /// Create a payload from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into().into_boxed_slice(),
        }
    }

    /// Parse a hex string (`"54686973"`), whitespace is ignored
    ///
    /// # Example
    /// ```
    /// use fsprobe::payload::Payload;
    /// let payload = Payload::from_hex("de ad be ef").unwrap();
    /// assert_eq!(payload.as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    /// ```
    pub fn from_hex(input: &str) -> Result<Self, PayloadError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = hex::decode(&compact).map_err(|e| PayloadError::InvalidHex(e.to_string()))?;
        Ok(Self::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the payload, used to identify it in reports
    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Payload rendered as text, invalid UTF-8 replaced
    pub fn lossy_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::from(DEFAULT_PAYLOAD)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Long payloads would flood debug logs
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("len", &self.len())
            .field("sha256", &self.sha256_hex())
            .finish()
    }
}

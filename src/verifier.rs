//! File content round-trip verification
//!
//! Writes a payload to a freshly (re)created file, closes it, reopens the path
//! through an independent handle and checks the bytes read back against the
//! payload. Every failure is reported as a [`VerificationResult`] value tagged
//! with the stage that detected it.

use crate::payload::Payload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Phase of the round trip in which a failure was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// The file could not be opened or created for writing
    Create,
    /// The write call failed or transferred fewer bytes than the payload
    Write,
    /// Reopening, reading or comparing the content failed
    Read,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Create => "create",
            Stage::Write => "write",
            Stage::Read => "read",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one verification run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Success { bytes_read: usize },
    Failure { stage: Stage, detail: String },
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success { .. })
    }

    /// Stage of the failure, `None` on success
    pub fn stage(&self) -> Option<Stage> {
        match self {
            VerificationResult::Success { .. } => None,
            VerificationResult::Failure { stage, .. } => Some(*stage),
        }
    }
}

impl From<Result<usize, ProbeError>> for VerificationResult {
    fn from(result: Result<usize, ProbeError>) -> Self {
        match result {
            Ok(bytes_read) => VerificationResult::Success { bytes_read },
            Err(err) => VerificationResult::Failure {
                stage: err.stage(),
                detail: err.to_string(),
            },
        }
    }
}

/// Every way a round trip can fail
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("could not create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("write to {} failed: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("short write: expected {expected} wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("could not open {} for reading: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("read from {} failed: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("short read: expected {expected} got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("content mismatch at offset {offset}: expected {expected:#04x} found {found:#04x}")]
    Mismatch { offset: usize, expected: u8, found: u8 },
}

impl ProbeError {
    pub fn stage(&self) -> Stage {
        match self {
            ProbeError::Create { .. } => Stage::Create,
            ProbeError::Write { .. } | ProbeError::ShortWrite { .. } => Stage::Write,
            ProbeError::Open { .. }
            | ProbeError::Read { .. }
            | ProbeError::ShortRead { .. }
            | ProbeError::Mismatch { .. } => Stage::Read,
        }
    }
}

/// The two file primitives a round trip needs
///
/// Handles are returned by value; dropping them closes the file.
pub trait ProbeFs {
    type Writer: Write;
    type Reader: Read;

    /// Open `path` for writing, creating it if absent and truncating it if present
    fn create(&self, path: &Path) -> io::Result<Self::Writer>;

    /// Open `path` read-only through a new handle
    fn open(&self, path: &Path) -> io::Result<Self::Reader>;
}

/// Host filesystem through `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl ProbeFs for HostFs {
    type Writer = File;
    type Reader = File;

    fn create(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    fn open(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }
}

/// Verifier for one probe path at a time
///
/// # Example
/// ```no_run
/// use fsprobe::payload::Payload;
/// use fsprobe::verifier::{RoundTripVerifier, VerificationResult};
///
/// let verifier = RoundTripVerifier::new();
/// let result = verifier.verify("tmptmp", &Payload::default());
/// assert_eq!(result, VerificationResult::Success { bytes_read: 24 });
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoundTripVerifier<F = HostFs> {
    fs: F,
}

impl RoundTripVerifier<HostFs> {
    pub fn new() -> Self {
        Self { fs: HostFs }
    }
}

impl<F: ProbeFs> RoundTripVerifier<F> {
    /// Verifier over a custom [`ProbeFs`] (fault injection, instrumentation)
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Run one round trip and report the outcome as a value
    pub fn verify(&self, path: impl AsRef<Path>, payload: &Payload) -> VerificationResult {
        self.round_trip(path.as_ref(), payload)
            .map(|readback| readback.len())
            .into()
    }

    /// Like [`verify`](Self::verify) but also hands back the bytes read from disk
    pub fn verify_with_readback(
        &self,
        path: impl AsRef<Path>,
        payload: &Payload,
    ) -> (VerificationResult, Option<Vec<u8>>) {
        match self.round_trip(path.as_ref(), payload) {
            Ok(readback) => (
                VerificationResult::Success {
                    bytes_read: readback.len(),
                },
                Some(readback),
            ),
            Err(err) => (VerificationResult::from(Err::<usize, _>(err)), None),
        }
    }

    fn round_trip(&self, path: &Path, payload: &Payload) -> Result<Vec<u8>, ProbeError> {
        let result = self
            .write_phase(path, payload)
            .and_then(|written| self.read_phase(path, payload, written));

        if let Err(err) = &result {
            tracing::warn!(path = %path.display(), stage = %err.stage(), "round trip failed: {}", err);
        }
        result
    }

    /// Create, write once, close. Returns the number of bytes written.
    fn write_phase(&self, path: &Path, payload: &Payload) -> Result<usize, ProbeError> {
        let mut writer = self.fs.create(path).map_err(|source| ProbeError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened probe file for writing");

        let written = writer
            .write(payload.as_bytes())
            .map_err(|source| ProbeError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        if written < payload.len() {
            return Err(ProbeError::ShortWrite {
                expected: payload.len(),
                written,
            });
        }
        if written > payload.len() {
            return Err(ProbeError::Write {
                path: path.to_path_buf(),
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "writer reported {} bytes for a {}-byte payload",
                        written,
                        payload.len()
                    ),
                ),
            });
        }

        // Buffered writers surface deferred errors here
        writer.flush().map_err(|source| ProbeError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        drop(writer);

        tracing::debug!(path = %path.display(), written, "wrote payload and closed write handle");
        Ok(written)
    }

    /// Reopen, read back `written` bytes, compare. Returns the bytes read.
    fn read_phase(
        &self,
        path: &Path,
        payload: &Payload,
        written: usize,
    ) -> Result<Vec<u8>, ProbeError> {
        let mut reader = self.fs.open(path).map_err(|source| ProbeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "reopened probe file for reading");

        // One spare zeroed byte keeps the content terminated when shown as text
        let mut buf = vec![0u8; written + 1];
        let got = read_up_to(&mut reader, &mut buf[..written]).map_err(|source| {
            ProbeError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        drop(reader);

        if got < written {
            return Err(ProbeError::ShortRead {
                expected: written,
                got,
            });
        }

        if let Some(offset) = first_mismatch(payload.as_bytes(), &buf[..got]) {
            return Err(ProbeError::Mismatch {
                offset,
                expected: payload.as_bytes()[offset],
                found: buf[offset],
            });
        }

        tracing::debug!(path = %path.display(), bytes_read = got, "content verified");
        buf.truncate(got);
        Ok(buf)
    }
}

/// Read until `buf` is full or EOF, retrying only on `Interrupted`
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn first_mismatch(expected: &[u8], actual: &[u8]) -> Option<usize> {
    expected.iter().zip(actual).position(|(a, b)| a != b)
}

/// Round trip against the host filesystem
pub fn verify(path: impl AsRef<Path>, payload: &Payload) -> VerificationResult {
    RoundTripVerifier::new().verify(path, payload)
}

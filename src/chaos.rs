// Chaos Engineering Configuration for the round-trip probe
//
// Builder pattern for fault injection. Wraps any ProbeFs and makes the
// write or read side misbehave so every failure path of the verifier can be
// driven deterministically.
//
// Faults:
// - Short write / write error on the single write call
// - Short read (early EOF) / read error
// - On-disk corruption between the write and read phases

use crate::verifier::ProbeFs;
use std::cell::Cell;
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Chaos engineering configuration with builder pattern
///
/// # Example
/// ```
/// use fsprobe::chaos::ChaosConfig;
///
/// let config = ChaosConfig::new()
///     .with_write_limit(3)     // accept at most 3 bytes per write
///     .with_corruption(0)      // flip byte 0 before reading back
///     .build();
/// assert!(config.is_active());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChaosConfig {
    /// Maximum bytes a single write call accepts (None = unlimited)
    pub write_limit: Option<usize>,

    /// Fail every write call
    pub write_error: bool,

    /// Bytes readable before the reader reports EOF (None = unlimited)
    pub read_limit: Option<usize>,

    /// Fail every read call
    pub read_error: bool,

    /// Offset of a byte to flip on disk before the read handle is opened
    pub corrupt_offset: Option<u64>,
}

impl ChaosConfig {
    /// Create a new chaos configuration with no faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the byte count a single write call reports
    ///
    /// # Example
    /// ```
    /// use fsprobe::chaos::ChaosConfig;
    /// let config = ChaosConfig::new().with_write_limit(10);
    /// assert_eq!(config.write_limit, Some(10));
    /// ```
    pub fn with_write_limit(mut self, bytes: usize) -> Self {
        self.write_limit = Some(bytes);
        self
    }

    /// Enable or disable write errors
    pub fn with_write_error(mut self, enabled: bool) -> Self {
        self.write_error = enabled;
        self
    }

    /// Truncate the readable stream after `bytes`
    pub fn with_read_limit(mut self, bytes: usize) -> Self {
        self.read_limit = Some(bytes);
        self
    }

    /// Enable or disable read errors
    pub fn with_read_error(mut self, enabled: bool) -> Self {
        self.read_error = enabled;
        self
    }

    /// Flip every bit of the byte at `offset` between the two phases
    pub fn with_corruption(mut self, offset: u64) -> Self {
        self.corrupt_offset = Some(offset);
        self
    }

    /// Build the final configuration (validates and returns)
    pub fn build(self) -> Self {
        self
    }

    /// Check if any fault is enabled
    pub fn is_active(&self) -> bool {
        self.write_limit.is_some()
            || self.write_error
            || self.read_limit.is_some()
            || self.read_error
            || self.corrupt_offset.is_some()
    }
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {} fault", what))
}

/// ProbeFs wrapper that applies a [`ChaosConfig`]
///
/// Counts handle acquisitions so callers can check which phases ran.
#[derive(Debug)]
pub struct ChaosFs<F> {
    inner: F,
    config: ChaosConfig,
    creates: Cell<usize>,
    opens: Cell<usize>,
}

impl<F: ProbeFs> ChaosFs<F> {
    pub fn new(inner: F, config: ChaosConfig) -> Self {
        Self {
            inner,
            config,
            creates: Cell::new(0),
            opens: Cell::new(0),
        }
    }

    pub fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// Number of write handles handed out
    pub fn create_count(&self) -> usize {
        self.creates.get()
    }

    /// Number of read handles handed out
    pub fn open_count(&self) -> usize {
        self.opens.get()
    }
}

impl<F: ProbeFs> ProbeFs for ChaosFs<F> {
    type Writer = ChaosWriter<F::Writer>;
    type Reader = ChaosReader<F::Reader>;

    fn create(&self, path: &Path) -> io::Result<Self::Writer> {
        let inner = self.inner.create(path)?;
        self.creates.set(self.creates.get() + 1);
        Ok(ChaosWriter {
            inner,
            limit: self.config.write_limit,
            fail: self.config.write_error,
        })
    }

    fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        if let Some(offset) = self.config.corrupt_offset {
            corrupt_byte(path, offset).map_err(|e| {
                io::Error::other(format!("injected corruption at offset {} failed: {}", offset, e))
            })?;
        }
        let inner = self.inner.open(path)?;
        self.opens.set(self.opens.get() + 1);
        Ok(ChaosReader {
            inner,
            remaining: self.config.read_limit,
            fail: self.config.read_error,
        })
    }
}

/// Writer half of [`ChaosFs`]
#[derive(Debug)]
pub struct ChaosWriter<W> {
    inner: W,
    limit: Option<usize>,
    fail: bool,
}

impl<W: Write> Write for ChaosWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(injected("write"));
        }
        let len = self.limit.map_or(buf.len(), |limit| buf.len().min(limit));
        self.inner.write(&buf[..len])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader half of [`ChaosFs`]
#[derive(Debug)]
pub struct ChaosReader<R> {
    inner: R,
    remaining: Option<usize>,
    fail: bool,
}

impl<R: Read> Read for ChaosReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail {
            return Err(injected("read"));
        }
        match self.remaining {
            None => self.inner.read(buf),
            Some(0) => Ok(0),
            Some(remaining) => {
                let len = buf.len().min(remaining);
                let n = self.inner.read(&mut buf[..len])?;
                self.remaining = Some(remaining - n);
                Ok(n)
            }
        }
    }
}

/// Flip the byte at `offset` in place; offsets past EOF are left alone
fn corrupt_byte(path: &Path, offset: u64) -> io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    if offset >= file.metadata()?.len() {
        tracing::debug!(path = %path.display(), offset, "corruption offset past EOF, skipped");
        return Ok(());
    }

    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut byte)?;
    byte[0] ^= 0xff;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&byte)?;
    tracing::debug!(path = %path.display(), offset, "corrupted probe file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use crate::verifier::{HostFs, RoundTripVerifier, Stage, VerificationResult};
    use tempfile::TempDir;

    fn chaos_verifier(config: ChaosConfig) -> RoundTripVerifier<ChaosFs<HostFs>> {
        RoundTripVerifier::with_fs(ChaosFs::new(HostFs, config))
    }

    #[test]
    fn test_default_config() {
        let config = ChaosConfig::new();
        assert_eq!(config.write_limit, None);
        assert!(!config.write_error);
        assert_eq!(config.read_limit, None);
        assert!(!config.read_error);
        assert_eq!(config.corrupt_offset, None);
        assert!(!config.is_active());
    }

    #[test]
    fn test_builder_chain() {
        let config = ChaosConfig::new()
            .with_write_limit(4)
            .with_read_limit(2)
            .with_corruption(7)
            .build();

        assert_eq!(config.write_limit, Some(4));
        assert_eq!(config.read_limit, Some(2));
        assert_eq!(config.corrupt_offset, Some(7));
        assert!(config.is_active());
    }

    #[test]
    fn test_inactive_chaos_is_transparent() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new());

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        assert_eq!(result, VerificationResult::Success { bytes_read: 24 });
        assert_eq!(verifier.fs().create_count(), 1);
        assert_eq!(verifier.fs().open_count(), 1);
    }

    #[test]
    fn test_short_write_never_opens_reader() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_write_limit(10));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        assert_eq!(
            result,
            VerificationResult::Failure {
                stage: Stage::Write,
                detail: "short write: expected 24 wrote 10".to_string(),
            }
        );
        assert_eq!(verifier.fs().create_count(), 1);
        assert_eq!(verifier.fs().open_count(), 0);
    }

    #[test]
    fn test_write_error_never_opens_reader() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_write_error(true));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        match result {
            VerificationResult::Failure { stage, detail } => {
                assert_eq!(stage, Stage::Write);
                assert!(detail.contains("injected write fault"), "{}", detail);
            }
            other => panic!("expected write failure, got {:?}", other),
        }
        assert_eq!(verifier.fs().open_count(), 0);
    }

    #[test]
    fn test_short_read() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_read_limit(5));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        assert_eq!(
            result,
            VerificationResult::Failure {
                stage: Stage::Read,
                detail: "short read: expected 24 got 5".to_string(),
            }
        );
    }

    #[test]
    fn test_read_error() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_read_error(true));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        assert_eq!(result.stage(), Some(Stage::Read));
    }

    #[test]
    fn test_corruption_reports_offset() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_corruption(5));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        match result {
            VerificationResult::Failure { stage, detail } => {
                assert_eq!(stage, Stage::Read);
                assert!(
                    detail.starts_with("content mismatch at offset 5"),
                    "{}",
                    detail
                );
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_corruption_past_eof_is_noop() {
        let dir = TempDir::new().unwrap();
        let verifier = chaos_verifier(ChaosConfig::new().with_corruption(1000));

        let result = verifier.verify(dir.path().join("probe"), &Payload::default());
        assert!(result.is_success());
    }

    #[test]
    fn test_chaos_reader_limit_spans_calls() {
        let mut reader = ChaosReader {
            inner: io::Cursor::new(b"abcdef".to_vec()),
            remaining: Some(4),
            fail: false,
        };
        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    /// Keeps file content in memory, so nothing exists at the probe path on disk
    struct MemoryFs;

    impl ProbeFs for MemoryFs {
        type Writer = io::Sink;
        type Reader = io::Cursor<Vec<u8>>;

        fn create(&self, _path: &Path) -> io::Result<io::Sink> {
            Ok(io::sink())
        }

        fn open(&self, _path: &Path) -> io::Result<io::Cursor<Vec<u8>>> {
            Ok(io::Cursor::new(Vec::new()))
        }
    }

    #[test]
    fn test_failed_corruption_names_injected_fault() {
        let dir = TempDir::new().unwrap();
        let verifier =
            RoundTripVerifier::with_fs(ChaosFs::new(MemoryFs, ChaosConfig::new().with_corruption(0)));

        let result = verifier.verify(dir.path().join("absent"), &Payload::default());
        match result {
            VerificationResult::Failure { stage, detail } => {
                assert_eq!(stage, Stage::Read);
                assert!(
                    detail.contains("injected corruption at offset 0 failed"),
                    "{}",
                    detail
                );
            }
            other => panic!("expected read failure, got {:?}", other),
        }
        assert_eq!(verifier.fs().open_count(), 0);
    }
}

//! Streaming CRC-32 / MD5 / SHA-1 hashing.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::{Duration, Instant};

use md5::Md5;
use sha1::{Digest, Sha1};
use tokio_util::sync::CancellationToken;

use dirdat_core::{DigestResult, ScanError};

/// Read block size.
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Minimum time between progress callbacks while hashing one file.
pub const PING_INTERVAL: Duration = Duration::from_secs(1);

/// Computes all three digests in a single pass over a file.
///
/// Every block is fed to the three hashers in read order. Progress
/// callbacks are advisory and never influence the digest values.
#[derive(Debug, Clone)]
pub struct DigestEngine {
    block_size: usize,
    ping_interval: Duration,
    cancel: Option<CancellationToken>,
}

impl DigestEngine {
    /// Create an engine with the default block size and ping interval.
    pub fn new() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            ping_interval: PING_INTERVAL,
            cancel: None,
        }
    }

    /// Set the read block size (minimum 1 byte).
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Set the minimum interval between progress callbacks.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Stop hashing between blocks once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Hash a file from start to end.
    ///
    /// `on_progress` receives the number of bytes of this file read so far.
    pub fn hash_file(
        &self,
        path: &Path,
        on_progress: impl FnMut(u64),
    ) -> Result<DigestResult, ScanError> {
        let file = File::open(path).map_err(|e| ScanError::file(path, e))?;
        match self.hash_reader(file, on_progress) {
            Ok(Some(digest)) => Ok(digest),
            Ok(None) => Err(ScanError::Interrupted),
            Err(e) => Err(ScanError::file(path, e)),
        }
    }

    /// Hash everything `reader` yields.
    ///
    /// Returns `Ok(None)` if the engine was cancelled part-way through.
    pub fn hash_reader<R: Read>(
        &self,
        mut reader: R,
        mut on_progress: impl FnMut(u64),
    ) -> std::io::Result<Option<DigestResult>> {
        let mut crc = crc32fast::Hasher::new();
        let mut md5 = Md5::new();
        let mut sha1 = Sha1::new();

        let mut buffer = vec![0u8; self.block_size];
        let mut size: u64 = 0;
        let mut last_ping = Instant::now();

        loop {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Ok(None);
            }

            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            let block = &buffer[..bytes_read];
            crc.update(block);
            md5.update(block);
            sha1.update(block);
            size += bytes_read as u64;

            if last_ping.elapsed() >= self.ping_interval {
                on_progress(size);
                last_ping = Instant::now();
            }
        }

        Ok(Some(DigestResult {
            size,
            crc32: crc.finalize(),
            md5: md5.finalize().into(),
            sha1: sha1.finalize().into(),
        }))
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new()
    }
}

//! Progress reporting for scanning and hashing.
//!
//! Nothing here affects the catalog; observers only watch it.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::scanner::ScanItem;

/// Length of the rolling window used for throughput and ETA.
pub const THROUGHPUT_WINDOW: Duration = Duration::from_secs(30);

/// Progress information while enumerating the source tree.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of regular files found so far.
    pub files_found: u64,
    /// Number of directories entered so far.
    pub dirs_scanned: u64,
    /// Total size of the files found so far.
    pub bytes_found: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_found: 0,
            dirs_scanned: 0,
            bytes_found: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress information while hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashProgress {
    /// Files fully hashed and inserted.
    pub files_done: usize,
    /// Files in the inventory.
    pub files_total: usize,
    /// Bytes hashed so far, including the current file's partial progress.
    pub bytes_done: u64,
    /// Total bytes in the inventory.
    pub bytes_total: u64,
}

impl HashProgress {
    /// Create progress for an inventory of the given size.
    pub fn new(files_total: usize, bytes_total: u64) -> Self {
        Self {
            files_done: 0,
            files_total,
            bytes_done: 0,
            bytes_total,
        }
    }

    /// Bytes still to hash.
    pub fn bytes_remaining(&self) -> u64 {
        self.bytes_total.saturating_sub(self.bytes_done)
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_done as f64 / self.bytes_total as f64 * 100.0).min(100.0)
        } else if self.files_total > 0 {
            self.files_done as f64 / self.files_total as f64 * 100.0
        } else {
            100.0
        }
    }
}

/// Receives progress events from a catalog run.
///
/// All methods default to doing nothing.
pub trait ProgressObserver {
    /// A file is about to be hashed.
    fn file_started(&mut self, _item: &ScanItem) {}

    /// Periodic update while hashing, and once after every finished file.
    fn ping(&mut self, _progress: &HashProgress) {}

    /// The run ended, for whatever reason.
    fn finished(&mut self, _progress: &HashProgress) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Rolling-window throughput estimate.
///
/// Only samples from the most recent window are used, so the estimate
/// follows changes in speed (small files vs. large files).
#[derive(Debug, Clone)]
pub struct Throughput {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
}

impl Throughput {
    /// Create an estimator over `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Record `bytes_done` at `now` and drop samples older than the window.
    pub fn record(&mut self, now: Instant, bytes_done: u64) {
        self.samples.push_back((now, bytes_done));
        while let Some((t, _)) = self.samples.front() {
            if now.saturating_duration_since(*t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Bytes per second across the window, if measurable and non-zero.
    pub fn bytes_per_second(&self) -> Option<f64> {
        let (first_t, first_bytes) = self.samples.front()?;
        let (last_t, last_bytes) = self.samples.back()?;

        let span = last_t.saturating_duration_since(*first_t).as_secs_f64();
        let delta = last_bytes.saturating_sub(*first_bytes) as f64;
        if span <= 0.0 || delta <= 0.0 {
            return None;
        }
        Some(delta / span)
    }

    /// Estimated time to hash `remaining` bytes.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let speed = self.bytes_per_second()?;
        Some(Duration::from_secs_f64(remaining as f64 / speed))
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(THROUGHPUT_WINDOW)
    }
}

/// Format a duration as `HH:MM:SS`.
pub fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Fit `text` into `width` characters, keeping the right-hand end.
pub fn truncate_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let keep = width - 1;
    let tail: String = text.chars().skip(len - keep).collect();
    format!("…{tail}")
}

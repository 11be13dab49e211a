//! Deterministic source tree enumeration.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use jwalk::{Parallelism, WalkDir};
use tokio::sync::broadcast;
use tracing::{debug, info};

use dirdat_core::ScanError;

use crate::progress::ScanProgress;

/// Send a scan progress update every this many files.
const PROGRESS_EVERY: u64 = 1000;

/// One regular file discovered under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanItem {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub relative: String,
    /// Components of `relative`.
    pub segments: Vec<String>,
    /// Size at enumeration time.
    pub size: u64,
}

impl ScanItem {
    /// Build an item from its absolute path and the scan root.
    pub fn new(root: &Path, path: PathBuf, size: u64) -> Self {
        let segments: Vec<String> = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let relative = segments.join("/");

        Self {
            path,
            relative,
            segments,
            size,
        }
    }
}

/// Ordered list of files under a root and their combined size.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// Files in enumeration order.
    pub items: Vec<ScanItem>,
    /// Sum of all item sizes.
    pub total_bytes: u64,
    /// Duration of the scan.
    pub scan_duration: Duration,
}

impl Inventory {
    /// Number of files.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if no files were found.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Walks a source root once, in a fixed order.
///
/// Within every directory, files come first and subdirectories after,
/// each sorted by name. Only regular files are listed; symbolic links are
/// not followed and not included.
pub struct InventoryScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl InventoryScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Enumerate every regular file under `root`.
    ///
    /// Any directory that cannot be listed aborts the scan.
    pub fn scan(&self, root: &Path) -> Result<Inventory, ScanError> {
        let start = Instant::now();
        let root_path = root.canonicalize().map_err(|e| ScanError::directory(root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let walker = WalkDir::new(&root_path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .process_read_dir(|_depth, _path, _state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a
                        .file_type
                        .is_dir()
                        .cmp(&b.file_type.is_dir())
                        .then_with(|| a.file_name.cmp(&b.file_name)),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => Ordering::Equal,
                });
            });

        let mut progress = ScanProgress::new();
        let mut items = Vec::new();
        let mut total_bytes: u64 = 0;

        for entry_result in walker {
            let mut entry = entry_result.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root_path.clone());
                ScanError::directory(path, into_io_error(err))
            })?;

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                // jwalk yields unlistable directories as Ok entries.
                if let Some(err) = entry.read_children_error.take() {
                    return Err(ScanError::directory(path, into_io_error(err)));
                }
                progress.dirs_scanned += 1;
                continue;
            }

            if !file_type.is_file() {
                debug!(path = %path.display(), "skipping non-regular file");
                continue;
            }

            let size = entry
                .metadata()
                .map_err(|err| ScanError::file(&path, into_io_error(err)))?
                .len();

            total_bytes += size;
            progress.files_found += 1;
            progress.bytes_found = total_bytes;

            if progress.files_found % PROGRESS_EVERY == 0 {
                progress.current_path = path.clone();
                progress.elapsed = start.elapsed();
                let _ = self.progress_tx.send(progress.clone());
            }

            items.push(ScanItem::new(&root_path, path, size));
        }

        progress.elapsed = start.elapsed();
        let _ = self.progress_tx.send(progress.clone());

        info!(
            root = %root_path.display(),
            files = items.len(),
            dirs = progress.dirs_scanned,
            bytes = total_bytes,
            "scan complete"
        );

        Ok(Inventory {
            root: root_path,
            items,
            total_bytes,
            scan_duration: progress.elapsed,
        })
    }
}

/// Unwrap a walk error, keeping its message when there is no io error.
fn into_io_error(err: jwalk::Error) -> std::io::Error {
    let message = err.to_string();
    err.into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message))
}

impl Default for InventoryScanner {
    fn default() -> Self {
        Self::new()
    }
}

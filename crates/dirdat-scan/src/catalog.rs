//! Per-file fold / hash / insert pipeline.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dirdat_core::{DatTree, PathFolder, RunConfig, ScanError, TreeBuilder};

use crate::digest::DigestEngine;
use crate::progress::{HashProgress, ProgressObserver};
use crate::scanner::Inventory;

/// Result of a catalog run.
///
/// The tree is always present: on interruption or a read error it holds
/// every file that was fully hashed before the run stopped.
#[derive(Debug)]
pub struct CatalogOutcome {
    /// Hierarchy built so far.
    pub tree: DatTree,
    /// Final progress counters.
    pub progress: HashProgress,
    /// Why the run stopped early, if it did.
    pub error: Option<ScanError>,
    /// Time spent hashing.
    pub duration: Duration,
}

impl CatalogOutcome {
    /// Check if every inventory item was cataloged.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Check if the run was stopped by a cancellation request.
    pub fn is_interrupted(&self) -> bool {
        self.error.as_ref().is_some_and(ScanError::is_interrupted)
    }
}

/// Drives the per-file pipeline over an inventory.
///
/// Files are processed one at a time in enumeration order, so leaves
/// appear in the tree in the same order as the inventory.
pub struct Cataloger {
    config: RunConfig,
    folder: PathFolder,
    engine: DigestEngine,
    cancel: CancellationToken,
}

impl Cataloger {
    /// Create a cataloger for a run.
    pub fn new(config: RunConfig) -> Self {
        let cancel = CancellationToken::new();
        Self {
            folder: PathFolder::from_config(&config),
            engine: DigestEngine::new().with_cancel(cancel.clone()),
            config,
            cancel,
        }
    }

    /// Use a custom digest engine.
    pub fn with_engine(mut self, engine: DigestEngine) -> Self {
        self.engine = engine.with_cancel(self.cancel.clone());
        self
    }

    /// Share an existing cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.engine = self.engine.with_cancel(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Token that stops this cataloger when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Fold, hash and insert every inventory item.
    ///
    /// Stops at the first read error or cancellation, returning what was
    /// built up to that point.
    pub fn build(
        &self,
        inventory: &Inventory,
        observer: &mut dyn ProgressObserver,
    ) -> CatalogOutcome {
        let start = Instant::now();
        let mut builder = TreeBuilder::for_config(&self.config);
        let mut progress = HashProgress::new(inventory.len(), inventory.total_bytes);
        let mut error = None;

        for item in &inventory.items {
            if self.cancel.is_cancelled() {
                error = Some(ScanError::Interrupted);
                break;
            }

            let folded = self.folder.fold(item.segments.as_slice());
            debug!(
                path = %item.relative,
                group = %folded.group,
                leaf = %folded.leaf,
                "folded"
            );
            observer.file_started(item);

            let done_before = progress.bytes_done;
            let result = self.engine.hash_file(&item.path, |read| {
                progress.bytes_done = done_before + read;
                observer.ping(&progress);
            });

            match result {
                Ok(digest) => {
                    let size = digest.size;
                    if size != item.size {
                        warn!(
                            path = %item.relative,
                            scanned = item.size,
                            hashed = size,
                            "file size changed since scan"
                        );
                    }
                    builder.insert_folded(&folded, digest);

                    progress.files_done += 1;
                    progress.bytes_done = done_before + size;
                    observer.ping(&progress);
                }
                Err(err) => {
                    progress.bytes_done = done_before;
                    error = Some(err);
                    break;
                }
            }
        }

        observer.finished(&progress);

        match &error {
            None => info!(
                files = progress.files_done,
                bytes = progress.bytes_done,
                "catalog complete"
            ),
            Some(err) => warn!(files = progress.files_done, error = %err, "catalog stopped early"),
        }

        CatalogOutcome {
            tree: builder.finish(),
            progress,
            error,
            duration: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::InventoryScanner;
    use std::fs;
    use tempfile::TempDir;

    struct Recorder {
        started: Vec<String>,
        pings: usize,
        finished: bool,
    }

    impl ProgressObserver for Recorder {
        fn file_started(&mut self, item: &crate::ScanItem) {
            self.started.push(item.relative.clone());
        }

        fn ping(&mut self, _progress: &HashProgress) {
            self.pings += 1;
        }

        fn finished(&mut self, _progress: &HashProgress) {
            self.finished = true;
        }
    }

    #[test]
    fn test_observer_sees_every_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("G")).unwrap();
        fs::write(temp.path().join("G/a.bin"), "aaa").unwrap();
        fs::write(temp.path().join("G/b.bin"), "bb").unwrap();

        let inventory = InventoryScanner::new().scan(temp.path()).unwrap();
        let cataloger = Cataloger::new(RunConfig::new(temp.path(), "out.dat"));
        let mut recorder = Recorder {
            started: Vec::new(),
            pings: 0,
            finished: false,
        };

        let outcome = cataloger.build(&inventory, &mut recorder);

        assert!(outcome.is_complete());
        assert_eq!(recorder.started, vec!["G/a.bin", "G/b.bin"]);
        assert!(recorder.pings >= 2);
        assert!(recorder.finished);
        assert_eq!(outcome.progress.bytes_done, 5);
        assert_eq!(outcome.tree.stats().leaves, 2);
    }

    #[test]
    fn test_cancel_before_start_keeps_empty_tree() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.bin"), "a").unwrap();

        let inventory = InventoryScanner::new().scan(temp.path()).unwrap();
        let cataloger = Cataloger::new(RunConfig::new(temp.path(), "out.dat"));
        cataloger.cancel_token().cancel();

        let outcome = cataloger.build(&inventory, &mut crate::NoProgress);
        assert!(outcome.is_interrupted());
        assert_eq!(outcome.tree.stats().leaves, 0);
    }
}

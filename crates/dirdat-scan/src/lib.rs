//! Source tree scanning and hashing engine for dirdat.
//!
//! # Overview
//!
//! A run has two phases:
//!
//! - **Inventory**: [`InventoryScanner`] walks the source root once, in a
//!   fixed order, listing every regular file and the total byte count.
//! - **Catalog**: [`Cataloger`] folds each file's path, hashes it with
//!   [`DigestEngine`] (CRC-32, MD5 and SHA-1 in one pass) and inserts the
//!   result into the hierarchy.
//!
//! The catalog phase always hands back the tree it has built, also when it
//! was cancelled through a [`CancellationToken`] or stopped by a read error.
//!
//! # Example
//!
//! ```rust,no_run
//! use dirdat_scan::{Cataloger, InventoryScanner, NoProgress, RunConfig};
//!
//! let config = RunConfig::new("/path/to/roms", "roms.dat");
//! let inventory = InventoryScanner::new().scan(&config.source).unwrap();
//!
//! let cataloger = Cataloger::new(config);
//! let outcome = cataloger.build(&inventory, &mut NoProgress);
//!
//! println!("Hashed {} files", outcome.progress.files_done);
//! ```

mod catalog;
mod digest;
mod progress;
mod scanner;

pub use catalog::{CatalogOutcome, Cataloger};
pub use digest::{BLOCK_SIZE, DigestEngine, PING_INTERVAL};
pub use progress::{
    HashProgress, NoProgress, ProgressObserver, ScanProgress, THROUGHPUT_WINDOW, Throughput,
    format_clock, truncate_left,
};
pub use scanner::{Inventory, InventoryScanner, ScanItem};
pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use dirdat_core::{
    DatHeader, DatNode, DatTree, DigestResult, ForcePacking, LooseFilePolicy, NodeId, NodeKind,
    RunConfig, ScanError, TreeStats,
};

//! Core types for dirdat.
//!
//! This crate provides the data model shared by the scanner and the DAT
//! writer: digest results, the directory / group / leaf hierarchy, the
//! path folding rules that place files into it, and run configuration.

mod config;
mod error;
mod fold;
mod node;
mod tree;

pub use config::{
    DEFAULT_GROUP_NAME, DatHeader, ForcePacking, LooseFilePolicy, RunConfig, RunConfigBuilder,
};
pub use error::ScanError;
pub use fold::{FoldedPath, PathFolder, file_stem};
pub use node::{DatNode, DigestResult, NodeId, NodeKind};
pub use tree::{DatTree, LeafEntry, TreeBuilder, TreeStats};

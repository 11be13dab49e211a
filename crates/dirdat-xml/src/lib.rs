//! DAT document writer and reader for dirdat.
//!
//! [`DatDocument`] renders a catalog tree as a Logiqx-style DAT: an XML
//! declaration, a `<datafile>` root, a `<header>` with the non-empty
//! metadata fields, then nested `dir` / `game` / `rom` elements in tree
//! order. Saving is atomic.
//!
//! [`read_dat`] and [`parse_dat`] read such documents back, which is mostly
//! useful for checking or comparing catalogs.

mod error;
mod reader;
mod writer;

pub use error::DatError;
pub use reader::{DatFile, RomEntry, parse_dat, read_dat};
pub use writer::DatDocument;

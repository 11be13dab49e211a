//! Error types for DAT documents.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing or reading a DAT document.
#[derive(Debug, Error)]
pub enum DatError {
    /// The output file could not be written.
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A DAT file could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML encoder or decoder failed.
    #[error("XML error: {message}")]
    Xml { message: String },

    /// The document is well-formed XML but not a valid DAT.
    #[error("Malformed DAT: {message}")]
    Malformed { message: String },
}

impl DatError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml {
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

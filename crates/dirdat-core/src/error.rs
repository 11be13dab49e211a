//! Error types for scanning and cataloging.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning or hashing.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root or a subdirectory could not be listed.
    #[error("Cannot read directory {path}: {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be opened or read.
    #[error("Cannot read file {path}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Operation was interrupted.
    #[error("Operation interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create a directory error, keeping `NotFound` distinct.
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::DirectoryUnreadable { path, source },
        }
    }

    /// Create a file read error.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a user interrupt.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_not_found() {
        let err = ScanError::directory(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_directory_permission_denied() {
        let err = ScanError::directory(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::DirectoryUnreadable { .. }));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_interrupted() {
        assert!(ScanError::Interrupted.is_interrupted());
        assert!(!ScanError::NotFound { path: "/x".into() }.is_interrupted());
    }
}

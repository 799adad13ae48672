//! Dictionary error handling
//!
//! Provides typed errors for dictionary and storage operations with
//! descriptive messages and recovery suggestions.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during dictionary operations
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Outline has no entry
    #[error("No entry for outline '{outline}'")]
    NotFound { outline: String },

    /// Mutation attempted on a read-only dictionary
    #[error("Dictionary is read-only: cannot {operation}")]
    ReadOnly { operation: &'static str },

    /// Operation needs a connection that was never established
    #[error("Dictionary is not connected to a backing store")]
    NotConnected,

    /// Save requested before any path was known
    #[error("Dictionary has no path to save to")]
    NoPath,

    /// The exclusion guard could not be acquired in time
    #[error("Could not acquire dictionary lock within {timeout:?}; the lock is held by another caller")]
    GuardTimeout { timeout: Duration },

    /// Snapshot file is not a flat JSON object of strings
    #[error("Malformed snapshot '{path}': {source}")]
    MalformedSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk is full or quota exceeded
    #[error(
        "Disk full or quota exceeded while writing to '{path}'. Free up disk space and try again."
    )]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read file
    #[error("Failed to read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write file
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Atomic write failed during rename
    #[error("Atomic write failed: could not rename '{from}' to '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DictionaryError {
    /// Create an error from an I/O error hit while reading `path`
    pub fn from_read(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => DictionaryError::PermissionDenied {
                path,
                source: error,
            },
            _ => DictionaryError::ReadError {
                path,
                source: error,
            },
        }
    }

    /// Create an error from an I/O error hit while writing `path`
    ///
    /// Classifies the error based on its kind (permission, disk full, etc.)
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => DictionaryError::PermissionDenied {
                path,
                source: error,
            },
            _ if is_disk_full_error(&error) => DictionaryError::DiskFull {
                path,
                source: error,
            },
            _ => DictionaryError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// Whether this is the normal "outline absent" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, DictionaryError::NotFound { .. })
    }

    /// Check if this error is recoverable
    ///
    /// Read-only violations and guard timeouts are caller bugs and never are.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DictionaryError::NotFound { .. }
                | DictionaryError::DiskFull { .. }
                | DictionaryError::PermissionDenied { .. }
                | DictionaryError::MalformedSnapshot { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            DictionaryError::DiskFull { .. } => Some("Free up disk space and try again."),
            DictionaryError::PermissionDenied { .. } => {
                Some("Check file and directory permissions. You may need to run with different permissions or change ownership.")
            }
            DictionaryError::MalformedSnapshot { .. } => {
                Some("The snapshot must be a single JSON object mapping outline strings to translation strings.")
            }
            DictionaryError::NoPath => Some("Load the dictionary from a file, or save it with an explicit path."),
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for dictionary operations
pub type DictResult<T> = Result<T, DictionaryError>;

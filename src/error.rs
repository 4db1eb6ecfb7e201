//! Errors raised while flattening or batching a directory tree.
//!
//! Name collisions are not errors; they are resolved by the mover. Everything
//! here is fatal for the current run and is propagated to the caller untouched.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during flatten and batch operations.
#[derive(Debug)]
pub enum FlatmoveError {
    /// The root passed to an operation is missing or is not a directory.
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Walking the tree failed (unreadable directory, vanished entry, ...).
    TraversalFailed {
        path: PathBuf,
        source: walkdir::Error,
    },
    /// Reading metadata (modification time, directory listing) failed.
    MetadataFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a bucket or batch directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to remove a directory that was found empty.
    DirectoryRemovalFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for FlatmoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRoot { path, source } => {
                write!(f, "Invalid root directory {}: {}", path.display(), source)
            }
            Self::TraversalFailed { path, source } => {
                write!(f, "Failed to walk {}: {}", path.display(), source)
            }
            Self::MetadataFailed { path, source } => {
                write!(f, "Failed to read metadata of {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DirectoryRemovalFailed { path, source } => {
                write!(
                    f,
                    "Failed to remove empty directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for FlatmoveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TraversalFailed { source, .. } => Some(source),
            Self::InvalidRoot { source, .. }
            | Self::MetadataFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::DirectoryRemovalFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
        }
    }
}

/// Result type for flatten and batch operations.
pub type FlatmoveResult<T> = Result<T, FlatmoveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_move_failure_display_names_both_paths() {
        let err = FlatmoveError::FileMoveFailure {
            source: PathBuf::from("/src/a.jpg"),
            destination: PathBuf::from("/dst/2021/a.jpg"),
            source_error: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let message = err.to_string();
        assert!(message.contains("/src/a.jpg"));
        assert!(message.contains("/dst/2021/a.jpg"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_source_is_exposed() {
        let err = FlatmoveError::DirectoryRemovalFailed {
            path: PathBuf::from("/tmp/x"),
            source: io::Error::other("busy"),
        };
        assert!(err.source().is_some());
    }
}

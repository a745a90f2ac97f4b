//! Errors raised while processing a source path.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a whole processing run.
///
/// Per-file read and write failures inside a directory run are not returned
/// through this type; they are logged and counted as failed in the summary.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Framework mode requires a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unsupported file type '{extension}': {}", .path.display())]
    UnsupportedKind { path: PathBuf, extension: String },

    #[error("No supported files found in {}", .0.display())]
    NoSupportedFiles(PathBuf),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to walk {}: {source}", .path.display())]
    Walk { path: PathBuf, source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_name_the_path() {
        let err = ProcessError::SourceNotFound(PathBuf::from("missing/app"));
        assert_eq!(err.to_string(), "Source not found: missing/app");

        let err = ProcessError::UnsupportedKind {
            path: PathBuf::from("notes.txt"),
            extension: "txt".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported file type 'txt': notes.txt");
    }

    #[test]
    fn test_io_errors_are_sources() {
        let err = ProcessError::Write {
            path: PathBuf::from("out/a.js"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("denied"));
    }
}

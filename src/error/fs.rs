//! File system errors

use std::fmt::Display;
use std::path::Path;

use super::ArchfixError;

/// Creates a read failure for `path`
pub fn read_failed(path: &Path, reason: impl Display) -> ArchfixError {
    ArchfixError::FileReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a write failure for `path`
pub fn write_failed(path: &Path, reason: impl Display) -> ArchfixError {
    ArchfixError::FileWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

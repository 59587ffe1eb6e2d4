//! Checkpoint errors

use std::fmt::Display;

use super::ArchfixError;

pub fn not_found(id: impl Into<String>) -> ArchfixError {
    ArchfixError::CheckpointNotFound { id: id.into() }
}

pub fn corrupted(id: impl Into<String>, reason: impl Display) -> ArchfixError {
    ArchfixError::CheckpointCorrupted {
        id: id.into(),
        reason: reason.to_string(),
    }
}

pub fn rollback_failed(id: impl Into<String>, reason: impl Display) -> ArchfixError {
    ArchfixError::RollbackFailed {
        id: id.into(),
        reason: reason.to_string(),
    }
}

pub fn failed(message: impl Display) -> ArchfixError {
    ArchfixError::CheckpointFailed {
        message: message.to_string(),
    }
}

//! Error types and handling for archfix
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Structural problems in the module graph (cycles, undefined dependencies,
//! layer violations) are *not* errors: they are reported as
//! [`Issue`](crate::domain::Issue) values by the validator. This enum covers
//! the failures that stop an operation: missing projects, unreadable files,
//! broken checkpoints and bad configuration.
//!
//! Constructor helpers are grouped by domain:
//! - [`checkpoint`]: Checkpoint errors
//! - [`fs`]: File system errors

pub mod checkpoint;
pub mod fs;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for archfix operations
#[derive(Error, Diagnostic, Debug)]
pub enum ArchfixError {
    // Project errors
    #[error("Project not found at: {path}")]
    #[diagnostic(
        code(archfix::project::not_found),
        help("Run 'archfix init' to create a project, or pass --project")
    )]
    ProjectNotFound { path: String },

    #[error("Project already locked by another process")]
    #[diagnostic(
        code(archfix::project::locked),
        help("Wait for the other repair run to finish or remove the .lock file manually")
    )]
    ProjectLocked,

    #[error("Failed to acquire project lock: {reason}")]
    #[diagnostic(code(archfix::project::lock_failed))]
    ProjectLockFailed { reason: String },

    // Module store errors
    #[error("Module '{name}' not found")]
    #[diagnostic(
        code(archfix::module::not_found),
        help("Module records live in modules/<name>/full_summary.json")
    )]
    ModuleNotFound { name: String },

    #[error("Failed to parse module record '{name}': {reason}")]
    #[diagnostic(code(archfix::module::parse_failed))]
    ModuleParseFailed { name: String, reason: String },

    #[error("Invalid module name '{name}': {reason}")]
    #[diagnostic(
        code(archfix::module::invalid_name),
        help("Module names must be non-empty and must not contain path separators")
    )]
    InvalidModuleName { name: String, reason: String },

    // Checkpoint errors
    #[error("Checkpoint '{id}' not found")]
    #[diagnostic(
        code(archfix::checkpoint::not_found),
        help("Run 'archfix checkpoint list' to see available checkpoints")
    )]
    CheckpointNotFound { id: String },

    #[error("Checkpoint '{id}' is corrupted: {reason}")]
    #[diagnostic(
        code(archfix::checkpoint::corrupted),
        help("The snapshot no longer matches its manifest; pick an older checkpoint")
    )]
    CheckpointCorrupted { id: String, reason: String },

    #[error("Rollback to checkpoint '{id}' failed: {reason}")]
    #[diagnostic(
        code(archfix::checkpoint::rollback_failed),
        help("Module records may hold unverified fixes; restore an older checkpoint with 'archfix checkpoint rollback <id>'")
    )]
    RollbackFailed { id: String, reason: String },

    #[error("Checkpoint operation failed: {message}")]
    #[diagnostic(code(archfix::checkpoint::operation_failed))]
    CheckpointFailed { message: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(archfix::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(archfix::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(archfix::config::invalid))]
    ConfigInvalid { message: String },

    // Report errors
    #[error("Validator report not found: {path}")]
    #[diagnostic(
        code(archfix::report::not_found),
        help("Run 'archfix validate' to produce a report")
    )]
    ReportNotFound { path: String },

    // Fix-Proposer errors
    #[error("No fix proposer configured")]
    #[diagnostic(
        code(archfix::proposer::not_configured),
        help("Set 'proposer.command' in archfix.yaml to the program that proposes module fixes")
    )]
    ProposerNotConfigured,

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(archfix::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(archfix::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(archfix::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for ArchfixError {
    fn from(err: std::io::Error) -> Self {
        ArchfixError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ArchfixError {
    fn from(err: serde_yaml::Error) -> Self {
        ArchfixError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArchfixError {
    fn from(err: serde_json::Error) -> Self {
        ArchfixError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ArchfixError>;

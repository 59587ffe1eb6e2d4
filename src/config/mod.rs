//! Configuration file handling for archfix
//!
//! This module contains data structures for:
//! - `archfix.yaml` - Repair, validation and proposer settings

pub mod archfix;

// Re-export commonly used types
pub use archfix::{
    ArchfixConfig, CONFIG_FILE, ProposerConfig, RegressionPolicy, RepairConfig, RetryPolicy,
    ValidationConfig,
};

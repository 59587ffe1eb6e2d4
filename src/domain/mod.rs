//! Domain models for archfix
//!
//! This module contains pure domain objects: module records and the issues
//! reported about them. These types carry no I/O.

pub mod issue;
pub mod module;

pub use issue::{Issue, IssueKind};
pub use module::{Module, REQUIRED_FIELDS, name_stem};

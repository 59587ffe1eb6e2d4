//! archfix - module dependency graph validator
//!
//! Keeps a dependency graph over module specification records, reports
//! structural defects, and repairs them in batches guarded by checkpoints.
//!
//! The pieces:
//! - [`store`]: module records on disk behind the [`store::ModuleRepository`] trait
//! - [`graph`]: dependency graph, cycle detection, topological order
//! - [`validator`]: structural checks and the issue report
//! - [`checkpoint`]: snapshots of the managed artifacts and rollback
//! - [`proposer`]: the fix proposer interface and its command adapter
//! - [`repair`]: the checkpointed repair loop

pub mod checkpoint;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod hash;
pub mod index;
pub mod logging;
pub mod progress;
pub mod project;
pub mod proposer;
pub mod repair;
pub mod store;
pub mod validator;

//! Command implementations for archfix CLI
//!
//! Each command is a thin `run` function over the library. Commands that
//! judge the project (`validate`, `repair`) return whether it ended clean so
//! `main` can pick the exit status.

pub mod checkpoint;
pub mod completions;
pub mod graph;
pub mod init;
pub mod repair;
pub mod report;
pub mod validate;
pub mod version;

use std::path::PathBuf;

use console::Style;

use crate::error::{ArchfixError, Result};
use crate::project::{Project, ProjectGuard};

/// Open the project for a command and take its lock without blocking
pub(crate) fn open_locked(project: Option<PathBuf>) -> Result<(Project, ProjectGuard)> {
    let project = Project::locate(project)?;
    let guard = ProjectGuard::try_acquire(&project.root)?.ok_or(ArchfixError::ProjectLocked)?;
    Ok((project, guard))
}

/// Bold yellow section heading
pub(crate) fn heading(text: &str) -> String {
    Style::new().bold().yellow().apply_to(text).to_string()
}

/// Count with a green/red tint depending on whether it is zero
pub(crate) fn count(n: usize) -> String {
    if n == 0 {
        Style::new().green().apply_to(n).to_string()
    } else {
        Style::new().red().bold().apply_to(n).to_string()
    }
}

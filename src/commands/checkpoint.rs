//! Checkpoint command implementation

use std::path::PathBuf;

use console::Style;

use crate::checkpoint::CheckpointStore;
use crate::cli::CheckpointCommand;
use crate::error::{Result, checkpoint as cp_err};
use crate::project::Project;

use super::{heading, open_locked};

/// Run a checkpoint subcommand
pub fn run(project: Option<PathBuf>, command: CheckpointCommand) -> Result<()> {
    match command {
        CheckpointCommand::Create { tag } => {
            let (project, _guard) = open_locked(project)?;
            let id = CheckpointStore::new(&project.root).create_checkpoint(&tag)?;
            println!("Created checkpoint {id}");
        }
        CheckpointCommand::List => {
            let project = Project::locate(project)?;
            list(&CheckpointStore::new(&project.root))?;
        }
        CheckpointCommand::Rollback { id } => {
            let (project, _guard) = open_locked(project)?;
            let store = CheckpointStore::new(&project.root);
            let id = match id {
                Some(id) => id,
                None => store.latest()?.ok_or_else(|| cp_err::not_found("latest"))?.id,
            };
            let stats = store.rollback_to(&id)?;
            println!(
                "Restored checkpoint {id}: {} files restored, {} removed",
                stats.restored, stats.removed
            );
        }
        CheckpointCommand::Cleanup { keep } => {
            let (project, _guard) = open_locked(project)?;
            let removed = CheckpointStore::new(&project.root).cleanup(keep)?;
            if removed.is_empty() {
                println!("Nothing to remove");
            } else {
                println!("Removed {} checkpoints", removed.len());
                for id in removed {
                    println!("  {id}");
                }
            }
        }
    }
    Ok(())
}

fn list(store: &CheckpointStore) -> Result<()> {
    let manifests = store.list()?;
    if manifests.is_empty() {
        println!("No checkpoints");
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("{}", heading("Checkpoints:"));
    for manifest in &manifests {
        println!(
            "  {}  {}",
            manifest.id,
            dim.apply_to(format!(
                "{} files, {}",
                manifest.files.len(),
                manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            ))
        );
    }
    Ok(())
}

//! Repair command implementation

use std::path::PathBuf;

use console::Style;

use crate::cli::RepairArgs;
use crate::config::RepairConfig;
use crate::error::{ArchfixError, Result};
use crate::project::Project;
use crate::proposer::command::CommandProposer;
use crate::repair::{RepairLoop, RepairSummary, StopReason};

use super::{count, heading};

/// Run repair command; `Ok(true)` when the project ended with no issues
pub fn run(project: Option<PathBuf>, args: RepairArgs) -> Result<bool> {
    let project = Project::locate(project)?;
    let config = effective_config(&project.config.repair, &args);

    let proposer = CommandProposer::from_argv(&project.config.proposer.command)
        .ok_or(ArchfixError::ProposerNotConfigured)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ArchfixError::IoError {
            message: format!("Failed to start async runtime: {e}"),
        })?;

    let show_progress = console::Term::stderr().is_term();
    let summary = runtime.block_on(async {
        RepairLoop::new(&project, config, &proposer)
            .with_progress(show_progress)
            .run()
            .await
    })?;

    print_summary(&summary);
    Ok(summary.is_clean())
}

/// File settings with command-line overrides applied
fn effective_config(base: &RepairConfig, args: &RepairArgs) -> RepairConfig {
    let mut config = base.clone();
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if args.force_all_rounds {
        config.force_all_rounds = true;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = usize::try_from(batch_size).unwrap_or(usize::MAX);
    }
    if let Some(tolerance) = args.tolerance {
        config.regression.tolerance = tolerance;
    }
    config
}

fn print_summary(summary: &RepairSummary) {
    let dim = Style::new().dim();

    println!("{}", heading("Rounds:"));
    for round in &summary.rounds {
        println!(
            "  round {}: {} -> {} issues, {} committed, {} rolled back, {} skipped {}",
            round.round,
            round.before.total,
            round.after.total,
            round.committed.len(),
            round.rolled_back.len(),
            round.skipped.len(),
            dim.apply_to(format!("(checkpoint {})", round.checkpoint))
        );
    }
    if summary.rounds.is_empty() {
        println!("  none");
    }

    let reason = match summary.stop_reason {
        StopReason::Converged => "no issues left",
        StopReason::NoImprovement => "no improvement in consecutive rounds",
        StopReason::MaxRounds => "round limit reached",
    };

    println!();
    println!(
        "Issues: {} before, {} after ({reason})",
        summary.issues_before.total,
        count(summary.issues_after.total)
    );

    if !summary.unrepaired.is_empty() {
        println!("Unrepaired: {}", summary.unrepaired.join(", "));
    }
    if !summary.remaining.is_empty() {
        println!("Modules with issues: {}", summary.remaining.join(", "));
    }
    println!("{}", dim.apply_to(format!("Run log: logs/{}", summary.run_id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RepairArgs {
        RepairArgs {
            max_rounds: None,
            force_all_rounds: false,
            batch_size: None,
            tolerance: None,
        }
    }

    #[test]
    fn test_effective_config_keeps_file_values() {
        let base = RepairConfig {
            max_rounds: 7,
            ..RepairConfig::default()
        };
        assert_eq!(effective_config(&base, &args()), base);
    }

    #[test]
    fn test_effective_config_overrides() {
        let overrides = RepairArgs {
            max_rounds: Some(1),
            force_all_rounds: true,
            batch_size: Some(10),
            tolerance: Some(0),
        };
        let config = effective_config(&RepairConfig::default(), &overrides);
        assert_eq!(config.max_rounds, 1);
        assert!(config.force_all_rounds);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.regression.tolerance, 0);
    }

    #[test]
    fn test_repair_without_proposer() {
        let temp = tempfile::TempDir::new().unwrap();
        Project::init(temp.path()).unwrap();

        let err = run(Some(temp.path().to_path_buf()), args()).unwrap_err();
        assert!(matches!(err, ArchfixError::ProposerNotConfigured));
    }
}

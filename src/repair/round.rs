//! Round records and the audit trail of a repair run
//!
//! ```text
//! logs/<run-id>/
//! ├── rounds/round_1/validator_report.json
//! ├── rounds/round_1/round.json
//! ├── fix_log.json
//! └── summary.json
//! ```
//!
//! Nothing here is authoritative; the module records are.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::fs::write_json;
use crate::error::Result;
use crate::validator::{IssueCounts, ValidatorReport};

/// A module that was not applied this round, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedModule {
    pub module: String,
    pub reason: String,
}

/// What happened to one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub checkpoint: Option<String>,
    pub attempted: Vec<String>,
    pub committed: Vec<String>,
    pub rolled_back: Vec<String>,
    pub skipped: Vec<SkippedModule>,
    /// The batch snapshot could not be restored and the round checkpoint was used instead
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub round_restored: bool,
    /// Scoped issue counts around the batch
    pub scoped_before: usize,
    pub scoped_after: usize,
}

impl BatchOutcome {
    /// `after - before`; positive means the batch made things worse
    pub fn delta(&self) -> i64 {
        let before = i64::try_from(self.scoped_before).unwrap_or(i64::MAX);
        let after = i64::try_from(self.scoped_after).unwrap_or(i64::MAX);
        after.saturating_sub(before)
    }
}

/// One round of the repair loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairRound {
    pub round: u32,
    pub checkpoint: String,
    pub before: IssueCounts,
    pub after: IssueCounts,
    pub attempted: Vec<String>,
    pub committed: Vec<String>,
    pub rolled_back: Vec<String>,
    pub skipped: Vec<SkippedModule>,
}

impl RepairRound {
    pub fn new(round: u32, checkpoint: String, before: IssueCounts) -> Self {
        Self {
            round,
            checkpoint,
            before,
            after: before,
            attempted: Vec::new(),
            committed: Vec::new(),
            rolled_back: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn absorb(&mut self, batch: BatchOutcome) {
        if batch.round_restored {
            // Earlier batches of the round were undone as well
            let undone = std::mem::take(&mut self.committed);
            self.rolled_back.extend(undone);
        }
        self.attempted.extend(batch.attempted);
        self.committed.extend(batch.committed);
        self.rolled_back.extend(batch.rolled_back);
        self.skipped.extend(batch.skipped);
    }

    pub fn improved(&self) -> bool {
        self.after.total < self.before.total
    }
}

/// A committed fix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixLogEntry {
    pub round: u32,
    pub batch: usize,
    pub module: String,
    /// Issues sent to the proposer
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stripped_dependencies: Vec<String>,
    pub attempts: u32,
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No issues left
    Converged,
    /// Two consecutive rounds without improvement
    NoImprovement,
    /// Round budget exhausted
    MaxRounds,
}

/// Final result of a repair run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub issues_before: IssueCounts,
    pub issues_after: IssueCounts,
    pub rounds: Vec<RepairRound>,
    /// Modules whose proposals kept failing and that still have issues
    pub unrepaired: Vec<String>,
    /// Modules with issues at the end of the run
    pub remaining: Vec<String>,
}

impl RepairSummary {
    pub fn is_clean(&self) -> bool {
        self.issues_after.total == 0
    }
}

/// Writer for `logs/<run-id>/`
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn round_dir(&self, round: u32) -> PathBuf {
        self.dir.join("rounds").join(format!("round_{round}"))
    }

    pub fn write_round_report(&self, round: u32, report: &ValidatorReport) -> Result<()> {
        report.save(&self.round_dir(round).join("validator_report.json"))
    }

    pub fn write_round(&self, record: &RepairRound) -> Result<()> {
        write_json(&self.round_dir(record.round).join("round.json"), record)
    }

    pub fn write_fix_log(&self, entries: &[FixLogEntry]) -> Result<()> {
        write_json(&self.dir.join("fix_log.json"), entries)
    }

    pub fn write_summary(&self, summary: &RepairSummary) -> Result<()> {
        write_json(&self.dir.join("summary.json"), summary)
    }
}

//! Checkpointed repair loop
//!
//! Each round validates the whole module set, orders the affected modules
//! (dependencies first), and works through them in batches:
//!
//! 1. checkpoint the managed artifacts
//! 2. ask the proposer for every module of the batch concurrently
//! 3. apply the proposals, stripping dependencies that would close a cycle
//! 4. revalidate the batch and its neighbors
//! 5. commit, or roll back to the checkpoint when the batch regressed
//!
//! If the batch checkpoint cannot be restored, the round checkpoint is
//! restored instead. If that fails too, the run aborts.
//!
//! Rounds stop when no issue is left, when two rounds in a row bring no
//! improvement (unless forced), or when the round budget runs out.

pub mod apply;
pub mod order;
pub mod related;
pub mod retry;
pub mod round;

use std::collections::BTreeSet;

use chrono::Utc;
use futures::future::join_all;

use crate::checkpoint::CheckpointStore;
use crate::config::RepairConfig;
use crate::domain::Module;
use crate::error::{ArchfixError, Result, checkpoint as cp_err};
use crate::graph::DependencyGraph;
use crate::progress::ProgressDisplay;
use crate::project::{Project, ProjectGuard};
use crate::proposer::{FixProposer, FixRequest};
use crate::store::{FsModuleRepository, LoadedModules, ModuleRepository};
use crate::validator::{Validation, Validator};

pub use round::{
    AuditLog, BatchOutcome, FixLogEntry, RepairRound, RepairSummary, SkippedModule, StopReason,
};

/// Tag prefix of per-batch checkpoints
pub const BATCH_TAG_PREFIX: &str = "batch-";

/// Rounds in a row without improvement before giving up
const STAGNANT_ROUNDS: u32 = 2;

/// Drives a project toward zero structural issues
pub struct RepairLoop<'a> {
    project: &'a Project,
    config: RepairConfig,
    validator: Validator,
    checkpoints: CheckpointStore,
    proposer: &'a dyn FixProposer,
    show_progress: bool,
}

/// Module set and graph as read from disk
struct State {
    loaded: LoadedModules,
    graph: DependencyGraph,
}

impl<'a> RepairLoop<'a> {
    pub fn new(project: &'a Project, config: RepairConfig, proposer: &'a dyn FixProposer) -> Self {
        Self {
            project,
            config,
            validator: Validator::new(project.config.validation.clone()),
            checkpoints: CheckpointStore::new(&project.root),
            proposer,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run rounds until convergence, stagnation or the round budget.
    ///
    /// Holds the project lock for the whole run.
    pub async fn run(&self) -> Result<RepairSummary> {
        let _guard =
            ProjectGuard::try_acquire(&self.project.root)?.ok_or(ArchfixError::ProjectLocked)?;

        let started_at = Utc::now();
        let run_id = started_at.format("%Y%m%dT%H%M%S%3fZ").to_string();
        let audit = AuditLog::new(self.project.logs_dir().join(&run_id));
        let repo = self.project.repository();

        let initial = self.validate(&self.load_state(&repo)?);
        let issues_before = initial.report().counts();
        tracing::info!(run = %run_id, issues = issues_before.total, "starting repair");

        let mut rounds = Vec::new();
        let mut fix_log = Vec::new();
        let mut exhausted = BTreeSet::new();
        let mut stagnant = 0;
        let mut stop_reason = StopReason::MaxRounds;

        for number in 1..=self.config.max_rounds {
            let state = self.load_state(&repo)?;
            let validation = self.validate(&state);
            if validation.is_clean() {
                stop_reason = StopReason::Converged;
                break;
            }

            let record = self
                .run_round(number, &repo, &state, &validation, &audit, &mut fix_log)
                .await?;

            for skipped in &record.skipped {
                exhausted.insert(skipped.module.clone());
            }
            tracing::info!(
                round = number,
                before = record.before.total,
                after = record.after.total,
                committed = record.committed.len(),
                rolled_back = record.rolled_back.len(),
                "round finished"
            );

            let after = record.after.total;
            if record.improved() {
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            rounds.push(record);

            if after == 0 {
                stop_reason = StopReason::Converged;
                break;
            }
            if stagnant >= STAGNANT_ROUNDS && !self.config.force_all_rounds {
                stop_reason = StopReason::NoImprovement;
                break;
            }
        }

        let state = self.load_state(&repo)?;
        let final_validation = self.validate(&state);
        self.persist(&state, &final_validation)?;

        let remaining = final_validation.affected_modules();
        let unrepaired = remaining
            .iter()
            .filter(|m| exhausted.contains(*m))
            .cloned()
            .collect();

        let summary = RepairSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            stop_reason,
            issues_before,
            issues_after: final_validation.report().counts(),
            rounds,
            unrepaired,
            remaining,
        };
        audit.write_summary(&summary)?;

        tracing::info!(
            before = summary.issues_before.total,
            after = summary.issues_after.total,
            reason = ?summary.stop_reason,
            "repair finished"
        );
        Ok(summary)
    }

    async fn run_round(
        &self,
        number: u32,
        repo: &FsModuleRepository,
        state: &State,
        validation: &Validation,
        audit: &AuditLog,
        fix_log: &mut Vec<FixLogEntry>,
    ) -> Result<RepairRound> {
        let report = validation.report();
        report.save(&self.project.report_path())?;
        audit.write_round_report(number, &report)?;

        let checkpoint = self.checkpoints.create_checkpoint(&format!("round-{number}"))?;
        let round_log_mark = fix_log.len();
        let mut record = RepairRound::new(number, checkpoint.clone(), report.counts());

        let affected: Vec<String> = validation
            .affected_modules()
            .into_iter()
            .filter(|name| {
                state.loaded.modules.contains_key(name) || state.loaded.failures.contains_key(name)
            })
            .collect();
        let ordered = order::order_modules(&state.graph, &affected);
        let batches = order::batches(&ordered, self.config.batch_size);

        let progress = if self.show_progress {
            ProgressDisplay::new(ordered.len() as u64)
        } else {
            ProgressDisplay::hidden()
        };

        for (index, batch) in batches.iter().enumerate() {
            let batch_number = index + 1;
            progress.update_batch(number, batch_number, batches.len(), batch);

            let outcome = match self
                .repair_batch(number, batch_number, batch, &checkpoint, repo, fix_log)
                .await
            {
                Ok(outcome) => outcome,
                Err(e @ ArchfixError::RollbackFailed { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(round = number, batch = batch_number, error = %e, "batch failed");
                    BatchOutcome {
                        attempted: batch.clone(),
                        skipped: batch
                            .iter()
                            .map(|module| SkippedModule {
                                module: module.clone(),
                                reason: e.to_string(),
                            })
                            .collect(),
                        ..BatchOutcome::default()
                    }
                }
            };

            if outcome.round_restored {
                fix_log.truncate(round_log_mark);
            }
            audit.write_fix_log(fix_log)?;
            progress.inc_modules(batch.len());
            record.absorb(outcome);
        }
        progress.finish();

        let end = self.load_state(repo)?;
        let after = self.validate(&end);
        self.persist(&end, &after)?;
        record.after = after.report().counts();
        audit.write_round(&record)?;

        let removed = self.checkpoints.cleanup_matching(self.config.keep_checkpoints, |m| {
            m.tag.starts_with(BATCH_TAG_PREFIX)
        })?;
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "pruned batch checkpoints");
        }

        Ok(record)
    }

    async fn repair_batch(
        &self,
        round: u32,
        batch_number: usize,
        batch: &[String],
        round_checkpoint: &str,
        repo: &FsModuleRepository,
        fix_log: &mut Vec<FixLogEntry>,
    ) -> Result<BatchOutcome> {
        // Every request sees the state as of batch start
        let start = self.load_state(repo)?;
        let validation = self.validate(&start);

        let requests: Vec<FixRequest> = batch
            .iter()
            .map(|name| {
                let current = start
                    .loaded
                    .modules
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Module::new(name.as_str()));
                related::build_request(
                    &current,
                    &validation,
                    &start.loaded.modules,
                    &start.graph,
                    self.config.max_issues_per_module,
                    self.config.max_related_modules,
                )
            })
            .collect();

        let transaction = self
            .checkpoints
            .begin(&format!("{BATCH_TAG_PREFIX}r{round}-{batch_number}"))?;
        let mut outcome = BatchOutcome {
            checkpoint: Some(transaction.id().to_string()),
            attempted: batch.to_vec(),
            ..BatchOutcome::default()
        };

        let policy = self.config.retry;
        let proposals = join_all(
            requests
                .iter()
                .map(|request| retry::propose_with_retry(self.proposer, request, &policy)),
        )
        .await;

        let log_mark = fix_log.len();
        let mut working = start.graph.clone();
        let mut apply_failed = false;
        let mut applied = Vec::new();

        for (request, proposal) in requests.iter().zip(proposals) {
            let proposal = match proposal {
                Ok(proposal) => proposal,
                Err(e) => {
                    outcome.skipped.push(SkippedModule {
                        module: request.module_name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let fix = apply::merge_proposal(&request.current, proposal.module, &working);
            if let Err(e) = repo.put(&fix.module) {
                tracing::warn!(module = %request.module_name, error = %e, "failed to write fix");
                apply_failed = true;
                outcome.skipped.push(SkippedModule {
                    module: request.module_name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            working.add_or_update(&fix.module.name, fix.module.depends_on.iter().cloned());
            applied.push(request.module_name.clone());
            fix_log.push(FixLogEntry {
                round,
                batch: batch_number,
                module: request.module_name.clone(),
                issues: request.issues.clone(),
                stripped_dependencies: fix.stripped,
                attempts: proposal.attempts,
            });
        }

        if applied.is_empty() && !apply_failed {
            transaction.commit();
            return Ok(outcome);
        }

        let end = self.load_state(repo)?;
        let scope = revalidation_scope(batch, &start.graph, &end.graph);
        outcome.scoped_before = self
            .validator
            .validate_scoped(&start.loaded, &start.graph, &scope)
            .total();
        outcome.scoped_after = self
            .validator
            .validate_scoped(&end.loaded, &end.graph, &scope)
            .total();

        let delta = outcome.delta();
        if self
            .config
            .regression
            .should_rollback(delta, apply_failed)
        {
            tracing::info!(
                round,
                batch = batch_number,
                delta,
                apply_failed,
                "rolling back batch"
            );
            if let Err(e) = transaction.rollback() {
                tracing::warn!(
                    round,
                    batch = batch_number,
                    error = %e,
                    checkpoint = %round_checkpoint,
                    "batch rollback failed, restoring round checkpoint"
                );
                self.checkpoints
                    .rollback_to(round_checkpoint)
                    .map_err(|fallback| {
                        cp_err::rollback_failed(
                            round_checkpoint,
                            format!("{fallback} (after batch rollback failed: {e})"),
                        )
                    })?;
                outcome.round_restored = true;
            }
            fix_log.truncate(log_mark);
            outcome.rolled_back = applied;
        } else {
            self.project
                .persist_derived(end.loaded.modules.values(), &end.graph)?;
            transaction.commit();
            outcome.committed = applied;
        }

        Ok(outcome)
    }

    fn load_state(&self, repo: &FsModuleRepository) -> Result<State> {
        let loaded = repo.load_all()?;
        let graph = DependencyGraph::from_modules(loaded.modules.values());
        Ok(State { loaded, graph })
    }

    fn validate(&self, state: &State) -> Validation {
        self.validator.validate(&state.loaded, &state.graph)
    }

    fn persist(&self, state: &State, validation: &Validation) -> Result<()> {
        self.project
            .persist_derived(state.loaded.modules.values(), &state.graph)?;
        validation.report().save(&self.project.report_path())
    }
}

/// The batch plus its neighbors before and after the change
fn revalidation_scope(
    batch: &[String],
    before: &DependencyGraph,
    after: &DependencyGraph,
) -> BTreeSet<String> {
    let mut scope: BTreeSet<String> = batch.iter().cloned().collect();
    for name in batch {
        scope.extend(before.neighbors(name));
        scope.extend(after.neighbors(name));
    }
    scope
}

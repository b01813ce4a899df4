//! Lifecycle engine.
//!
//! The `LifecycleEngine` drives the two scheduled entry points:
//! - [`evaluate_all`](LifecycleEngine::evaluate_all) walks every course
//!   through the trigger chain and flags the ones that qualify
//! - [`advance_all`](LifecycleEngine::advance_all) moves every pending
//!   entry forward by exactly one step
//!
//! plus the administrator's entry points for entries that stopped
//! (resume, retry, dismiss) and crash recovery.

pub mod error;
pub mod evaluator;

pub use error::{EngineError, EngineResult, CONFIGURATION_ERROR};
pub use evaluator::{evaluate_chain, ChainDecision};

use crate::courses::CourseSource;
use crate::registry::{SubpluginCatalog, SubpluginRegistry, SyncReport};
use crate::state::entry::{self, emit_message, emit_transition, expect_status};
use crate::state::{Ledger, LedgerError};
use crate::store::SqliteStore;
use crate::subplugins::{take_message, StepContext};
use cc_protocol::{
    EntryStatus, Event, GlobalConfig, HistoryRecord, LifecycleEntry, StepOutcome, SubpluginKind,
    SubpluginRecord,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Decision taken for one course during an evaluation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDecision {
    pub course_id: i64,
    pub decision: ChainDecision,
}

/// What an evaluation run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Decisions in course id order, for every course that was evaluated.
    pub decisions: Vec<CourseDecision>,

    /// Courses that received a new ledger entry.
    pub created: Vec<i64>,

    /// Courses not evaluated because they already have a live entry.
    pub skipped: usize,
}

impl EvaluationReport {
    fn ids_where(&self, pred: impl Fn(&ChainDecision) -> bool) -> Vec<i64> {
        self.decisions
            .iter()
            .filter(|d| pred(&d.decision))
            .map(|d| d.course_id)
            .collect()
    }

    pub fn triggered(&self) -> Vec<i64> {
        self.ids_where(|d| matches!(d, ChainDecision::Triggered { .. }))
    }

    pub fn excluded(&self) -> Vec<i64> {
        self.ids_where(|d| matches!(d, ChainDecision::Excluded { .. }))
    }

    pub fn errored(&self) -> Vec<i64> {
        self.ids_where(|d| matches!(d, ChainDecision::Errored { .. }))
    }
}

/// What an advance run did, counted per resulting status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Entries moved to their next step.
    pub advanced: usize,
    pub awaiting: usize,
    pub completed: usize,
    pub failed: usize,

    /// Entries another invocation claimed first.
    pub skipped: usize,

    /// Entries whose result could not be stored; their claim was released.
    pub errors: usize,
}

impl AdvanceReport {
    /// Entries whose step ran and whose result was stored.
    pub fn processed(&self) -> usize {
        self.advanced + self.awaiting + self.completed + self.failed
    }

    fn record(&mut self, status: EntryStatus) {
        match status {
            EntryStatus::Pending | EntryStatus::Running => self.advanced += 1,
            EntryStatus::AwaitingInput => self.awaiting += 1,
            EntryStatus::Completed => self.completed += 1,
            EntryStatus::Failed => self.failed += 1,
        }
    }
}

/// The course lifecycle engine.
///
/// Ties the registries, the catalog, the ledger and the course source
/// together. All state lives in the store, so an engine can be created per
/// invocation.
pub struct LifecycleEngine {
    triggers: SubpluginRegistry,
    steps: SubpluginRegistry,
    ledger: Ledger,
    catalog: SubpluginCatalog,
    courses: Arc<dyn CourseSource>,
    config: GlobalConfig,
    events_tx: UnboundedSender<Event>,
}

impl LifecycleEngine {
    /// Create a new LifecycleEngine.
    ///
    /// # Arguments
    ///
    /// * `store` - Storage shared by the registries and the ledger
    /// * `catalog` - Installed trigger and step implementations
    /// * `courses` - Where courses are read from
    /// * `config` - Per-subplugin settings and limits
    /// * `events_tx` - Channel for progress events
    pub fn new(
        store: Arc<SqliteStore>,
        catalog: SubpluginCatalog,
        courses: Arc<dyn CourseSource>,
        config: GlobalConfig,
        events_tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            triggers: SubpluginRegistry::triggers(Arc::clone(&store)),
            steps: SubpluginRegistry::steps(Arc::clone(&store)),
            ledger: Ledger::new(store),
            catalog,
            courses,
            config,
            events_tx,
        }
    }

    pub fn triggers(&self) -> &SubpluginRegistry {
        &self.triggers
    }

    pub fn steps(&self) -> &SubpluginRegistry {
        &self.steps
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &SubpluginCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Register installed subplugins and drop uninstalled ones, for both kinds.
    pub fn sync_installed(&self) -> EngineResult<(SyncReport, SyncReport)> {
        let triggers = self
            .triggers
            .sync_installed(&self.catalog.installed(SubpluginKind::Trigger))?;
        let steps = self
            .steps
            .sync_installed(&self.catalog.installed(SubpluginKind::Step))?;
        Ok((triggers, steps))
    }

    /// Evaluate every course now. See [`evaluate_all_at`](Self::evaluate_all_at).
    pub async fn evaluate_all(&self) -> EngineResult<EvaluationReport> {
        self.evaluate_all_at(Utc::now()).await
    }

    /// Walk every eligible course through the trigger chain and flag the
    /// triggered ones at the first enabled step.
    ///
    /// The site course and courses that already have a live entry are not
    /// evaluated. A course whose chain errored is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyStepChain`] before evaluating anything if
    /// no step is enabled.
    pub async fn evaluate_all_at(&self, now: DateTime<Utc>) -> EngineResult<EvaluationReport> {
        let first_step = self
            .steps
            .enabled()?
            .into_iter()
            .next()
            .ok_or(EngineError::EmptyStepChain)?;

        let mut report = self.preview_all_at(now).await?;
        for decision in &report.decisions {
            let course_id = decision.course_id;
            match &decision.decision {
                ChainDecision::Triggered { by } => {
                    if self
                        .ledger
                        .insert_if_absent(course_id, by, &first_step.name, now)?
                    {
                        tracing::info!(
                            course_id,
                            trigger = %by,
                            step = %first_step.name,
                            "course triggered"
                        );
                        let _ = self.events_tx.send(Event::CourseTriggered {
                            course_id,
                            trigger: by.clone(),
                            first_step: first_step.name.clone(),
                        });
                        report.created.push(course_id);
                    }
                }
                ChainDecision::Excluded { by } => {
                    tracing::debug!(course_id, trigger = %by, "course excluded");
                    let _ = self.events_tx.send(Event::CourseExcluded {
                        course_id,
                        trigger: by.clone(),
                    });
                }
                ChainDecision::Errored { trigger, reason } => {
                    tracing::warn!(
                        course_id,
                        trigger = %trigger,
                        reason = %reason,
                        "trigger failed, course skipped"
                    );
                }
                ChainDecision::NoAction => {}
            }
        }
        tracing::info!(
            evaluated = report.decisions.len(),
            created = report.created.len(),
            skipped = report.skipped,
            "evaluation finished"
        );
        Ok(report)
    }

    /// Evaluate every eligible course without writing anything.
    ///
    /// Given the same courses, registry and settings, the result depends
    /// only on `now`.
    pub async fn preview_all_at(&self, now: DateTime<Utc>) -> EngineResult<EvaluationReport> {
        let chain = self.triggers.enabled()?;
        let live = self.ledger.live_course_ids()?;
        let mut courses = self.courses.courses().map_err(EngineError::Courses)?;
        courses.sort_by_key(|c| c.id);

        let mut report = EvaluationReport::default();
        for course in courses.iter().filter(|c| !c.is_site_course()) {
            if live.contains(&course.id) {
                report.skipped += 1;
                continue;
            }
            let decision = evaluate_chain(course, &chain, &self.catalog, &self.config, now).await;
            report.decisions.push(CourseDecision {
                course_id: course.id,
                decision,
            });
        }
        Ok(report)
    }

    /// Advance every pending entry now. See [`advance_all_at`](Self::advance_all_at).
    pub async fn advance_all(&self) -> EngineResult<AdvanceReport> {
        self.advance_all_at(Utc::now()).await
    }

    /// Run the current step of every entry that is Pending when the call
    /// starts, each exactly once.
    ///
    /// Entries claimed by someone else are skipped. A store failure on one
    /// entry is logged, its claim is released and the run continues.
    pub async fn advance_all_at(&self, now: DateTime<Utc>) -> EngineResult<AdvanceReport> {
        let chain = self.steps.enabled()?;
        let pending = self.ledger.list_by_status(EntryStatus::Pending)?;

        let mut report = AdvanceReport::default();
        for snapshot in &pending {
            match self.advance_entry(snapshot, &chain, now).await {
                Ok(Some(status)) => report.record(status),
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    tracing::error!(
                        course_id = snapshot.course_id,
                        error = %e,
                        "failed to advance entry"
                    );
                    report.errors += 1;
                }
            }
        }
        tracing::info!(
            processed = report.processed(),
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "advance finished"
        );
        Ok(report)
    }

    /// Claim, run and commit one entry.
    ///
    /// # Returns
    ///
    /// The stored status, or `None` if the entry was claimed elsewhere.
    async fn advance_entry(
        &self,
        snapshot: &LifecycleEntry,
        chain: &[SubpluginRecord],
        now: DateTime<Utc>,
    ) -> EngineResult<Option<EntryStatus>> {
        let Some(mut entry) = self.ledger.claim(snapshot.course_id, snapshot.version, now)? else {
            tracing::debug!(course_id = snapshot.course_id, "entry claimed elsewhere");
            return Ok(None);
        };
        let claimed_version = entry.version;

        let mut outcome = self.run_step(&entry, chain, now).await;
        let message = match &mut outcome {
            StepOutcome::Advance(data) | StepOutcome::Await(data) => take_message(data),
            StepOutcome::Fail(_) => None,
        };
        let next = next_step(chain, &entry.current_step);
        entry::apply_outcome(&mut entry, outcome, next, now);

        match self.ledger.commit_outcome(&entry) {
            Ok(_) => {
                if let Some(message) = message {
                    emit_message(entry.course_id, message, &self.events_tx);
                }
                tracing::info!(
                    course_id = entry.course_id,
                    status = %entry.status,
                    step = %entry.current_step,
                    "entry advanced"
                );
                emit_transition(&entry, &self.events_tx);
                Ok(Some(entry.status))
            }
            Err(LedgerError::ClaimLost(course_id)) => {
                tracing::warn!(course_id, "claim lost before commit, result dropped");
                Ok(None)
            }
            Err(e) => {
                if let Err(release_err) = self.ledger.release(entry.course_id, claimed_version, now) {
                    tracing::error!(
                        course_id = entry.course_id,
                        error = %release_err,
                        "failed to release claim"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Run the entry's current step. Every problem becomes a `Fail` outcome.
    async fn run_step(
        &self,
        entry: &LifecycleEntry,
        chain: &[SubpluginRecord],
        now: DateTime<Utc>,
    ) -> StepOutcome {
        let name = entry.current_step.as_str();
        if !chain.iter().any(|r| r.name == name) {
            return StepOutcome::Fail(format!(
                "{CONFIGURATION_ERROR}: step '{name}' is not enabled"
            ));
        }
        let Some(step) = self.catalog.step(name) else {
            return StepOutcome::Fail(format!(
                "{CONFIGURATION_ERROR}: step '{name}' is not installed"
            ));
        };
        let course = match self.courses.course(entry.course_id) {
            Ok(Some(course)) => course,
            Ok(None) => {
                return StepOutcome::Fail(format!("course {} no longer exists", entry.course_id))
            }
            Err(e) => return StepOutcome::Fail(format!("course lookup failed: {e}")),
        };

        let settings = self.config.step_settings(name);
        let ctx = StepContext {
            settings: &settings,
            now,
        };
        tracing::debug!(course_id = entry.course_id, step = name, "running step");
        match step.process(&course, &ctx, entry.data.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => StepOutcome::Fail(e.to_string()),
        }
    }

    /// Supply input to an entry that is awaiting it.
    ///
    /// The current step folds `input` into the entry's data; the entry then
    /// runs the same step again on the next advance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] / [`LedgerError::InvalidState`] (wrapped)
    ///   if the course has no entry awaiting input
    /// - [`EngineError::StepUnavailable`] if the current step is not installed
    /// - [`LedgerError::InputRejected`] (wrapped) if the step refuses `input`
    pub fn resume(&self, course_id: i64, input: Value) -> EngineResult<LifecycleEntry> {
        let current = self.ledger.require(course_id)?;
        expect_status(&current, EntryStatus::AwaitingInput)?;
        let step = self
            .catalog
            .step(&current.current_step)
            .ok_or_else(|| EngineError::StepUnavailable {
                course_id,
                step: current.current_step.clone(),
            })?;
        let entry = self
            .ledger
            .resume(course_id, |data| step.resume(data, input), Utc::now())?;
        tracing::info!(course_id, step = %entry.current_step, "entry resumed");
        emit_transition(&entry, &self.events_tx);
        Ok(entry)
    }

    /// Put a failed entry back to Pending at the step it failed on.
    pub fn retry(&self, course_id: i64) -> EngineResult<LifecycleEntry> {
        let entry = self.ledger.retry(course_id, Utc::now())?;
        tracing::info!(course_id, step = %entry.current_step, "entry retried");
        emit_transition(&entry, &self.events_tx);
        Ok(entry)
    }

    /// Archive a failed entry; the course may be flagged again later.
    pub fn dismiss(&self, course_id: i64) -> EngineResult<HistoryRecord> {
        let record = self.ledger.dismiss(course_id, Utc::now())?;
        tracing::info!(course_id, step = %record.final_step, "entry dismissed");
        Ok(record)
    }

    /// Fail entries whose claim is older than `stale_claim_secs`.
    pub fn recover_stale(&self) -> EngineResult<Vec<i64>> {
        self.recover_stale_at(Utc::now())
    }

    /// Like [`recover_stale`](Self::recover_stale), relative to `now`.
    pub fn recover_stale_at(&self, now: DateTime<Utc>) -> EngineResult<Vec<i64>> {
        let max_age = i64::try_from(self.config.stale_claim_secs).unwrap_or(i64::MAX);
        let cutoff = now
            .checked_sub_signed(Duration::seconds(max_age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let recovered = self.ledger.recover_stale(cutoff, now)?;
        for course_id in &recovered {
            tracing::warn!(course_id, "abandoned claim recovered as failed");
            if let Some(entry) = self.ledger.get(*course_id)? {
                emit_transition(&entry, &self.events_tx);
            }
        }
        Ok(recovered)
    }
}

/// The enabled step after `current`, if there is one.
fn next_step<'a>(chain: &'a [SubpluginRecord], current: &str) -> Option<&'a str> {
    let position = chain.iter().position(|r| r.name == current)?;
    chain.get(position + 1).map(|r| r.name.as_str())
}

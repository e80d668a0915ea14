//! Generation pipeline
//!
//! Runs every record of a snapshot through aggregation, drafting, cleanup,
//! proofreading and persistence, strictly one record after another. A record
//! that fails a stage is reported and skipped; only fatal errors (malformed
//! input, persistence) abort the run.

use crate::services::{
    CommentFinalizer, CommentGenerator, ContextAggregator, OutputWriter, PromptContext,
};
use chrono::{DateTime, Utc};
use domain::{
    AppraisalError, AppraisalResult, AppraisalSnapshot, CommentSet, GeneratedComment, RecordId,
    RecordKind, RecordState,
};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, instrument, warn};

/// Stage at which a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Generation,
    Cleanup,
    Proofreading,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::Generation => "generation",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Proofreading => "proofreading",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub record_id: RecordId,
    pub kind: RecordKind,
    pub stage: PipelineStage,
    pub error: AppraisalError,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}): {}", self.kind, self.record_id, self.stage, self.error)
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Exactly what was written to the output file
    pub comments: CommentSet,
    pub failures: Vec<RecordFailure>,
    /// Final state of every record, in processing order
    pub states: Vec<(RecordId, RecordState)>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.states.len()
    }

    pub fn succeeded(&self) -> usize {
        self.comments.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn state_of(&self, record_id: &RecordId) -> Option<RecordState> {
        self.states
            .iter()
            .find(|(id, _)| id == record_id)
            .map(|(_, state)| *state)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Called before each record is drafted with `(position, total, record_id)`
pub type ProgressFn = Box<dyn Fn(usize, usize, &RecordId) + Send + Sync>;

/// Record states for one run; every change goes through `RecordState::transition`
struct StateLedger {
    order: Vec<RecordId>,
    states: HashMap<RecordId, RecordState>,
}

impl StateLedger {
    fn new(contexts: &[PromptContext]) -> Self {
        let order: Vec<RecordId> = contexts.iter().map(|c| c.record_id().clone()).collect();
        let states = order
            .iter()
            .map(|id| (id.clone(), RecordState::Extracted))
            .collect();
        Self { order, states }
    }

    fn advance(&mut self, record_id: &RecordId, next: RecordState) -> AppraisalResult<()> {
        let current = self
            .states
            .get_mut(record_id)
            .ok_or_else(|| AppraisalError::InvalidTransition {
                record_id: record_id.clone(),
                from: RecordState::Extracted,
                to: next,
            })?;
        *current = current.transition(next, record_id)?;
        Ok(())
    }

    fn into_states(mut self) -> Vec<(RecordId, RecordState)> {
        self.order
            .into_iter()
            .filter_map(|id| self.states.remove(&id).map(|state| (id, state)))
            .collect()
    }
}

pub struct Pipeline {
    aggregator: ContextAggregator,
    generator: CommentGenerator,
    finalizer: CommentFinalizer,
    writer: OutputWriter,
    progress: Option<ProgressFn>,
}

impl Pipeline {
    pub fn new(generator: CommentGenerator, finalizer: CommentFinalizer, writer: OutputWriter) -> Self {
        Self {
            aggregator: ContextAggregator::new(),
            generator,
            finalizer,
            writer,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Generate, finalize and persist a comment for every record in `snapshot`
    #[instrument(skip(self, snapshot), fields(records = snapshot.record_count()))]
    pub async fn run(&self, snapshot: &AppraisalSnapshot) -> AppraisalResult<RunReport> {
        let started_at = Utc::now();
        let contexts = self.aggregator.aggregate(snapshot)?;
        let mut ledger = StateLedger::new(&contexts);
        for context in &contexts {
            ledger.advance(context.record_id(), RecordState::ContextAssembled)?;
        }
        info!(
            "Assembled {} prompt contexts, proofreading {}",
            contexts.len(),
            if self.finalizer.proofreads() { "on" } else { "off" }
        );

        let total = contexts.len();
        let mut finalized: Vec<GeneratedComment> = Vec::with_capacity(total);
        let mut failures: Vec<RecordFailure> = Vec::new();

        for (position, context) in contexts.iter().enumerate() {
            let record_id = context.record_id();
            if let Some(progress) = &self.progress {
                progress(position, total, record_id);
            }

            match self.process(context, &mut ledger).await? {
                Ok(comment) => finalized.push(comment),
                Err(failure) => {
                    warn!(
                        record_id = %failure.record_id,
                        kind = %failure.kind,
                        stage = %failure.stage,
                        "Record failed: {}",
                        failure.error
                    );
                    failures.push(failure);
                }
            }
        }

        let comments = self.writer.write(finalized).await?;
        for comment in comments.iter() {
            ledger.advance(&comment.record_id, RecordState::Persisted)?;
        }

        info!(
            succeeded = comments.len(),
            failed = failures.len(),
            "Pipeline finished"
        );
        Ok(RunReport {
            comments,
            failures,
            states: ledger.into_states(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Draft and finalize one record.
    ///
    /// The outer `Result` carries state-machine errors, the inner one the
    /// record's own failure.
    async fn process(
        &self,
        context: &PromptContext,
        ledger: &mut StateLedger,
    ) -> AppraisalResult<Result<GeneratedComment, RecordFailure>> {
        let record_id = context.record_id();
        let fail = |stage: PipelineStage, error: AppraisalError| RecordFailure {
            record_id: record_id.clone(),
            kind: context.kind(),
            stage,
            error,
        };

        ledger.advance(record_id, RecordState::Drafted)?;
        let draft = match self.generator.generate(context).await {
            Ok(draft) => draft,
            Err(e) => {
                ledger.advance(record_id, RecordState::Failed)?;
                return Ok(Err(fail(PipelineStage::Generation, e)));
            }
        };

        let cleaned = match self.finalizer.clean(draft) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                ledger.advance(record_id, RecordState::Failed)?;
                return Ok(Err(fail(PipelineStage::Cleanup, e)));
            }
        };
        ledger.advance(record_id, RecordState::Finalized)?;

        match self.finalizer.review(context, cleaned).await {
            Ok(comment) => Ok(Ok(comment)),
            Err(e) => {
                ledger.advance(record_id, RecordState::Failed)?;
                Ok(Err(fail(PipelineStage::Proofreading, e)))
            }
        }
    }
}

//! Sequential batch runner with an explicit failure policy

use std::sync::Arc;

use serde::Serialize;

use crate::analysis::{EvaluationResult, Judge, ScoringError};
use crate::config::FailurePolicy;
use crate::data::Example;

/// Per-example outcome of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Scored(EvaluationResult),
    /// Recorded only under [`FailurePolicy::BestEffort`]
    Failed { example: Example, error: String },
}

impl RowOutcome {
    pub fn example(&self) -> &Example {
        match self {
            RowOutcome::Scored(result) => result.example(),
            RowOutcome::Failed { example, .. } => example,
        }
    }

    pub fn result(&self) -> Option<&EvaluationResult> {
        match self {
            RowOutcome::Scored(result) => Some(result),
            RowOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RowOutcome::Scored(_) => None,
            RowOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}

/// Batch-level errors
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Example {index} failed: {source}")]
    Aborted {
        index: usize,
        #[source]
        source: ScoringError,
    },
}

/// Applies a [`Judge`] to a sequence of examples.
///
/// Examples are evaluated one at a time in input order, and outcomes are
/// returned in that same order. Under [`FailurePolicy::Abort`] the first
/// failure ends the batch; under [`FailurePolicy::BestEffort`] it becomes a
/// [`RowOutcome::Failed`] entry and the batch continues.
pub struct BatchRunner {
    judge: Judge,
    policy: FailurePolicy,
    progress: Arc<dyn ProgressCallback>,
}

impl BatchRunner {
    pub fn new(judge: Judge, policy: FailurePolicy) -> Self {
        Self {
            judge,
            policy,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set a progress callback
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Evaluate every example
    pub async fn run(&self, examples: &[Example]) -> Result<Vec<RowOutcome>, BatchError> {
        let total = examples.len();
        let mut outcomes = Vec::with_capacity(total);

        tracing::info!(
            "Evaluating {} examples ({} mode, {} policy)",
            total,
            self.judge.mode(),
            self.policy
        );

        for (index, example) in examples.iter().enumerate() {
            self.progress.on_example_start(index, total);

            match self.judge.evaluate(example).await {
                Ok(result) => {
                    tracing::debug!("Example {}: composite {:.3}", index, result.composite());
                    self.progress.on_example_complete(index, true);
                    outcomes.push(RowOutcome::Scored(result));
                }
                Err(source) => {
                    self.progress.on_example_complete(index, false);
                    match self.policy {
                        FailurePolicy::Abort => {
                            tracing::error!("Aborting batch at example {}: {}", index, source);
                            return Err(BatchError::Aborted { index, source });
                        }
                        FailurePolicy::BestEffort => {
                            tracing::warn!("Recording failure for example {}: {}", index, source);
                            outcomes.push(RowOutcome::Failed {
                                example: example.clone(),
                                error: source.to_string(),
                            });
                        }
                    }
                }
            }

            self.progress.on_progress(index + 1, total);
        }

        Ok(outcomes)
    }
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send + Sync {
    fn on_example_start(&self, index: usize, total: usize);
    fn on_example_complete(&self, index: usize, success: bool);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_example_start(&self, _index: usize, _total: usize) {}
    fn on_example_complete(&self, _index: usize, _success: bool) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_example_start(&self, _index: usize, _total: usize) {}

    fn on_example_complete(&self, index: usize, success: bool) {
        if !success {
            println!("  FAILED example {}", index);
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        if completed == total || completed % 10 == 0 {
            println!("Progress: {}/{} examples evaluated", completed, total);
        }
    }
}

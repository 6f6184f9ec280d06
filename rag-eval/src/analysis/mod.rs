//! Scoring dimensions, evaluation engine and aggregate statistics

pub mod judge;
pub mod scorers;
pub mod summary;

pub use judge::{EvaluationResult, Judge, ScoringError};
pub use scorers::{
    standard_definitions, HeuristicFn, RubricFn, ScorerDefinition, ScorerRegistry,
};
pub use summary::{DimensionSummary, LowScorer, Summary, NOTABLE_COUNT};

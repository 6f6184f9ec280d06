//! Evaluation engine: runs every registered dimension over one example

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use super::scorers::{HeuristicFn, RubricFn, ScorerRegistry};
use crate::config::{ConfigError, ScoringMode};
use crate::data::Example;
use crate::providers::{JudgmentClient, ProviderError};

/// Failure of one dimension's scoring function on one example
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("{dimension}: judgment failed: {source}")]
    Judgment {
        dimension: String,
        #[source]
        source: ProviderError,
    },

    #[error("{dimension}: raw score {raw} outside [0, {max_raw}]")]
    OutOfRange {
        dimension: String,
        raw: i64,
        max_raw: u32,
    },
}

impl ScoringError {
    pub fn dimension(&self) -> &str {
        match self {
            ScoringError::Judgment { dimension, .. } | ScoringError::OutOfRange { dimension, .. } => {
                dimension
            }
        }
    }
}

/// Raw scores for one example plus their weighted composite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    example: Example,
    scores: IndexMap<String, u32>,
    composite: f64,
}

impl EvaluationResult {
    pub fn example(&self) -> &Example {
        &self.example
    }

    /// Raw score per dimension, in registry order
    pub fn scores(&self) -> &IndexMap<String, u32> {
        &self.scores
    }

    pub fn score(&self, dimension: &str) -> Option<u32> {
        self.scores.get(dimension).copied()
    }

    pub fn composite(&self) -> f64 {
        self.composite
    }
}

/// Scoring capability bound once at construction
enum ScoreFn {
    Heuristic(HeuristicFn),
    External {
        rubric: RubricFn,
        client: Arc<dyn JudgmentClient>,
    },
}

struct Dimension {
    name: String,
    max_raw: u32,
    weight: f64,
    score_fn: ScoreFn,
}

impl Dimension {
    async fn score(&self, example: &Example) -> Result<u32, ScoringError> {
        let raw = match &self.score_fn {
            ScoreFn::Heuristic(heuristic) => i64::from(heuristic(example)),
            ScoreFn::External { rubric, client } => client
                .judge(&rubric(example))
                .await
                .map_err(|source| ScoringError::Judgment {
                    dimension: self.name.clone(),
                    source,
                })?,
        };

        // Out-of-range scores are a scoring-function bug; never clamp.
        u32::try_from(raw)
            .ok()
            .filter(|r| *r <= self.max_raw)
            .ok_or_else(|| ScoringError::OutOfRange {
                dimension: self.name.clone(),
                raw,
                max_raw: self.max_raw,
            })
    }
}

/// Scores examples across every registered dimension.
///
/// The scoring mode is fixed at construction: each dimension is bound to
/// either its heuristic or its rubric + judgment client, and `evaluate`
/// never re-dispatches on the mode.
pub struct Judge {
    mode: ScoringMode,
    dimensions: Vec<Dimension>,
}

impl Judge {
    /// Build a judge over a registry.
    ///
    /// External mode requires a client; heuristic mode ignores one.
    pub fn new(
        registry: &ScorerRegistry,
        mode: ScoringMode,
        client: Option<Arc<dyn JudgmentClient>>,
    ) -> Result<Self, ConfigError> {
        let client = match (mode, client) {
            (ScoringMode::External, None) => return Err(ConfigError::MissingClient),
            (ScoringMode::External, Some(client)) => Some(client),
            (ScoringMode::Heuristic, _) => None,
        };

        let dimensions = registry
            .iter()
            .map(|def| Dimension {
                name: def.name.clone(),
                max_raw: def.max_raw,
                weight: def.weight,
                score_fn: match &client {
                    Some(client) => ScoreFn::External {
                        rubric: def.rubric,
                        client: Arc::clone(client),
                    },
                    None => ScoreFn::Heuristic(def.heuristic),
                },
            })
            .collect();

        Ok(Self { mode, dimensions })
    }

    /// Build a judge from a mode name such as `"heuristic"` or `"external"`
    pub fn from_mode_name(
        registry: &ScorerRegistry,
        mode: &str,
        client: Option<Arc<dyn JudgmentClient>>,
    ) -> Result<Self, ConfigError> {
        Self::new(registry, mode.parse()?, client)
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Dimension names in registry order
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    /// Score one example on every dimension, in registry order.
    ///
    /// The first failing dimension aborts the evaluation; no partial
    /// result is returned.
    pub async fn evaluate(&self, example: &Example) -> Result<EvaluationResult, ScoringError> {
        let mut scores = IndexMap::with_capacity(self.dimensions.len());

        for dimension in &self.dimensions {
            let raw = dimension.score(example).await?;
            scores.insert(dimension.name.clone(), raw);
        }

        let composite = self.compute_composite(&scores);

        Ok(EvaluationResult {
            example: example.clone(),
            scores,
            composite,
        })
    }

    /// Weighted sum of `raw / max_raw` over all dimensions; a missing
    /// dimension counts as zero
    pub fn compute_composite(&self, scores: &IndexMap<String, u32>) -> f64 {
        self.dimensions
            .iter()
            .map(|d| {
                let raw = scores.get(&d.name).copied().unwrap_or(0);
                d.weight * (f64::from(raw) / f64::from(d.max_raw))
            })
            .sum()
    }
}

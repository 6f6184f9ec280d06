//! Aggregate statistics over a finished batch

use serde::{Deserialize, Serialize};

use super::scorers::ScorerRegistry;
use crate::runner::RowOutcome;

/// How many lowest-composite examples a summary keeps
pub const NOTABLE_COUNT: usize = 5;

/// Mean raw score of one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub name: String,
    pub mean: f64,
    pub max_raw: u32,
}

/// An example among the lowest composites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowScorer {
    /// Position in the input batch
    pub index: usize,
    pub question: String,
    pub composite: f64,
}

/// Batch-level aggregate: per-dimension means, composite mean, and the
/// worst-scoring examples. Failed rows count toward `failed` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub dimensions: Vec<DimensionSummary>,
    pub composite_mean: f64,
    pub lowest: Vec<LowScorer>,
}

impl Summary {
    pub fn from_outcomes(registry: &ScorerRegistry, outcomes: &[RowOutcome]) -> Self {
        let scored: Vec<(usize, &super::EvaluationResult)> = outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.result().map(|r| (i, r)))
            .collect();

        let dimensions = registry
            .iter()
            .map(|def| DimensionSummary {
                name: def.name.clone(),
                mean: mean(scored.iter().map(|(_, r)| f64::from(r.score(&def.name).unwrap_or(0)))),
                max_raw: def.max_raw,
            })
            .collect();

        let composite_mean = mean(scored.iter().map(|(_, r)| r.composite()));

        // sort_by is stable, so ties keep input order
        let mut ranked = scored.clone();
        ranked.sort_by(|a, b| {
            a.1.composite()
                .partial_cmp(&b.1.composite())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let lowest = ranked
            .into_iter()
            .take(NOTABLE_COUNT)
            .map(|(index, r)| LowScorer {
                index,
                question: r.example().question.clone(),
                composite: r.composite(),
            })
            .collect();

        Self {
            total: outcomes.len(),
            scored: scored.len(),
            failed: outcomes.len() - scored.len(),
            dimensions,
            composite_mean,
            lowest,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

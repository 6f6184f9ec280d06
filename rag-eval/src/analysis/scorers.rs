//! Scoring dimensions and the registry that fixes their order
//!
//! Every dimension pairs a deterministic heuristic with a rubric prompt for
//! the external judge. Both map an [`Example`] to a raw integer in
//! `[0, max_raw]`; the registry's order is the order of result columns.

use std::collections::HashSet;

use crate::config::ConfigError;
use crate::data::Example;

/// Deterministic scoring rule over an example's text
pub type HeuristicFn = fn(&Example) -> u32;

/// Builds the rubric prompt sent to the external judge
pub type RubricFn = fn(&Example) -> String;

/// Allowed drift of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One quality dimension
#[derive(Clone)]
pub struct ScorerDefinition {
    pub name: String,
    /// Inclusive upper bound of the raw score scale
    pub max_raw: u32,
    /// Aggregation weight in the composite
    pub weight: f64,
    pub heuristic: HeuristicFn,
    pub rubric: RubricFn,
}

impl ScorerDefinition {
    pub fn new(
        name: impl Into<String>,
        max_raw: u32,
        weight: f64,
        heuristic: HeuristicFn,
        rubric: RubricFn,
    ) -> Self {
        Self {
            name: name.into(),
            max_raw,
            weight,
            heuristic,
            rubric,
        }
    }
}

impl std::fmt::Debug for ScorerDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerDefinition")
            .field("name", &self.name)
            .field("max_raw", &self.max_raw)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Ordered, validated, immutable set of scoring dimensions
#[derive(Debug, Clone)]
pub struct ScorerRegistry {
    definitions: Vec<ScorerDefinition>,
}

impl ScorerRegistry {
    /// Validate and build a registry.
    ///
    /// Empty registries, duplicate names, a zero `max_raw` and negative or
    /// non-finite weights are errors. A weight sum away from 1.0 is only
    /// logged; use [`ScorerRegistry::strict`] to reject it.
    pub fn new(definitions: Vec<ScorerDefinition>) -> Result<Self, ConfigError> {
        validate(&definitions)?;

        let sum = weight_sum(&definitions);
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            tracing::warn!(
                "Scorer weights sum to {:.4}; composite scores will range over [0, {:.4}]",
                sum,
                sum
            );
        }

        Ok(Self { definitions })
    }

    /// Like [`ScorerRegistry::new`], but weights must sum to 1.0
    pub fn strict(definitions: Vec<ScorerDefinition>) -> Result<Self, ConfigError> {
        validate(&definitions)?;

        let sum = weight_sum(&definitions);
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }

        Ok(Self { definitions })
    }

    /// The five standard RAG dimensions, validated like any other registry
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(standard_definitions())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScorerDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ScorerDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Dimension names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn weight_sum(&self) -> f64 {
        weight_sum(&self.definitions)
    }
}

fn weight_sum(definitions: &[ScorerDefinition]) -> f64 {
    definitions.iter().map(|d| d.weight).sum()
}

fn validate(definitions: &[ScorerDefinition]) -> Result<(), ConfigError> {
    if definitions.is_empty() {
        return Err(ConfigError::EmptyRegistry);
    }

    let mut seen = HashSet::new();
    for def in definitions {
        if !seen.insert(def.name.as_str()) {
            return Err(ConfigError::DuplicateScorer(def.name.clone()));
        }
        if def.max_raw == 0 {
            return Err(ConfigError::InvalidMaxRaw {
                name: def.name.clone(),
            });
        }
        if !def.weight.is_finite() || def.weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                name: def.name.clone(),
                weight: def.weight,
            });
        }
    }

    Ok(())
}

pub const ACCURACY: &str = "Accuracy";
pub const EVIDENCE: &str = "Use of Evidence";
pub const RELEVANCE: &str = "Relevance";
pub const COHERENCE: &str = "Coherence & Clarity";
pub const CONCISENESS: &str = "Conciseness";

/// Standard dimensions in registration order
pub fn standard_definitions() -> Vec<ScorerDefinition> {
    vec![
        ScorerDefinition::new(ACCURACY, 3, 0.30, accuracy_heuristic, accuracy_rubric),
        ScorerDefinition::new(EVIDENCE, 2, 0.20, evidence_heuristic, evidence_rubric),
        ScorerDefinition::new(RELEVANCE, 3, 0.20, relevance_heuristic, relevance_rubric),
        ScorerDefinition::new(COHERENCE, 2, 0.15, coherence_heuristic, coherence_rubric),
        ScorerDefinition::new(CONCISENESS, 1, 0.05, conciseness_heuristic, conciseness_rubric),
    ]
}

// Heuristics

/// Lowercased whitespace tokens, punctuation kept
fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect()
}

fn overlap(a: &str, b: &str) -> usize {
    let left = token_set(a);
    let right = token_set(b);
    left.intersection(&right).count()
}

fn fragment_overlap(example: &Example) -> usize {
    overlap(&example.fragments.join(" "), &example.answer)
}

/// Bucket a count by ascending exclusive thresholds
fn bucket(count: usize, thresholds: &[usize]) -> u32 {
    thresholds.iter().take_while(|&&t| count >= t).count() as u32
}

pub fn accuracy_heuristic(example: &Example) -> u32 {
    bucket(fragment_overlap(example), &[3, 6, 10])
}

pub fn evidence_heuristic(example: &Example) -> u32 {
    if fragment_overlap(example) == 0 {
        0
    } else if example.answer.contains('[') && example.answer.contains(']') {
        2
    } else {
        1
    }
}

pub fn relevance_heuristic(example: &Example) -> u32 {
    bucket(overlap(&example.question, &example.answer), &[2, 4, 7])
}

pub fn coherence_heuristic(example: &Example) -> u32 {
    let sentences: Vec<&str> = example
        .answer
        .split('.')
        .filter(|s| !s.trim().is_empty())
        .collect();

    if sentences.is_empty() {
        return 0;
    }

    let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    let avg_len = words as f64 / sentences.len() as f64;

    if !(5.0..=30.0).contains(&avg_len) {
        1
    } else {
        2
    }
}

pub fn conciseness_heuristic(example: &Example) -> u32 {
    if example.answer.split_whitespace().count() <= 50 {
        1
    } else {
        0
    }
}

// Rubrics

const EVALUATOR_PREAMBLE: &str = "You are an expert evaluator of answers produced by a retrieval-augmented assistant.";
const INTEGER_ONLY: &str = "Reply with the integer score only, in plain text.";

fn rubric_prompt(context: &str, levels: &[&str]) -> String {
    let scale: Vec<String> = levels
        .iter()
        .enumerate()
        .map(|(score, level)| format!("{} = {}", score, level))
        .collect();

    format!(
        "{}\n\n{}\n\nScore using this rubric:\n{}\n\n{}",
        EVALUATOR_PREAMBLE,
        context,
        scale.join("\n"),
        INTEGER_ONLY
    )
}

fn passages_and_answer(example: &Example) -> String {
    format!(
        "Source passages:\n{}\n\nAnswer:\n{}",
        example.fragments_text(),
        example.answer
    )
}

pub fn accuracy_rubric(example: &Example) -> String {
    rubric_prompt(
        &passages_and_answer(example),
        &[
            "The answer contains factual errors.",
            "Mostly correct, with small mistakes.",
            "Correct on the major points but misses a minor detail.",
            "Matches all information in the passages.",
        ],
    )
}

pub fn evidence_rubric(example: &Example) -> String {
    rubric_prompt(
        &passages_and_answer(example),
        &[
            "The retrieved passages are not used.",
            "Passages are paraphrased or mentioned without a citation.",
            "Passages are clearly cited or integrated.",
        ],
    )
}

pub fn relevance_rubric(example: &Example) -> String {
    rubric_prompt(
        &format!("User question:\n{}\n\nAnswer:\n{}", example.question, example.answer),
        &[
            "Off-topic.",
            "Partially addresses the question.",
            "Addresses the question but misses nuance.",
            "Fully and directly addresses the user's question.",
        ],
    )
}

pub fn coherence_rubric(example: &Example) -> String {
    rubric_prompt(
        &format!("Judge the coherence and clarity of this answer:\n{}", example.answer),
        &[
            "Disjointed or contradictory.",
            "Understandable but awkward.",
            "Very clear and well structured.",
        ],
    )
}

pub fn conciseness_rubric(example: &Example) -> String {
    rubric_prompt(
        &format!("Judge the conciseness of this answer:\n{}", example.answer),
        &[
            "Verbose or repetitive.",
            "Succinct; every sentence adds value.",
        ],
    )
}

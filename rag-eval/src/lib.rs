//! Quality scoring for retrieval-augmented generation answers
//!
//! This crate scores generated answers against their retrieved passages and
//! the user's question on several independent dimensions, and combines the
//! raw scores into one weighted composite per example.
//!
//! # Features
//!
//! - Five standard dimensions: accuracy, use of evidence, relevance,
//!   coherence and conciseness
//! - Two interchangeable scoring modes: deterministic heuristics, or rubric
//!   prompts judged by an external model (Mistral)
//! - Sequential batch evaluation with an explicit abort / best-effort policy
//! - CSV results, Markdown and JSON summaries
//!
//! # Example
//!
//! ```no_run
//! use rag_eval::{
//!     analysis::{Judge, ScorerRegistry, Summary},
//!     config::{FailurePolicy, ScoringMode},
//!     data::Example,
//!     runner::BatchRunner,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ScorerRegistry::standard()?;
//!     let judge = Judge::new(&registry, ScoringMode::Heuristic, None)?;
//!     let runner = BatchRunner::new(judge, FailurePolicy::Abort);
//!
//!     let examples = vec![Example::new(
//!         "What color is the sky?",
//!         ["The sky is blue."],
//!         "The sky is blue.",
//!     )];
//!
//!     let outcomes = runner.run(&examples).await?;
//!     let summary = Summary::from_outcomes(&registry, &outcomes);
//!     println!("composite mean: {:.2}", summary.composite_mean);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod providers;
pub mod reporting;
pub mod runner;

pub use config::{Config, FailurePolicy, ScoringMode};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        EvaluationResult, Judge, ScorerDefinition, ScorerRegistry, ScoringError, Summary,
    };
    pub use crate::config::{Config, ConfigError, FailurePolicy, ScoringMode};
    pub use crate::data::{load_examples_from_csv, Example, LoadError};
    pub use crate::providers::{
        create_client, JudgmentClient, MistralClient, ProviderError, ProviderResult,
    };
    pub use crate::reporting::{
        print_console_report, render_markdown, write_markdown_summary, write_results_csv,
        JsonSummary, ReportError,
    };
    pub use crate::runner::{BatchError, BatchRunner, RowOutcome};
}

//! Results reporting

pub mod csv_writer;

pub use csv_writer::{result_columns, write_results, write_results_csv, COMPOSITE_COLUMN, ERROR_COLUMN};

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

use crate::analysis::{DimensionSummary, LowScorer, Summary};

/// Reporting errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON summary export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub run_id: String,
    pub timestamp: String,
    pub mode: String,
    pub seed: u64,
    pub total_examples: usize,
    pub scored_examples: usize,
    pub failed_examples: usize,
    pub dimensions: Vec<DimensionSummary>,
    pub composite_mean: f64,
    pub lowest: Vec<LowScorer>,
    pub detailed_results_file: String,
}

impl JsonSummary {
    /// Create from an aggregate summary
    pub fn from_summary(
        run_id: impl Into<String>,
        mode: impl Into<String>,
        seed: u64,
        summary: &Summary,
        detailed_file: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: mode.into(),
            seed,
            total_examples: summary.total,
            scored_examples: summary.scored,
            failed_examples: summary.failed,
            dimensions: summary.dimensions.clone(),
            composite_mean: summary.composite_mean,
            lowest: summary.lowest.clone(),
            detailed_results_file: detailed_file.into(),
        }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Render the Markdown summary report
pub fn render_markdown(summary: &Summary, timestamp: &str) -> String {
    let mut md = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(md, "# RAG Evaluation Summary ({})\n", timestamp);

    let _ = writeln!(md, "## Aggregate Scores");
    let _ = writeln!(md, "| Dimension | Average Score | Max Score |");
    let _ = writeln!(md, "|-----------|:-------------:|:---------:|");
    for dim in &summary.dimensions {
        let _ = writeln!(md, "| {} | {:.2} | {} |", dim.name, dim.mean, dim.max_raw);
    }
    let _ = writeln!(md, "| Composite | {:.2} | 1 |", summary.composite_mean);
    md.push('\n');

    if summary.failed > 0 {
        let _ = writeln!(
            md,
            "_{} of {} examples could not be scored and are excluded above._\n",
            summary.failed, summary.total
        );
    }

    let _ = writeln!(md, "## Notable Failures (Lowest Composite)");
    for low in &summary.lowest {
        let _ = writeln!(md, "- Composite {:.2}/1.00: {}", low.composite, low.question);
    }

    md
}

/// Write the Markdown summary, creating parent directories as needed
pub fn write_markdown_summary(
    path: impl AsRef<Path>,
    summary: &Summary,
    timestamp: &str,
) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_markdown(summary, timestamp))?;
    Ok(())
}

/// Generate a console report
pub fn print_console_report(summary: &Summary) {
    println!("\n=== RAG Evaluation Results ===\n");
    println!(
        "Examples: {} ({} scored, {} failed)\n",
        summary.total, summary.scored, summary.failed
    );

    println!("{:<24} {:>8} {:>6}", "Dimension", "Average", "Max");
    println!("{:-<40}", "");
    for dim in &summary.dimensions {
        println!("{:<24} {:>8.2} {:>6}", dim.name, dim.mean, dim.max_raw);
    }
    println!("{:<24} {:>8.3} {:>6}", "Composite", summary.composite_mean, 1);

    if !summary.lowest.is_empty() {
        println!("\nLowest Composite:");
        println!("{:-<40}", "");
        for low in &summary.lowest {
            println!("  #{:<4} {:.3}  {}", low.index, low.composite, low.question);
        }
    }

    println!("\n{:=<40}", "");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            total: 3,
            scored: 2,
            failed: 1,
            dimensions: vec![
                DimensionSummary {
                    name: "Accuracy".to_string(),
                    mean: 1.5,
                    max_raw: 3,
                },
                DimensionSummary {
                    name: "Conciseness".to_string(),
                    mean: 1.0,
                    max_raw: 1,
                },
            ],
            composite_mean: 0.4166,
            lowest: vec![
                LowScorer {
                    index: 2,
                    question: "Why is the sky blue?".to_string(),
                    composite: 0.25,
                },
                LowScorer {
                    index: 0,
                    question: "What is RAG?".to_string(),
                    composite: 0.583,
                },
            ],
        }
    }

    #[test]
    fn test_render_markdown() {
        let md = render_markdown(&summary(), "2025-01-02_03-04-05");

        assert!(md.starts_with("# RAG Evaluation Summary (2025-01-02_03-04-05)\n"));
        assert!(md.contains("| Accuracy | 1.50 | 3 |"));
        assert!(md.contains("| Conciseness | 1.00 | 1 |"));
        assert!(md.contains("| Composite | 0.42 | 1 |"));
        assert!(md.contains("_1 of 3 examples could not be scored"));
        assert!(md.contains("- Composite 0.25/1.00: Why is the sky blue?\n- Composite 0.58/1.00: What is RAG?"));
    }

    #[test]
    fn test_json_summary_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        let json = JsonSummary::from_summary("run-1", "heuristic", 42, &summary(), "evaluated.csv");
        json.write_to_file(&path).unwrap();

        let loaded: JsonSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.failed_examples, 1);
        assert_eq!(loaded.dimensions, summary().dimensions);
    }

    #[test]
    fn test_write_markdown_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("summary.md");

        write_markdown_summary(&path, &summary(), "now").unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("## Notable Failures"));
    }
}

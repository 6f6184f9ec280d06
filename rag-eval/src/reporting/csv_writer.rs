//! Detailed per-example results as CSV

use std::io::Write;
use std::path::Path;

use super::ReportError;
use crate::analysis::ScorerRegistry;
use crate::data::{ANSWER_COLUMN, FRAGMENTS_COLUMN, HISTORY_COLUMN, QUESTION_COLUMN};
use crate::runner::RowOutcome;

/// Column holding the weighted composite
pub const COMPOSITE_COLUMN: &str = "Composite";
/// Column holding the failure message of a skipped row
pub const ERROR_COLUMN: &str = "Error";

/// Header row: input columns, one column per dimension in registry order,
/// then composite and error
pub fn result_columns(registry: &ScorerRegistry) -> Vec<String> {
    let mut columns: Vec<String> = [QUESTION_COLUMN, HISTORY_COLUMN, FRAGMENTS_COLUMN, ANSWER_COLUMN]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(registry.names().into_iter().map(String::from));
    columns.push(COMPOSITE_COLUMN.to_string());
    columns.push(ERROR_COLUMN.to_string());
    columns
}

/// Write results to a CSV file
pub fn write_results_csv(
    path: impl AsRef<Path>,
    registry: &ScorerRegistry,
    outcomes: &[RowOutcome],
) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    write_results(file, registry, outcomes)
}

/// Write results to any sink
pub fn write_results<W: Write>(
    sink: W,
    registry: &ScorerRegistry,
    outcomes: &[RowOutcome],
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(sink);
    wtr.write_record(result_columns(registry))?;

    for outcome in outcomes {
        let example = outcome.example();
        let mut record = vec![
            example.question.clone(),
            example.history.clone(),
            example.fragments_text(),
            example.answer.clone(),
        ];

        match outcome {
            RowOutcome::Scored(result) => {
                for name in registry.names() {
                    record.push(result.score(name).map(|s| s.to_string()).unwrap_or_default());
                }
                record.push(result.composite().to_string());
                record.push(String::new());
            }
            RowOutcome::Failed { error, .. } => {
                record.extend(std::iter::repeat(String::new()).take(registry.len() + 1));
                record.push(error.clone());
            }
        }

        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

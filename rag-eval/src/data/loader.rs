//! Example loading from CSV files

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::Example;

/// Error type for example loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw CSV row; any missing column reads as empty
#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(rename = "Current User Question", default)]
    question: String,
    #[serde(rename = "Conversation History", default)]
    history: String,
    #[serde(rename = "Fragment Texts", default)]
    fragments: String,
    #[serde(rename = "Assistant Answer", default)]
    answer: String,
}

impl From<CsvRow> for Example {
    fn from(row: CsvRow) -> Self {
        Example {
            question: row.question.trim().to_string(),
            history: row.history.trim().to_string(),
            fragments: split_fragments(&row.fragments),
            answer: row.answer.trim().to_string(),
        }
    }
}

/// Load examples from a CSV file
pub fn load_examples_from_csv(path: impl AsRef<Path>) -> Result<Vec<Example>, LoadError> {
    let file = std::fs::File::open(path)?;
    load_examples_from_reader(file)
}

/// Load examples from any CSV source with a header row
pub fn load_examples_from_reader<R: Read>(reader: R) -> Result<Vec<Example>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut examples = Vec::new();
    for record in rdr.deserialize::<CsvRow>() {
        examples.push(Example::from(record?));
    }

    tracing::debug!("Loaded {} examples", examples.len());
    Ok(examples)
}

/// Split newline-separated fragment text, dropping blank pieces
fn split_fragments(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(String::from)
        .collect()
}

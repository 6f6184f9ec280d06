//! Evaluation examples and loading

pub mod loader;

pub use loader::{load_examples_from_csv, load_examples_from_reader, LoadError};

use serde::{Deserialize, Serialize};

/// Column holding the user's current question
pub const QUESTION_COLUMN: &str = "Current User Question";
/// Column holding the prior conversation, newline-delimited
pub const HISTORY_COLUMN: &str = "Conversation History";
/// Column holding retrieved passages, one per line
pub const FRAGMENTS_COLUMN: &str = "Fragment Texts";
/// Column holding the generated answer under evaluation
pub const ANSWER_COLUMN: &str = "Assistant Answer";

/// One question/history/fragments/answer tuple under evaluation.
///
/// Every field is always present; absent input values are empty strings or
/// an empty fragment list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub history: String,
    pub fragments: Vec<String>,
    pub answer: String,
}

impl Example {
    /// Create an example with no history
    pub fn new<I, S>(question: impl Into<String>, fragments: I, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            history: String::new(),
            fragments: fragments.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = history.into();
        self
    }

    /// Fragments joined with line breaks, the way they are stored in CSV
    pub fn fragments_text(&self) -> String {
        self.fragments.join("\n")
    }
}

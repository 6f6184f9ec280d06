//! External judgment clients

pub mod mistral;
pub mod traits;

pub use mistral::MistralClient;
pub use traits::{parse_judgment, JudgmentClient, ProviderError, ProviderResult};

use std::sync::Arc;

use crate::config::{ClientConfig, ScoringMode};

/// Create the judgment client a scoring mode needs.
///
/// Heuristic mode needs no client and returns `None` without touching the
/// environment; external mode fails if the API key is missing.
pub fn create_client(
    mode: ScoringMode,
    config: &ClientConfig,
) -> ProviderResult<Option<Arc<dyn JudgmentClient>>> {
    match mode {
        ScoringMode::Heuristic => Ok(None),
        ScoringMode::External => {
            let client = MistralClient::from_config(config)?;
            tracing::info!("Using {} judge ({})", client.name(), client.model());
            Ok(Some(Arc::new(client)))
        }
    }
}

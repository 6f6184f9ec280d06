//! Judgment client trait definitions

use async_trait::async_trait;

/// Error types for judgment client operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Malformed judgment: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Auth(_) | ProviderError::Malformed(_) | ProviderError::Config(_) => {
                false
            }
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// An external service that turns a rubric prompt into an integer score
#[async_trait]
pub trait JudgmentClient: Send + Sync {
    /// Client name for logs (e.g., "mistral")
    fn name(&self) -> &str;

    /// Score a rubric prompt
    async fn judge(&self, prompt: &str) -> ProviderResult<i64>;
}

/// Parse a judgment reply that should contain only an integer
pub fn parse_judgment(text: &str) -> ProviderResult<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ProviderError::Malformed(format!("expected an integer, got {:?}", trimmed)))
}

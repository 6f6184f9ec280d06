//! Mistral completions client used as the external judge

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::traits::{parse_judgment, JudgmentClient, ProviderError, ProviderResult};
use crate::config::ClientConfig;
use crate::runner::rate_limiter::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
const DEFAULT_MODEL: &str = "mistral-7b-instruct";

/// Environment variable that overrides the configured model
pub const MODEL_ENV: &str = "MISTRAL_MODEL";

/// Mistral completions client.
///
/// Each [`judge`](JudgmentClient::judge) call is one logical judgment: the
/// client retries transient failures with exponential backoff and gives up
/// immediately on auth errors or replies that are not an integer.
pub struct MistralClient {
    api_key: String,
    base_url: String,
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry_count: u32,
    retry_delay_ms: u64,
    max_retry_delay_ms: u64,
    timeout_ms: u64,
}

impl MistralClient {
    /// Create a new client with default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: Client::new(),
            rate_limiter: Arc::new(RateLimiter::new(defaults.rpm)),
            model: DEFAULT_MODEL.to_string(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            retry_count: defaults.retry_count,
            retry_delay_ms: defaults.retry_delay_ms,
            max_retry_delay_ms: defaults.max_retry_delay_ms,
            timeout_ms: defaults.timeout_ms,
        }
    }

    /// Create from configuration, reading the API key from the configured
    /// environment variable. `MISTRAL_MODEL` overrides the configured model.
    pub fn from_config(config: &ClientConfig) -> ProviderResult<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ProviderError::Config(format!("{} not set", config.api_key_env)))?;
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| config.model.clone());

        Ok(Self::new(api_key)
            .with_base_url(&config.base_url)
            .with_model(model)
            .with_rate_limit(config.rpm)
            .with_sampling(config.temperature, config.max_tokens)
            .with_retries(config.retry_count, config.retry_delay_ms, config.max_retry_delay_ms)
            .with_timeout_ms(config.timeout_ms))
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set requests-per-minute limit
    pub fn with_rate_limit(mut self, rpm: u32) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(rpm));
        self
    }

    /// Share a rate limiter with other clients
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Set retry count and backoff bounds
    pub fn with_retries(mut self, retry_count: u32, delay_ms: u64, max_delay_ms: u64) -> Self {
        self.retry_count = retry_count;
        self.retry_delay_ms = delay_ms;
        self.max_retry_delay_ms = max_delay_ms;
        self
    }

    /// Set per-attempt timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}/completions", self.base_url, self.model)
    }

    /// Single completion attempt, bounded by the configured timeout.
    /// Callers hold a rate-limit guard; waiting for it is not timed.
    async fn try_complete(&self, prompt: &str) -> ProviderResult<String> {
        let timeout = Duration::from_millis(self.timeout_ms);
        match tokio::time::timeout(timeout, self.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                timeout_ms: self.timeout_ms,
            }),
        }
    }

    /// Send one completion request and return the trimmed text
    async fn complete(&self, prompt: &str) -> ProviderResult<String> {
        let start = Instant::now();

        let body = CompletionBody {
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            n: 1,
            stop: ["\n"],
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60)
                .saturating_mul(1000);
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<MistralError>(&body) {
                Ok(error) => error.message,
                Err(_) => format!("HTTP {}: {}", status.as_u16(), body),
            };

            if status == 401 || status == 403 {
                return Err(ProviderError::Auth(format!(
                    "Mistral rejected credentials ({}): {}",
                    status.as_u16(),
                    message
                )));
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionReply = response.json().await?;

        tracing::debug!(
            "Mistral completion in {}ms",
            start.elapsed().as_millis()
        );

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Malformed("No choices in response".to_string()))?;

        Ok(choice.text.trim().to_string())
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    n: u32,
    stop: [&'a str; 1],
}

#[derive(Deserialize)]
struct CompletionReply {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct MistralError {
    message: String,
}

#[async_trait]
impl JudgmentClient for MistralClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn judge(&self, prompt: &str) -> ProviderResult<i64> {
        let mut delay = self.retry_delay_ms;
        let mut attempt = 0;

        loop {
            let _guard = self.rate_limiter.acquire().await;
            let error = match self.try_complete(prompt).await {
                Ok(text) => return parse_judgment(&text),
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.retry_count {
                tracing::error!("Judgment failed on {} after {} attempt(s): {}", self.model, attempt + 1, error);
                return Err(error);
            }

            attempt += 1;
            let wait = match &error {
                ProviderError::RateLimited { retry_after_ms } => {
                    (*retry_after_ms).min(self.max_retry_delay_ms)
                }
                _ => delay,
            };
            tracing::warn!("Retry {} on {} in {}ms: {}", attempt, self.model, wait, error);
            sleep(Duration::from_millis(wait)).await;
            delay = delay.saturating_mul(2).min(self.max_retry_delay_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        serve_with_headers(responses.into_iter().map(|(status, body)| (status, "", body)).collect()).await
    }

    /// Serve the given canned HTTP responses, one per connection, and
    /// return the base URL plus a handle yielding the raw requests received.
    /// Extra headers are written verbatim and must end in `\r\n`.
    async fn serve_with_headers(
        responses: Vec<(u16, &'static str, &'static str)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, headers, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 {} X\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    headers,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            requests
        });

        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let head = &text[..split];
                let content_length = head
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn client(base_url: &str) -> MistralClient {
        MistralClient::new("test-key")
            .with_base_url(base_url)
            .with_model("judge-model")
            .with_retries(2, 1, 5)
            .with_timeout_ms(5_000)
    }

    #[tokio::test]
    async fn test_judge_parses_integer_reply() {
        let (url, server) = serve(vec![(200, r#"{"choices":[{"text":" 2\n"}]}"#)]).await;

        let score = client(&url).judge("rate this").await.unwrap();
        assert_eq!(score, 2);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /models/judge-model/completions"));
        assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer test-key"));
        assert!(requests[0].contains(r#""prompt":"rate this""#));
        assert!(requests[0].contains(r#""stop":["\n"]"#));
    }

    #[tokio::test]
    async fn test_judge_retries_server_errors() {
        let (url, server) = serve(vec![
            (503, r#"{"message":"overloaded"}"#),
            (200, r#"{"choices":[{"text":"1"}]}"#),
        ])
        .await;

        assert_eq!(client(&url).judge("p").await.unwrap(), 1);
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_judge_does_not_retry_auth_errors() {
        let (url, server) = serve(vec![(401, r#"{"message":"bad key"}"#)]).await;

        let err = client(&url).judge("p").await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_judge_rejects_non_integer_reply() {
        let (url, _server) = serve(vec![(200, r#"{"choices":[{"text":"three"}]}"#)]).await;

        let err = client(&url).judge("p").await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_wait_is_not_part_of_timeout() {
        let (url, server) = serve(vec![
            (200, r#"{"choices":[{"text":"1"}]}"#),
            (200, r#"{"choices":[{"text":"2"}]}"#),
        ])
        .await;

        // Second call waits ~500ms for the limiter, longer than the timeout
        let limiter = Arc::new(RateLimiter::with_window(1, Duration::from_millis(500)));
        let client = client(&url)
            .with_rate_limiter(limiter)
            .with_retries(0, 1, 5)
            .with_timeout_ms(300);

        assert_eq!(client.judge("p").await.unwrap(), 1);
        let start = Instant::now();
        assert_eq!(client.judge("p").await.unwrap(), 2);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_after_is_capped() {
        let (url, server) = serve_with_headers(vec![
            (429, "Retry-After: 18446744073709552\r\n", r#"{"message":"slow down"}"#),
            (200, "", r#"{"choices":[{"text":"3"}]}"#),
        ])
        .await;

        let start = Instant::now();
        assert_eq!(client(&url).judge("p").await.unwrap(), 3);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ClientConfig {
            api_key_env: "RAG_EVAL_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            MistralClient::from_config(&config),
            Err(ProviderError::Config(_))
        ));
    }
}

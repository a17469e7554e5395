//! Async Gemini `generateContent` client.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::core::config::ModelConfig;
use crate::core::errors::{AssistantError, AssistantResult};
use crate::llm::types::{GenerateContentRequest, GenerateContentResponse};

/// Connection timeout for model requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Boxed future type for model backend operations.
pub type ModelFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can answer a `generateContent` request.
pub trait ModelBackend: Send + Sync {
    /// Run one generation round.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    fn generate<'a>(
        &'a self,
        request: &'a GenerateContentRequest,
    ) -> ModelFuture<'a, AssistantResult<GenerateContentResponse>>;
}

/// HTTP client for the hosted model.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client for the configured model.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn new(config: &ModelConfig) -> AssistantResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()?;

        let base = url::Url::parse(config.base_url.trim_end_matches('/'))?;
        let endpoint = format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a request and decode the response.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or a malformed body.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> AssistantResult<GenerateContentResponse> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Upstream {
                service: "gemini",
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        tracing::info!(
            elapsed = ?started.elapsed(),
            total_tokens = body.usage_metadata.map_or(0, |u| u.total_token_count),
            "model round completed"
        );
        Ok(body)
    }
}

impl ModelBackend for GeminiClient {
    fn generate<'a>(
        &'a self,
        request: &'a GenerateContentRequest,
    ) -> ModelFuture<'a, AssistantResult<GenerateContentResponse>> {
        Box::pin(self.generate_content(request))
    }
}

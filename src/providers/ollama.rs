//! Ollama completion backend
//!
//! Endpoint: POST /api/generate (non-streaming). Transient failures are
//! retried with backoff before surfacing as `NetError::Provider`.

use crate::errors::{NetError, Result};
use crate::providers::retry::RetryManager;
use crate::providers::{CompletionOptions, CompletionProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Request timeout (30 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ollama HTTP client
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    retry: RetryManager,
}

impl OllamaProvider {
    /// Create client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, REQUEST_TIMEOUT, RetryManager::new())
    }

    /// Create client with custom configuration
    pub fn with_config(base_url: &str, timeout: Duration, retry: RetryManager) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NetError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn generate_once(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &options.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NetError::Provider(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NetError::Provider(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| NetError::Provider(format!("Failed to parse response: {}", e)))?;

        Ok(body.response)
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        debug!(model = %options.model, prompt_len = prompt.len(), "ollama generate");
        self.retry
            .execute_with_retry(|| async { self.generate_once(prompt, options).await })
            .await
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

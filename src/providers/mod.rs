//! Completion providers
//!
//! The engine treats language-model backends as an opaque text-completion
//! capability. Everything that talks to a model goes through [`ModelClient`],
//! which bundles the provider with generation options and a hard timeout.

pub mod demo;
pub mod fallback;
pub mod ollama;
pub mod retry;
pub mod scripted;

use crate::config::Config;
use crate::errors::{NetError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use demo::DemoProvider;
pub use fallback::FallbackProvider;
pub use ollama::OllamaProvider;
pub use retry::RetryManager;
pub use scripted::ScriptedProvider;

/// Headroom between a live backend's deadline and the client's own timeout
const FALLBACK_GRACE: Duration = Duration::from_secs(1);

/// Generation parameters passed with every prompt
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "qwen2.5:7b-instruct".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

/// Text-completion capability
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// Provider + options + timeout, cheap to clone
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn CompletionProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl ModelClient {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        options: CompletionOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            options,
            timeout,
        }
    }

    /// Build the provider stack described by the configuration
    ///
    /// A live backend gets `provider_timeout` in total, split across its retry
    /// attempts; past that the demo reply is used. The client's own deadline
    /// sits `FALLBACK_GRACE` beyond it so the fallback always gets to answer.
    pub fn from_config(config: &Config) -> Result<Self> {
        let deadline = config.provider_timeout();
        let (provider, timeout): (Arc<dyn CompletionProvider>, Duration) =
            match config.provider.kind.as_str() {
                "demo" => (Arc::new(DemoProvider::new()), deadline),
                "ollama" => {
                    let retry = RetryManager::with_config(config.provider.max_retries, 500);
                    let ollama = OllamaProvider::with_config(
                        &config.provider.base_url,
                        deadline / retry.max_retries(),
                        retry,
                    )?;
                    (
                        Arc::new(FallbackProvider::with_deadline(Arc::new(ollama), deadline)),
                        deadline + FALLBACK_GRACE,
                    )
                }
                other => {
                    return Err(NetError::ConfigError(format!(
                        "Unknown provider kind: {}",
                        other
                    )))
                }
            };

        let options = CompletionOptions {
            model: config.provider.model.clone(),
            max_tokens: config.provider.max_tokens,
            temperature: config.provider.temperature,
        };

        Ok(Self::new(provider, options, timeout))
    }

    /// Complete a prompt, failing with `ProviderTimeout` once the deadline passes
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.provider.complete(prompt, &self.options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(NetError::ProviderTimeout {
                duration_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }
}

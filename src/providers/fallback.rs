//! Primary provider with a deterministic demo fallback

use crate::errors::Result;
use crate::providers::{CompletionOptions, CompletionProvider, DemoProvider};
use crate::errors::NetError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Answers from the primary; substitutes the demo reply when the primary
/// fails or misses its deadline
pub struct FallbackProvider {
    primary: Arc<dyn CompletionProvider>,
    fallback: DemoProvider,
    deadline: Option<Duration>,
    name: String,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn CompletionProvider>) -> Self {
        let name = format!("{}+demo", primary.name());
        Self {
            primary,
            fallback: DemoProvider::new(),
            deadline: None,
            name,
        }
    }

    /// Give the primary at most `deadline` before falling back
    pub fn with_deadline(primary: Arc<dyn CompletionProvider>, deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::new(primary)
        }
    }

    async fn complete_primary(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let call = self.primary.complete(prompt, options);
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call).await.unwrap_or_else(|_| {
                Err(NetError::ProviderTimeout {
                    duration_ms: deadline.as_millis() as u64,
                })
            }),
            None => call.await,
        }
    }
}

#[async_trait]
impl CompletionProvider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        match self.complete_primary(prompt, options).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(provider = self.primary.name(), error = %e, "primary provider failed, using demo response");
                Ok(self.fallback.respond(prompt))
            }
        }
    }
}

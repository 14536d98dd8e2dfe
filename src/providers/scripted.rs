//! Closure-driven provider for tests and offline experiments

use crate::errors::{NetError, Result};
use crate::providers::{CompletionOptions, CompletionProvider};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Replies by calling a function of the prompt; records every prompt seen
#[derive(Clone)]
pub struct ScriptedProvider {
    responder: Arc<Responder>,
    delay: Option<Duration>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Same text for every prompt
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Always fails with a provider error
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(NetError::Provider(message.clone())))
    }

    /// Fixed text after a delay
    pub fn delayed(delay: Duration, text: &str) -> Self {
        let mut provider = Self::fixed(text);
        provider.delay = Some(delay);
        provider
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(prompt)
    }
}

//! Shared helpers for integration tests

#![allow(dead_code)]

use netpilot::agent::PromptTemplate;
use netpilot::device::{CLI_PROMPT_HEADER, REVIEW_PROMPT_HEADER};
use netpilot::providers::{
    CompletionOptions, CompletionProvider, DemoProvider, ModelClient, ScriptedProvider,
};
use netpilot::{Config, Engine, ExecutionStatus, NetError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const SECURE_CONFIG: &str = "hostname edge\n\
service password-encryption\n\
enable secret 9 $9$abc\n\
!\n\
interface Gig0/1\n \
description uplink\n \
ip address 10.0.0.1 255.255.255.0\n \
no shutdown\n\
!\n\
line vty 0 4\n \
transport input ssh\n\
!\n\
end\n";

pub const INSECURE_CONFIG: &str = "hostname edge\n\
enable password cisco\n\
line vty 0 4\n \
transport input telnet\n\
end\n";

pub async fn engine_with(provider: Arc<dyn CompletionProvider>) -> Engine {
    let model = ModelClient::new(provider, CompletionOptions::default(), Duration::from_secs(5));
    Engine::new(Config::default(), model)
        .await
        .expect("engine")
}

pub async fn demo_engine() -> Engine {
    engine_with(Arc::new(DemoProvider::new())).await
}

/// Answers every prompt kind the engine sends; generation yields `configuration`
pub fn network_provider(configuration: &str) -> ScriptedProvider {
    let configuration = configuration.to_string();
    ScriptedProvider::new(move |prompt: &str| {
        if prompt.contains(REVIEW_PROMPT_HEADER) {
            Ok(json!({ "valid": true, "issues": [] }).to_string())
        } else if prompt.contains(CLI_PROMPT_HEADER) {
            Ok("ok".to_string())
        } else if prompt.contains(PromptTemplate::ConfigurationGeneration.header()) {
            Ok(json!({ "configuration": configuration }).to_string())
        } else if prompt.contains(PromptTemplate::ConfigurationPlanning.header()) {
            Ok(json!({ "plan": "apply the change" }).to_string())
        } else {
            Ok("all interfaces healthy".to_string())
        }
    })
}

/// Fails planning prompts only
pub fn failing_planner() -> ScriptedProvider {
    ScriptedProvider::new(|prompt: &str| {
        if prompt.contains(PromptTemplate::ConfigurationPlanning.header()) {
            Err(NetError::Provider("model unavailable".into()))
        } else {
            Ok("{}".to_string())
        }
    })
}

pub async fn create_devices(engine: &Engine, names: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let device = engine
            .devices()
            .create_device(name, &format!("192.0.2.{}", i + 1))
            .await
            .expect("device");
        ids.push(device.id);
    }
    ids
}

pub fn assert_terminal(status: ExecutionStatus) {
    assert!(status.is_terminal(), "expected terminal status, got {}", status);
}

//! Deterministic demo generator
//!
//! Stands in for a live model so every pipeline stays demonstrable without
//! credentials. Replies are chosen by the template header found in the prompt
//! and are shaped like what the real prompts ask for.

use crate::agent::PromptTemplate;
use crate::device::simulator::{CLI_PROMPT_HEADER, REVIEW_PROMPT_HEADER};
use crate::errors::Result;
use crate::providers::{CompletionOptions, CompletionProvider};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_HOSTNAME: &str = "netpilot-demo";

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoProvider;

impl DemoProvider {
    pub fn new() -> Self {
        Self
    }

    /// Canned reply for a prompt
    pub fn respond(&self, prompt: &str) -> String {
        if prompt.contains(REVIEW_PROMPT_HEADER) {
            return json!({ "valid": true, "issues": [] }).to_string();
        }

        if prompt.contains(CLI_PROMPT_HEADER) {
            let command = field_value(prompt, "Command:").unwrap_or("?");
            let host = hostname_in(prompt);
            return format!("% Command '{}' accepted\n{}#", command, host);
        }

        if prompt.contains(PromptTemplate::ConfigurationGeneration.header()) {
            return json!({ "configuration": demo_configuration(hostname_in(prompt)) })
                .to_string();
        }

        if prompt.contains(PromptTemplate::ConfigurationPlanning.header()) {
            return json!({
                "plan": "1. Set the device hostname\n\
                         2. Enable password encryption and an enable secret\n\
                         3. Address GigabitEthernet0/1 and bring it up\n\
                         4. Restrict VTY access to SSH",
                "risks": ["Brief loss of management access while VTY lines are reconfigured"]
            })
            .to_string();
        }

        if prompt.contains(PromptTemplate::Validation.header()) {
            return json!({ "valid": true, "issues": [] }).to_string();
        }

        if prompt.contains(PromptTemplate::DeploymentPlanning.header()) {
            return json!({
                "steps": ["Apply to a canary device", "Verify interfaces", "Roll out to the rest"],
                "rollback": "Re-apply the saved startup configuration"
            })
            .to_string();
        }

        if prompt.contains(PromptTemplate::Troubleshooting.header()) {
            return format!(
                "Device {} looks healthy: management interface is up, no telnet access \
                 detected. Consider saving the running configuration to startup.",
                hostname_in(prompt)
            );
        }

        "Demo mode: no live model configured.".to_string()
    }
}

#[async_trait]
impl CompletionProvider for DemoProvider {
    fn name(&self) -> &str {
        "demo"
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        Ok(self.respond(prompt))
    }
}

/// Configuration text that passes the heuristic validator
pub fn demo_configuration(hostname: &str) -> String {
    format!(
        "hostname {}\n\
         service password-encryption\n\
         enable secret 9 $9$netpilot$demo\n\
         !\n\
         interface GigabitEthernet0/1\n \
         description managed by netpilot\n \
         ip address 10.10.10.1 255.255.255.0\n \
         no shutdown\n\
         !\n\
         line vty 0 4\n \
         transport input ssh\n \
         login local\n\
         !\n\
         end\n",
        hostname
    )
}

fn field_value<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(label))
        .map(str::trim)
}

fn hostname_in(prompt: &str) -> &str {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix("hostname "))
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(DEFAULT_HOSTNAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::validation::ConfigValidator;

    #[test]
    fn test_generation_reply_is_valid_configuration() {
        let prompt = format!(
            "{}\nContext:\nhostname edge-1\n",
            PromptTemplate::ConfigurationGeneration.prefix()
        );
        let reply: serde_json::Value =
            serde_json::from_str(&DemoProvider::new().respond(&prompt)).unwrap();
        let config = reply["configuration"].as_str().unwrap();

        assert!(config.starts_with("hostname edge-1\n"));
        assert!(ConfigValidator::new().validate(config).is_empty());
    }

    #[test]
    fn test_planning_reply_has_plan() {
        let prompt = PromptTemplate::ConfigurationPlanning.prefix();
        let reply: serde_json::Value =
            serde_json::from_str(&DemoProvider::new().respond(&prompt)).unwrap();
        assert!(reply["plan"].as_str().unwrap().contains("hostname"));
    }

    #[test]
    fn test_review_reply_is_valid() {
        let prompt = format!("{}\n...", REVIEW_PROMPT_HEADER);
        let reply: serde_json::Value =
            serde_json::from_str(&DemoProvider::new().respond(&prompt)).unwrap();
        assert_eq!(reply["valid"], json!(true));
    }

    #[test]
    fn test_cli_reply_echoes_command() {
        let prompt = format!("{}\nCommand: ping 10.0.0.1\nhostname r1\n", CLI_PROMPT_HEADER);
        let reply = DemoProvider::new().respond(&prompt);
        assert!(reply.contains("ping 10.0.0.1"));
        assert!(reply.ends_with("r1#"));
    }
}

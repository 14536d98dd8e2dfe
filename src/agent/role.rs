//! Agent roles and their prompt templates
//!
//! Roles form a closed set; each maps (with an optional pipeline stage) to
//! exactly one template, so adding a role without a template fails to compile.

use crate::errors::NetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of agent roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Configuration,
    Validation,
    Troubleshooting,
    Deployment,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Configuration,
        AgentRole::Validation,
        AgentRole::Troubleshooting,
        AgentRole::Deployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Configuration => "configuration",
            AgentRole::Validation => "validation",
            AgentRole::Troubleshooting => "troubleshooting",
            AgentRole::Deployment => "deployment",
        }
    }

    /// Template for this role, refined by the pipeline stage tag
    pub fn template(&self, stage: Option<&str>) -> PromptTemplate {
        match (self, stage) {
            (AgentRole::Configuration, Some("generation")) => PromptTemplate::ConfigurationGeneration,
            (AgentRole::Configuration, _) => PromptTemplate::ConfigurationPlanning,
            (AgentRole::Validation, _) => PromptTemplate::Validation,
            (AgentRole::Troubleshooting, _) => PromptTemplate::Troubleshooting,
            (AgentRole::Deployment, _) => PromptTemplate::DeploymentPlanning,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "configuration" => Ok(AgentRole::Configuration),
            "validation" => Ok(AgentRole::Validation),
            "troubleshooting" => Ok(AgentRole::Troubleshooting),
            "deployment" => Ok(AgentRole::Deployment),
            other => Err(NetError::InvalidInput(format!("Unknown agent role: {}", other))),
        }
    }
}

/// Instruction prefix selected per task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    ConfigurationPlanning,
    ConfigurationGeneration,
    Validation,
    Troubleshooting,
    DeploymentPlanning,
}

impl PromptTemplate {
    /// First line of every prompt built from this template
    pub fn header(&self) -> &'static str {
        match self {
            PromptTemplate::ConfigurationPlanning => "### ROLE: CONFIGURATION PLANNING",
            PromptTemplate::ConfigurationGeneration => "### ROLE: CONFIGURATION GENERATION",
            PromptTemplate::Validation => "### ROLE: CONFIGURATION VALIDATION",
            PromptTemplate::Troubleshooting => "### ROLE: TROUBLESHOOTING",
            PromptTemplate::DeploymentPlanning => "### ROLE: DEPLOYMENT PLANNING",
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            PromptTemplate::ConfigurationPlanning => {
                "You are a senior network engineer. Turn the operator's request into an \
                 ordered change plan for the device described in the context.\n\
                 Respond with JSON only: {\"plan\": \"<step-by-step plan>\", \"risks\": [\"...\"]}"
            }
            PromptTemplate::ConfigurationGeneration => {
                "You are a network configuration generator. Produce complete IOS-style \
                 configuration text implementing the plan. Always enable \
                 'service password-encryption', use 'enable secret', and restrict VTY \
                 access to SSH.\n\
                 Respond with JSON only: {\"configuration\": \"<configuration text>\"}"
            }
            PromptTemplate::Validation => {
                "You review network configuration for syntax and security problems.\n\
                 Respond with JSON only: {\"valid\": true|false, \"issues\": [\"...\"]}"
            }
            PromptTemplate::Troubleshooting => {
                "You are a network troubleshooting assistant. Study the device state in \
                 the context and summarise notable findings, risks, and recommended \
                 follow-ups in plain text."
            }
            PromptTemplate::DeploymentPlanning => {
                "You plan safe rollouts of configuration changes across devices. Order \
                 the work, name verification checks, and describe rollback.\n\
                 Respond with JSON only: {\"steps\": [\"...\"], \"rollback\": \"...\"}"
            }
        }
    }

    /// Header plus instructions
    pub fn prefix(&self) -> String {
        format!("{}\n{}", self.header(), self.instructions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_template_by_stage() {
        assert_eq!(
            AgentRole::Configuration.template(Some("planning")),
            PromptTemplate::ConfigurationPlanning
        );
        assert_eq!(
            AgentRole::Configuration.template(Some("generation")),
            PromptTemplate::ConfigurationGeneration
        );
        assert_eq!(
            AgentRole::Configuration.template(None),
            PromptTemplate::ConfigurationPlanning
        );
        assert_eq!(
            AgentRole::Deployment.template(Some("generation")),
            PromptTemplate::DeploymentPlanning
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Validation".parse::<AgentRole>().unwrap(), AgentRole::Validation);
        assert!("firewall".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_prefix_starts_with_header() {
        for template in [
            PromptTemplate::ConfigurationPlanning,
            PromptTemplate::ConfigurationGeneration,
            PromptTemplate::Validation,
            PromptTemplate::Troubleshooting,
            PromptTemplate::DeploymentPlanning,
        ] {
            assert!(template.prefix().starts_with(template.header()));
        }
    }
}

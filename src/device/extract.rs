//! Advisory fact extraction from configuration text
//!
//! Best effort only: derives hostname and interface facts from applied
//! configuration. Never fails; anything it cannot match is left alone.

use crate::device::types::{Device, Interface, InterfaceStatus};
use once_cell::sync::Lazy;
use regex::Regex;

static HOSTNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*hostname\s+(\S+)").expect("hostname pattern"));

static INTERFACE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^interface\s+").expect("interface pattern"));

static IP_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*ip address\s+(\d{1,3}(?:\.\d{1,3}){3})\s+(\d{1,3}(?:\.\d{1,3}){3})")
        .expect("ip address pattern")
});

/// Facts found in a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFacts {
    pub hostname: Option<String>,
    pub interfaces: Vec<Interface>,
}

/// Scan configuration text for hostname and addressed interface blocks
pub fn extract_facts(config: &str) -> ExtractedFacts {
    let hostname = HOSTNAME_RE
        .captures(config)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let starts: Vec<usize> = INTERFACE_START_RE
        .find_iter(config)
        .map(|m| m.start())
        .collect();

    let mut interfaces = Vec::new();
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(config.len());
        if let Some(iface) = parse_interface_block(&config[*start..end]) {
            interfaces.push(iface);
        }
    }

    ExtractedFacts {
        hostname,
        interfaces,
    }
}

/// One `interface <name>` block; `None` unless it carries an address
fn parse_interface_block(block: &str) -> Option<Interface> {
    let mut lines = block.lines();
    let name = lines
        .next()?
        .trim()
        .strip_prefix("interface")?
        .split_whitespace()
        .next()?
        .to_string();

    // a top-level line ends the block
    let body: String = lines
        .take_while(|l| l.starts_with(' ') || l.starts_with('\t') || l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let captures = IP_ADDRESS_RE.captures(&body)?;
    let shutdown = body.lines().any(|l| l.trim() == "shutdown");

    Some(Interface {
        name,
        address: captures[1].to_string(),
        mask: captures[2].to_string(),
        status: if shutdown {
            InterfaceStatus::Down
        } else {
            InterfaceStatus::Up
        },
    })
}

/// Merge extracted facts into the device: update by name, else append
pub fn apply_facts(device: &mut Device, facts: ExtractedFacts) {
    if let Some(hostname) = facts.hostname {
        device.hostname = hostname;
    }

    for iface in facts.interfaces {
        match device.interfaces.iter_mut().find(|i| i.name == iface.name) {
            Some(existing) => *existing = iface,
            None => device.interfaces.push(iface),
        }
    }
}

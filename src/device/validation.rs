//! Heuristic configuration validator
//!
//! Single-device syntax/security screening run before a deployment:
//! - `service password-encryption` present
//! - `enable secret` rather than `enable password`
//! - no telnet on VTY transport
//! - well-formed `interface` and `ip address` lines

use std::net::Ipv4Addr;

/// Which checks run
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub check_password_encryption: bool,
    pub check_enable_secret: bool,
    pub check_telnet: bool,
    pub check_syntax: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_password_encryption: true,
            check_enable_secret: true,
            check_telnet: true,
            check_syntax: true,
        }
    }
}

pub struct ConfigValidator {
    config: ValidatorConfig,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Every issue found, in check order; empty means the text passed
    pub fn validate(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec!["Configuration is empty".to_string()];
        }

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut issues = Vec::new();

        if self.config.check_password_encryption {
            issues.extend(check_password_encryption(&lines));
        }
        if self.config.check_enable_secret {
            issues.extend(check_enable_secret(&lines));
        }
        if self.config.check_telnet {
            issues.extend(check_telnet(&lines));
        }
        if self.config.check_syntax {
            issues.extend(check_syntax(&lines));
        }

        issues
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn check_password_encryption(lines: &[&str]) -> Vec<String> {
    if lines.iter().any(|l| *l == "service password-encryption") {
        Vec::new()
    } else {
        vec!["Password encryption is not enabled (missing 'service password-encryption')".to_string()]
    }
}

fn check_enable_secret(lines: &[&str]) -> Vec<String> {
    if lines.iter().any(|l| l.starts_with("enable password")) {
        vec!["Use 'enable secret' instead of 'enable password'".to_string()]
    } else {
        Vec::new()
    }
}

fn check_telnet(lines: &[&str]) -> Vec<String> {
    let telnet = lines.iter().any(|l| {
        l.strip_prefix("transport input")
            .map(|rest| {
                rest.split_whitespace()
                    .any(|proto| proto == "telnet" || proto == "all")
            })
            .unwrap_or(false)
    });

    if telnet {
        vec!["Telnet is allowed on VTY lines; use 'transport input ssh'".to_string()]
    } else {
        Vec::new()
    }
}

fn check_syntax(lines: &[&str]) -> Vec<String> {
    let mut issues = Vec::new();

    for (n, line) in lines.iter().enumerate() {
        let line_no = n + 1;

        if let Some(rest) = line.strip_prefix("interface") {
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                continue; // e.g. "interface-range"
            }
            if rest.trim().is_empty() {
                issues.push(format!("Line {}: 'interface' without a name", line_no));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("ip address ") {
            let args: Vec<&str> = rest.split_whitespace().collect();
            match args.as_slice() {
                ["dhcp", ..] => {}
                [addr, mask, ..] => {
                    if addr.parse::<Ipv4Addr>().is_err() {
                        issues.push(format!("Line {}: invalid IP address '{}'", line_no, addr));
                    }
                    if !is_valid_mask(mask) {
                        issues.push(format!("Line {}: invalid subnet mask '{}'", line_no, mask));
                    }
                }
                _ => issues.push(format!(
                    "Line {}: 'ip address' needs an address and a mask",
                    line_no
                )),
            }
        }
    }

    issues
}

/// Contiguous-ones dotted mask
fn is_valid_mask(mask: &str) -> bool {
    match mask.parse::<Ipv4Addr>() {
        Ok(addr) => {
            let bits = u32::from(addr);
            bits.leading_ones() + bits.trailing_zeros() == 32
        }
        Err(_) => false,
    }
}

//! Simulated device entity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default hardware model for simulated devices
pub const DEFAULT_MODEL: &str = "CSR1000V";

/// Default software version for simulated devices
pub const DEFAULT_VERSION: &str = "17.3.4";

/// Management interface created with every device
pub const MGMT_INTERFACE: &str = "GigabitEthernet0/0";

/// Default management mask
pub const MGMT_MASK: &str = "255.255.255.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStatus {
    Up,
    Down,
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceStatus::Up => f.write_str("up"),
            InterfaceStatus::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub address: String,
    pub mask: String,
    pub status: InterfaceStatus,
}

/// In-memory network device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub mgmt_address: String,
    pub model: String,
    pub version: String,
    pub interfaces: Vec<Interface>,
    pub running_config: String,
    pub startup_config: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// New device with a management interface and matching boot configuration
    pub fn new(name: &str, mgmt_address: &str) -> Self {
        let config = format!(
            "hostname {name}\n!\ninterface {MGMT_INTERFACE}\n ip address {mgmt_address} {MGMT_MASK}\n no shutdown\n!\nend\n"
        );
        let now = Utc::now();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            hostname: name.to_string(),
            mgmt_address: mgmt_address.to_string(),
            model: DEFAULT_MODEL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            interfaces: vec![Interface {
                name: MGMT_INTERFACE.to_string(),
                address: mgmt_address.to_string(),
                mask: MGMT_MASK.to_string(),
                status: InterfaceStatus::Up,
            }],
            running_config: config.clone(),
            startup_config: config,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// `show ip interface brief` style table
    pub fn interface_summary(&self) -> String {
        let mut lines = vec![format!(
            "{:<24} {:<16} {:<16} {}",
            "Interface", "IP-Address", "Mask", "Status"
        )];
        for iface in &self.interfaces {
            lines.push(format!(
                "{:<24} {:<16} {:<16} {}",
                iface.name, iface.address, iface.mask, iface.status
            ));
        }
        lines.join("\n")
    }

    /// `show version` style summary
    pub fn version_summary(&self) -> String {
        format!(
            "{} Software, Version {}\n{} uptime is simulated\ncisco {} processor\nManagement address {}",
            self.model, self.version, self.hostname, self.model, self.mgmt_address
        )
    }

    /// Prompt-ready description of the current state
    pub fn describe(&self) -> String {
        format!(
            "Device: {} ({})\nModel: {} running {}\nManagement address: {}\n\nInterfaces:\n{}\n\nRunning configuration:\n{}",
            self.name,
            self.id,
            self.model,
            self.version,
            self.mgmt_address,
            self.interface_summary(),
            self.running_config
        )
    }
}

/// Running and startup configuration pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub running: String,
    pub startup: String,
}

/// Outcome of a device command or configuration apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_boot_state() {
        let device = Device::new("edge-1", "192.0.2.10");
        assert_eq!(device.running_config, device.startup_config);
        assert!(device.running_config.starts_with("hostname edge-1\n"));

        let mgmt = device.interface(MGMT_INTERFACE).unwrap();
        assert_eq!(mgmt.address, "192.0.2.10");
        assert_eq!(mgmt.status, InterfaceStatus::Up);
    }

    #[test]
    fn test_interface_summary_lists_interfaces() {
        let device = Device::new("edge-1", "192.0.2.10");
        let summary = device.interface_summary();
        assert!(summary.contains("GigabitEthernet0/0"));
        assert!(summary.contains("192.0.2.10"));
        assert!(summary.lines().last().unwrap().ends_with("up"));
    }

    #[test]
    fn test_describe_includes_running_config() {
        let device = Device::new("core", "10.0.0.1");
        let text = device.describe();
        assert!(text.contains("Running configuration:\nhostname core"));
    }

    #[test]
    fn test_command_result_serialization() {
        let json = serde_json::to_value(CommandResult::failed("rejected")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "rejected");
        assert!(json.get("output").is_none());
    }
}

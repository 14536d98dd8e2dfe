//! Device state machine
//!
//! Holds every simulated device behind its own async mutex, so operations on
//! one device never interleave while different devices proceed in parallel.
//! The device map itself is only locked long enough to find the handle.

use crate::agent::parse_structured;
use crate::device::extract::{apply_facts, extract_facts};
use crate::device::types::{CommandResult, Device, DeviceConfig};
use crate::errors::{NetError, Result};
use crate::providers::ModelClient;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Marks prompts asking the model to review configuration text
pub const REVIEW_PROMPT_HEADER: &str = "### DEVICE CONFIGURATION REVIEW";

/// Marks prompts asking the model to play the device CLI
pub const CLI_PROMPT_HEADER: &str = "### SIMULATED DEVICE CLI";

const CONFIG_MODE_BANNER: &str = "Enter configuration commands, one per line.  End with CNTL/Z.";

type DeviceHandle = Arc<Mutex<Device>>;

/// What a command line asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    ConfigMode,
    ShowRunning,
    ShowStartup,
    ShowInterfaces,
    ShowVersion,
    Save,
    Passthrough,
}

fn classify(command: &str) -> CommandKind {
    let cmd = command.trim().to_lowercase();

    if cmd.starts_with("conf") {
        return CommandKind::ConfigMode;
    }

    if let Some(rest) = cmd.strip_prefix("show ").or_else(|| cmd.strip_prefix("sh ")) {
        if rest.contains("run") {
            return CommandKind::ShowRunning;
        } else if rest.contains("start") {
            return CommandKind::ShowStartup;
        } else if rest.contains("int") {
            return CommandKind::ShowInterfaces;
        } else if rest.contains("ver") {
            return CommandKind::ShowVersion;
        }
        return CommandKind::Passthrough;
    }

    if is_save(&cmd) {
        return CommandKind::Save;
    }

    CommandKind::Passthrough
}

/// Running → startup only: `save`, `wr`, `write`, `write memory`, or
/// `copy run... start...`
fn is_save(cmd: &str) -> bool {
    let words: Vec<&str> = cmd.split_whitespace().collect();
    match words.as_slice() {
        ["save"] | ["wr"] | ["write"] | ["wr", "mem"] | ["write", "mem"] | ["write", "memory"] => {
            true
        }
        ["copy", source, destination] => source.starts_with("run") && destination.starts_with("start"),
        _ => false,
    }
}

pub struct DeviceSimulator {
    devices: RwLock<HashMap<String, DeviceHandle>>,
    model: ModelClient,
}

impl DeviceSimulator {
    pub fn new(model: ModelClient) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            model,
        }
    }

    pub async fn create_device(&self, name: &str, mgmt_address: &str) -> Result<Device> {
        if name.trim().is_empty() {
            return Err(NetError::InvalidInput("Device name must not be empty".into()));
        }

        let device = Device::new(name.trim(), mgmt_address.trim());
        info!(device_id = %device.id, name = %device.name, "created device");

        self.devices
            .write()
            .await
            .insert(device.id.clone(), Arc::new(Mutex::new(device.clone())));
        Ok(device)
    }

    async fn handle(&self, id: &str) -> Result<DeviceHandle> {
        self.devices
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NetError::not_found("Device", id))
    }

    pub async fn get_device(&self, id: &str) -> Result<Device> {
        let handle = self.handle(id).await?;
        let device = handle.lock().await;
        Ok(device.clone())
    }

    /// All devices, oldest first
    pub async fn list_devices(&self) -> Vec<Device> {
        let handles: Vec<DeviceHandle> = self.devices.read().await.values().cloned().collect();

        let mut devices = Vec::with_capacity(handles.len());
        for handle in handles {
            devices.push(handle.lock().await.clone());
        }
        devices.sort_by_key(|d| d.created_at);
        devices
    }

    /// Prompt-ready description of a device
    pub async fn describe(&self, id: &str) -> Result<String> {
        Ok(self.get_device(id).await?.describe())
    }

    pub async fn get_config(&self, id: &str) -> Result<DeviceConfig> {
        let device = self.get_device(id).await?;
        Ok(DeviceConfig {
            running: device.running_config,
            startup: device.startup_config,
        })
    }

    /// Copy running configuration to startup; the only way startup changes
    pub async fn save_running_to_startup(&self, id: &str) -> Result<()> {
        let handle = self.handle(id).await?;
        let mut device = handle.lock().await;
        save_locked(&mut device);
        info!(device_id = %id, "saved running configuration to startup");
        Ok(())
    }

    /// Review, then replace the running configuration
    ///
    /// A review reply that cannot be parsed lets the configuration through.
    /// An explicit `"valid": false` rejects it with the issues joined.
    pub async fn apply_configuration(&self, id: &str, config: &str) -> Result<CommandResult> {
        let handle = self.handle(id).await?;
        let mut device = handle.lock().await;

        let review = match self.model.complete(&review_prompt(config)).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(device_id = %id, error = %e, "configuration review failed");
                return Ok(CommandResult::failed(format!(
                    "Configuration review failed: {}",
                    e
                )));
            }
        };

        if let Some(issues) = rejected_issues(&review) {
            warn!(device_id = %id, issues = issues.len(), "configuration rejected");
            return Ok(CommandResult::failed(format!(
                "Configuration rejected: {}",
                issues.join("; ")
            )));
        }

        device.running_config = config.to_string();
        apply_facts(&mut device, extract_facts(config));
        device.updated_at = Utc::now();

        info!(device_id = %id, hostname = %device.hostname, "applied configuration");
        Ok(CommandResult::ok("Configuration applied successfully"))
    }

    pub async fn execute_command(&self, id: &str, command: &str) -> Result<CommandResult> {
        let handle = self.handle(id).await?;
        let mut device = handle.lock().await;
        let kind = classify(command);
        debug!(device_id = %id, command, ?kind, "executing command");

        let result = match kind {
            CommandKind::ConfigMode => CommandResult::ok(CONFIG_MODE_BANNER),
            CommandKind::ShowRunning => CommandResult::ok(device.running_config.clone()),
            CommandKind::ShowStartup => CommandResult::ok(device.startup_config.clone()),
            CommandKind::ShowInterfaces => CommandResult::ok(device.interface_summary()),
            CommandKind::ShowVersion => CommandResult::ok(device.version_summary()),
            CommandKind::Save => {
                save_locked(&mut device);
                CommandResult::ok("Building configuration...\n[OK]")
            }
            CommandKind::Passthrough => {
                match self.model.complete(&cli_prompt(&device, command)).await {
                    Ok(reply) => CommandResult::ok(reply),
                    Err(e) => {
                        warn!(device_id = %id, error = %e, "simulated CLI reply failed");
                        CommandResult::failed(e.to_string())
                    }
                }
            }
        };

        Ok(result)
    }

    pub fn model(&self) -> &ModelClient {
        &self.model
    }
}

fn save_locked(device: &mut Device) {
    device.startup_config = device.running_config.clone();
    device.updated_at = Utc::now();
}

fn review_prompt(config: &str) -> String {
    format!(
        "{}\nReview the configuration below for syntax errors and security problems.\n\
         Reply with JSON only: {{\"valid\": true|false, \"issues\": [\"...\"]}}\n\n\
         ## Configuration\n{}",
        REVIEW_PROMPT_HEADER, config
    )
}

fn cli_prompt(device: &Device, command: &str) -> String {
    format!(
        "{}\nYou are the CLI of the network device described below. Reply only with \
         the output the device would print.\n\nCommand: {}\n\n{}",
        CLI_PROMPT_HEADER,
        command.trim(),
        device.describe()
    )
}

/// Issues from a review reply that explicitly says `"valid": false`
fn rejected_issues(reply: &str) -> Option<Vec<String>> {
    let value = match parse_structured(reply) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "unparseable review reply, proceeding");
            return None;
        }
    };

    if value.get("valid").and_then(|v| v.as_bool()) != Some(false) {
        return None;
    }

    let issues = value
        .get("issues")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|i| match i.as_str() {
                    Some(s) => s.to_string(),
                    None => i.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Some(issues)
}

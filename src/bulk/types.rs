//! Bulk operation entity types

use crate::device::CommandResult;
use crate::errors::{NetError, Result};
use crate::types::{ExecutionStatus, StatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What is fanned out to every device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A CLI command line
    Command,
    /// Configuration text to apply
    Configuration,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Command => "command",
            OperationType::Configuration => "configuration",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "command" => Ok(OperationType::Command),
            "configuration" | "config" => Ok(OperationType::Configuration),
            other => Err(NetError::InvalidInput(format!(
                "Unknown operation type: {}",
                other
            ))),
        }
    }
}

/// One command or configuration fanned out to many devices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    pub id: String,
    pub operation_type: OperationType,
    pub device_ids: Vec<String>,
    pub data: String,
    pub status: ExecutionStatus,
    /// 0-100, never decreases
    pub progress: u8,
    pub results: HashMap<String, CommandResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl BulkOperation {
    pub fn new(operation_type: OperationType, device_ids: Vec<String>, data: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation_type,
            device_ids,
            data,
            status: ExecutionStatus::Pending,
            progress: 0,
            results: HashMap::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Start)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Record one device's outcome and advance progress
    pub fn record(&mut self, device_id: String, result: CommandResult) {
        self.results.insert(device_id, result);
        let progress = progress_percent(self.results.len(), self.device_ids.len());
        self.progress = self.progress.max(progress);
    }

    pub fn complete(&mut self) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Succeed)?;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Fail)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.values().filter(|r| !r.success).count()
    }
}

/// `round(done / total * 100)`, held below 100 until every device is done
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 || done >= total {
        return 100;
    }
    let pct = ((done as f64 / total as f64) * 100.0).round() as u8;
    pct.min(99)
}

/// Listing filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct BulkFilter {
    pub status: Option<ExecutionStatus>,
    pub operation_type: Option<OperationType>,
}

impl BulkFilter {
    pub fn matches(&self, op: &BulkOperation) -> bool {
        self.status.map_or(true, |s| op.status == s)
            && self.operation_type.map_or(true, |t| op.operation_type == t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(199, 200), 99);
    }

    #[test]
    fn test_record_is_monotonic() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let mut op = BulkOperation::new(OperationType::Command, ids, "show run".into());
        op.start().unwrap();

        op.record("a".into(), CommandResult::ok("x"));
        assert_eq!(op.progress, 50);
        // re-recording a device does not move progress backwards
        op.record("a".into(), CommandResult::failed("y"));
        assert_eq!(op.progress, 50);

        op.record("b".into(), CommandResult::ok("z"));
        assert_eq!(op.progress, 100);
        op.complete().unwrap();
        assert_eq!(op.failed(), 1);
        assert_eq!(op.succeeded(), 1);
    }

    #[test]
    fn test_operation_type_parse() {
        assert_eq!("config".parse::<OperationType>().unwrap(), OperationType::Configuration);
        assert!("reboot".parse::<OperationType>().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let op = BulkOperation::new(OperationType::Configuration, vec![], String::new());
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operationType"], "configuration");
        assert_eq!(json["status"], "pending");
    }
}

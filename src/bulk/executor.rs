//! Bulk operation executor
//!
//! Fans one command or configuration out to many devices:
//! - bounded by a semaphore (`max_parallel` devices at a time)
//! - every device is attempted; failures stay in that device's result
//! - progress is updated under the registry lock as each device finishes
//!
//! Creation spawns the work and returns immediately.

use crate::bulk::types::{BulkFilter, BulkOperation, OperationType};
use crate::device::{CommandResult, ConfigValidator, DeviceSimulator};
use crate::errors::{NetError, Result};
use crate::types::RunHandle;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tracing::{error, info, warn};

/// Upper bound on the default worker pool
pub const MAX_DEFAULT_PARALLEL: usize = 8;

/// `num_cpus`, clamped to `1..=MAX_DEFAULT_PARALLEL`
pub fn default_parallelism() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_PARALLEL)
}

#[derive(Clone)]
pub struct BulkExecutor {
    operations: Arc<RwLock<HashMap<String, BulkOperation>>>,
    simulator: Arc<DeviceSimulator>,
    semaphore: Arc<Semaphore>,
    max_parallel: usize,
}

impl BulkExecutor {
    pub fn new(simulator: Arc<DeviceSimulator>, max_parallel: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            operations: Arc::new(RwLock::new(HashMap::new())),
            simulator,
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            max_parallel,
        }
    }

    /// Register the operation and start it in the background
    ///
    /// Fails only on misuse: an empty device list. Duplicate ids are
    /// collapsed, keeping first occurrence order.
    pub async fn create_bulk_operation(
        &self,
        operation_type: OperationType,
        device_ids: Vec<String>,
        data: String,
    ) -> Result<RunHandle<BulkOperation>> {
        let device_ids = dedup(device_ids);
        if device_ids.is_empty() {
            return Err(NetError::InvalidInput(
                "Bulk operation needs at least one device".into(),
            ));
        }

        let op = BulkOperation::new(operation_type, device_ids, data);
        let id = op.id.clone();
        info!(
            bulk_id = %id,
            operation_type = %operation_type,
            devices = op.device_ids.len(),
            "created bulk operation"
        );
        self.operations.write().await.insert(id.clone(), op.clone());

        let this = self.clone();
        let run_id = id.clone();
        let join = tokio::spawn(async move {
            let worker = this.clone();
            let worker_id = run_id.clone();
            let outcome = tokio::spawn(async move { worker.run(&worker_id).await }).await;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("Bulk operation aborted: {}", e)),
            };
            if let Some(message) = failure {
                error!(bulk_id = %run_id, error = %message, "bulk operation failed");
                this.mark_failed(&run_id, message).await;
            }
        });

        Ok(RunHandle::new(id, op, join))
    }

    async fn run(&self, id: &str) -> Result<()> {
        let (operation_type, device_ids, data) = {
            let mut ops = self.operations.write().await;
            let op = ops
                .get_mut(id)
                .ok_or_else(|| NetError::not_found("BulkOperation", id))?;
            op.start()?;
            (op.operation_type, op.device_ids.clone(), op.data.clone())
        };

        let mut pending = self.device_futures(operation_type, &device_ids, &data);
        while let Some((device_id, result)) = pending.next().await {
            let mut ops = self.operations.write().await;
            if let Some(op) = ops.get_mut(id) {
                op.record(device_id, result);
            }
        }

        let mut ops = self.operations.write().await;
        let op = ops
            .get_mut(id)
            .ok_or_else(|| NetError::not_found("BulkOperation", id))?;
        op.complete()?;
        info!(
            bulk_id = %id,
            succeeded = op.succeeded(),
            failed = op.failed(),
            "bulk operation completed"
        );
        Ok(())
    }

    async fn mark_failed(&self, id: &str, message: String) {
        let mut ops = self.operations.write().await;
        if let Some(op) = ops.get_mut(id) {
            if !op.status.is_terminal() {
                // a panic before start() leaves the operation pending
                if op.started_at.is_none() {
                    let _ = op.start();
                }
                let _ = op.fail(message);
            }
        }
    }

    /// Run against every device and collect all results
    ///
    /// Same worker pool and per-device isolation as a bulk operation, without
    /// registering one.
    pub async fn execute_on_devices(
        &self,
        operation_type: OperationType,
        device_ids: &[String],
        data: &str,
    ) -> Vec<(String, CommandResult)> {
        let mut pending = self.device_futures(operation_type, device_ids, data);
        let mut results = Vec::with_capacity(device_ids.len());
        while let Some(result) = pending.next().await {
            results.push(result);
        }
        results
    }

    fn device_futures(
        &self,
        operation_type: OperationType,
        device_ids: &[String],
        data: &str,
    ) -> FuturesUnordered<BoxFuture<'static, (String, CommandResult)>> {
        let data: Arc<str> = Arc::from(data);

        device_ids
            .iter()
            .cloned()
            .map(|device_id| {
                let simulator = self.simulator.clone();
                let semaphore = self.semaphore.clone();
                let data = data.clone();

                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return (device_id, CommandResult::failed(e.to_string()));
                        }
                    };

                    let outcome = match operation_type {
                        OperationType::Command => {
                            simulator.execute_command(&device_id, &data).await
                        }
                        OperationType::Configuration => {
                            simulator.apply_configuration(&device_id, &data).await
                        }
                    };

                    let result = match outcome {
                        Ok(result) => result,
                        Err(e) => CommandResult::failed(e.to_string()),
                    };
                    if !result.success {
                        warn!(
                            device_id = %device_id,
                            error = result.error.as_deref().unwrap_or(""),
                            "device operation failed"
                        );
                    }
                    (device_id, result)
                }
                .boxed()
            })
            .collect()
    }

    /// Heuristic single-device validation used before deployment
    pub fn validate_configuration(&self, config: &str) -> Vec<String> {
        ConfigValidator::new().validate(config)
    }

    pub async fn get_bulk_operation(&self, id: &str) -> Result<BulkOperation> {
        self.operations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NetError::not_found("BulkOperation", id))
    }

    /// Matching operations, newest first
    pub async fn list_bulk_operations(&self, filter: &BulkFilter) -> Vec<BulkOperation> {
        let mut ops: Vec<BulkOperation> = self
            .operations
            .read()
            .await
            .values()
            .filter(|op| filter.matches(op))
            .cloned()
            .collect();
        ops.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        ops
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn simulator(&self) -> &Arc<DeviceSimulator> {
        &self.simulator
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

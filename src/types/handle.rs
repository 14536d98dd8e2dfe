//! Handle returned by every non-blocking creation call

use crate::errors::{NetError, Result};
use tokio::task::JoinHandle;

/// Id, creation-time snapshot, and the background work's join handle
///
/// Dropping the handle does not stop the work; callers may poll the owning
/// registry by id instead of awaiting.
#[derive(Debug)]
pub struct RunHandle<T> {
    pub id: String,
    pub snapshot: T,
    join: JoinHandle<()>,
}

impl<T> RunHandle<T> {
    pub fn new(id: String, snapshot: T, join: JoinHandle<()>) -> Self {
        Self { id, snapshot, join }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the background work to reach its terminal state
    pub async fn wait(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| NetError::Generic(format!("Background run {} aborted: {}", self.id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_joins_background_work() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let join = tokio::spawn(async move {
            let _ = tx.send(42);
        });
        let handle = RunHandle::new("run-1".to_string(), (), join);

        handle.wait().await.unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_panicking_work_reports_error() {
        let join = tokio::spawn(async { panic!("boom") });
        let handle = RunHandle::new("run-2".to_string(), (), join);
        assert!(matches!(handle.wait().await, Err(NetError::Generic(_))));
    }
}

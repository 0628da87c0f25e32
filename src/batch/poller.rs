//! Polling of asynchronous remote tasks

use crate::client::SnapshotApi;
use crate::error::Result;
use crate::types::{TaskId, TaskStatus};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Suspension between two status checks
///
/// Production code sleeps on the tokio timer; tests substitute a recorder so
/// no real time passes.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What a finished wait observed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollReport {
    /// First terminal status seen
    pub status: TaskStatus,
    /// Number of status checks issued, including the terminal one
    pub checks: u32,
    /// Total time spent suspended between checks
    pub waited: Duration,
}

/// Waits for remote tasks to leave the `IN_PROCESS` state
pub struct TaskPoller<'a> {
    api: &'a dyn SnapshotApi,
    sleeper: &'a dyn Sleeper,
}

impl<'a> TaskPoller<'a> {
    /// Create a poller over the given API and sleeper
    pub fn new(api: &'a dyn SnapshotApi, sleeper: &'a dyn Sleeper) -> Self {
        Self { api, sleeper }
    }

    /// Read the task's current status once
    pub async fn check(&self, task_id: &TaskId) -> Result<TaskStatus> {
        self.api.task_status(task_id).await
    }

    /// Read the result document of a finished task
    pub async fn result(&self, task_id: &TaskId) -> Result<serde_json::Value> {
        self.api.task_result(task_id).await
    }

    /// Poll until the task reaches a terminal state
    ///
    /// There is no attempt limit and no timeout: the remote task decides how
    /// long it runs, and cancellation belongs to whoever owns the process.
    /// The first failed check ends the wait with that error.
    pub async fn wait(&self, task_id: &TaskId, poll_interval: Duration) -> Result<PollReport> {
        let mut checks = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            let status = self.check(task_id).await?;
            checks += 1;

            if status.code.is_terminal() {
                debug!(
                    task_id = %task_id,
                    code = %status.code,
                    checks,
                    "task reached terminal state"
                );
                return Ok(PollReport {
                    status,
                    checks,
                    waited,
                });
            }

            debug!(task_id = %task_id, checks, "task still in process");
            self.sleeper.sleep(poll_interval).await;
            waited += poll_interval;
        }
    }
}

//! Batch orchestration: runs one operation per zone, strictly in order.
//!
//! The orchestrator is split into focused submodules:
//! - [`executor`] - One create, restore or fetch call and its skip/fatal classification
//! - [`poller`] - Waiting for remote tasks to reach a terminal state
//!
//! Create and restore batches poll every started task to completion before the
//! next zone begins. Download batches collect payloads and hand them to the
//! [`ArchiveBuilder`] at the end.

pub mod executor;
pub mod poller;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use executor::{ExecOutcome, OperationExecutor};
pub use poller::{PollReport, Sleeper, TaskPoller, TokioSleeper};

use crate::archive::ArchiveBuilder;
use crate::client::SnapshotApi;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{BatchReport, Mode, Outcome, SnapshotPayload, TaskId, ZoneOutcome};
use crate::zones::{self, ZoneSource};
use tracing::{error, info, warn};

/// Notification sent to the progress observer after each zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based position of the zone just processed
    pub position: usize,
    /// Number of zones in the batch
    pub total: usize,
    /// Zone just processed
    pub zone: String,
    /// Label of the zone's outcome (see [`Outcome::label`])
    pub outcome: &'static str,
}

type ProgressFn<'a> = Box<dyn Fn(&BatchProgress) + Send + Sync + 'a>;

/// Runs a batch over an already resolved zone list
pub struct BatchRunner<'a> {
    api: &'a dyn SnapshotApi,
    config: &'a Config,
    sleeper: &'a dyn Sleeper,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> BatchRunner<'a> {
    /// Create a runner over the given API, configuration and sleeper
    pub fn new(api: &'a dyn SnapshotApi, config: &'a Config, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            api,
            config,
            sleeper,
            progress: None,
        }
    }

    /// Register an observer called after every zone
    pub fn with_progress(mut self, observer: impl Fn(&BatchProgress) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(observer));
        self
    }

    /// Process every zone in order and return the report
    ///
    /// Skipped zones never affect later ones. An unexpected failure while
    /// starting a create or restore stops the batch with
    /// [`Error::BatchAborted`]; the same failure while fetching or polling is
    /// recorded against that zone only.
    pub async fn run(&self, mode: Mode, zones: &[String]) -> Result<BatchReport> {
        let executor = OperationExecutor::new(self.api, &self.config.snapshot_description);
        let poller = TaskPoller::new(self.api, self.sleeper);
        let mut report = BatchReport::new(mode);
        let mut payloads: Vec<(String, SnapshotPayload)> = Vec::new();

        info!(mode = %mode, zones = zones.len(), "starting batch");

        for (index, zone) in zones.iter().enumerate() {
            let outcome = match executor.execute(mode, zone).await {
                ExecOutcome::Started(task) => self.await_task(&poller, zone, &task).await,
                ExecOutcome::Fetched(payload) => {
                    payloads.push((zone.clone(), payload));
                    Outcome::Success
                }
                ExecOutcome::Skipped { status, reason } => Outcome::Skipped { reason, status },
                ExecOutcome::Fatal(e) if mode.is_destructive() => {
                    error!(
                        zone = %zone,
                        "[FATAL] Stopping batch, remaining zones were not processed."
                    );
                    return Err(Error::BatchAborted {
                        zone: zone.clone(),
                        source: Box::new(e),
                    });
                }
                ExecOutcome::Fatal(e) => Outcome::Fatal {
                    error: e.to_string(),
                },
            };

            self.notify(index + 1, zones.len(), zone, outcome.label());
            report.outcomes.push(ZoneOutcome::new(zone.clone(), outcome));
        }

        if mode == Mode::Download {
            let builder = ArchiveBuilder::new(&self.config.output_dir, self.config.scratch_dir());
            let summary = builder.build(&payloads)?;
            for (zone, reason) in summary.skipped {
                if let Some(entry) = report
                    .outcomes
                    .iter_mut()
                    .find(|entry| entry.zone == zone && entry.outcome == Outcome::Success)
                {
                    entry.outcome = Outcome::Skipped {
                        reason,
                        status: None,
                    };
                }
            }
            report.archive = summary.archive;
        }

        let counts = report.counts();
        info!(
            mode = %mode,
            success = counts.success,
            failed = counts.failed,
            skipped = counts.skipped,
            fatal = counts.fatal,
            "batch finished"
        );
        Ok(report)
    }

    async fn await_task(&self, poller: &TaskPoller<'_>, zone: &str, task: &TaskId) -> Outcome {
        info!(zone, task_id = %task, "[VERIFY] Checking status of {}.", task);
        match poller.wait(task, self.config.poll_interval).await {
            Ok(poll) if poll.status.is_complete() => {
                info!(
                    zone,
                    task_id = %task,
                    checks = poll.checks,
                    "[SUCCESS] {} completed: {}",
                    task,
                    poll.status.message
                );
                Outcome::Success
            }
            Ok(poll) => {
                warn!(
                    zone,
                    task_id = %task,
                    code = %poll.status.code,
                    "[FAILED] {} was not successfully processed: {}",
                    task,
                    poll.status.message
                );
                Outcome::Failed {
                    code: poll.status.code.as_str().to_string(),
                    message: poll.status.message,
                }
            }
            Err(e) => {
                error!(
                    zone,
                    task_id = %task,
                    error = %e,
                    "[FATAL] An unexpected error occurred retrieving {}.",
                    task
                );
                Outcome::Fatal {
                    error: e.to_string(),
                }
            }
        }
    }

    fn notify(&self, position: usize, total: usize, zone: &str, outcome: &'static str) {
        if let Some(observer) = &self.progress {
            observer(&BatchProgress {
                position,
                total,
                zone: zone.to_string(),
                outcome,
            });
        }
    }
}

/// Resolve `source` and run a batch over it with the tokio timer
pub async fn run_batch(
    api: &dyn SnapshotApi,
    config: &Config,
    mode: Mode,
    source: &ZoneSource,
) -> Result<BatchReport> {
    let zones = zones::resolve(source, api, config.page_size).await?;
    BatchRunner::new(api, config, &TokioSleeper)
        .run(mode, &zones)
        .await
}

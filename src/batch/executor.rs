//! Per-zone operations and their skip/fatal classification

use crate::client::SnapshotApi;
use crate::error::{Error, ZoneEligibility};
use crate::types::{Mode, SnapshotPayload, TaskId};
use tracing::{error, info, warn};

const CREATE_INELIGIBLE: &str =
    "this zone cannot be snapshotted (secondary/alias) or you don't have permission";
const RESTORE_INELIGIBLE: &str = "this zone cannot be restored (secondary/alias), \
     you don't have permission or no snapshot exists";
const DOWNLOAD_INELIGIBLE: &str = "this zone cannot be snapshotted (secondary/alias), \
     a snapshot doesn't exist or you don't have permission";

/// What one operation on one zone produced
#[derive(Debug)]
pub enum ExecOutcome {
    /// A create or restore task was started
    Started(TaskId),
    /// A snapshot document was downloaded
    Fetched(SnapshotPayload),
    /// The zone cannot take part; the batch moves on
    Skipped {
        /// HTTP status returned by the API
        status: Option<u16>,
        /// Explanation for the log and the report
        reason: String,
    },
    /// Unexpected failure; whether it stops the batch is the caller's call
    Fatal(Error),
}

/// Runs a single create, restore or fetch operation for a zone
///
/// Holds no state between zones.
pub struct OperationExecutor<'a> {
    api: &'a dyn SnapshotApi,
    description: &'a str,
}

impl<'a> OperationExecutor<'a> {
    /// Create an executor; `description` is the label sent with new snapshots
    pub fn new(api: &'a dyn SnapshotApi, description: &'a str) -> Self {
        Self { api, description }
    }

    /// Run the operation `mode` calls for on `zone`
    pub async fn execute(&self, mode: Mode, zone: &str) -> ExecOutcome {
        match mode {
            Mode::Create => self.create(zone).await,
            Mode::Restore => self.restore(zone).await,
            Mode::Download => self.fetch(zone).await,
        }
    }

    /// Start a snapshot of `zone`
    pub async fn create(&self, zone: &str) -> ExecOutcome {
        info!(zone, "[CREATE] Beginning snapshot of {}.", zone);
        match self.api.create_snapshot(zone, self.description).await {
            Ok(task) => {
                info!(
                    zone,
                    task_id = %task,
                    "[SUCCESS] Snapshot initiated for {}. Task ID: {}",
                    zone,
                    task
                );
                ExecOutcome::Started(task)
            }
            Err(e) => classify(e, zone, "snapshot", CREATE_INELIGIBLE),
        }
    }

    /// Start a restore of `zone` from its latest snapshot
    pub async fn restore(&self, zone: &str) -> ExecOutcome {
        info!(zone, "[RESTORE] Beginning restore of {}.", zone);
        match self.api.restore_snapshot(zone).await {
            Ok(task) => {
                info!(
                    zone,
                    task_id = %task,
                    "[SUCCESS] Restore initiated for {}. Task ID: {}",
                    zone,
                    task
                );
                ExecOutcome::Started(task)
            }
            Err(e) => classify(e, zone, "restore", RESTORE_INELIGIBLE),
        }
    }

    /// Download the current snapshot of `zone`
    pub async fn fetch(&self, zone: &str) -> ExecOutcome {
        info!(zone, "[DOWNLOAD] Fetching snapshot of {}.", zone);
        match self.api.get_snapshot(zone).await {
            Ok(payload) => {
                info!(zone, "[SUCCESS] Snapshot downloaded for {}.", zone);
                ExecOutcome::Fetched(payload)
            }
            Err(e) => classify(e, zone, "download", DOWNLOAD_INELIGIBLE),
        }
    }
}

fn classify(e: Error, zone: &str, verb: &str, ineligible_reason: &str) -> ExecOutcome {
    if e.is_ineligible() {
        let status = e.status();
        warn!(
            zone,
            status,
            "[SKIP] Unable to {} {}. Either {}. HTTP Error: {}",
            verb,
            zone,
            ineligible_reason,
            status.map(|s| s.to_string()).unwrap_or_default()
        );
        ExecOutcome::Skipped {
            status,
            reason: ineligible_reason.to_string(),
        }
    } else {
        error!(
            zone,
            error = %e,
            "[FATAL] An unexpected error occurred trying to {} {}.",
            verb,
            zone
        );
        ExecOutcome::Fatal(e)
    }
}

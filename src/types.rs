//! Core types for zone-snapshot

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot document returned by the remote API, kept verbatim
pub type SnapshotPayload = serde_json::Value;

/// Opaque identifier of an asynchronous remote task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status code reported by the remote API
///
/// Only `IN_PROCESS` and `COMPLETE` carry meaning for this tool; every other
/// code is terminal and counts as a failure. Unknown codes are preserved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskCode {
    /// Task still running
    InProcess,
    /// Task finished successfully
    Complete,
    /// Any other terminal code
    Other(String),
}

impl TaskCode {
    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskCode::InProcess)
    }

    /// Wire representation of the code
    pub fn as_str(&self) -> &str {
        match self {
            TaskCode::InProcess => "IN_PROCESS",
            TaskCode::Complete => "COMPLETE",
            TaskCode::Other(code) => code,
        }
    }
}

impl From<String> for TaskCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "IN_PROCESS" => TaskCode::InProcess,
            "COMPLETE" => TaskCode::Complete,
            _ => TaskCode::Other(code),
        }
    }
}

impl From<TaskCode> for String {
    fn from(code: TaskCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for TaskCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status document returned by the task endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Status code
    pub code: TaskCode,
    /// Human-readable message accompanying the code
    #[serde(default)]
    pub message: String,
    /// Location of the task result, when the API provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_uri: Option<String>,
}

impl TaskStatus {
    /// Whether the task finished successfully
    pub fn is_complete(&self) -> bool {
        self.code == TaskCode::Complete
    }
}

/// One page of the account's zone listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZonePage {
    /// Zone names on this page, in the order the API returned them
    pub zones: Vec<String>,
    /// Cursor for the next page, if any
    pub next_cursor: Option<String>,
}

/// Operation applied to every zone of a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Take a fresh snapshot of each zone
    #[default]
    Create,
    /// Roll each zone back to its most recent snapshot
    Restore,
    /// Download each zone's snapshot into a local archive
    Download,
}

impl Mode {
    /// Whether this mode changes remote state and needs operator confirmation
    pub fn is_destructive(&self) -> bool {
        matches!(self, Mode::Create | Mode::Restore)
    }

    /// Log tag used when an operation of this mode starts
    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Create => "[CREATE]",
            Mode::Restore => "[RESTORE]",
            Mode::Download => "[DOWNLOAD]",
        }
    }

    /// What the operator is about to do, phrased for the confirmation prompt
    pub fn action_description(&self) -> &'static str {
        match self {
            Mode::Create => {
                "overwrite zone snapshots with a new snapshot representing their current state"
            }
            Mode::Restore => "roll zones back to their most recent snapshot",
            Mode::Download => "download every available zone snapshot",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Create => "create",
            Mode::Restore => "restore",
            Mode::Download => "download",
        };
        f.write_str(s)
    }
}

/// Final result of one zone within a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Task completed, or snapshot downloaded and archived
    Success,
    /// Task reached a terminal code other than COMPLETE
    Failed {
        /// Terminal code reported by the task
        code: String,
        /// Message reported by the task
        message: String,
    },
    /// Zone could not take part (ineligible, missing snapshot, unwritable document)
    Skipped {
        /// Why the zone was skipped
        reason: String,
        /// HTTP status observed, when the skip came from the remote API
        status: Option<u16>,
    },
    /// Unexpected failure confined to this zone
    Fatal {
        /// Rendered error
        error: String,
    },
}

impl Outcome {
    /// Short lowercase label, used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed { .. } => "failed",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Fatal { .. } => "fatal",
        }
    }
}

/// Outcome of one zone, tagged with the zone name
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ZoneOutcome {
    /// Zone name as resolved by the zone source
    pub zone: String,
    /// What happened to it
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ZoneOutcome {
    /// Pair a zone with its outcome
    pub fn new(zone: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            zone: zone.into(),
            outcome,
        }
    }
}

/// Everything a batch produced
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    /// Mode the batch ran in
    pub mode: Mode,
    /// One entry per attempted zone, in processing order
    pub outcomes: Vec<ZoneOutcome>,
    /// Archive written by a download batch, if any payload was gathered
    pub archive: Option<PathBuf>,
}

/// Counts of outcomes by kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    /// Zones that succeeded
    pub success: usize,
    /// Zones whose task ended in a non-COMPLETE state
    pub failed: usize,
    /// Zones that were skipped
    pub skipped: usize,
    /// Zones that hit an unexpected error
    pub fatal: usize,
}

impl BatchReport {
    /// Start an empty report for the given mode
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            outcomes: Vec::new(),
            archive: None,
        }
    }

    /// Tally outcomes by kind
    pub fn counts(&self) -> OutcomeCounts {
        self.outcomes
            .iter()
            .fold(OutcomeCounts::default(), |mut counts, entry| {
                match entry.outcome {
                    Outcome::Success => counts.success += 1,
                    Outcome::Failed { .. } => counts.failed += 1,
                    Outcome::Skipped { .. } => counts.skipped += 1,
                    Outcome::Fatal { .. } => counts.fatal += 1,
                }
                counts
            })
    }

    /// Look up the outcome recorded for a zone
    pub fn outcome_for(&self, zone: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|entry| entry.zone == zone)
            .map(|entry| &entry.outcome)
    }
}

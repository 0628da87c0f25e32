//! Remote DNS management API access
//!
//! [`SnapshotApi`] is the seam between the batch logic and the network. The
//! production implementation is [`HttpClient`]; tests drive the batch through
//! scripted implementations of the same trait.

mod auth;
mod http;

pub use auth::{Credentials, Session, open_session, refresh_session};
pub use http::HttpClient;

use crate::error::Result;
use crate::types::{SnapshotPayload, TaskId, TaskStatus, ZonePage};
use async_trait::async_trait;

/// Operations the remote API offers for zone snapshots
///
/// Every method is a single request; none of them retry. Failures are
/// reported as [`crate::Error`] and classified by the caller.
#[async_trait]
pub trait SnapshotApi: Send + Sync {
    /// Fetch one page of the account's zones
    ///
    /// `cursor` is `None` for the first page.
    async fn list_zones(&self, cursor: Option<&str>, limit: u32) -> Result<ZonePage>;

    /// Ask the API to snapshot a zone, returning the task that does the work
    async fn create_snapshot(&self, zone: &str, description: &str) -> Result<TaskId>;

    /// Ask the API to restore a zone from its latest snapshot
    async fn restore_snapshot(&self, zone: &str) -> Result<TaskId>;

    /// Read the zone's current snapshot document
    async fn get_snapshot(&self, zone: &str) -> Result<SnapshotPayload>;

    /// Read the status of an asynchronous task
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus>;

    /// Read the result document of a finished task
    async fn task_result(&self, task_id: &TaskId) -> Result<serde_json::Value>;
}

//! # zone-snapshot
//!
//! Bulk snapshot management for DNS zones hosted behind a managed DNS API.
//!
//! ## Design Philosophy
//!
//! zone-snapshot is designed to be:
//! - **Sequential** - One zone at a time, each remote task polled to completion
//! - **Forgiving per zone** - Ineligible zones are skipped, the batch carries on
//! - **Strict where it matters** - An unexpected failure while changing remote
//!   state stops the batch before any further zone is touched
//! - **Testable** - The remote API and the poll delay sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use zone_snapshot::{Config, Mode, ZoneSource, run_batch};
//! use zone_snapshot::client::{Credentials, HttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let credentials = Credentials::Token {
//!         access_token: "token".to_string(),
//!         refresh_token: None,
//!     };
//!     let client = HttpClient::connect(&config, &credentials).await?;
//!
//!     let source = ZoneSource::List(vec!["example.com.".to_string()]);
//!     let report = run_batch(&client, &config, Mode::Download, &source).await?;
//!     println!("archive: {:?}", report.archive);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Zip archive of downloaded snapshots
pub mod archive;
/// Batch orchestration, per-zone execution and task polling
pub mod batch;
/// Remote API client and authentication
pub mod client;
/// Configuration types
pub mod config;
/// Confirmation prompt for destructive batches
pub mod confirm;
/// Error types
pub mod error;
/// Confirm, connect and run in one call
pub mod invocation;
/// Log file setup
pub mod logging;
/// Core types and outcomes
pub mod types;
/// Zone name sources
pub mod zones;

// Re-export commonly used types
pub use archive::{ArchiveBuilder, ArchiveSummary};
pub use batch::{BatchProgress, BatchRunner, run_batch};
pub use client::{Credentials, HttpClient, SnapshotApi};
pub use config::Config;
pub use error::{Error, Result, ZoneEligibility};
pub use invocation::{Connector, HttpConnector, Invocation};
pub use types::{
    BatchReport, Mode, Outcome, OutcomeCounts, SnapshotPayload, TaskCode, TaskId, TaskStatus,
    ZoneOutcome, ZonePage,
};
pub use zones::ZoneSource;

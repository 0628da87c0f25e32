//! One complete run of the tool
//!
//! A destructive batch is confirmed before anything else happens: no log
//! file is opened and no connection is made until the operator has typed
//! the confirmation phrase. Then logging starts, the client connects, the
//! zone source is resolved and the batch runs.

use crate::batch::{BatchProgress, BatchRunner, Sleeper};
use crate::client::{Credentials, HttpClient, SnapshotApi};
use crate::config::Config;
use crate::confirm;
use crate::error::Result;
use crate::logging;
use crate::types::{BatchReport, Mode};
use crate::zones::{self, ZoneSource};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{Level, info};

/// Opens a session against the remote API
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticate and return a ready client
    async fn connect(&self, config: &Config) -> Result<Arc<dyn SnapshotApi>>;
}

/// [`Connector`] that authenticates an [`HttpClient`] with fixed credentials
pub struct HttpConnector {
    credentials: Credentials,
}

impl HttpConnector {
    /// Connect with `credentials` on every call
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, config: &Config) -> Result<Arc<dyn SnapshotApi>> {
        let client = HttpClient::connect(config, &self.credentials).await?;
        Ok(Arc::new(client))
    }
}

/// Everything one run needs besides its I/O
#[derive(Clone, Debug)]
pub struct Invocation<'a> {
    /// Operation applied to every zone
    pub mode: Mode,
    /// Where the zone names come from
    pub source: ZoneSource,
    /// Validated configuration
    pub config: &'a Config,
    /// Log file to install as the process-wide subscriber, if any
    pub log_file: Option<&'a Path>,
}

impl Invocation<'_> {
    /// Confirm, start logging, connect, resolve the zones and run the batch
    ///
    /// A declined confirmation returns [`crate::Error::Aborted`] before the
    /// connector is called.
    pub async fn execute<R, W>(
        &self,
        connector: &dyn Connector,
        sleeper: &dyn Sleeper,
        input: &mut R,
        output: &mut W,
        progress: impl Fn(&BatchProgress) + Send + Sync,
    ) -> Result<BatchReport>
    where
        R: BufRead,
        W: Write,
    {
        if self.mode.is_destructive() {
            confirm::confirm(
                input,
                output,
                self.mode.action_description(),
                &self.config.confirmation_phrase,
            )?;
        }

        if let Some(path) = self.log_file {
            logging::init_file_logging(path, Level::INFO)?;
        }
        info!(
            mode = %self.mode,
            "zone-snapshot {} starting",
            env!("CARGO_PKG_VERSION")
        );

        let api = connector.connect(self.config).await?;
        let zones = zones::resolve(&self.source, api.as_ref(), self.config.page_size).await?;

        BatchRunner::new(api.as_ref(), self.config, sleeper)
            .with_progress(progress)
            .run(self.mode, &zones)
            .await
    }
}

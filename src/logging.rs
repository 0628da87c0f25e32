//! Log file setup
//!
//! Every run appends to a single plain-text log file, one line per event with
//! a timestamp, the level and the message. `RUST_LOG` overrides the default
//! level.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Build a subscriber that appends to `path`
///
/// The file is created if missing and never truncated.
pub fn file_subscriber(
    path: &Path,
    default_level: Level,
) -> Result<impl Subscriber + Send + Sync + use<>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    Ok(Registry::default().with(filter).with(layer))
}

/// Install the file subscriber as the process-wide default
pub fn init_file_logging(path: &Path, default_level: Level) -> Result<()> {
    let subscriber = file_subscriber(path, default_level)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

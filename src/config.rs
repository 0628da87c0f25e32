//! Configuration types for zone-snapshot

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Label attached to every snapshot this tool creates
pub const DEFAULT_SNAPSHOT_DESCRIPTION: &str =
    concat!("Snapshot generated by zone-snapshot ", env!("CARGO_PKG_VERSION"));

/// Main configuration for a snapshot run
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the DNS management API (default: "https://api.ultradns.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Delay between task status checks (default: 1 second)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Zones requested per page when enumerating an account (default: 1000)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout applied to every HTTP request (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Description sent with snapshot creation requests
    #[serde(default = "default_snapshot_description")]
    pub snapshot_description: String,

    /// Directory the download archive is written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Name of the scratch directory created inside `output_dir` while
    /// building an archive (default: "temp_zone_files")
    #[serde(default = "default_scratch_dir_name")]
    pub scratch_dir_name: String,

    /// Phrase the operator must type before destructive batches (default: "UNDERSTOOD")
    #[serde(default = "default_confirmation_phrase")]
    pub confirmation_phrase: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval: default_poll_interval(),
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
            snapshot_description: default_snapshot_description(),
            output_dir: default_output_dir(),
            scratch_dir_name: default_scratch_dir_name(),
            confirmation_phrase: default_confirmation_phrase(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.api_url).is_err() {
            return Err(Error::config(
                "api_url",
                format!("'{}' is not a valid URL", self.api_url),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::config("page_size", "must be greater than zero"));
        }
        if self.confirmation_phrase.trim().is_empty() {
            return Err(Error::config("confirmation_phrase", "must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll_interval", "must be at least one second"));
        }
        let mut components = Path::new(&self.scratch_dir_name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain || self.scratch_dir_name.contains(['/', '\\']) {
            return Err(Error::config(
                "scratch_dir_name",
                format!("'{}' is not a plain directory name", self.scratch_dir_name),
            ));
        }
        Ok(())
    }

    /// Full path of the scratch directory used by the archive builder
    pub fn scratch_dir(&self) -> PathBuf {
        self.output_dir.join(&self.scratch_dir_name)
    }
}

fn default_api_url() -> String {
    "https://api.ultradns.com".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_page_size() -> u32 {
    1000
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_snapshot_description() -> String {
    DEFAULT_SNAPSHOT_DESCRIPTION.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_scratch_dir_name() -> String {
    "temp_zone_files".to_string()
}

fn default_confirmation_phrase() -> String {
    "UNDERSTOOD".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

//! Error types for zone-snapshot
//!
//! This module provides the error handling for the library, including:
//! - A single crate-wide [`Error`] type with contextual variants
//! - Classification of remote failures into "ineligible zone" and "unexpected"
//! - Machine-readable error codes for the end-of-run summary

use thiserror::Error;

/// Result type alias for zone-snapshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for zone-snapshot
///
/// Each variant includes enough context to be logged on its own, since the log
/// file is the operator's only detailed record of a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "page_size")
        key: Option<String>,
    },

    /// Missing, conflicting or rejected credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// The remote API answered with a non-success status
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code returned by the remote API
        status: u16,
        /// HTTP method of the failed request
        method: String,
        /// Request path (without host)
        path: String,
        /// Response body, kept verbatim for the log
        body: String,
    },

    /// Transport-level failure talking to the remote API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote API answered successfully but the body was not what we expected
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Archive creation failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The zone source resolved to an empty list
    #[error("no zones to process: {message}")]
    NoZones {
        /// Where the empty list came from
        message: String,
        /// The list was fetched from the account rather than given by the operator
        from_account: bool,
    },

    /// The operator declined a destructive action
    #[error("operation aborted: {0}")]
    Aborted(String),

    /// A create/restore request failed unexpectedly and the batch was stopped
    #[error("batch aborted at zone {zone}: {source}")]
    BatchAborted {
        /// Zone being processed when the batch stopped
        zone: String,
        /// The underlying remote failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// HTTP status reported by the remote API, if this is a remote rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            Error::BatchAborted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Machine-readable error code used in logs and summaries
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Auth(_) => "auth_error",
            Error::Api { .. } => "api_error",
            Error::Network(_) => "network_error",
            Error::InvalidResponse(_) => "invalid_response",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Archive(_) => "archive_error",
            Error::NoZones { .. } => "no_zones",
            Error::Aborted(_) => "aborted",
            Error::BatchAborted { .. } => "batch_aborted",
        }
    }

    /// Whether this error was raised before any remote call could be made
    ///
    /// These are operator mistakes (bad flags, declined confirmation, bad
    /// config, an empty zone file or list) rather than failures of the
    /// remote service. An account that lists no zones is not one of them.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::Auth(_)
                | Error::Aborted(_)
                | Error::NoZones {
                    from_account: false,
                    ..
                }
        )
    }
}

/// Classification of remote failures into per-zone skips and unexpected errors
///
/// The remote API reports ineligible zones (secondary or alias zones, zones
/// without a snapshot, zones the account may not touch) with a client-class
/// status. Those never stop a batch.
pub trait ZoneEligibility {
    /// Returns true if the failure only means "this zone cannot take part"
    fn is_ineligible(&self) -> bool;
}

/// Statuses the remote API uses for zones that cannot be snapshotted or restored
pub const INELIGIBLE_STATUSES: [u16; 2] = [400, 404];

impl ZoneEligibility for Error {
    fn is_ineligible(&self) -> bool {
        match self {
            Error::Api { status, .. } => INELIGIBLE_STATUSES.contains(status),
            // Transport failures and malformed bodies say nothing about the zone
            _ => false,
        }
    }
}

//! Zone source: which zones a batch runs over
//!
//! Zones come from a file (one name per line), an in-memory list, or the
//! account itself via the paginated zone listing.

use crate::client::SnapshotApi;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the zone names for a batch come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneSource {
    /// A text file with one zone name per line
    File(PathBuf),
    /// Names supplied directly by the caller
    List(Vec<String>),
    /// Every zone visible to the account
    Account,
}

/// Resolve a zone source into an ordered list of zone names
///
/// Order is preserved and duplicates are kept. An empty result is an error,
/// reported before any zone operation is attempted.
pub async fn resolve(
    source: &ZoneSource,
    api: &dyn SnapshotApi,
    page_size: u32,
) -> Result<Vec<String>> {
    let zones = match source {
        ZoneSource::File(path) => read_zones_file(path)?,
        ZoneSource::List(names) => normalize(names.iter().map(String::as_str)),
        ZoneSource::Account => list_all_zones(api, page_size).await?,
    };

    if zones.is_empty() {
        let message = match source {
            ZoneSource::File(path) => format!("{} contains no zone names", path.display()),
            ZoneSource::List(_) => "the zone list is empty".to_string(),
            ZoneSource::Account => "the account has no zones".to_string(),
        };
        return Err(Error::NoZones {
            message,
            from_account: matches!(source, ZoneSource::Account),
        });
    }

    info!(count = zones.len(), "resolved zones");
    Ok(zones)
}

/// Read zone names from a file, one per line
///
/// Surrounding whitespace is stripped and blank lines are dropped.
pub fn read_zones_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("failed to read zones file {}: {}", path.display(), e),
        key: Some("zones_file".to_string()),
    })?;
    Ok(normalize(contents.lines()))
}

fn normalize<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Enumerate every zone of the account, following the listing cursor
///
/// Pages are concatenated in the order they arrive. A failed page request
/// ends the enumeration with that error; nothing is retried.
pub async fn list_all_zones(api: &dyn SnapshotApi, page_size: u32) -> Result<Vec<String>> {
    let mut zones = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = api.list_zones(cursor.as_deref(), page_size).await?;
        pages += 1;
        debug!(page = pages, zones = page.zones.len(), "received zone page");
        zones.extend(page.zones);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(pages, total = zones.len(), "zone enumeration finished");
    Ok(zones)
}

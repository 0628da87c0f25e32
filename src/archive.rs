//! Bundling downloaded snapshots into a single zip archive
//!
//! Each payload is written as a pretty-printed JSON document into a scratch
//! directory, the documents are zipped into `snapshot-backup_<timestamp>.zip`,
//! and the scratch directory is removed afterwards whether or not bundling
//! succeeded.

use crate::error::{Error, Result};
use crate::types::SnapshotPayload;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Prefix of every archive file name
pub const ARCHIVE_PREFIX: &str = "snapshot-backup_";

/// Archive file name for a capture time given in seconds since the epoch
pub fn archive_name(timestamp: i64) -> String {
    format!("{}{}.zip", ARCHIVE_PREFIX, timestamp)
}

/// Document file name for a zone
///
/// Path separators (classless reverse zones use `/`) are replaced so every
/// zone maps to a single file inside the scratch directory.
pub fn document_name(zone: &str) -> Option<String> {
    let name: String = zone
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }
    Some(format!("{}.json", name))
}

/// Result of an archive build
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the archive, if one was written
    pub archive: Option<PathBuf>,
    /// Zones whose document made it into the archive, in input order
    pub archived: Vec<String>,
    /// Zones whose document could not be written, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Builds the download archive from fetched payloads
pub struct ArchiveBuilder {
    output_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl ArchiveBuilder {
    /// Create a builder writing into `output_dir`, staging in `scratch_dir`
    pub fn new(output_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Build the archive stamped with the current time
    pub fn build(&self, payloads: &[(String, SnapshotPayload)]) -> Result<ArchiveSummary> {
        self.build_at(payloads, chrono::Utc::now().timestamp())
    }

    /// Build the archive stamped with `timestamp` (seconds since the epoch)
    ///
    /// No payloads means no archive and no scratch directory. A payload that
    /// cannot be written is skipped and logged with its raw content; the other
    /// documents still go into the archive. A zone whose document name is
    /// already taken by a different zone is skipped the same way. If no
    /// document could be written at all, no archive is produced.
    pub fn build_at(
        &self,
        payloads: &[(String, SnapshotPayload)],
        timestamp: i64,
    ) -> Result<ArchiveSummary> {
        if payloads.is_empty() {
            info!("[SKIP] No existing snapshots found, no archive created.");
            return Ok(ArchiveSummary::default());
        }

        let scratch = ScratchDir::create(&self.scratch_dir)?;
        let mut summary = ArchiveSummary::default();
        let mut documents = Vec::with_capacity(payloads.len());
        let mut owners: HashMap<PathBuf, &str> = HashMap::new();

        for (zone, payload) in payloads {
            match write_document(scratch.path(), zone, payload, &owners) {
                Ok(path) => {
                    info!(
                        zone = %zone,
                        path = %path.display(),
                        "[DOWNLOAD] Wrote '{}'.",
                        path.display()
                    );
                    // A repeated zone overwrites its own document
                    if owners.insert(path.clone(), zone).is_none() {
                        documents.push(path);
                    }
                    summary.archived.push(zone.clone());
                }
                Err(e) => {
                    warn!(
                        zone = %zone,
                        error = %e,
                        "[SKIP] Skipping {}, reason: {}",
                        zone,
                        payload
                    );
                    summary.skipped.push((zone.clone(), e.to_string()));
                }
            }
        }

        if documents.is_empty() {
            warn!("[SKIP] None of the downloaded snapshots could be written, no archive created.");
            scratch.remove()?;
            return Ok(summary);
        }

        let archive_path = self.output_dir.join(archive_name(timestamp));
        info!(
            path = %archive_path.display(),
            "[DOWNLOAD] Creating archive '{}'.",
            archive_path.display()
        );
        if let Err(e) = bundle(&archive_path, &documents) {
            error!(
                path = %archive_path.display(),
                error = %e,
                "[FATAL] Failed to create archive."
            );
            if let Err(remove_err) = fs::remove_file(&archive_path) {
                debug!(error = %remove_err, "no partial archive to remove");
            }
            return Err(e);
        }

        info!("[DOWNLOAD] Cleaning up temp files.");
        scratch.remove()?;

        summary.archive = Some(archive_path);
        Ok(summary)
    }
}

fn write_document(
    dir: &Path,
    zone: &str,
    payload: &SnapshotPayload,
    owners: &HashMap<PathBuf, &str>,
) -> Result<PathBuf> {
    if !payload.is_object() {
        return Err(Error::InvalidResponse(format!(
            "snapshot for {} is not a JSON object",
            zone
        )));
    }
    let name = document_name(zone).ok_or_else(|| {
        Error::InvalidResponse(format!("'{}' cannot be used as a file name", zone))
    })?;

    let path = dir.join(&name);
    if let Some(owner) = owners.get(&path).filter(|owner| **owner != zone) {
        return Err(Error::InvalidResponse(format!(
            "document {} for {} is already taken by zone {}",
            name, zone, owner
        )));
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    payload.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(path)
}

fn bundle(archive_path: &Path, documents: &[PathBuf]) -> Result<()> {
    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for document in documents {
        let name = document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Io(std::io::Error::other(format!(
                    "document path has no file name: {}",
                    document.display()
                )))
            })?;
        zip.start_file(name, options)?;
        let mut source = File::open(document)?;
        std::io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}

/// Scratch directory that is removed when dropped, unless removed explicitly first
struct ScratchDir {
    path: PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Create a fresh directory at `path`
    ///
    /// Anything already at `path` belongs to someone else and is left alone.
    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => Error::config(
                "scratch_dir_name",
                format!(
                    "scratch directory {} already exists, remove it or choose another name",
                    path.display()
                ),
            ),
            _ => Error::Io(e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            removed: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Delete every document, then the directory itself
    fn remove(mut self) -> Result<()> {
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            debug!(path = %path.display(), "removing scratch document");
            fs::remove_file(&path)?;
        }
        fs::remove_dir(&self.path)?;
        self.removed = true;
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            error!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            );
        }
    }
}

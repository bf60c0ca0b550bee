// ABOUTME: On-disk store for the routing document with atomic replace semantics.
// ABOUTME: Snapshots are byte-exact copies persisted beside the live document.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::document::RouteDocument;

#[derive(Debug, Error)]
pub enum RouteStoreError {
    /// The current document could not be captured. A deployment must not
    /// proceed without a recoverable baseline.
    #[error("failed to snapshot route document {path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read route document {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("route document {path} is not valid YAML: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to write route document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize route document: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Byte-exact copy of the routing document taken before the first mutation.
///
/// At most one snapshot exists per deployment attempt. The bytes are also
/// persisted to a sidecar file so an abnormally terminated process still
/// leaves a recoverable artifact on disk.
#[derive(Debug, Clone)]
pub struct RouteSnapshot {
    bytes: Vec<u8>,
    backup_path: PathBuf,
}

impl RouteSnapshot {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Remove the sidecar backup. Called when the snapshot is no longer
    /// needed, on commit or after a completed restore.
    pub fn discard(&self) {
        if let Err(e) = fs::remove_file(&self.backup_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("could not remove snapshot backup {}: {}", self.backup_path.display(), e);
        }
    }
}

/// Reads and writes the routing document at a fixed path.
///
/// Writes are whole-file replacements via a temp file and rename, so the
/// proxy never observes a half-written document.
#[derive(Debug, Clone)]
pub struct RouteStore {
    path: PathBuf,
}

impl RouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<RouteDocument, RouteStoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| RouteStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| RouteStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn snapshot(&self) -> Result<RouteSnapshot, RouteStoreError> {
        let bytes = fs::read(&self.path).map_err(|source| RouteStoreError::Snapshot {
            path: self.path.clone(),
            source,
        })?;
        let backup_path = self.path.with_extension("bak");
        fs::write(&backup_path, &bytes).map_err(|source| RouteStoreError::Snapshot {
            path: backup_path.clone(),
            source,
        })?;
        Ok(RouteSnapshot { bytes, backup_path })
    }

    pub fn write(&self, document: &RouteDocument) -> Result<(), RouteStoreError> {
        let yaml = serde_yaml::to_string(document)?;
        self.replace_with(yaml.as_bytes())
    }

    /// Restore the snapshot content over the live document.
    ///
    /// Restoration is the last line of defense: a post-write verification
    /// mismatch is reported as a warning rather than an error, so it cannot
    /// itself abort a rollback.
    pub fn restore(&self, snapshot: &RouteSnapshot) -> Result<(), RouteStoreError> {
        self.replace_with(snapshot.bytes())?;
        match fs::read(&self.path) {
            Ok(written) if written == snapshot.bytes() => {}
            Ok(_) => tracing::warn!(
                "restored route document {} does not match its snapshot",
                self.path.display()
            ),
            Err(e) => tracing::warn!(
                "could not verify restored route document {}: {}",
                self.path.display(),
                e
            ),
        }
        Ok(())
    }

    fn replace_with(&self, bytes: &[u8]) -> Result<(), RouteStoreError> {
        let tmp = self.path.with_extension("tmp");
        let write_err = |source| RouteStoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, bytes).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

// ABOUTME: Deploy lock preventing concurrent attempts on the same service.
// ABOUTME: Atomic create-new lock file with holder info under the state dir.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ServiceName;

use super::error::DeployError;

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Service being deployed.
    pub service: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(service: &ServiceName) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            service: service.to_string(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

/// A held deploy lock. Removed on release, best-effort on drop.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire a deploy lock for the given service.
    ///
    /// Uses atomic create-new file creation, so there is no check-then-create
    /// race. Stale locks (>1 hour) are auto-broken with a warning; `force`
    /// breaks a live lock.
    pub fn acquire(
        state_dir: &Path,
        service: &ServiceName,
        force: bool,
    ) -> Result<Self, DeployError> {
        fs::create_dir_all(state_dir)
            .map_err(|e| DeployError::lock_error(format!("failed to create state dir: {e}")))?;
        let path = state_dir.join(format!("{service}.lock"));

        match Self::try_create(&path, service) {
            Ok(lock) => return Ok(lock),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to acquire lock: {e}"
                )));
            }
        }

        // Lock file exists: decide whether it may be broken.
        if !Self::should_break(&path, force)? {
            match fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<LockInfo>(&raw).ok())
            {
                Some(existing) => {
                    return Err(DeployError::LockHeld {
                        holder: existing.holder,
                        pid: existing.pid,
                        started_at: existing.started_at,
                    });
                }
                None => return Err(DeployError::lock_error("lock held by another process")),
            }
        }

        tracing::debug!("removing stale/forced lock at {}", path.display());
        let _ = fs::remove_file(&path);

        Self::try_create(&path, service).map_err(|e| {
            DeployError::lock_error(format!("lock acquired by another process during break: {e}"))
        })
    }

    fn try_create(path: &Path, service: &ServiceName) -> std::io::Result<Self> {
        let info = LockInfo::new(service);
        let json = serde_json::to_string(&info).map_err(std::io::Error::other)?;
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(json.as_bytes())?;
        Ok(Self {
            path: path.to_path_buf(),
            released: false,
        })
    }

    /// Check if an existing lock should be broken (stale, forced, corrupted).
    fn should_break(path: &Path, force: bool) -> Result<bool, DeployError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                // Unreadable or already gone, break it.
                tracing::warn!("lock info unreadable, breaking lock");
                return Ok(true);
            }
        };

        match serde_json::from_str::<LockInfo>(&raw) {
            Ok(existing) => {
                if force {
                    tracing::warn!(
                        "breaking lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else if existing.is_stale() {
                    tracing::warn!(
                        "auto-breaking stale lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(_) => {
                tracing::warn!("lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    /// Release the lock.
    pub fn release(mut self) {
        let _ = fs::remove_file(&self.path);
        self.released = true;
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let service = ServiceName::new("test-service").unwrap();
        let info = LockInfo::new(&service);

        assert_eq!(info.service, "test-service");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        let service = ServiceName::new("test").unwrap();
        let info = LockInfo::new(&service);
        assert!(!info.is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let service = ServiceName::new("test").unwrap();
        let mut info = LockInfo::new(&service);
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }
}

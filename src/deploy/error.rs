// ABOUTME: Error taxonomy for deployment attempts.
// ABOUTME: Kinds distinguish pre-mutation aborts from failures that need rollback.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::routes::RouteStoreError;
use crate::runtime::RuntimeOpError;
use crate::types::{ImageRef, ServiceName};

/// Errors that can occur during a deployment attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("new service name collides with old instance name: {0}")]
    NameCollision(ServiceName),

    #[error("old service workspace does not exist: {0}")]
    MissingWorkspace(PathBuf),

    #[error("old instance is not running: {0}")]
    OldInstanceNotRunning(ServiceName),

    #[error("an instance named {0} already exists")]
    NewInstanceAlreadyRunning(ServiceName),

    #[error("image not present locally: {0}")]
    ImageNotPresent(ImageRef),

    #[error("no router found for service {0} in the route document")]
    RouterNotFound(ServiceName),

    #[error("failed to create new instance: {0}")]
    InstanceCreation(String),

    #[error("instance address not assigned after {attempts} attempts")]
    AddressUnresolved { attempts: u32 },

    #[error("readiness probe did not succeed within {attempts} attempts")]
    InitialHealthCheck { attempts: u32 },

    #[error("could not capture route snapshot: {0}")]
    Snapshot(RouteStoreError),

    #[error("route document operation failed: {0}")]
    RouteStore(RouteStoreError),

    #[error("canary validation failed before completing {required} checks")]
    CanaryValidation { required: u32 },

    #[error("cutover failed: {0}")]
    Cutover(String),

    #[error("runtime operation failed: {0}")]
    Runtime(#[from] RuntimeOpError),

    #[error("deploy lock held by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("deploy lock error: {0}")]
    Lock(String),

    #[error("deployment aborted by external signal")]
    Aborted,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Preflight,
    InstanceCreation,
    HealthCheck,
    Snapshot,
    RouteWrite,
    Cutover,
    Runtime,
    Lock,
    Aborted,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::NameCollision(_)
            | DeployError::MissingWorkspace(_)
            | DeployError::OldInstanceNotRunning(_)
            | DeployError::NewInstanceAlreadyRunning(_)
            | DeployError::ImageNotPresent(_) => DeployErrorKind::Preflight,
            DeployError::InstanceCreation(_) | DeployError::AddressUnresolved { .. } => {
                DeployErrorKind::InstanceCreation
            }
            DeployError::InitialHealthCheck { .. } | DeployError::CanaryValidation { .. } => {
                DeployErrorKind::HealthCheck
            }
            DeployError::RouterNotFound(_) | DeployError::Snapshot(_) => DeployErrorKind::Snapshot,
            // Canary and cutover writes share the variant; the kind names the
            // operation, not the stage.
            DeployError::RouteStore(_) => DeployErrorKind::RouteWrite,
            DeployError::Cutover(_) => DeployErrorKind::Cutover,
            DeployError::Runtime(_) => DeployErrorKind::Runtime,
            DeployError::LockHeld { .. } | DeployError::Lock(_) => DeployErrorKind::Lock,
            DeployError::Aborted => DeployErrorKind::Aborted,
        }
    }

    /// Whether compensating actions are warranted. Pre-flight and lock
    /// failures occur before any mutation.
    pub fn needs_rollback(&self) -> bool {
        !matches!(
            self.kind(),
            DeployErrorKind::Preflight | DeployErrorKind::Lock
        )
    }

    pub(crate) fn lock_error(msg: impl Into<String>) -> Self {
        DeployError::Lock(msg.into())
    }
}

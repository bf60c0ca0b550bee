// ABOUTME: Runtime adapter boundary: create, inspect, and remove service instances.
// ABOUTME: The orchestrator drives this trait; bollard provides the real implementation.

mod docker;
mod error;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{ContainerId, ImageRef, ServiceName};

pub use docker::DockerRuntime;
pub use error::ConnectError;

/// A running service instance. Owned by the state machine for the duration of
/// one deployment; the adapter never retains a reference after an operation
/// returns.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    pub name: ServiceName,
    pub container_id: ContainerId,
    /// Resolved lazily; empty until the runtime reports it.
    pub address: Option<String>,
    pub workspace: PathBuf,
}

/// Opaque base definition an instance is created from. The orchestrator only
/// instantiates it by name; its contents are prepared out of band.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceTemplate {
    pub name: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Network the instance joins so the proxy can reach it.
    #[serde(default)]
    pub network: Option<String>,
}

impl ServiceTemplate {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            env: HashMap::new(),
            labels: HashMap::new(),
            network: None,
        }
    }
}

/// Errors from individual runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeOpError {
    #[error("instance not found: {0}")]
    NotFound(String),

    #[error("instance already exists: {0}")]
    AlreadyExists(String),

    #[error("failed to prepare workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("runtime rejected image {0}")]
    ImageRejected(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Container runtime operations the deployment state machine depends on.
#[async_trait]
pub trait RuntimeOps: Send + Sync {
    /// Instantiate the service from the named template with the given image
    /// and binding port. Prepares the instance workspace and starts the
    /// container.
    async fn start_instance(
        &self,
        template: &ServiceTemplate,
        image: &ImageRef,
        name: &ServiceName,
        port: u16,
    ) -> Result<InstanceHandle, RuntimeOpError>;

    /// Poll the runtime for the instance's network address. `None` until the
    /// runtime assigns one; not an error by itself, the caller retries.
    async fn resolve_address(&self, handle: &InstanceHandle)
    -> Result<Option<String>, RuntimeOpError>;

    /// Exact-name existence and liveness check.
    async fn is_running(&self, name: &ServiceName) -> Result<bool, RuntimeOpError>;

    /// Local image-availability check, used as a pre-flight gate.
    async fn image_exists(&self, image: &ImageRef) -> Result<bool, RuntimeOpError>;

    /// Force-stop and delete the instance. Removing an already-absent
    /// instance is a no-op, not an error.
    async fn remove(&self, name: &ServiceName) -> Result<(), RuntimeOpError>;
}

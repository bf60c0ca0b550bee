// ABOUTME: Deployment request and the generic deployment struct.
// ABOUTME: The state type parameter carries stage-specific data.

use std::path::PathBuf;

use crate::config::Settings;
use crate::types::{ImageRef, ServiceName};

use super::error::DeployError;
use super::state::Preflighted;

/// Immutable input for one deployment attempt.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub new_service: ServiceName,
    pub new_image: ImageRef,
    pub old_workspace: PathBuf,
    pub old_instance: ServiceName,
    pub binding_port: u16,
}

impl DeploymentRequest {
    /// Build a request, enforcing that the new service name differs from the
    /// old instance name.
    pub fn new(
        new_service: ServiceName,
        new_image: ImageRef,
        old_workspace: PathBuf,
        old_instance: ServiceName,
        binding_port: u16,
    ) -> Result<Self, DeployError> {
        if new_service == old_instance {
            return Err(DeployError::NameCollision(new_service));
        }
        Ok(Self {
            new_service,
            new_image,
            old_workspace,
            old_instance,
            binding_port,
        })
    }
}

/// A deployment in progress, parameterized by its current stage.
///
/// Transitions consume `self` and return the next stage, so stages cannot be
/// skipped or reordered: each depends on data only the prior stage produces.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) request: DeploymentRequest,
    pub(crate) settings: Settings,
    pub(crate) state: S,
}

impl Deployment<Preflighted> {
    /// Begin a deployment whose pre-flight gates have passed.
    pub fn new(request: DeploymentRequest, settings: Settings) -> Self {
        Deployment {
            request,
            settings,
            state: Preflighted,
        }
    }
}

impl<S> Deployment<S> {
    pub fn request(&self) -> &DeploymentRequest {
        &self.request
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

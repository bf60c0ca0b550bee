// ABOUTME: Pre-flight gates checked before any mutating action.
// ABOUTME: A failed gate aborts the attempt with nothing to roll back.

use crate::runtime::RuntimeOps;

use super::deployment::DeploymentRequest;
use super::error::DeployError;

/// Validate the environment for a deployment attempt. Checks, in order:
/// name collision, old workspace presence, old instance liveness, new
/// instance absence, local image availability.
pub async fn preflight<R: RuntimeOps>(
    request: &DeploymentRequest,
    runtime: &R,
) -> Result<(), DeployError> {
    if request.new_service == request.old_instance {
        return Err(DeployError::NameCollision(request.new_service.clone()));
    }
    if !request.old_workspace.is_dir() {
        return Err(DeployError::MissingWorkspace(request.old_workspace.clone()));
    }
    if !runtime.is_running(&request.old_instance).await? {
        return Err(DeployError::OldInstanceNotRunning(
            request.old_instance.clone(),
        ));
    }
    if runtime.is_running(&request.new_service).await? {
        return Err(DeployError::NewInstanceAlreadyRunning(
            request.new_service.clone(),
        ));
    }
    if !runtime.image_exists(&request.new_image).await? {
        return Err(DeployError::ImageNotPresent(request.new_image.clone()));
    }
    Ok(())
}

// ABOUTME: Bollard-based runtime adapter over the local Docker-compatible socket.
// ABOUTME: Works with Docker and Podman; maps API status codes to adapter errors.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bollard::Docker;
use bollard::models::{ContainerCreateBody, EndpointSettings, HostConfig, NetworkingConfig};
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions, StartContainerOptions,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use snafu::ResultExt;

use super::error::{ConnectError, SocketSnafu};
use super::{InstanceHandle, RuntimeOpError, RuntimeOps, ServiceTemplate};
use crate::types::{ContainerId, ImageRef, ServiceName};
use async_trait::async_trait;

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Record written into each instance workspace for operator inspection.
#[derive(Debug, Serialize)]
struct InstanceRecord<'a> {
    service: &'a str,
    image: String,
    template: &'a str,
    port: u16,
    created_at: DateTime<Utc>,
}

/// Runtime adapter talking to the local Docker-compatible API.
pub struct DockerRuntime {
    client: Docker,
    workspace_root: PathBuf,
}

impl DockerRuntime {
    /// Connect to the local runtime socket. `DOCKER_HOST` (unix form) takes
    /// precedence over the default socket path.
    pub fn connect_local(workspace_root: impl Into<PathBuf>) -> Result<Self, ConnectError> {
        let socket = std::env::var("DOCKER_HOST")
            .ok()
            .map(|v| v.trim_start_matches("unix://").to_string())
            .unwrap_or_else(|| DEFAULT_SOCKET.to_string());
        let client = Docker::connect_with_unix(&socket, 120, bollard::API_DEFAULT_VERSION)
            .context(SocketSnafu { socket })?;
        Ok(Self {
            client,
            workspace_root: workspace_root.into(),
        })
    }

    pub fn new(client: Docker, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            workspace_root: workspace_root.into(),
        }
    }

    fn prepare_workspace(
        &self,
        template: &ServiceTemplate,
        image: &ImageRef,
        name: &ServiceName,
        port: u16,
    ) -> Result<PathBuf, RuntimeOpError> {
        let workspace = self.workspace_root.join(name.as_str());
        let map_err = |source| RuntimeOpError::Workspace {
            path: workspace.clone(),
            source,
        };
        fs::create_dir_all(&workspace).map_err(map_err)?;

        let record = InstanceRecord {
            service: name.as_str(),
            image: image.to_string(),
            template: &template.name,
            port,
            created_at: Utc::now(),
        };
        let yaml = serde_yaml::to_string(&record)
            .map_err(|e| RuntimeOpError::Runtime(format!("failed to render instance record: {e}")))?;
        fs::write(workspace.join("instance.yml"), yaml).map_err(map_err)?;
        Ok(workspace)
    }

    fn build_create_body(
        template: &ServiceTemplate,
        image: &ImageRef,
        name: &ServiceName,
        port: u16,
    ) -> ContainerCreateBody {
        let env: Vec<String> = template
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let mut labels: HashMap<String, String> = template.labels.clone();
        labels.insert("relevo.managed".to_string(), "true".to_string());
        labels.insert("relevo.service".to_string(), name.to_string());
        labels.insert("relevo.template".to_string(), template.name.clone());

        let mut host_config = HostConfig::default();
        let mut networking_config = None;
        if let Some(ref network) = template.network {
            host_config.network_mode = Some(network.clone());
            let mut endpoints: HashMap<String, EndpointSettings> = HashMap::new();
            endpoints.insert(
                network.clone(),
                EndpointSettings {
                    aliases: Some(vec![name.to_string()]),
                    ..Default::default()
                },
            );
            networking_config = Some(NetworkingConfig {
                endpoints_config: Some(endpoints),
            });
        }

        ContainerCreateBody {
            image: Some(image.to_string()),
            env: if env.is_empty() { None } else { Some(env) },
            labels: Some(labels),
            exposed_ports: Some(vec![format!("{port}/tcp")]),
            host_config: Some(host_config),
            networking_config,
            ..Default::default()
        }
    }
}

fn remove_workspace_best_effort(workspace: &Path) {
    if let Err(e) = fs::remove_dir_all(workspace)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("could not remove workspace {}: {}", workspace.display(), e);
    }
}

fn map_create_error(e: bollard::errors::Error, image: &ImageRef) -> RuntimeOpError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeOpError::ImageRejected(image.to_string()),
        bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message,
        } => RuntimeOpError::AlreadyExists(message.clone()),
        _ => RuntimeOpError::Runtime(e.to_string()),
    }
}

fn map_not_found(e: bollard::errors::Error, name: &str) -> RuntimeOpError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeOpError::NotFound(name.to_string()),
        _ => RuntimeOpError::Runtime(e.to_string()),
    }
}

#[async_trait]
impl RuntimeOps for DockerRuntime {
    async fn start_instance(
        &self,
        template: &ServiceTemplate,
        image: &ImageRef,
        name: &ServiceName,
        port: u16,
    ) -> Result<InstanceHandle, RuntimeOpError> {
        let workspace = self.prepare_workspace(template, image, name, port)?;

        let body = Self::build_create_body(template, image, name, port);
        let opts = CreateContainerOptions {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let response = match self.client.create_container(Some(opts), body).await {
            Ok(r) => r,
            Err(e) => {
                remove_workspace_best_effort(&workspace);
                return Err(map_create_error(e, image));
            }
        };
        let container_id = ContainerId::new(response.id);

        if let Err(e) = self
            .client
            .start_container(container_id.as_str(), None::<StartContainerOptions>)
            .await
        {
            // Clean up the created container on start failure.
            let _ = self
                .client
                .remove_container(
                    container_id.as_str(),
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await;
            remove_workspace_best_effort(&workspace);
            return Err(RuntimeOpError::Runtime(format!(
                "failed to start instance {name}: {e}"
            )));
        }

        Ok(InstanceHandle {
            name: name.clone(),
            container_id,
            address: None,
            workspace,
        })
    }

    async fn resolve_address(
        &self,
        handle: &InstanceHandle,
    ) -> Result<Option<String>, RuntimeOpError> {
        let details = self
            .client
            .inspect_container(handle.container_id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_not_found(e, handle.name.as_str()))?;

        let address = details
            .network_settings
            .and_then(|settings| settings.networks)
            .and_then(|networks| {
                networks
                    .into_values()
                    .filter_map(|endpoint| endpoint.ip_address)
                    .find(|ip| !ip.is_empty())
            });
        Ok(address)
    }

    async fn is_running(&self, name: &ServiceName) -> Result<bool, RuntimeOpError> {
        match self
            .client
            .inspect_container(name.as_str(), None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => Ok(details
                .state
                .and_then(|s| s.status)
                .map(|s| s == bollard::models::ContainerStateStatusEnum::RUNNING)
                .unwrap_or(false)),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(RuntimeOpError::Runtime(e.to_string())),
        }
    }

    async fn image_exists(&self, image: &ImageRef) -> Result<bool, RuntimeOpError> {
        match self.client.inspect_image(&image.to_string()).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(RuntimeOpError::Runtime(format!(
                "failed to inspect {image}: {e}"
            ))),
        }
    }

    async fn remove(&self, name: &ServiceName) -> Result<(), RuntimeOpError> {
        let opts = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.client.remove_container(name.as_str(), Some(opts)).await {
            Ok(()) => Ok(()),
            // Absent instance: removal is idempotent.
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(RuntimeOpError::Runtime(e.to_string())),
        }
    }
}

// ABOUTME: In-memory RuntimeOps implementation recording every mutation.
// ABOUTME: Lets tests drive the state machine without a container runtime.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;

use relevo::runtime::{InstanceHandle, RuntimeOpError, RuntimeOps, ServiceTemplate};
use relevo::types::{ContainerId, ImageRef, ServiceName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Removed(String),
}

#[derive(Default)]
struct Inner {
    running: HashSet<String>,
    images: HashSet<String>,
    addresses: HashMap<String, String>,
    /// Polls to swallow before an address is reported.
    address_delay: HashMap<String, u32>,
    fail_start: bool,
    events: Vec<Event>,
}

/// Fake container runtime with scripted liveness, images, and addresses.
pub struct FakeRuntime {
    workspace_root: PathBuf,
    inner: Mutex<Inner>,
}

impl FakeRuntime {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn add_running(&self, name: &str) {
        self.inner.lock().running.insert(name.to_string());
    }

    pub fn add_image(&self, image: &str) {
        self.inner.lock().images.insert(image.to_string());
    }

    pub fn set_address(&self, name: &str, address: &str) {
        self.inner
            .lock()
            .addresses
            .insert(name.to_string(), address.to_string());
    }

    pub fn delay_address(&self, name: &str, polls: u32) {
        self.inner.lock().address_delay.insert(name.to_string(), polls);
    }

    pub fn fail_start(&self) {
        self.inner.lock().fail_start = true;
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.inner.lock().running.contains(name)
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().events.clone()
    }
}

#[async_trait]
impl RuntimeOps for FakeRuntime {
    async fn start_instance(
        &self,
        _template: &ServiceTemplate,
        image: &ImageRef,
        name: &ServiceName,
        _port: u16,
    ) -> Result<InstanceHandle, RuntimeOpError> {
        let workspace = self.workspace_root.join(name.as_str());
        {
            let mut inner = self.inner.lock();
            if inner.fail_start {
                return Err(RuntimeOpError::Runtime("start refused".to_string()));
            }
            if inner.running.contains(name.as_str()) {
                return Err(RuntimeOpError::AlreadyExists(name.to_string()));
            }
            if !inner.images.contains(&image.to_string()) {
                return Err(RuntimeOpError::ImageRejected(image.to_string()));
            }
            inner.running.insert(name.to_string());
            inner.events.push(Event::Started(name.to_string()));
        }
        std::fs::create_dir_all(&workspace).map_err(|source| RuntimeOpError::Workspace {
            path: workspace.clone(),
            source,
        })?;
        Ok(InstanceHandle {
            name: name.clone(),
            container_id: ContainerId::new(format!("fake-{name}")),
            address: None,
            workspace,
        })
    }

    async fn resolve_address(
        &self,
        handle: &InstanceHandle,
    ) -> Result<Option<String>, RuntimeOpError> {
        let mut inner = self.inner.lock();
        if let Some(delay) = inner.address_delay.get_mut(handle.name.as_str()) {
            if *delay > 0 {
                *delay -= 1;
                return Ok(None);
            }
        }
        Ok(inner.addresses.get(handle.name.as_str()).cloned())
    }

    async fn is_running(&self, name: &ServiceName) -> Result<bool, RuntimeOpError> {
        Ok(self.inner.lock().running.contains(name.as_str()))
    }

    async fn image_exists(&self, image: &ImageRef) -> Result<bool, RuntimeOpError> {
        Ok(self.inner.lock().images.contains(&image.to_string()))
    }

    async fn remove(&self, name: &ServiceName) -> Result<(), RuntimeOpError> {
        let mut inner = self.inner.lock();
        // Removing an absent instance is a no-op.
        inner.running.remove(name.as_str());
        inner.events.push(Event::Removed(name.to_string()));
        Ok(())
    }
}

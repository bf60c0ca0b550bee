// ABOUTME: Run-once rollback controller restoring pre-deployment state.
// ABOUTME: Armed progressively as mutating stages begin, disarmed only on commit.

use std::path::PathBuf;

use parking_lot::Mutex;

use crate::routes::{RouteSnapshot, RouteStore};
use crate::runtime::RuntimeOps;
use crate::types::ServiceName;

#[derive(Debug)]
struct ArmedInstance {
    name: ServiceName,
    workspace: PathBuf,
}

#[derive(Debug, Default)]
struct GuardState {
    fired: bool,
    disarmed: bool,
    instance: Option<ArmedInstance>,
    snapshot: Option<RouteSnapshot>,
}

/// Compensating-action runner for one deployment attempt.
///
/// Armed before the first action that can leave residual state and disarmed
/// only after the terminal commit. `run` executes at most once per attempt,
/// so an explicit failure path and an abort handler cannot double-clean.
#[derive(Debug, Default)]
pub struct RollbackGuard {
    state: Mutex<GuardState>,
}

impl RollbackGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the new instance (and its workspace) may now exist.
    pub fn arm_instance(&self, name: ServiceName, workspace: PathBuf) {
        self.state.lock().instance = Some(ArmedInstance { name, workspace });
    }

    /// Record the route snapshot to restore. At most one per attempt.
    pub fn arm_snapshot(&self, snapshot: RouteSnapshot) {
        self.state.lock().snapshot = Some(snapshot);
    }

    /// Deactivate the guard after a committed deployment and discard the
    /// snapshot bookkeeping.
    pub fn disarm(&self) {
        let snapshot = {
            let mut state = self.state.lock();
            state.disarmed = true;
            state.snapshot.take()
        };
        if let Some(snapshot) = snapshot {
            snapshot.discard();
        }
    }

    /// Execute the compensating actions. Returns true if this call performed
    /// them, false if the guard was already fired, disarmed, or never armed.
    ///
    /// Steps are independently fault-tolerant: a failing step is logged and
    /// the remaining steps still run.
    pub async fn run<R: RuntimeOps>(&self, runtime: &R, store: &RouteStore) -> bool {
        let (instance, snapshot) = {
            let mut state = self.state.lock();
            if state.fired || state.disarmed {
                return false;
            }
            if state.instance.is_none() && state.snapshot.is_none() {
                return false;
            }
            state.fired = true;
            (state.instance.take(), state.snapshot.take())
        };

        if let Some(snapshot) = snapshot {
            if let Err(e) = store.restore(&snapshot) {
                tracing::warn!("rollback could not restore route document: {}", e);
            }
            snapshot.discard();
        }

        if let Some(instance) = instance {
            if let Err(e) = runtime.remove(&instance.name).await {
                tracing::warn!("rollback could not remove instance {}: {}", instance.name, e);
            }
            if let Err(e) = std::fs::remove_dir_all(&instance.workspace)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    "rollback could not remove workspace {}: {}",
                    instance.workspace.display(),
                    e
                );
            }
        }

        true
    }
}

// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::probe::HealthProber;
use crate::routes::RouteStore;
use crate::runtime::RuntimeOps;
use crate::types::ServiceName;

use super::Deployment;
use super::error::DeployError;
use super::guard::RollbackGuard;
use super::state::{
    CanaryRouted, CanaryValidated, Committed, CutOver, HealthChecked, InstanceStarted, Preflighted,
};

// =============================================================================
// Preflighted -> InstanceStarted
// =============================================================================

impl Deployment<Preflighted> {
    /// Start the new instance in isolation. No router references it yet.
    ///
    /// The guard is armed before the runtime call: a failed creation can
    /// still leave a workspace or a half-created container behind.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InstanceCreation` if the workspace cannot be
    /// prepared or the runtime rejects the image.
    #[must_use = "deployment state must be used"]
    pub async fn start_instance<R: RuntimeOps>(
        self,
        runtime: &R,
        guard: &RollbackGuard,
    ) -> Result<Deployment<InstanceStarted>, DeployError> {
        let workspace = self
            .settings
            .workspace_root
            .join(self.request.new_service.as_str());
        guard.arm_instance(self.request.new_service.clone(), workspace);

        let handle = runtime
            .start_instance(
                &self.settings.template,
                &self.request.new_image,
                &self.request.new_service,
                self.request.binding_port,
            )
            .await
            .map_err(|e| DeployError::InstanceCreation(e.to_string()))?;

        let Deployment {
            request, settings, ..
        } = self;
        Ok(Deployment {
            request,
            settings,
            state: InstanceStarted { handle },
        })
    }
}

// =============================================================================
// InstanceStarted -> HealthChecked
// =============================================================================

impl Deployment<InstanceStarted> {
    /// Resolve the instance address and wait for its readiness probe, both
    /// with bounded attempt budgets.
    ///
    /// # Errors
    ///
    /// Returns `AddressUnresolved` or `InitialHealthCheck` when a budget is
    /// exhausted.
    #[must_use = "deployment state must be used"]
    pub async fn await_ready<R: RuntimeOps>(
        self,
        runtime: &R,
        prober: &HealthProber,
    ) -> Result<Deployment<HealthChecked>, DeployError> {
        let resolve = self.settings.address_resolve;
        let mut address = None;
        for attempt in 1..=resolve.attempts {
            if let Some(found) = runtime.resolve_address(&self.state.handle).await? {
                address = Some(found);
                break;
            }
            if attempt < resolve.attempts {
                tokio::time::sleep(resolve.interval).await;
            }
        }
        let Some(address) = address else {
            return Err(DeployError::AddressUnresolved {
                attempts: resolve.attempts,
            });
        };

        let url = format!(
            "http://{}:{}{}",
            address, self.request.binding_port, self.settings.health_path
        );
        if !prober
            .wait_until_healthy(&url, &self.settings.initial_health)
            .await
        {
            return Err(DeployError::InitialHealthCheck {
                attempts: self.settings.initial_health.attempts,
            });
        }

        let Deployment {
            request,
            settings,
            state: InstanceStarted { mut handle },
        } = self;
        handle.address = Some(address);
        Ok(Deployment {
            request,
            settings,
            state: HealthChecked { handle },
        })
    }
}

// =============================================================================
// HealthChecked -> CanaryRouted
// =============================================================================

impl Deployment<HealthChecked> {
    /// Snapshot the current route document, then replace it with a weighted
    /// split under the discovered router.
    ///
    /// # Errors
    ///
    /// Returns `Snapshot` if the current document cannot be captured: the
    /// deployment must not proceed without a baseline to roll back to.
    #[must_use = "deployment state must be used"]
    pub fn shift_canary(
        self,
        store: &RouteStore,
        guard: &RollbackGuard,
    ) -> Result<Deployment<CanaryRouted>, DeployError> {
        let document = store.read().map_err(DeployError::Snapshot)?;
        let router = document
            .discover_router(&self.request.old_instance)
            .ok_or_else(|| DeployError::RouterNotFound(self.request.old_instance.clone()))?
            .to_string();

        let snapshot = store.snapshot().map_err(DeployError::Snapshot)?;
        guard.arm_snapshot(snapshot);

        let canary = document.with_canary_split(
            &router,
            &self.request.old_instance,
            &self.request.new_service,
            self.settings.canary.old_weight,
            self.settings.canary.new_weight,
        );
        store.write(&canary).map_err(DeployError::RouteStore)?;

        let Deployment {
            request,
            settings,
            state: HealthChecked { handle },
        } = self;
        Ok(Deployment {
            request,
            settings,
            state: CanaryRouted { handle, router },
        })
    }
}

// =============================================================================
// CanaryRouted -> CanaryValidated
// =============================================================================

impl Deployment<CanaryRouted> {
    /// Exercise the public entrypoint for the canary window. The first failed
    /// probe aborts the canary; checks are fail-fast, not averaged.
    #[must_use = "deployment state must be used"]
    pub async fn validate_canary(
        self,
        prober: &HealthProber,
    ) -> Result<Deployment<CanaryValidated>, DeployError> {
        let canary = self.settings.canary;
        if !prober
            .validate_under_load(
                &self.settings.public_endpoint,
                canary.checks,
                canary.interval,
            )
            .await
        {
            return Err(DeployError::CanaryValidation {
                required: canary.checks,
            });
        }
        let Deployment {
            request,
            settings,
            state: CanaryRouted { handle, router },
        } = self;
        Ok(Deployment {
            request,
            settings,
            state: CanaryValidated { handle, router },
        })
    }
}

// =============================================================================
// CanaryValidated -> CutOver
// =============================================================================

impl Deployment<CanaryValidated> {
    /// Route all traffic to the new service, let the proxy settle, and issue
    /// one final probe against the public entrypoint.
    ///
    /// # Errors
    ///
    /// Returns `Cutover` if the final probe fails; the rollback restores the
    /// pre-canary document, undoing the entire migration.
    #[must_use = "deployment state must be used"]
    pub async fn cutover(
        self,
        store: &RouteStore,
        prober: &HealthProber,
    ) -> Result<Deployment<CutOver>, DeployError> {
        let document = store.read().map_err(DeployError::RouteStore)?;
        let full = document.with_cutover(&self.state.router, &self.request.new_service);
        store.write(&full).map_err(DeployError::RouteStore)?;

        tokio::time::sleep(self.settings.settle_delay).await;

        if !prober.probe_once(&self.settings.public_endpoint).await {
            return Err(DeployError::Cutover(
                "final probe against public entrypoint failed".to_string(),
            ));
        }

        let Deployment {
            request,
            settings,
            state: CanaryValidated { handle, .. },
        } = self;
        Ok(Deployment {
            request,
            settings,
            state: CutOver { handle },
        })
    }
}

// =============================================================================
// CutOver -> Committed
// =============================================================================

impl Deployment<CutOver> {
    /// Remove the old instance and its workspace. Best-effort: the new
    /// version is already live and correct, so failures here are logged and
    /// never escalate to a rollback.
    #[must_use = "deployment state must be used"]
    pub async fn decommission<R: RuntimeOps>(self, runtime: &R) -> Deployment<Committed> {
        if let Err(e) = runtime.remove(&self.request.old_instance).await {
            tracing::warn!(
                "could not remove old instance {}: {}",
                self.request.old_instance,
                e
            );
        }
        if let Err(e) = std::fs::remove_dir_all(&self.request.old_workspace)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(
                "could not remove old workspace {}: {}",
                self.request.old_workspace.display(),
                e
            );
        }

        let Deployment {
            request,
            settings,
            state: CutOver { handle },
        } = self;
        Deployment {
            request,
            settings,
            state: Committed { handle },
        }
    }
}

// =============================================================================
// Committed - Terminal State
// =============================================================================

impl Deployment<Committed> {
    /// Name of the instance now serving all traffic.
    pub fn deployed_instance(&self) -> &ServiceName {
        &self.state.handle.name
    }

    pub fn address(&self) -> Option<&str> {
        self.state.handle.address.as_deref()
    }
}

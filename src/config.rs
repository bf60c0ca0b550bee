// ABOUTME: Orchestrator settings with defaults and optional YAML override file.
// ABOUTME: Timing constants live here so control logic stays testable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::probe::RetryPolicy;
use crate::runtime::ServiceTemplate;

/// Canary stage tuning. The 90/10 split is a conservative fixed ratio:
/// a single canary stage bounds deployment duration, at the cost of
/// gradualness.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CanarySettings {
    pub checks: u32,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub old_weight: u32,
    pub new_weight: u32,
}

impl Default for CanarySettings {
    fn default() -> Self {
        Self {
            checks: 10,
            interval: Duration::from_secs(3),
            old_weight: 90,
            new_weight: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Path of the declarative routing document the proxy watches.
    pub route_file: PathBuf,
    /// Public entrypoint probed during canary validation and after cutover.
    pub public_endpoint: String,
    /// Readiness endpoint path on the instance itself.
    pub health_path: String,
    /// Budget for the runtime to assign the instance an address.
    pub address_resolve: RetryPolicy,
    /// Budget for the instance-internal readiness probe.
    pub initial_health: RetryPolicy,
    pub canary: CanarySettings,
    /// Delay between the cutover write and the final probe.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    /// Per-probe timeout.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    /// Base definition new instances are created from.
    pub template: ServiceTemplate,
    /// Directory instance workspaces are created under.
    pub workspace_root: PathBuf,
    /// Directory for lock files and bookkeeping.
    pub state_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            route_file: PathBuf::from("/etc/traefik/dynamic/relevo.yml"),
            public_endpoint: "http://127.0.0.1/".to_string(),
            health_path: "/health".to_string(),
            address_resolve: RetryPolicy::new(10, Duration::from_secs(1)),
            initial_health: RetryPolicy::new(15, Duration::from_secs(2)),
            canary: CanarySettings::default(),
            settle_delay: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(5),
            template: ServiceTemplate::named("default"),
            workspace_root: PathBuf::from("/var/lib/relevo"),
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/state/relevo"),
        None => PathBuf::from("/var/lib/relevo/state"),
    }
}

impl Settings {
    /// Load settings, applying the override file when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                serde_yaml::from_str(&raw)?
            }
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject endpoints the prober cannot reach, so a misconfigured endpoint
    /// surfaces as a config error instead of a failed health check and a
    /// spurious rollback. Must be re-run after CLI overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if !crate::probe::is_probe_url(&self.public_endpoint) {
            return Err(Error::Config(format!(
                "public endpoint {} is not a plain http:// URL; probes are sent \
                 over plain HTTP behind the TLS-terminating proxy",
                self.public_endpoint
            )));
        }
        Ok(())
    }
}

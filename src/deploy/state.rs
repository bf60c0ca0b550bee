// ABOUTME: Deployment state types for the type state pattern.
// ABOUTME: Each state carries the data the remaining stages depend on.

use crate::runtime::InstanceHandle;

/// Pre-flight gates passed, no mutation has occurred.
/// Available actions: `start_instance()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Preflighted;

/// New instance running in isolation, not referenced by any router.
/// Available actions: `await_ready()`
#[derive(Debug)]
pub struct InstanceStarted {
    pub(crate) handle: InstanceHandle,
}

/// Instance address resolved and readiness probe succeeded.
/// Available actions: `shift_canary()`
#[derive(Debug)]
pub struct HealthChecked {
    pub(crate) handle: InstanceHandle,
}

/// Route document snapshotted and replaced with the weighted canary split.
/// Available actions: `validate_canary()`
#[derive(Debug)]
pub struct CanaryRouted {
    pub(crate) handle: InstanceHandle,
    pub(crate) router: String,
}

/// Canary window passed under live traffic.
/// Available actions: `cutover()`
#[derive(Debug)]
pub struct CanaryValidated {
    pub(crate) handle: InstanceHandle,
    pub(crate) router: String,
}

/// All traffic on the new instance, final probe confirmed.
/// Available actions: `decommission()`
#[derive(Debug)]
pub struct CutOver {
    pub(crate) handle: InstanceHandle,
}

/// Terminal state: old instance gone, rollback guard may be disarmed.
#[derive(Debug)]
pub struct Committed {
    pub(crate) handle: InstanceHandle,
}

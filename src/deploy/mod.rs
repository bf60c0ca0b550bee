// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Stages run strictly in order; the rollback guard compensates any failure.

mod deployment;
mod error;
mod guard;
mod lock;
mod preflight;
mod state;
mod transitions;

pub use deployment::{Deployment, DeploymentRequest};
pub use error::{DeployError, DeployErrorKind};
pub use guard::RollbackGuard;
pub use lock::{DeployLock, LockInfo};
pub use preflight::preflight;
pub use state::{
    CanaryRouted, CanaryValidated, Committed, CutOver, HealthChecked, InstanceStarted, Preflighted,
};

// ABOUTME: Application-wide error types for relevo.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

use crate::deploy::DeployError;
use crate::runtime::ConnectError;
use crate::types::{ParseImageRefError, ServiceNameError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid service name: {0}")]
    ServiceName(#[from] ServiceNameError),

    #[error("invalid image reference: {0}")]
    ImageRef(#[from] ParseImageRefError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

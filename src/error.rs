use thiserror::Error;

use crate::build::BuildError;
use crate::config::{ConfigError, ValidationError};
use crate::platform::PlatformError;
use crate::provision::ProvisionError;
use crate::spec::SpecError;

/// Any failure that aborts a run; each stage is fail-fast
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid app spec: {0}")]
    Spec(#[from] SpecError),

    #[error("Image build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Registry provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Platform request failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("Failed to write run outputs: {0}")]
    Outputs(#[from] std::io::Error),

    #[error("Failed to encode descriptor: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;

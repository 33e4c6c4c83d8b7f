use async_trait::async_trait;
use thiserror::Error;

use super::models::{AppDetail, NewRegistry, RegistryRef};
use crate::descriptor::AppDescriptor;

/// Platform API errors. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("{method} {path} failed: {message}")]
    Request {
        method: String,
        path: String,
        message: String,
    },

    #[error("Unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Response from {path} is missing '{field}'")]
    MissingField { path: String, field: String },

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Remote container platform, one sequential request/response per call
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// `GET /registries`
    async fn list_registries(&self) -> Result<Vec<RegistryRef>, PlatformError>;

    /// `POST /registries`
    async fn create_registry(&self, request: &NewRegistry) -> Result<RegistryRef, PlatformError>;

    /// `POST /apps`, returning the new application id
    async fn create_app(&self, descriptor: &AppDescriptor) -> Result<String, PlatformError>;

    /// `POST /apps/{id}/deploy`
    async fn deploy_app(&self, app_id: &str) -> Result<(), PlatformError>;

    /// `GET /apps/{id}`
    async fn get_app(&self, app_id: &str) -> Result<AppDetail, PlatformError>;
}

//! Configuration management for deckhand
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command-line overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use deckhand::config::{Overrides, Settings};
//!
//! let settings = Settings::load(None, &Overrides::new()).expect("Failed to load configuration");
//! println!("Deploying to: {}", settings.platform.api_url);
//! ```
//!
//! # Environment Variables
//!
//! Settings can be overridden using environment variables with the pattern:
//! `DECKHAND__<section>__<key>`
//!
//! Examples:
//! - `DECKHAND__PLATFORM__API_URL=https://api.example.com/v1`
//! - `DECKHAND__APP__NAME=shop`
//! - `DECKHAND__DEPLOY__TIMEOUT=15m`
//!
//! Secrets are read only from `DECKHAND_ACCESS_KEY`, `DECKHAND_REGISTRY_PASSWORD`,
//! `DECKHAND_PRIVATE_REGISTRY_TOKEN` and `DECKHAND_PRIVATE_REGISTRY_PASSWORD`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `deckhand.toml`.
//! This can be overridden using `--config` or the `DECKHAND_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use crate::humanize::HumanDuration;
pub use models::{
    AppSettings, BuildSettings, DeploySettings, EndpointSettings, PlatformSettings,
    PrivateRegistrySettings, PushRegistrySettings, Settings,
};
pub use sources::Overrides;
pub use validation::ValidationError;

use crate::build::RegistryLogin;
use crate::deploy::WaitPolicy;
use crate::descriptor::EndpointDefaults;
use crate::platform::HttpConfig;
use crate::provision::RegistryCredentials;
use crate::spec::{DeploymentType, ResolveDefaults, image};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_BUILD_ID: &str = "latest";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Settings {
    /// Load settings from all sources (file + environment + overrides)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (missing region, unknown endpoint kind, etc.)
    pub fn load(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let settings = sources::load(config_path, overrides)?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific path, without `.env` or secrets
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let settings = sources::load_from_sources(path, &Overrides::new())?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Build identifier: explicit SHA, else `latest`
    pub fn build_id(&self) -> String {
        self.build
            .sha
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BUILD_ID)
            .to_string()
    }

    pub fn resolve_defaults(&self) -> ResolveDefaults {
        ResolveDefaults {
            default_registry: self.push_registry.host.trim().trim_end_matches('/').to_string(),
            build_id: self.build_id(),
            app_name: self.app.name.clone().filter(|n| !n.trim().is_empty()),
            deployment_type: DeploymentType::parse(&self.app.deployment_type),
            region: self.app.region.clone().filter(|r| !r.trim().is_empty()),
            create_endpoints: self.endpoint.create,
        }
    }

    /// Registry host part of the push prefix (`ghcr.io/acme` -> `ghcr.io`)
    pub fn push_registry_host(&self) -> String {
        let prefix = self.push_registry.host.trim();
        image::registry_host(prefix)
            .unwrap_or(prefix)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn registry_credentials(&self) -> RegistryCredentials {
        let private = &self.private_registry;
        RegistryCredentials {
            name: private.name.clone(),
            provision: private.provision,
            kind: private.kind.clone(),
            host: self.push_registry_host(),
            username: private
                .username
                .clone()
                .or_else(|| self.push_registry.username.clone())
                .unwrap_or_default(),
            token: private.token.clone(),
            password: private
                .password
                .clone()
                .or_else(|| self.push_registry.password.clone()),
        }
    }

    /// Login for pushing built images, when both username and password are set
    pub fn registry_login(&self) -> Option<RegistryLogin> {
        let username = self.push_registry.username.as_deref()?.trim();
        let password = self.push_registry.password.as_deref()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }

        Some(RegistryLogin {
            host: self.push_registry_host(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn endpoint_defaults(&self) -> EndpointDefaults {
        EndpointDefaults {
            name: self.endpoint.name.trim().to_string(),
            kind: self.endpoint.kind.parse().unwrap_or_default(),
            container: self.endpoint.container.clone().filter(|c| !c.trim().is_empty()),
            exposed_port: self.endpoint.exposed_port,
        }
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.deploy.wait, self.deploy.timeout.as_duration())
    }

    /// Connection settings for the platform client
    ///
    /// # Errors
    ///
    /// Fails when the access key is missing or the API URL is not http(s).
    pub fn http_config(&self) -> Result<HttpConfig, ValidationError> {
        validation::validate_platform(&self.platform)?;

        Ok(HttpConfig {
            base_url: self.platform.api_url.trim().to_string(),
            access_key: self.platform.access_key.clone().unwrap_or_default(),
            connect_timeout: self.platform.connect_timeout.as_duration(),
            request_timeout: self.platform.request_timeout.as_duration(),
            ..HttpConfig::default()
        })
    }
}

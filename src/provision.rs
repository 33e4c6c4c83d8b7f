//! Idempotent registry provisioning
//!
//! One list call, then at most two creates: a public pull registry for
//! pre-built images and a private push registry for images this run builds.
//! Lookup by name or host is authoritative; creation only happens on a miss.

use thiserror::Error;
use tracing::{info, warn};

use crate::platform::{NewRegistry, PlatformApi, PlatformError, RegistryRef};
use crate::spec::ContainerSpec;

pub const PUBLIC_REGISTRY_NAME: &str = "Docker Hub (public pulls)";
pub const PUBLIC_REGISTRY_KIND: &str = "dockerhub";
pub const PUBLIC_REGISTRY_HOST: &str = "docker.io";
/// Placeholder credentials for anonymous public pulls; not secrets
pub const PUBLIC_REGISTRY_USERNAME: &str = "anonymous";
pub const PUBLIC_REGISTRY_PASSWORD: &str = "anonymous";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Cannot create registry '{registry}': a username and a token or password are required")]
    MissingCredentials { registry: String },
}

/// Private registry inputs
#[derive(Debug, Clone, Default)]
pub struct RegistryCredentials {
    /// Display name to look up or create; defaults to `host`
    pub name: Option<String>,
    /// Create the registry when the lookup misses
    pub provision: bool,
    /// Platform registry type, e.g. `ghcr` or `generic`
    pub kind: String,
    pub host: String,
    pub username: String,
    pub token: Option<String>,
    pub password: Option<String>,
}

impl RegistryCredentials {
    /// Name the push registry is looked up by; `None` means no push registry
    pub fn display_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .or_else(|| Some(self.host.trim().to_string()).filter(|h| !h.is_empty()))
    }

    fn secret(&self) -> Option<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.password.as_deref().filter(|p| !p.is_empty()))
    }
}

/// Registry ids resolved for this run, referenced read-only afterwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryIds {
    pub pull: Option<String>,
    pub push: Option<String>,
}

/// Whether a run would look up the public pull registry
pub fn needs_pull_registry(containers: &[ContainerSpec]) -> bool {
    containers.iter().any(|c| !c.build)
}

/// Whether a run would look up (and maybe create) a private push registry
pub fn needs_push_registry(
    containers: &[ContainerSpec],
    credentials: &RegistryCredentials,
) -> bool {
    containers.iter().any(|c| c.build)
        && (credentials.provision
            || credentials
                .name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty()))
}

/// Find or create the registries the containers need
pub async fn provision_registries(
    api: &dyn PlatformApi,
    containers: &[ContainerSpec],
    credentials: &RegistryCredentials,
) -> Result<RegistryIds, ProvisionError> {
    let needs_pull = needs_pull_registry(containers);
    let needs_push = needs_push_registry(containers, credentials);

    let mut ids = RegistryIds::default();
    if !needs_pull && !needs_push {
        return Ok(ids);
    }

    let existing = api.list_registries().await?;
    info!(count = existing.len(), "Listed registries");

    if needs_pull {
        ids.pull = Some(ensure_public_registry(api, &existing).await?);
    }

    if needs_push {
        ids.push = ensure_private_registry(api, &existing, credentials).await?;
    }

    Ok(ids)
}

async fn ensure_public_registry(
    api: &dyn PlatformApi,
    existing: &[RegistryRef],
) -> Result<String, ProvisionError> {
    if let Some(found) = existing.iter().find(|r| r.is_public_pull()) {
        info!(registry_id = %found.id, name = %found.name, "Reusing public pull registry");
        return Ok(found.id.clone());
    }

    let created = api
        .create_registry(&NewRegistry {
            name: PUBLIC_REGISTRY_NAME.to_string(),
            kind: PUBLIC_REGISTRY_KIND.to_string(),
            host: PUBLIC_REGISTRY_HOST.to_string(),
            username: PUBLIC_REGISTRY_USERNAME.to_string(),
            password: PUBLIC_REGISTRY_PASSWORD.to_string(),
            public: true,
        })
        .await?;

    info!(registry_id = %created.id, "Created public pull registry");
    Ok(created.id)
}

async fn ensure_private_registry(
    api: &dyn PlatformApi,
    existing: &[RegistryRef],
    credentials: &RegistryCredentials,
) -> Result<Option<String>, ProvisionError> {
    let Some(name) = credentials.display_name() else {
        warn!("No private registry name or host configured, built images use no registry");
        return Ok(None);
    };

    if let Some(found) = existing.iter().find(|r| r.name_matches(&name)) {
        info!(registry_id = %found.id, name = %found.name, "Reusing private registry");
        return Ok(Some(found.id.clone()));
    }

    if !credentials.provision {
        warn!(name = %name, "Private registry not found and provisioning is disabled");
        return Ok(None);
    }

    let secret = match credentials.secret() {
        Some(secret) if !credentials.username.trim().is_empty() => secret,
        _ => return Err(ProvisionError::MissingCredentials { registry: name }),
    };

    let created = api
        .create_registry(&NewRegistry {
            name: name.clone(),
            kind: credentials.kind.clone(),
            host: credentials.host.clone(),
            username: credentials.username.clone(),
            password: secret.to_string(),
            public: false,
        })
        .await?;

    info!(registry_id = %created.id, name = %name, "Created private registry");
    Ok(Some(created.id))
}

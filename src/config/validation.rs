use super::models::{PlatformSettings, Settings};
use crate::spec::{DeploymentType, EndpointKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Platform access key is missing (set DECKHAND_ACCESS_KEY)")]
    MissingAccessKey,

    #[error("Invalid platform API URL '{url}', expected 'http://' or 'https://'")]
    InvalidApiUrl { url: String },

    #[error("Deploy timeout must be positive when waiting for the deployment")]
    ZeroTimeout,

    #[error("Private registry provisioning requires a username and a token or password")]
    MissingRegistryCredentials,

    #[error("Unknown endpoint kind '{kind}', expected 'cdn' or 'anycast'")]
    InvalidEndpointKind { kind: String },

    #[error("Deployment type 'single' requires a region")]
    MissingRegion,
}

/// Validate everything that does not require talking to the platform
pub fn validate(settings: &Settings) -> Result<(), ValidationError> {
    validate_deploy(settings)?;
    validate_private_registry(settings)?;
    validate_endpoint(settings)?;
    validate_app(settings)?;
    Ok(())
}

/// Connection settings, checked only by commands that reach the platform
pub fn validate_platform(platform: &PlatformSettings) -> Result<(), ValidationError> {
    if platform
        .access_key
        .as_deref()
        .is_none_or(|k| k.trim().is_empty())
    {
        return Err(ValidationError::MissingAccessKey);
    }

    let url = platform.api_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidApiUrl {
            url: platform.api_url.clone(),
        });
    }

    Ok(())
}

fn validate_deploy(settings: &Settings) -> Result<(), ValidationError> {
    if settings.deploy.wait && settings.deploy.timeout.as_secs() == 0 {
        return Err(ValidationError::ZeroTimeout);
    }

    Ok(())
}

fn validate_private_registry(settings: &Settings) -> Result<(), ValidationError> {
    let registry = &settings.private_registry;
    if !registry.provision {
        return Ok(());
    }

    let has_username = registry
        .username
        .as_deref()
        .or(settings.push_registry.username.as_deref())
        .is_some_and(|u| !u.trim().is_empty());
    let has_secret = [&registry.token, &registry.password, &settings.push_registry.password]
        .into_iter()
        .any(|s| s.as_deref().is_some_and(|s| !s.is_empty()));

    if !has_username || !has_secret {
        return Err(ValidationError::MissingRegistryCredentials);
    }

    Ok(())
}

fn validate_endpoint(settings: &Settings) -> Result<(), ValidationError> {
    settings
        .endpoint
        .kind
        .parse::<EndpointKind>()
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidEndpointKind {
            kind: settings.endpoint.kind.clone(),
        })
}

fn validate_app(settings: &Settings) -> Result<(), ValidationError> {
    let single = DeploymentType::parse(&settings.app.deployment_type) == DeploymentType::Single;
    let has_region = settings
        .app
        .region
        .as_deref()
        .is_some_and(|r| !r.trim().is_empty());

    if single && !has_region {
        return Err(ValidationError::MissingRegion);
    }

    Ok(())
}

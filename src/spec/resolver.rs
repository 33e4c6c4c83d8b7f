use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{
    AppSpec, ContainerSpec, DeploymentType, RawContainer, RawDescriptor, SourceKind,
};

const DEFAULT_CONTEXT: &str = ".";
const DEFAULT_DOCKERFILE: &str = "Dockerfile";
const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("No container configuration: provide an inline container list or a descriptor file")]
    NoSource,

    #[error("Failed to read descriptor {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Application name is required (set it explicitly or in the descriptor file)")]
    MissingAppName,

    #[error("At least one container is required")]
    NoContainers,

    #[error("Container at index {index} is missing 'name'")]
    MissingContainerName { index: usize },

    #[error("Container '{container}' has no image and is not built by this run")]
    MissingImage { container: String },

    #[error("Container name '{0}' is declared more than once")]
    DuplicateContainerName(String),
}

/// Raw configuration source, chosen by precedence and never merged
#[derive(Debug, Clone)]
pub enum SpecSource {
    Inline(String),
    File { path: PathBuf, contents: String },
}

/// Run-level values applied while resolving containers
#[derive(Debug, Clone, Default)]
pub struct ResolveDefaults {
    /// Push registry prefix for built images, e.g. `ghcr.io/org`
    pub default_registry: String,
    /// Build identifier used as the tag of built images
    pub build_id: String,
    /// Explicit application name; wins over the descriptor's
    pub app_name: Option<String>,
    pub deployment_type: DeploymentType,
    pub region: Option<String>,
    /// Endpoint creation flag for inline sources
    pub create_endpoints: bool,
}

/// Pick the single source to resolve from.
///
/// An existing descriptor file takes precedence over the inline list entirely.
pub fn select_source(
    inline: Option<&str>,
    descriptor: Option<&Path>,
) -> Result<SpecSource, SpecError> {
    if let Some(path) = descriptor {
        if path.is_file() {
            info!(path = %path.display(), "Using descriptor file");
            let contents = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(SpecSource::File {
                path: path.to_path_buf(),
                contents,
            });
        }
        debug!(path = %path.display(), "Descriptor file not found, falling back to inline list");
    }

    match inline.map(str::trim) {
        Some(text) if !text.is_empty() => {
            info!("Using inline container list");
            Ok(SpecSource::Inline(text.to_string()))
        }
        _ => Err(SpecError::NoSource),
    }
}

/// Resolve a source into the canonical [`AppSpec`]
pub fn resolve(source: &SpecSource, defaults: &ResolveDefaults) -> Result<AppSpec, SpecError> {
    let (kind, descriptor) = match source {
        SpecSource::Inline(text) => (SourceKind::Inline, parse_inline(text)?),
        SpecSource::File { path, contents } => (SourceKind::File, parse_file(path, contents)?),
    };

    let name = defaults
        .app_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            descriptor
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_owned)
        })
        .ok_or(SpecError::MissingAppName)?;

    if descriptor.containers.is_empty() {
        return Err(SpecError::NoContainers);
    }

    let containers = descriptor
        .containers
        .into_iter()
        .enumerate()
        .map(|(index, raw)| resolve_container(index, raw, &name, defaults))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for container in &containers {
        if !seen.insert(container.name.as_str()) {
            return Err(SpecError::DuplicateContainerName(container.name.clone()));
        }
    }

    let create_endpoints = match kind {
        SourceKind::File => containers.iter().any(|c| !c.endpoints.is_empty()),
        SourceKind::Inline => defaults.create_endpoints,
    };

    Ok(AppSpec {
        name,
        deployment_type: defaults.deployment_type.clone(),
        region: defaults
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned),
        containers,
        source: kind,
        create_endpoints,
    })
}

fn parse_inline(text: &str) -> Result<RawDescriptor, SpecError> {
    let parse_error = |e: serde_yaml::Error| SpecError::Parse {
        origin: "inline container list".to_string(),
        message: e.to_string(),
    };

    // Endpoints are dropped before typed parsing so their shape never matters
    let entries: Vec<serde_yaml::Value> = serde_yaml::from_str(text).map_err(parse_error)?;
    let containers = entries
        .into_iter()
        .map(|mut entry| {
            if let Some(map) = entry.as_mapping_mut() {
                if map.remove("endpoints").is_some() {
                    warn!(
                        container = map.get("name").and_then(|n| n.as_str()).unwrap_or("<unnamed>"),
                        "Endpoints are not supported in the inline container list, ignoring them"
                    );
                }
            }
            serde_yaml::from_value::<RawContainer>(entry).map_err(parse_error)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawDescriptor {
        name: None,
        containers,
    })
}

fn parse_file(path: &Path, contents: &str) -> Result<RawDescriptor, SpecError> {
    let origin = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => toml::from_str(contents).map_err(|e| SpecError::Parse {
            origin,
            message: e.to_string(),
        }),
        Some("json") => serde_json::from_str(contents).map_err(|e| SpecError::Parse {
            origin,
            message: e.to_string(),
        }),
        _ => serde_yaml::from_str(contents).map_err(|e| SpecError::Parse {
            origin,
            message: e.to_string(),
        }),
    }
}

fn resolve_container(
    index: usize,
    raw: RawContainer,
    app_name: &str,
    defaults: &ResolveDefaults,
) -> Result<ContainerSpec, SpecError> {
    let name = non_empty(raw.name).ok_or(SpecError::MissingContainerName { index })?;
    let registry = defaults.default_registry.trim().trim_end_matches('/');

    let mut image = match non_empty(raw.image) {
        Some(image) => image,
        None if raw.build => join_registry(registry, app_name),
        None => return Err(SpecError::MissingImage { container: name }),
    };

    if raw.build && !image.contains('/') && !registry.is_empty() {
        image = join_registry(registry, &image);
    }

    if image.is_empty() {
        return Err(SpecError::MissingImage { container: name });
    }

    let tag = non_empty(raw.tag).unwrap_or_else(|| {
        let build_id = defaults.build_id.trim();
        if raw.build && !build_id.is_empty() {
            build_id.to_string()
        } else {
            DEFAULT_TAG.to_string()
        }
    });

    Ok(ContainerSpec {
        name,
        image,
        tag,
        build: raw.build,
        context: non_empty(raw.context).unwrap_or_else(|| DEFAULT_CONTEXT.to_string()),
        dockerfile: non_empty(raw.dockerfile).unwrap_or_else(|| DEFAULT_DOCKERFILE.to_string()),
        env: raw.env,
        port: raw.port,
        endpoints: raw.endpoints,
    })
}

fn join_registry(registry: &str, image: &str) -> String {
    if registry.is_empty() {
        image.to_string()
    } else {
        format!("{}/{}", registry, image)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

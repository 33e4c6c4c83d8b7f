//! Application-creation payload assembly
//!
//! Pure: the same [`AppSpec`] and [`RegistryIds`] always produce the same
//! [`AppDescriptor`]. All I/O stays with the caller.

use serde::Serialize;
use tracing::{debug, warn};

use crate::provision::RegistryIds;
use crate::spec::{AppSpec, ContainerSpec, DeploymentType, EndpointKind, EnvVar, PortMapping};

/// Run-level endpoint defaults for inline sources
#[derive(Debug, Clone, Default)]
pub struct EndpointDefaults {
    /// Endpoint name; the exposed container's name when empty
    pub name: String,
    pub kind: EndpointKind,
    /// Container to expose, overriding the first-declared-port rule
    pub container: Option<String>,
    pub exposed_port: Option<u16>,
}

/// Application-creation payload (`POST /apps`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDescriptor {
    pub name: String,
    pub runtime: Runtime,
    pub regions: RegionSettings,
    pub containers: Vec<ContainerTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Shared,
    Reserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSettings {
    pub required: Vec<String>,
    pub allowed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_allowed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTemplate {
    pub name: String,
    pub image: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSource {
    pub registry_id: String,
    pub namespace: String,
    pub name: String,
    pub tag: String,
    pub pull_policy: PullPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PullPolicy {
    Always,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    pub port_mappings: Vec<PortMapping>,
}

/// Build the platform payload for `spec`
pub fn build_descriptor(
    spec: &AppSpec,
    registries: &RegistryIds,
    endpoint: &EndpointDefaults,
) -> AppDescriptor {
    let exposed = exposed_container(spec, endpoint.container.as_deref()).map(|c| c.name.as_str());

    let containers = spec
        .containers
        .iter()
        .map(|container| {
            let is_exposed = exposed == Some(container.name.as_str());
            container_template(spec, container, registries, endpoint, is_exposed)
        })
        .collect();

    AppDescriptor {
        name: spec.name.clone(),
        runtime: runtime_for(&spec.deployment_type),
        regions: regions_for(&spec.deployment_type, spec.region.as_deref()),
        containers,
    }
}

/// The container that receives the synthesized endpoint: explicitly named,
/// else the first declaring a port, else the first overall
pub fn exposed_container<'a>(spec: &'a AppSpec, explicit: Option<&str>) -> Option<&'a ContainerSpec> {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        match spec.container(name) {
            Some(container) => return Some(container),
            None => warn!(container = name, "Endpoint container not found, using the default choice"),
        }
    }

    spec.containers
        .iter()
        .find(|c| c.port.is_some())
        .or_else(|| spec.containers.first())
}

fn runtime_for(deployment_type: &DeploymentType) -> Runtime {
    match deployment_type {
        DeploymentType::Reserved(_) => Runtime::Reserved,
        DeploymentType::Shared | DeploymentType::Single => Runtime::Shared,
    }
}

fn regions_for(deployment_type: &DeploymentType, region: Option<&str>) -> RegionSettings {
    match (deployment_type, region) {
        (DeploymentType::Single, Some(region)) => RegionSettings {
            required: vec![region.to_string()],
            allowed: vec![region.to_string()],
            max_allowed: Some(1),
        },
        _ => RegionSettings::default(),
    }
}

fn container_template(
    spec: &AppSpec,
    container: &ContainerSpec,
    registries: &RegistryIds,
    endpoint: &EndpointDefaults,
    is_exposed: bool,
) -> ContainerTemplate {
    let image_ref = container.image_ref();

    let registry_id = match (container.build, &registries.push, &registries.pull) {
        (true, Some(push), _) => push.clone(),
        (_, _, Some(pull)) => pull.clone(),
        _ => String::new(),
    };

    let endpoints = if !container.endpoints.is_empty() {
        container
            .endpoints
            .iter()
            .map(|declared| EndpointTemplate {
                name: declared.name.clone(),
                kind: declared.kind,
                port_mappings: declared.port_mappings.clone(),
            })
            .collect()
    } else {
        match container.port {
            Some(port) if spec.create_endpoints && is_exposed => {
                let name = if endpoint.name.trim().is_empty() {
                    container.name.clone()
                } else {
                    endpoint.name.trim().to_string()
                };
                debug!(container = %container.name, endpoint = %name, port, "Synthesizing endpoint");
                vec![EndpointTemplate {
                    name,
                    kind: endpoint.kind,
                    port_mappings: vec![PortMapping {
                        container_port: port,
                        exposed_port: endpoint.exposed_port,
                    }],
                }]
            }
            _ => Vec::new(),
        }
    };

    ContainerTemplate {
        name: container.name.clone(),
        image: ImageSource {
            registry_id,
            namespace: image_ref.namespace,
            name: image_ref.name,
            tag: container.tag.clone(),
            pull_policy: PullPolicy::Always,
        },
        port: container.port,
        env: container.env.clone(),
        endpoints,
    }
}

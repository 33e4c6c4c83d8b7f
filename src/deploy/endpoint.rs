use serde_json::Value;

use crate::platform::{AppDetail, first_string};

const HOSTNAME_FIELDS: &[&str] = &["hostname", "host", "fqdn", "publicUrl", "public_url", "url", "domain"];
const CONTAINER_LIST_FIELDS: &[&str] = &[
    "containers",
    "containerTemplates",
    "container_templates",
    "templates",
];
const ENDPOINT_LIST_FIELDS: &[&str] = &["endpoints", "ports"];

const DEFAULT_SCHEME: &str = "https://";

/// Externally reachable address of a deployed app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Hostname without scheme
    pub hostname: String,
    /// Hostname with a scheme, `https://` assumed when none was given
    pub url: String,
}

/// Best-known public address: the top-level hostname, else the first
/// endpoint hostname across container templates. `None` means not yet
/// provisioned, which is not an error.
pub fn resolve_endpoint(detail: &AppDetail) -> Option<ResolvedEndpoint> {
    let root = detail.root();

    first_string(root, HOSTNAME_FIELDS)
        .or_else(|| first_string(&detail.0, HOSTNAME_FIELDS))
        .or_else(|| container_hostname(root))
        .map(|raw| ResolvedEndpoint {
            hostname: strip_scheme(&raw).trim_end_matches('/').to_string(),
            url: with_scheme(&raw),
        })
}

fn container_hostname(root: &Value) -> Option<String> {
    let containers = CONTAINER_LIST_FIELDS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_array))?;

    containers.iter().find_map(|container| {
        ENDPOINT_LIST_FIELDS
            .iter()
            .filter_map(|key| container.get(*key).and_then(Value::as_array))
            .flatten()
            .find_map(|endpoint| first_string(endpoint, HOSTNAME_FIELDS))
    })
}

/// Prefix `https://` unless a scheme is already present
pub fn with_scheme(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        host.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, host)
    }
}

fn strip_scheme(value: &str) -> &str {
    let value = value.trim();
    match value.split_once("://") {
        Some((_, rest)) => rest,
        None => value,
    }
}

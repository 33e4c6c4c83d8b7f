//! Loosely-typed platform records.
//!
//! Response shapes differ between API versions, so every field is read
//! through an ordered list of candidate names instead of a fixed schema.

use serde::Serialize;
use serde_json::Value;

const ID_FIELDS: &[&str] = &["id", "registryId", "registry_id", "appId", "app_id", "uuid"];
const NAME_FIELDS: &[&str] = &["name", "displayName", "display_name"];
const HOST_FIELDS: &[&str] = &["host", "url", "server", "registryUrl", "registry_url"];
const PUBLIC_FIELDS: &[&str] = &["public", "isPublic", "is_public"];
const LIST_WRAPPERS: &[&str] = &["registries", "items", "data", "results"];
const STATUS_FIELDS: &[&str] = &["status", "state", "deploymentStatus", "deployment_status"];
const NESTED_STATUS_FIELDS: &[&str] = &["state", "phase", "value", "name"];
const APP_WRAPPERS: &[&str] = &["app", "application", "data"];

/// Hosts of the well-known public pull registry
pub const PUBLIC_REGISTRY_HOSTS: &[&str] = &[
    "docker.io",
    "index.docker.io",
    "registry-1.docker.io",
    "registry.hub.docker.com",
    "hub.docker.com",
];

/// Display-name markers of a public pull registry record
pub const PUBLIC_REGISTRY_MARKERS: &[&str] = &["docker hub", "dockerhub", "docker-hub"];

/// Registry credential record known to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRef {
    pub id: String,
    pub name: String,
    pub host: String,
    pub public: bool,
}

impl RegistryRef {
    /// Read a registry record; `None` when no id can be found
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = first_string(value, ID_FIELDS)?;
        Some(Self {
            id,
            name: first_string(value, NAME_FIELDS).unwrap_or_default(),
            host: first_string(value, HOST_FIELDS).unwrap_or_default(),
            public: first_bool(value, PUBLIC_FIELDS).unwrap_or(false),
        })
    }

    /// Read a registry list, either a bare array or wrapped in an object
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        let items = match value {
            Value::Array(items) => Some(items),
            Value::Object(map) => LIST_WRAPPERS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array)),
            _ => None,
        };

        items
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Whether this record authenticates pulls from the public registry
    pub fn is_public_pull(&self) -> bool {
        let host = normalize_host(&self.host);
        if PUBLIC_REGISTRY_HOSTS.iter().any(|h| *h == host) {
            return true;
        }

        let name = self.name.to_lowercase();
        PUBLIC_REGISTRY_MARKERS.iter().any(|m| name.contains(m))
    }

    pub fn name_matches(&self, wanted: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(wanted.trim())
    }
}

/// Registry creation request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRegistry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub username: String,
    pub password: String,
    pub public: bool,
}

/// Application detail response
#[derive(Debug, Clone, PartialEq)]
pub struct AppDetail(pub Value);

impl AppDetail {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The application object, unwrapping `{"app": {...}}` style envelopes
    pub fn root(&self) -> &Value {
        APP_WRAPPERS
            .iter()
            .find_map(|key| self.0.get(*key).filter(|v| v.is_object()))
            .unwrap_or(&self.0)
    }

    pub fn id(&self) -> Option<String> {
        first_string(self.root(), ID_FIELDS)
    }

    /// Deployment status token, if the response carries one
    pub fn status(&self) -> Option<String> {
        let root = self.root();
        read_status(root).or_else(|| root.get("deployment").and_then(read_status))
    }
}

fn read_status(value: &Value) -> Option<String> {
    STATUS_FIELDS.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        nested @ Value::Object(_) => first_string(nested, NESTED_STATUS_FIELDS),
        _ => None,
    })
}

/// First non-empty string (or number) among `keys`
pub fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| value.get(*key)?.as_bool())
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host.as_str());
    host.split('/').next().unwrap_or_default().to_string()
}

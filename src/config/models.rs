use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level run settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub push_registry: PushRegistrySettings,
    #[serde(default)]
    pub endpoint: EndpointSettings,
    #[serde(default)]
    pub private_registry: PrivateRegistrySettings,
    #[serde(default)]
    pub deploy: DeploySettings,
}

/// Platform API connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformSettings {
    #[serde(default)]
    pub api_url: String,
    /// Access key (loaded from environment, not from config file)
    #[serde(skip)]
    pub access_key: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            access_key: None,
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration(60)
}

/// Application identity and container sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSettings {
    pub name: Option<String>,
    #[serde(default = "default_deployment_type")]
    pub deployment_type: String,
    pub region: Option<String>,
    /// Descriptor file; wins over `containers` when it exists
    #[serde(default = "default_descriptor")]
    pub descriptor: Option<PathBuf>,
    /// Inline container list (YAML or JSON text)
    pub containers: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: None,
            deployment_type: default_deployment_type(),
            region: None,
            descriptor: default_descriptor(),
            containers: None,
        }
    }
}

fn default_deployment_type() -> String {
    "default".to_string()
}

fn default_descriptor() -> Option<PathBuf> {
    Some(PathBuf::from("deckhand.yaml"))
}

/// Image build inputs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildSettings {
    /// Build identifier used as the default tag (falls back to `GITHUB_SHA`)
    pub sha: Option<String>,
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_target_platform")]
    pub platform: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            sha: None,
            tool: default_tool(),
            platform: default_target_platform(),
        }
    }
}

fn default_tool() -> String {
    crate::build::DEFAULT_TOOL.to_string()
}

fn default_target_platform() -> String {
    crate::build::DEFAULT_TARGET_PLATFORM.to_string()
}

/// Registry that built images are pushed to
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PushRegistrySettings {
    /// Image prefix for built images, e.g. `ghcr.io/acme`
    #[serde(default)]
    pub host: String,
    pub username: Option<String>,
    /// Push password (loaded from environment, not from config file)
    #[serde(skip)]
    pub password: Option<String>,
}

/// Endpoint synthesis for inline container lists
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointSettings {
    #[serde(default)]
    pub create: bool,
    #[serde(default = "default_endpoint_name")]
    pub name: String,
    #[serde(default = "default_endpoint_kind")]
    pub kind: String,
    pub container: Option<String>,
    pub exposed_port: Option<u16>,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            create: false,
            name: default_endpoint_name(),
            kind: default_endpoint_kind(),
            container: None,
            exposed_port: None,
        }
    }
}

fn default_endpoint_name() -> String {
    "web".to_string()
}

fn default_endpoint_kind() -> String {
    "cdn".to_string()
}

/// Private registry record on the platform
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrivateRegistrySettings {
    #[serde(default)]
    pub provision: bool,
    pub name: Option<String>,
    #[serde(default = "default_registry_kind")]
    pub kind: String,
    pub username: Option<String>,
    /// Personal access token (loaded from environment, not from config file)
    #[serde(skip)]
    pub token: Option<String>,
    /// Password fallback (loaded from environment, not from config file)
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for PrivateRegistrySettings {
    fn default() -> Self {
        Self {
            provision: false,
            name: None,
            kind: default_registry_kind(),
            username: None,
            token: None,
            password: None,
        }
    }
}

fn default_registry_kind() -> String {
    "generic".to_string()
}

/// Wait-for-deployment behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeploySettings {
    #[serde(default = "default_wait")]
    pub wait: bool,
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            wait: default_wait(),
            timeout: default_timeout(),
        }
    }
}

fn default_wait() -> bool {
    true
}

fn default_timeout() -> HumanDuration {
    HumanDuration(600)
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::image::ImageRef;

/// Canonical, fully-defaulted application specification
#[derive(Debug, Clone, Serialize)]
pub struct AppSpec {
    pub name: String,
    pub deployment_type: DeploymentType,
    pub region: Option<String>,
    pub containers: Vec<ContainerSpec>,
    /// Where the containers came from
    pub source: SourceKind,
    /// Whether endpoints are created at all (implied for file sources, explicit for inline)
    pub create_endpoints: bool,
}

impl AppSpec {
    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn builds_any(&self) -> bool {
        self.containers.iter().any(|c| c.build)
    }

    pub fn pulls_any(&self) -> bool {
        self.containers.iter().any(|c| !c.build)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Inline,
    File,
}

/// One deployable unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub tag: String,
    pub build: bool,
    pub context: String,
    pub dockerfile: String,
    pub env: Vec<EnvVar>,
    pub port: Option<u16>,
    pub endpoints: Vec<EndpointSpec>,
}

impl ContainerSpec {
    pub fn image_ref(&self) -> ImageRef {
        ImageRef::parse(&self.image)
    }

    /// `image:tag`, as handed to the build tool
    pub fn tagged_image(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// One externally reachable entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EndpointKind,
    #[serde(default, alias = "port_mappings")]
    pub port_mappings: Vec<PortMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    #[serde(alias = "container_port")]
    pub container_port: u16,
    #[serde(default, alias = "exposed_port", skip_serializing_if = "Option::is_none")]
    pub exposed_port: Option<u16>,
}

/// Platform endpoint kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EndpointKind {
    #[default]
    Cdn,
    Anycast,
}

impl FromStr for EndpointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cdn" | "http" | "https" => Ok(EndpointKind::Cdn),
            "anycast" | "tcp" | "udp" => Ok(EndpointKind::Anycast),
            other => Err(format!(
                "unknown endpoint type '{}', expected 'cdn' or 'anycast'",
                other
            )),
        }
    }
}

impl TryFrom<String> for EndpointKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Cdn => write!(f, "cdn"),
            EndpointKind::Anycast => write!(f, "anycast"),
        }
    }
}

/// Deployment type token
///
/// `single` pins the app to one region; empty, `default` and `shared` use
/// platform scheduling; any other token requests reserved capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    #[default]
    Shared,
    Single,
    Reserved(String),
}

impl DeploymentType {
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_ascii_lowercase();
        match token.as_str() {
            "" | "default" | "shared" => DeploymentType::Shared,
            "single" => DeploymentType::Single,
            _ => DeploymentType::Reserved(token),
        }
    }
}

/// Container entry as written in a descriptor file or the inline list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContainer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub dockerfile: Option<String>,
    #[serde(default, deserialize_with = "env::deserialize")]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

/// File-based descriptor: application name plus container list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDescriptor {
    #[serde(default, alias = "app", alias = "appName")]
    pub name: Option<String>,
    #[serde(default)]
    pub containers: Vec<RawContainer>,
}

mod env {
    use super::EnvVar;
    use serde::Deserialize;
    use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
    use std::fmt;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Bool(bool),
        Int(i64),
        Float(f64),
        Null(()),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Str(s) => s,
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Null(()) => String::new(),
            }
        }
    }

    /// Accepts `{NAME: value}` (document order kept) or `[{name, value}]`
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<EnvVar>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EnvVisitor;

        impl<'de> Visitor<'de> for EnvVisitor {
            type Value = Vec<EnvVar>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of variable names to values or a list of {name, value}")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Vec::new())
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Vec::new())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut vars = Vec::new();
                while let Some((name, value)) = map.next_entry::<String, Scalar>()? {
                    vars.push(EnvVar {
                        name,
                        value: value.into_string(),
                    });
                }
                Ok(vars)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut vars = Vec::new();
                while let Some(var) = seq.next_element::<EnvVar>()? {
                    vars.push(var);
                }
                Ok(vars)
            }
        }

        deserializer.deserialize_any(EnvVisitor)
    }
}

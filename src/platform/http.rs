//! HTTP client for the platform REST API

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::models::{AppDetail, NewRegistry, RegistryRef};
use super::traits::{PlatformApi, PlatformError};
use crate::descriptor::AppDescriptor;

pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";

pub type Result<T> = std::result::Result<T, PlatformError>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub access_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            access_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: format!("deckhand/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed [`PlatformApi`]
pub struct HttpPlatform {
    client: Client,
    base_url: String,
    access_key: String,
}

impl HttpPlatform {
    pub fn new(config: HttpConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(PlatformError::InvalidConfig("platform API URL is empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PlatformError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key,
        })
    }

    /// Issue one request; non-2xx responses become [`PlatformError::Status`]
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, path, "Platform request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| PlatformError::Request {
            method: method.to_string(),
            path: path.to_string(),
            message: if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            },
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| PlatformError::Request {
            method: method.to_string(),
            path: path.to_string(),
            message: format!("failed to read body: {}", e),
        })?;

        if !status.is_success() {
            return Err(PlatformError::Status {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(path, status = status.as_u16(), size = text.len(), "Platform response");

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| PlatformError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn list_registries(&self) -> Result<Vec<RegistryRef>> {
        let value = self.send::<()>(Method::GET, "/registries", None).await?;
        Ok(RegistryRef::list_from_value(&value))
    }

    async fn create_registry(&self, request: &NewRegistry) -> Result<RegistryRef> {
        let value = self.send(Method::POST, "/registries", Some(request)).await?;
        let record = value.get("registry").unwrap_or(&value);
        RegistryRef::from_value(record).ok_or_else(|| PlatformError::MissingField {
            path: "/registries".to_string(),
            field: "id".to_string(),
        })
    }

    async fn create_app(&self, descriptor: &AppDescriptor) -> Result<String> {
        let value = self.send(Method::POST, "/apps", Some(descriptor)).await?;
        AppDetail::new(value)
            .id()
            .ok_or_else(|| PlatformError::MissingField {
                path: "/apps".to_string(),
                field: "id".to_string(),
            })
    }

    async fn deploy_app(&self, app_id: &str) -> Result<()> {
        let path = format!("/apps/{}/deploy", app_id);
        self.send::<()>(Method::POST, &path, None).await?;
        Ok(())
    }

    async fn get_app(&self, app_id: &str) -> Result<AppDetail> {
        let path = format!("/apps/{}", app_id);
        let value = self.send::<()>(Method::GET, &path, None).await?;
        Ok(AppDetail::new(value))
    }
}

use super::models::Settings;
use config::{ConfigError, Environment, File, FileFormat, Value};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "DECKHAND_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "deckhand.toml";
const ENV_PREFIX: &str = "DECKHAND";
const ENV_SEPARATOR: &str = "__";

/// Command-line values layered over file and environment settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: Vec<(String, Value)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` (dotted, e.g. `app.name`) when `value` is present
    pub fn set<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.values.push((key.to_string(), value.into()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Load settings from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables
/// 5. Command-line overrides (highest priority)
pub fn load(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<Settings, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = config_path
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut settings = load_from_sources(config_path, overrides)?;

    load_secrets(&mut settings);

    Ok(settings)
}

/// Secrets are never stored in TOML files, only in environment
fn load_secrets(settings: &mut Settings) {
    if let Ok(access_key) = env::var("DECKHAND_ACCESS_KEY") {
        settings.platform.access_key = Some(access_key);
    }
    if let Ok(password) = env::var("DECKHAND_REGISTRY_PASSWORD") {
        settings.push_registry.password = Some(password);
    }
    if let Ok(token) = env::var("DECKHAND_PRIVATE_REGISTRY_TOKEN") {
        settings.private_registry.token = Some(token);
    }
    if let Ok(password) = env::var("DECKHAND_PRIVATE_REGISTRY_PASSWORD") {
        settings.private_registry.password = Some(password);
    }

    // CI commit SHA as the default build identifier
    if settings.build.sha.is_none() {
        if let Ok(sha) = env::var("GITHUB_SHA") {
            settings.build.sha = Some(sha);
        }
    }
}

/// Load settings from a specific path, environment and overrides.
/// Useful for testing with custom config files.
pub fn load_from_sources(config_path: PathBuf, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // DECKHAND__APP__NAME -> app.name
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    for (key, value) in &overrides.values {
        builder = builder.set_override(key.as_str(), value.clone())?;
    }

    let config = builder.build()?;
    config.try_deserialize()
}

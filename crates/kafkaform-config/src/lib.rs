//! Provider configuration for kafkaform.
//!
//! Settings are layered: built-in defaults, then an optional file (YAML, TOML
//! or JSON by extension), then `KAFKAFORM_*` environment variables, then
//! whatever the command line supplies. Later layers win field by field.

pub mod provider;
pub mod validation;

pub use provider::{
    ConfigProvider, ConfigSource, EnvironmentProvider, FileFormat, FileProvider, SourceType, ENV_PREFIX,
};
pub use validation::ValidationError;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_REST_URL: &str = "http://localhost:8082";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Fully resolved connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Kafka REST v3 endpoint used for ACLs and topics.
    pub rest_url: String,
    /// Cluster to target; discovered from the REST endpoint when unset.
    pub cluster_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Kafka Connect REST endpoint. Required only for connector resources.
    pub connect_url: Option<String>,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rest_url: DEFAULT_REST_URL.to_string(),
            cluster_id: None,
            username: None,
            password: None,
            connect_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("rest_url", &self.rest_url)
            .field("cluster_id", &self.cluster_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_url", &self.connect_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Username and password, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    /// Overlay every field `layer` sets.
    pub fn apply(&mut self, layer: PartialConfig) {
        if let Some(v) = layer.rest_url {
            self.rest_url = v;
        }
        if layer.cluster_id.is_some() {
            self.cluster_id = layer.cluster_id;
        }
        if layer.username.is_some() {
            self.username = layer.username;
        }
        if layer.password.is_some() {
            self.password = layer.password;
        }
        if layer.connect_url.is_some() {
            self.connect_url = layer.connect_url;
        }
        if let Some(v) = layer.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = layer.log_level {
            self.log_level = v;
        }
    }
}

/// One configuration layer. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default)]
    pub rest_url: Option<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub connect_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Resolves a [`ProviderConfig`] from an ordered list of providers.
#[derive(Default)]
pub struct ConfigLoader {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer above the ones already registered.
    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Merge every layer over the defaults, then apply `overrides` and validate.
    pub async fn load(&self, overrides: PartialConfig) -> Result<ProviderConfig> {
        let mut config = ProviderConfig::default();
        for provider in &self.providers {
            let layer = provider.load().await?;
            debug!("Applying config layer {}", provider.source());
            config.apply(layer);
        }
        config.apply(overrides);
        validation::validate(&config)?;
        Ok(config)
    }
}

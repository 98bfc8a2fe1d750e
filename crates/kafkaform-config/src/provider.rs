//! Configuration providers for different sources.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::{ConfigError, PartialConfig, Result};

/// Trait for configuration providers
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load one configuration layer from this provider
    async fn load(&self) -> Result<PartialConfig>;

    /// Get source information
    fn source(&self) -> ConfigSource;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    File,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub source_type: SourceType,
    pub identifier: String,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_type {
            SourceType::File => write!(f, "file {}", self.identifier),
            SourceType::Environment => write!(f, "env {}*", self.identifier),
        }
    }
}

/// File-based configuration provider
pub struct FileProvider {
    path: PathBuf,
    format: FileFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileProvider {
    /// Create a provider, picking the format from the file extension
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = detect_format(&path)?;
        Ok(Self { path, format })
    }

    /// Create with explicit format
    pub fn with_format(path: impl AsRef<Path>, format: FileFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }
}

#[async_trait]
impl ConfigProvider for FileProvider {
    async fn load(&self) -> Result<PartialConfig> {
        let content = fs::read_to_string(&self.path).await?;

        let layer = match self.format {
            FileFormat::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?,
            FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?,
            FileFormat::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?,
        };

        info!("Loaded configuration from {:?}", self.path);
        Ok(layer)
    }

    fn source(&self) -> ConfigSource {
        ConfigSource {
            source_type: SourceType::File,
            identifier: self.path.display().to_string(),
        }
    }
}

/// Environment variable configuration provider.
///
/// Reads `<PREFIX>_REST_URL`, `<PREFIX>_CLUSTER_ID`, `<PREFIX>_USERNAME`,
/// `<PREFIX>_PASSWORD`, `<PREFIX>_CONNECT_URL`,
/// `<PREFIX>_REQUEST_TIMEOUT_SECS` and `<PREFIX>_LOG_LEVEL`. Unknown keys
/// under the prefix are ignored.
pub struct EnvironmentProvider {
    prefix: String,
    vars: Option<Vec<(String, String)>>,
}

pub const ENV_PREFIX: &str = "KAFKAFORM";

impl EnvironmentProvider {
    /// Read from the process environment
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
        }
    }

    /// Read from a fixed set of variables with the default prefix
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefix: ENV_PREFIX.to_string(),
            vars: Some(vars.into_iter().collect()),
        }
    }
}

impl Default for EnvironmentProvider {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

#[async_trait]
impl ConfigProvider for EnvironmentProvider {
    async fn load(&self) -> Result<PartialConfig> {
        let vars = match &self.vars {
            Some(vars) => vars.clone(),
            None => env::vars().collect(),
        };

        let mut layer = PartialConfig::default();
        let mut count = 0;
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(&self.prefix).and_then(|k| k.strip_prefix('_')) else {
                continue;
            };
            match name.to_ascii_uppercase().as_str() {
                "REST_URL" => layer.rest_url = Some(value),
                "CLUSTER_ID" => layer.cluster_id = Some(value),
                "USERNAME" => layer.username = Some(value),
                "PASSWORD" => layer.password = Some(value),
                "CONNECT_URL" => layer.connect_url = Some(value),
                "REQUEST_TIMEOUT_SECS" => {
                    let secs = value.trim().parse::<u64>().map_err(|e| {
                        ConfigError::Parse(format!("{key}: expected seconds, got {value:?}: {e}"))
                    })?;
                    layer.request_timeout_secs = Some(secs);
                }
                "LOG_LEVEL" => layer.log_level = Some(value),
                _ => continue,
            }
            debug!("Loaded env var: {key}");
            count += 1;
        }

        info!("Loaded {count} environment variables with prefix '{}'", self.prefix);
        Ok(layer)
    }

    fn source(&self) -> ConfigSource {
        ConfigSource {
            source_type: SourceType::Environment,
            identifier: self.prefix.clone(),
        }
    }
}

/// Detect file format from extension
fn detect_format(path: &Path) -> Result<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(FileFormat::Json),
        Some("yaml") | Some("yml") => Ok(FileFormat::Yaml),
        Some("toml") => Ok(FileFormat::Toml),
        _ => Err(ConfigError::Parse(format!("Unknown file format for {:?}", path))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.yml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("a.yaml")).unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), FileFormat::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), FileFormat::Json);
        assert!(detect_format(Path::new("a.ini")).is_err());
    }

    #[tokio::test]
    async fn test_yaml_file() {
        let file = write_temp(
            ".yaml",
            "rest_url: https://rest:8443\nusername: admin\npassword: secret\nrequest_timeout_secs: 10\n",
        );
        let layer = FileProvider::new(file.path()).unwrap().load().await.unwrap();
        assert_eq!(layer.rest_url.as_deref(), Some("https://rest:8443"));
        assert_eq!(layer.request_timeout_secs, Some(10));
        assert!(layer.connect_url.is_none());
    }

    #[tokio::test]
    async fn test_toml_file() {
        let file = write_temp(".toml", "connect_url = \"http://connect:8083\"\ncluster_id = \"c1\"\n");
        let layer = FileProvider::new(file.path()).unwrap().load().await.unwrap();
        assert_eq!(layer.connect_url.as_deref(), Some("http://connect:8083"));
        assert_eq!(layer.cluster_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_json_file_rejects_unknown_keys() {
        let file = write_temp(".json", r#"{"rest_url": "http://x", "bootstrap": "y"}"#);
        let err = FileProvider::new(file.path()).unwrap().load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = FileProvider::new("/nonexistent/kafkaform.yaml")
            .unwrap()
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn test_environment_vars() {
        let provider = EnvironmentProvider::from_vars([
            ("KAFKAFORM_CONNECT_URL".to_string(), "http://connect:8083".to_string()),
            ("KAFKAFORM_REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
            ("KAFKAFORM_UNRELATED".to_string(), "x".to_string()),
            ("KAFKAFORMREST_URL".to_string(), "http://wrong".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
        ]);
        let layer = provider.load().await.unwrap();
        assert_eq!(layer.connect_url.as_deref(), Some("http://connect:8083"));
        assert_eq!(layer.request_timeout_secs, Some(5));
        assert!(layer.rest_url.is_none());
    }

    #[tokio::test]
    async fn test_environment_bad_timeout() {
        let provider = EnvironmentProvider::from_vars([(
            "KAFKAFORM_REQUEST_TIMEOUT_SECS".to_string(),
            "soon".to_string(),
        )]);
        assert!(matches!(provider.load().await, Err(ConfigError::Parse(_))));
    }
}

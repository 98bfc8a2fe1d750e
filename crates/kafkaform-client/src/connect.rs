use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::error::{api_error, GatewayError, Result};
use crate::gateway::{ConnectClusterInfo, ConnectorGateway, ConnectorInfo};
use crate::http::{authorize, build_http, endpoint, trim_base, Credentials};

/// Client for the Kafka Connect REST API.
pub struct KafkaConnectClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl KafkaConnectClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base_url: trim_base(base_url),
            credentials: None,
        })
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    fn request(&self, method: reqwest::Method, segments: &[&str]) -> Result<reqwest::RequestBuilder> {
        let url = endpoint(&self.base_url, segments)?;
        debug!("{method} {url}");
        Ok(authorize(self.http.request(method, url), &self.credentials))
    }
}

/// Map a failed Connect response. 409 means the worker group is rebalancing.
async fn connect_error(context: &str, resp: reqwest::Response) -> GatewayError {
    if resp.status() == StatusCode::CONFLICT {
        let text = resp.text().await.unwrap_or_default();
        warn!("{context}: Connect cluster is rebalancing");
        return GatewayError::Rebalance(format!("{context}: {text}"));
    }
    api_error(context, resp).await
}

#[async_trait]
impl ConnectorGateway for KafkaConnectClient {
    async fn cluster_info(&self) -> Result<ConnectClusterInfo> {
        let resp = self.request(reqwest::Method::GET, &[])?.send().await?;
        if !resp.status().is_success() {
            return Err(connect_error("Connect cluster info failed", resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn list_connectors(&self) -> Result<Vec<String>> {
        let resp = self.request(reqwest::Method::GET, &["connectors"])?.send().await?;
        if !resp.status().is_success() {
            return Err(connect_error("List connectors failed", resp).await);
        }
        let mut names: Vec<String> = resp.json().await?;
        names.sort();
        Ok(names)
    }

    async fn get_connector(&self, name: &str) -> Result<Option<ConnectorInfo>> {
        let resp = self
            .request(reqwest::Method::GET, &["connectors", name])?
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(connect_error("Get connector failed", resp).await);
        }
        Ok(Some(resp.json().await?))
    }

    async fn put_connector_config(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<ConnectorInfo> {
        let resp = self
            .request(reqwest::Method::PUT, &["connectors", name, "config"])?
            .json(config)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(connect_error("Put connector config failed", resp).await);
        }
        let info: ConnectorInfo = resp.json().await?;
        if status == StatusCode::CREATED {
            info!(connector = %name, "Created connector");
        } else {
            info!(connector = %name, "Updated connector config");
        }
        Ok(info)
    }

    async fn delete_connector(&self, name: &str) -> Result<()> {
        let resp = self
            .request(reqwest::Method::DELETE, &["connectors", name])?
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("Connector {name} already gone");
            return Ok(());
        }
        if !resp.status().is_success() {
            return Err(connect_error("Delete connector failed", resp).await);
        }
        info!(connector = %name, "Deleted connector");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_info_deserialization() {
        let json = r#"{
            "name": "sink",
            "config": {"connector.class": "FileStreamSink", "name": "sink", "topics": "a"},
            "tasks": [{"connector": "sink", "task": 0}],
            "type": "sink"
        }"#;
        let info: ConnectorInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "sink");
        assert_eq!(info.config["topics"], "a");
        assert_eq!(info.tasks[0].task, 0);
    }

    #[test]
    fn test_cluster_info_deserialization() {
        let info: ConnectClusterInfo =
            serde_json::from_str(r#"{"version":"3.6.0","commit":"abc","kafka_cluster_id":"k1"}"#).unwrap();
        assert_eq!(info.kafka_cluster_id, "k1");
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = KafkaConnectClient::new("http://connect:8083/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://connect:8083");
    }
}

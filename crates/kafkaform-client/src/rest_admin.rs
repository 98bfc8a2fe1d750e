use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use kafkaform_acl::{
    group_into_entities, AclOperation, AclPermission, Grant, GrantFilter, PatternType, ResourceEntity,
    ResourcePattern, ResourceType,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{api_error, ApiErrorBody, GatewayError, Result};
use crate::gateway::{AclGateway, NewTopic, TopicDescription, TopicGateway};
use crate::http::{authorize, build_http, endpoint, trim_base, Credentials};

/// REST v3 error code for "topic already exists".
const TOPIC_EXISTS_ERROR_CODE: i64 = 40002;

/// Config sources whose values are broker defaults rather than topic overrides.
const DEFAULT_SOURCES: [&str; 2] = ["DEFAULT_CONFIG", "STATIC_BROKER_CONFIG"];

/// Client for the Kafka REST v3 admin API.
///
/// ACL and topic calls are scoped to one cluster. When no cluster id is
/// configured the first cluster reported by `GET /v3/clusters` is used and
/// remembered for the lifetime of the client.
pub struct RestAdminClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    cluster_id: OnceCell<String>,
}

impl RestAdminClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base_url: trim_base(base_url),
            credentials: None,
            cluster_id: OnceCell::new(),
        })
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_cluster_id(mut self, cluster_id: Option<String>) -> Self {
        if let Some(id) = cluster_id {
            self.cluster_id = OnceCell::new_with(Some(id));
        }
        self
    }

    /// The cluster every call is scoped to, discovered on first use.
    pub async fn cluster_id(&self) -> Result<&str> {
        let id = self
            .cluster_id
            .get_or_try_init(|| self.discover_cluster_id())
            .await?;
        Ok(id.as_str())
    }

    async fn discover_cluster_id(&self) -> Result<String> {
        let url = endpoint(&self.base_url, &["v3", "clusters"])?;
        debug!("Discover cluster id: {url}");
        let resp = self.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("List clusters failed", resp).await);
        }
        let list: DataList<ClusterData> = resp.json().await?;
        list.data
            .into_iter()
            .next()
            .map(|c| c.cluster_id)
            .ok_or_else(|| {
                GatewayError::ClusterUnresolved(format!("{} reports no clusters", self.base_url))
            })
    }

    /// `segments` under `/v3/clusters/{id}`, each one percent-encoded.
    async fn cluster_url(&self, segments: &[&str]) -> Result<Url> {
        let id = self.cluster_id().await?;
        let mut path = vec!["v3", "clusters", id];
        path.extend_from_slice(segments);
        endpoint(&self.base_url, &path)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        authorize(self.http.get(url), &self.credentials)
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        authorize(self.http.post(url), &self.credentials)
    }

    fn delete(&self, url: Url) -> reqwest::RequestBuilder {
        authorize(self.http.delete(url), &self.credentials)
    }

    async fn topic_configs(&self, name: &str) -> Result<BTreeMap<String, String>> {
        let url = self.cluster_url(&["topics", name, "configs"]).await?;
        debug!("Describe topic configs {name}: {url}");
        let resp = self.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("Describe topic configs failed", resp).await);
        }
        let list: DataList<TopicConfigData> = resp.json().await?;
        Ok(non_default_configs(list.data))
    }
}

#[async_trait]
impl AclGateway for RestAdminClient {
    async fn apply_grants(&self, grants: &[Grant]) -> Result<()> {
        let url = self.cluster_url(&["acls"]).await?;
        for grant in grants {
            debug!(
                "Create ACL {} {} {} {}: {url}",
                grant.pattern, grant.principal, grant.operation, grant.permission
            );
            let resp = self.post(url.clone()).json(&AclData::from(grant)).send().await?;
            if !resp.status().is_success() {
                return Err(api_error("Create ACL failed", resp).await);
            }
        }
        Ok(())
    }

    async fn list_grants(&self, principal: &str) -> Result<Vec<ResourceEntity>> {
        let url = self.cluster_url(&["acls"]).await?;
        debug!("List ACLs for {principal}: {url}");
        let resp = self.get(url).query(&[("principal", principal)]).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("List ACLs failed", resp).await);
        }
        let list: DataList<AclData> = resp.json().await?;
        Ok(group_into_entities(list.data.into_iter().map(Grant::from)))
    }

    async fn delete_grants_matching(&self, filter: &GrantFilter) -> Result<usize> {
        let url = self.cluster_url(&["acls"]).await?;
        let query = filter_query(filter);
        debug!("Delete ACLs matching {query:?}: {url}");
        let resp = self.delete(url).query(&query).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("Delete ACLs failed", resp).await);
        }
        let list: DataList<AclData> = resp.json().await?;
        Ok(list.data.len())
    }
}

#[async_trait]
impl TopicGateway for RestAdminClient {
    async fn create_topic(&self, topic: &NewTopic) -> Result<()> {
        let url = self.cluster_url(&["topics"]).await?;
        debug!("Create topic {}: {url}", topic.name);
        let request = CreateTopicRequest {
            topic_name: &topic.name,
            partitions_count: topic.partitions,
            replication_factor: topic.replication_factor,
            configs: topic
                .config
                .iter()
                .map(|(name, value)| ConfigEntry {
                    name: name.as_str(),
                    value: Some(value.as_str()),
                    operation: None,
                })
                .collect(),
        };
        let resp = self.post(url).json(&request).send().await?;
        let status = resp.status();
        if status.is_success() {
            info!(topic = %topic.name, partitions = topic.partitions, "Created topic");
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ApiErrorBody>(&text).ok();
        let exists = body.as_ref().is_some_and(|b| {
            b.error_code == Some(TOPIC_EXISTS_ERROR_CODE)
                || b.message.as_deref().is_some_and(|m| m.contains("already exists"))
        });
        if exists {
            debug!("Topic {} already exists", topic.name);
            return Ok(());
        }
        Err(GatewayError::AdminApi {
            status: status.as_u16(),
            message: format!(
                "Create topic failed: {}",
                body.and_then(|b| b.message).unwrap_or(text)
            ),
        })
    }

    async fn describe_topic(&self, name: &str) -> Result<Option<TopicDescription>> {
        let url = self.cluster_url(&["topics", name]).await?;
        debug!("Describe topic {name}: {url}");
        let resp = self.get(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(api_error("Describe topic failed", resp).await);
        }
        let data: TopicData = resp.json().await?;
        let config = self.topic_configs(name).await?;
        Ok(Some(data.into_description(config)))
    }

    async fn list_topics(&self, prefix: &str) -> Result<Vec<TopicDescription>> {
        let url = self.cluster_url(&["topics"]).await?;
        debug!("List topics with prefix {prefix:?}: {url}");
        let resp = self.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("List topics failed", resp).await);
        }
        let list: DataList<TopicData> = resp.json().await?;

        let mut topics = Vec::new();
        for data in list.data.into_iter().filter(|t| t.topic_name.starts_with(prefix)) {
            let config = self.topic_configs(&data.topic_name).await?;
            topics.push(data.into_description(config));
        }
        topics.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(topics)
    }

    async fn increase_partitions(&self, name: &str, partitions: i32) -> Result<()> {
        let url = self.cluster_url(&["topics", name]).await?;
        debug!("Increase partitions for {name} to {partitions}: {url}");
        let resp = authorize(self.http.patch(url), &self.credentials)
            .json(&UpdatePartitionsRequest { partitions_count: partitions })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(api_error("Increase partitions failed", resp).await);
        }
        info!(topic = %name, partitions, "Increased partitions");
        Ok(())
    }

    async fn update_topic_config(
        &self,
        name: &str,
        updates: &BTreeMap<String, Option<String>>,
    ) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let url = self.cluster_url(&["topics", name, "configs:alter"]).await?;
        debug!("Update topic config {name}: {url}");
        let request = AlterConfigsRequest {
            data: updates
                .iter()
                .map(|(key, value)| ConfigEntry {
                    name: key.as_str(),
                    value: value.as_deref(),
                    operation: value.is_none().then_some("DELETE"),
                })
                .collect(),
        };
        let resp = self.post(url).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(api_error("Update topic config failed", resp).await);
        }
        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        let url = self.cluster_url(&["topics", name]).await?;
        debug!("Delete topic {name}: {url}");
        let resp = self.delete(url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("Topic {name} already gone");
            return Ok(());
        }
        if !resp.status().is_success() {
            return Err(api_error("Delete topic failed", resp).await);
        }
        info!(topic = %name, "Deleted topic");
        Ok(())
    }
}

/// Query parameters for a delete filter. Unset enum fields become `ANY`.
fn filter_query(filter: &GrantFilter) -> Vec<(&'static str, String)> {
    let any = |v: Option<&'static str>| v.unwrap_or("ANY").to_string();
    let mut query = vec![
        ("resource_type", any(filter.resource_type.map(|t| t.as_str()))),
        ("pattern_type", any(filter.pattern_type.map(|t| t.as_str()))),
        ("operation", any(filter.operation.map(|o| o.as_str()))),
        ("permission", any(filter.permission.map(|p| p.as_str()))),
    ];
    if let Some(name) = &filter.name {
        query.push(("resource_name", name.clone()));
    }
    if let Some(principal) = &filter.principal {
        query.push(("principal", principal.clone()));
    }
    if let Some(host) = &filter.host {
        query.push(("host", host.clone()));
    }
    query
}

fn non_default_configs(entries: Vec<TopicConfigData>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .filter(|c| !c.is_default && !DEFAULT_SOURCES.contains(&c.source.as_str()))
        .filter_map(|c| c.value.map(|v| (c.name, v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DataList<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ClusterData {
    cluster_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct AclData {
    resource_type: ResourceType,
    resource_name: String,
    pattern_type: PatternType,
    principal: String,
    host: String,
    operation: AclOperation,
    permission: AclPermission,
}

impl From<&Grant> for AclData {
    fn from(grant: &Grant) -> Self {
        Self {
            resource_type: grant.pattern.resource_type,
            resource_name: grant.pattern.name.clone(),
            pattern_type: grant.pattern.pattern_type,
            principal: grant.principal.clone(),
            host: grant.host.clone(),
            operation: grant.operation,
            permission: grant.permission,
        }
    }
}

impl From<AclData> for Grant {
    fn from(data: AclData) -> Self {
        Grant {
            pattern: ResourcePattern::new(data.resource_name, data.resource_type, data.pattern_type),
            principal: data.principal,
            host: data.host,
            operation: data.operation,
            permission: data.permission,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateTopicRequest<'a> {
    topic_name: &'a str,
    partitions_count: i32,
    replication_factor: i32,
    configs: Vec<ConfigEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct UpdatePartitionsRequest {
    partitions_count: i32,
}

#[derive(Debug, Serialize)]
struct AlterConfigsRequest<'a> {
    data: Vec<ConfigEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ConfigEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct TopicData {
    topic_name: String,
    partitions_count: i32,
    replication_factor: i32,
}

impl TopicData {
    fn into_description(self, config: BTreeMap<String, String>) -> TopicDescription {
        TopicDescription {
            name: self.topic_name,
            partitions: self.partitions_count,
            replication_factor: self.replication_factor,
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopicConfigData {
    name: String,
    value: Option<String>,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    source: String,
}

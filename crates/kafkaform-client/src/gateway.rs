//! The surfaces the provisioner drives: ACLs, topics and connectors.
//!
//! Every call is independent. A multi-grant apply is sent one grant at a time
//! with no rollback; when it fails part way the grants already sent stay in
//! place and the error is returned as-is.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kafkaform_acl::{Grant, GrantFilter, ResourceEntity};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[async_trait]
pub trait AclGateway: Send + Sync {
    /// Create each grant. Creating a grant that already exists is not an error.
    async fn apply_grants(&self, grants: &[Grant]) -> Result<()>;

    /// Every resource entity holding an entry for `principal`.
    async fn list_grants(&self, principal: &str) -> Result<Vec<ResourceEntity>>;

    /// Delete every grant matched by `filter`, returning how many went.
    async fn delete_grants_matching(&self, filter: &GrantFilter) -> Result<usize>;
}

#[async_trait]
pub trait TopicGateway: Send + Sync {
    /// Create a topic. An existing topic with the same name is left untouched.
    async fn create_topic(&self, topic: &NewTopic) -> Result<()>;

    /// Topic metadata with its non-default configuration, `None` if absent.
    async fn describe_topic(&self, name: &str) -> Result<Option<TopicDescription>>;

    /// Every topic whose name starts with `prefix`.
    async fn list_topics(&self, prefix: &str) -> Result<Vec<TopicDescription>>;

    /// Grow a topic to `partitions`. Kafka cannot shrink a topic.
    async fn increase_partitions(&self, name: &str, partitions: i32) -> Result<()>;

    /// Set (`Some`) or reset to default (`None`) individual config entries.
    async fn update_topic_config(
        &self,
        name: &str,
        updates: &BTreeMap<String, Option<String>>,
    ) -> Result<()>;

    /// Delete a topic. Deleting a missing topic is not an error.
    async fn delete_topic(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait ConnectorGateway: Send + Sync {
    async fn cluster_info(&self) -> Result<ConnectClusterInfo>;

    async fn list_connectors(&self) -> Result<Vec<String>>;

    async fn get_connector(&self, name: &str) -> Result<Option<ConnectorInfo>>;

    /// Create or update a connector.
    async fn put_connector_config(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<ConnectorInfo>;

    /// Delete a connector. Deleting a missing connector is not an error.
    async fn delete_connector(&self, name: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicDescription {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectClusterInfo {
    pub version: String,
    pub commit: String,
    pub kafka_cluster_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub name: String,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
    #[serde(default)]
    pub tasks: Vec<ConnectorTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectorTask {
    pub connector: String,
    pub task: i64,
}

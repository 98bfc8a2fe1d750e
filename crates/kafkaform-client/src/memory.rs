//! In-process cluster used by tests and `--dry-run` style previews.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use kafkaform_acl::{group_into_entities, Grant, GrantFilter, ResourceEntity};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{GatewayError, Result};
use crate::gateway::{
    AclGateway, ConnectClusterInfo, ConnectorGateway, ConnectorInfo, NewTopic, TopicDescription,
    TopicGateway,
};

/// Bindings, topics and connectors held in memory.
///
/// Grants are kept in insertion order so listings come back in the order they
/// were applied. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryCluster {
    state: Arc<RwLock<State>>,
}

#[derive(Default)]
struct State {
    grants: Vec<Grant>,
    topics: BTreeMap<String, TopicDescription>,
    connectors: BTreeMap<String, ConnectorInfo>,
    unavailable: Option<String>,
    rebalancing: bool,
    /// Remaining grant creations before `apply_grants` starts failing.
    grant_budget: Option<usize>,
}

impl State {
    fn check_available(&self) -> Result<()> {
        match &self.unavailable {
            Some(reason) => Err(GatewayError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Unavailable` until cleared with `None`.
    pub async fn set_unavailable(&self, reason: Option<&str>) {
        self.state.write().await.unavailable = reason.map(str::to_string);
    }

    /// Make connector writes fail with `Rebalance`.
    pub async fn set_rebalancing(&self, rebalancing: bool) {
        self.state.write().await.rebalancing = rebalancing;
    }

    /// Accept `count` more grant creations, then fail the rest.
    pub async fn fail_grants_after(&self, count: usize) {
        self.state.write().await.grant_budget = Some(count);
    }

    /// Snapshot of every stored grant in insertion order.
    pub async fn grants(&self) -> Vec<Grant> {
        self.state.read().await.grants.clone()
    }
}

fn not_found(context: &str, topic: &str) -> GatewayError {
    GatewayError::AdminApi {
        status: 404,
        message: format!("{context}: topic {topic} not found"),
    }
}

#[async_trait]
impl AclGateway for InMemoryCluster {
    async fn apply_grants(&self, grants: &[Grant]) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;

        for grant in grants {
            if let Some(budget) = state.grant_budget.as_mut() {
                if *budget == 0 {
                    return Err(GatewayError::Unavailable(format!(
                        "broker rejected ACL on {}",
                        grant.pattern
                    )));
                }
                *budget -= 1;
            }
            if state.grants.contains(grant) {
                debug!("ACL already present on {} for {}", grant.pattern, grant.principal);
                continue;
            }
            state.grants.push(grant.clone());
        }
        Ok(())
    }

    async fn list_grants(&self, principal: &str) -> Result<Vec<ResourceEntity>> {
        let state = self.state.read().await;
        state.check_available()?;

        let filter = GrantFilter::for_principal(principal);
        Ok(group_into_entities(
            state.grants.iter().filter(|g| filter.matches(g)).cloned(),
        ))
    }

    async fn delete_grants_matching(&self, filter: &GrantFilter) -> Result<usize> {
        let mut state = self.state.write().await;
        state.check_available()?;

        let before = state.grants.len();
        state.grants.retain(|g| !filter.matches(g));
        let removed = before - state.grants.len();
        debug!("Deleted {removed} ACL(s)");
        Ok(removed)
    }
}

#[async_trait]
impl TopicGateway for InMemoryCluster {
    async fn create_topic(&self, topic: &NewTopic) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;

        if state.topics.contains_key(&topic.name) {
            debug!("Topic {} already exists", topic.name);
            return Ok(());
        }
        state.topics.insert(
            topic.name.clone(),
            TopicDescription {
                name: topic.name.clone(),
                partitions: topic.partitions,
                replication_factor: topic.replication_factor,
                config: topic.config.clone(),
            },
        );
        info!(topic = %topic.name, "Created topic");
        Ok(())
    }

    async fn describe_topic(&self, name: &str) -> Result<Option<TopicDescription>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.topics.get(name).cloned())
    }

    async fn list_topics(&self, prefix: &str) -> Result<Vec<TopicDescription>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state
            .topics
            .values()
            .filter(|t| t.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn increase_partitions(&self, name: &str, partitions: i32) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;

        let topic = state.topics.get_mut(name).ok_or_else(|| not_found("Increase partitions failed", name))?;
        if partitions < topic.partitions {
            return Err(GatewayError::AdminApi {
                status: 400,
                message: format!(
                    "Increase partitions failed: topic {name} has {} partitions, cannot shrink to {partitions}",
                    topic.partitions
                ),
            });
        }
        topic.partitions = partitions;
        Ok(())
    }

    async fn update_topic_config(
        &self,
        name: &str,
        updates: &BTreeMap<String, Option<String>>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;

        let topic = state.topics.get_mut(name).ok_or_else(|| not_found("Update topic config failed", name))?;
        for (key, value) in updates {
            match value {
                Some(v) => {
                    topic.config.insert(key.clone(), v.clone());
                }
                None => {
                    topic.config.remove(key);
                }
            }
        }
        Ok(())
    }

    async fn delete_topic(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if state.topics.remove(name).is_some() {
            info!(topic = %name, "Deleted topic");
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectorGateway for InMemoryCluster {
    async fn cluster_info(&self) -> Result<ConnectClusterInfo> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(ConnectClusterInfo {
            version: "in-memory".into(),
            commit: String::new(),
            kafka_cluster_id: "in-memory".into(),
        })
    }

    async fn list_connectors(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.connectors.keys().cloned().collect())
    }

    async fn get_connector(&self, name: &str) -> Result<Option<ConnectorInfo>> {
        let state = self.state.read().await;
        state.check_available()?;
        Ok(state.connectors.get(name).cloned())
    }

    async fn put_connector_config(
        &self,
        name: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<ConnectorInfo> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if state.rebalancing {
            return Err(GatewayError::Rebalance(format!("Put connector config failed: {name}")));
        }

        // Connect echoes the connector name back inside its config.
        let mut config = config.clone();
        config.insert("name".into(), name.to_string());
        let info = ConnectorInfo {
            name: name.to_string(),
            config,
            tasks: Vec::new(),
        };
        state.connectors.insert(name.to_string(), info.clone());
        Ok(info)
    }

    async fn delete_connector(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_available()?;
        if state.rebalancing {
            return Err(GatewayError::Rebalance(format!("Delete connector failed: {name}")));
        }
        state.connectors.remove(name);
        Ok(())
    }
}

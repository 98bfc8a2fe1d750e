//! Workload-level access intents.
//!
//! Each intent describes what a workload needs (a consumer, a Kafka Streams
//! application, a Kafka Connect cluster) and expands into a fixed shape of
//! flat grants. Fields that can be recovered from the cluster are rebuilt on
//! every read; `metadata` is caller-local bookkeeping and never leaves the
//! process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

pub type Metadata = BTreeMap<String, String>;

/// Read access for a consumer on a project's topics and one consumer group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerAccess {
    pub project: String,
    pub principal: String,
    pub group: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ConsumerAccess {
    pub fn new(
        project: impl Into<String>,
        principal: impl Into<String>,
        group: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            project: project.into(),
            principal: principal.into(),
            group: group.into(),
            metadata,
        }
    }

    /// External identifier: `project#principal#group`.
    pub fn id(&self) -> String {
        format!("{}#{}#{}", self.project, self.principal, self.group)
    }

    pub fn validate(&self) -> Result<()> {
        let id = self.id();
        require("ConsumerAccess", &id, "project", &self.project)?;
        require("ConsumerAccess", &id, "principal", &self.principal)?;
        require("ConsumerAccess", &id, "group", &self.group)
    }
}

/// Access for a Kafka Streams application: literal source and sink topics
/// plus full control over its own `project`-prefixed internal topics and
/// consumer groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamsAccess {
    pub project: String,
    pub principal: String,
    #[serde(default)]
    pub read_topics: Vec<String>,
    #[serde(default)]
    pub write_topics: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl StreamsAccess {
    pub fn new(
        project: impl Into<String>,
        principal: impl Into<String>,
        read_topics: Vec<String>,
        write_topics: Vec<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            project: project.into(),
            principal: principal.into(),
            read_topics,
            write_topics,
            metadata,
        }
    }

    /// External identifier: `project#principal`.
    pub fn id(&self) -> String {
        format!("{}#{}", self.project, self.principal)
    }

    pub fn validate(&self) -> Result<()> {
        let id = self.id();
        require("StreamsAccess", &id, "project", &self.project)?;
        require("StreamsAccess", &id, "principal", &self.principal)?;
        require_topics("StreamsAccess", &id, "readTopics", &self.read_topics)?;
        require_topics("StreamsAccess", &id, "writeTopics", &self.write_topics)
    }
}

/// Access for a Kafka Connect worker cluster.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAccess {
    pub principal: String,
    pub group: String,
    #[serde(default)]
    pub read_topics: Vec<String>,
    #[serde(default)]
    pub write_topics: Vec<String>,
    pub status_topic: String,
    pub configs_topic: String,
    pub offset_topic: String,
    #[serde(default)]
    pub enable_topic_create: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ConnectAccess {
    /// External identifier: `group#principal`.
    pub fn id(&self) -> String {
        format!("{}#{}", self.group, self.principal)
    }

    /// The three worker-internal topics, in build order.
    pub fn management_topics(&self) -> [&str; 3] {
        [
            self.status_topic.as_str(),
            self.configs_topic.as_str(),
            self.offset_topic.as_str(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        let id = self.id();
        require("ConnectAccess", &id, "principal", &self.principal)?;
        require("ConnectAccess", &id, "group", &self.group)?;
        require("ConnectAccess", &id, "statusTopic", &self.status_topic)?;
        require("ConnectAccess", &id, "configsTopic", &self.configs_topic)?;
        require("ConnectAccess", &id, "offsetTopic", &self.offset_topic)?;
        require_topics("ConnectAccess", &id, "readTopics", &self.read_topics)?;
        require_topics("ConnectAccess", &id, "writeTopics", &self.write_topics)
    }
}

/// One of the three supported intents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum AccessIntent {
    Consumer(ConsumerAccess),
    Streams(StreamsAccess),
    Connect(ConnectAccess),
}

impl AccessIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            AccessIntent::Consumer(_) => "ConsumerAccess",
            AccessIntent::Streams(_) => "StreamsAccess",
            AccessIntent::Connect(_) => "ConnectAccess",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            AccessIntent::Consumer(c) => c.validate(),
            AccessIntent::Streams(s) => s.validate(),
            AccessIntent::Connect(c) => c.validate(),
        }
    }
}

impl From<ConsumerAccess> for AccessIntent {
    fn from(value: ConsumerAccess) -> Self {
        AccessIntent::Consumer(value)
    }
}

impl From<StreamsAccess> for AccessIntent {
    fn from(value: StreamsAccess) -> Self {
        AccessIntent::Streams(value)
    }
}

impl From<ConnectAccess> for AccessIntent {
    fn from(value: ConnectAccess) -> Self {
        AccessIntent::Connect(value)
    }
}

fn require(kind: &'static str, id: &str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AclError::EmptyField {
            kind,
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}

fn require_topics(kind: &'static str, id: &str, field: &'static str, topics: &[String]) -> Result<()> {
    if topics.iter().any(|t| t.trim().is_empty()) {
        return Err(AclError::EmptyTopic {
            kind,
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}

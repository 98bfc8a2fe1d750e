//! Declarative input: one YAML document listing every resource to manage.
//!
//! ```yaml
//! resources:
//!   - kind: Topic
//!     name: orders
//!     partitions: 6
//!     replicationFactor: 3
//!   - kind: ConsumerAcl
//!     name: orders-reader
//!     project: orders
//!     principal: User:reader
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use kafkaform_acl::{AccessIntent, ConnectAccess, ConsumerAccess, Metadata, StreamsAccess};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::defaults;
use crate::error::{ProvisionError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceSpec {
    Topic(TopicSpec),
    ConsumerAcl(ConsumerAclSpec),
    StreamsAcl(StreamsAclSpec),
    ConnectAcl(ConnectAclSpec),
    Connector(ConnectorSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerAclSpec {
    pub name: String,
    pub project: String,
    pub principal: String,
    #[serde(default = "defaults::consumer_group")]
    pub group: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamsAclSpec {
    pub name: String,
    pub project: String,
    pub principal: String,
    #[serde(default)]
    pub read_topics: Vec<String>,
    #[serde(default)]
    pub write_topics: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAclSpec {
    pub name: String,
    pub principal: String,
    #[serde(default = "defaults::connect_group")]
    pub group: String,
    #[serde(default)]
    pub read_topics: Vec<String>,
    #[serde(default)]
    pub write_topics: Vec<String>,
    #[serde(default = "defaults::status_topic")]
    pub status_topic: String,
    #[serde(default = "defaults::configs_topic")]
    pub configs_topic: String,
    #[serde(default = "defaults::offset_topic")]
    pub offset_topic: String,
    #[serde(default)]
    pub enable_topic_create: bool,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub name: String,
    pub config: BTreeMap<String, String>,
}

impl ResourceSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Topic(_) => "Topic",
            ResourceSpec::ConsumerAcl(_) => "ConsumerAcl",
            ResourceSpec::StreamsAcl(_) => "StreamsAcl",
            ResourceSpec::ConnectAcl(_) => "ConnectAcl",
            ResourceSpec::Connector(_) => "Connector",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResourceSpec::Topic(t) => &t.name,
            ResourceSpec::ConsumerAcl(c) => &c.name,
            ResourceSpec::StreamsAcl(s) => &s.name,
            ResourceSpec::ConnectAcl(c) => &c.name,
            ResourceSpec::Connector(c) => &c.name,
        }
    }

    /// The access intent behind an ACL resource, `None` for other kinds.
    pub fn access_intent(&self) -> Option<AccessIntent> {
        match self {
            ResourceSpec::ConsumerAcl(c) => Some(
                ConsumerAccess::new(&c.project, &c.principal, &c.group, c.metadata.clone()).into(),
            ),
            ResourceSpec::StreamsAcl(s) => Some(
                StreamsAccess::new(
                    &s.project,
                    &s.principal,
                    s.read_topics.clone(),
                    s.write_topics.clone(),
                    s.metadata.clone(),
                )
                .into(),
            ),
            ResourceSpec::ConnectAcl(c) => Some(
                ConnectAccess {
                    principal: c.principal.clone(),
                    group: c.group.clone(),
                    read_topics: c.read_topics.clone(),
                    write_topics: c.write_topics.clone(),
                    status_topic: c.status_topic.clone(),
                    configs_topic: c.configs_topic.clone(),
                    offset_topic: c.offset_topic.clone(),
                    enable_topic_create: c.enable_topic_create,
                    metadata: c.metadata.clone(),
                }
                .into(),
            ),
            ResourceSpec::Topic(_) | ResourceSpec::Connector(_) => None,
        }
    }
}

impl Manifest {
    /// Parse and validate a YAML manifest.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Manifest =
            serde_yaml::from_str(content).map_err(|e| ProvisionError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let manifest = Self::from_yaml(&content)?;
        info!(
            "Loaded manifest {:?} with {} resource(s)",
            path,
            manifest.resources.len()
        );
        Ok(manifest)
    }

    /// Reject duplicate names per kind and resources no run could act on.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            let (kind, name) = (resource.kind(), resource.name());
            if name.trim().is_empty() {
                return Err(ProvisionError::Manifest(format!("{kind} with an empty name")));
            }
            if !seen.insert((kind, name)) {
                return Err(ProvisionError::Manifest(format!("duplicate {kind} {name}")));
            }

            match resource {
                ResourceSpec::Topic(t) => {
                    if t.partitions < 1 || t.replication_factor < 1 {
                        return Err(ProvisionError::Manifest(format!(
                            "Topic {name}: partitions and replicationFactor must be at least 1"
                        )));
                    }
                }
                ResourceSpec::Connector(c) => {
                    if c.config.is_empty() {
                        return Err(ProvisionError::Manifest(format!("Connector {name}: empty config")));
                    }
                    if c.config.get("name").is_some_and(|n| n != name) {
                        return Err(ProvisionError::Manifest(format!(
                            "Connector {name}: config name does not match the resource name"
                        )));
                    }
                }
                acl => {
                    if let Some(intent) = acl.access_intent() {
                        intent.validate()?;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicSpec> {
        self.resources.iter().filter_map(|r| match r {
            ResourceSpec::Topic(t) => Some(t),
            _ => None,
        })
    }

    pub fn connectors(&self) -> impl Iterator<Item = &ConnectorSpec> {
        self.resources.iter().filter_map(|r| match r {
            ResourceSpec::Connector(c) => Some(c),
            _ => None,
        })
    }

    /// ACL resources paired with their intents, in manifest order.
    pub fn acls(&self) -> impl Iterator<Item = (&ResourceSpec, AccessIntent)> {
        self.resources
            .iter()
            .filter_map(|r| r.access_intent().map(|intent| (r, intent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kafkaform_acl::AclResourceSet;

    const MANIFEST: &str = r#"
resources:
  - kind: Topic
    name: orders
    partitions: 6
    replicationFactor: 3
    config:
      retention.ms: "86400000"
  - kind: ConsumerAcl
    name: orders-reader
    project: orders
    principal: User:reader
  - kind: StreamsAcl
    name: enricher
    project: enricher
    principal: User:enricher
    readTopics: [orders]
    writeTopics: [orders-enriched]
  - kind: ConnectAcl
    name: workers
    principal: User:connect
    readTopics: [orders]
  - kind: Connector
    name: orders-sink
    config:
      connector.class: FileStreamSink
      topics: orders
"#;

    #[test]
    fn test_parse_with_defaults() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.resources.len(), 5);

        let ResourceSpec::ConsumerAcl(consumer) = &manifest.resources[1] else {
            panic!("expected a ConsumerAcl");
        };
        assert_eq!(consumer.group, "*");

        let ResourceSpec::ConnectAcl(connect) = &manifest.resources[3] else {
            panic!("expected a ConnectAcl");
        };
        assert_eq!(connect.group, "connect-cluster");
        assert_eq!(connect.status_topic, "connect-status");
        assert_eq!(connect.offset_topic, "connect-offsets");
        assert_eq!(connect.configs_topic, "connect-configs");
        assert!(!connect.enable_topic_create);
        assert!(connect.write_topics.is_empty());
    }

    #[test]
    fn test_access_intents() {
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let ids: Vec<_> = manifest.acls().map(|(_, intent)| intent.id()).collect();
        assert_eq!(
            ids,
            vec![
                "orders#User:reader#*",
                "enricher#User:enricher",
                "connect-cluster#User:connect",
            ]
        );
        assert_eq!(manifest.topics().count(), 1);
        assert_eq!(manifest.connectors().count(), 1);
    }

    #[test]
    fn test_rejects_duplicates() {
        let yaml = r#"
resources:
  - {kind: Topic, name: a, partitions: 1, replicationFactor: 1}
  - {kind: Topic, name: a, partitions: 2, replicationFactor: 1}
"#;
        assert!(matches!(Manifest::from_yaml(yaml), Err(ProvisionError::Manifest(_))));
    }

    #[test]
    fn test_same_name_different_kinds_is_fine() {
        let yaml = r#"
resources:
  - {kind: Topic, name: orders, partitions: 1, replicationFactor: 1}
  - {kind: ConsumerAcl, name: orders, project: orders, principal: "User:a"}
"#;
        assert!(Manifest::from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_rejects_invalid_resources() {
        let zero_partitions = "resources:\n  - {kind: Topic, name: a, partitions: 0, replicationFactor: 1}\n";
        assert!(Manifest::from_yaml(zero_partitions).is_err());

        let empty_principal = "resources:\n  - {kind: ConsumerAcl, name: a, project: p, principal: \"\"}\n";
        assert!(matches!(
            Manifest::from_yaml(empty_principal),
            Err(ProvisionError::Acl(_))
        ));

        let mismatched = "resources:\n  - {kind: Connector, name: a, config: {name: b, x: y}}\n";
        assert!(Manifest::from_yaml(mismatched).is_err());

        let unknown_kind = "resources:\n  - {kind: Schema, name: a}\n";
        assert!(Manifest::from_yaml(unknown_kind).is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kafka.yaml");
        tokio::fs::write(&path, MANIFEST).await.unwrap();
        let manifest = Manifest::load(&path).await.unwrap();
        assert_eq!(manifest.resources.len(), 5);

        let missing = Manifest::load(dir.path().join("missing.yaml")).await;
        assert!(matches!(missing, Err(ProvisionError::Io(_))));
    }
}

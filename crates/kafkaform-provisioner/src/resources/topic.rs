use std::collections::BTreeMap;

use kafkaform_client::{NewTopic, TopicDescription, TopicGateway};
use tracing::{info, warn};

use crate::error::{ProvisionError, Result};
use crate::manifest::TopicSpec;
use crate::status::Drift;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Create the topic, or bring an existing one in line with `spec`.
///
/// Partitions only grow. A declared count below the current one cannot be
/// applied in place and is returned as `RequiresReplacement`. Replication
/// factor changes are reported but not applied.
pub async fn apply(gateway: &dyn TopicGateway, spec: &TopicSpec) -> Result<TopicOutcome> {
    let Some(existing) = gateway.describe_topic(&spec.name).await? else {
        info!(
            topic = %spec.name,
            partitions = spec.partitions,
            rf = spec.replication_factor,
            "Creating topic"
        );
        gateway
            .create_topic(&NewTopic {
                name: spec.name.clone(),
                partitions: spec.partitions,
                replication_factor: spec.replication_factor,
                config: spec.config.clone(),
            })
            .await?;
        return Ok(TopicOutcome::Created);
    };

    if spec.partitions < existing.partitions {
        return Err(ProvisionError::RequiresReplacement {
            kind: "Topic",
            name: spec.name.clone(),
            reason: format!(
                "partitions cannot decrease from {} to {}",
                existing.partitions, spec.partitions
            ),
        });
    }

    let mut updated = false;
    if spec.partitions > existing.partitions {
        info!(
            topic = %spec.name,
            current = existing.partitions,
            desired = spec.partitions,
            "Increasing partitions"
        );
        gateway.increase_partitions(&spec.name, spec.partitions).await?;
        updated = true;
    }

    if spec.replication_factor != existing.replication_factor {
        warn!(
            topic = %spec.name,
            current = existing.replication_factor,
            desired = spec.replication_factor,
            "Replication factor changes are not applied"
        );
    }

    let updates = config_updates(&spec.config, &existing.config);
    if !updates.is_empty() {
        info!(topic = %spec.name, keys = updates.len(), "Updating topic config");
        gateway.update_topic_config(&spec.name, &updates).await?;
        updated = true;
    }

    Ok(if updated {
        TopicOutcome::Updated
    } else {
        TopicOutcome::Unchanged
    })
}

/// Differences between the declared topic and the cluster's, `None` when
/// the topic does not exist.
pub async fn refresh(gateway: &dyn TopicGateway, spec: &TopicSpec) -> Result<Option<Vec<Drift>>> {
    Ok(gateway
        .describe_topic(&spec.name)
        .await?
        .map(|observed| drift(spec, &observed)))
}

pub async fn destroy(gateway: &dyn TopicGateway, spec: &TopicSpec) -> Result<()> {
    info!(topic = %spec.name, "Deleting topic");
    gateway.delete_topic(&spec.name).await?;
    Ok(())
}

/// Per-key changes turning `observed` into `desired`: `Some` sets a value,
/// `None` resets an override the manifest no longer declares.
pub fn config_updates(
    desired: &BTreeMap<String, String>,
    observed: &BTreeMap<String, String>,
) -> BTreeMap<String, Option<String>> {
    let mut updates = BTreeMap::new();
    for (key, value) in desired {
        if observed.get(key) != Some(value) {
            updates.insert(key.clone(), Some(value.clone()));
        }
    }
    for key in observed.keys() {
        if !desired.contains_key(key) {
            updates.insert(key.clone(), None);
        }
    }
    updates
}

pub fn drift(spec: &TopicSpec, observed: &TopicDescription) -> Vec<Drift> {
    let mut drift = Vec::new();
    if spec.partitions != observed.partitions {
        drift.push(Drift::new("partitions", spec.partitions, observed.partitions));
    }
    if spec.replication_factor != observed.replication_factor {
        drift.push(Drift::new(
            "replicationFactor",
            spec.replication_factor,
            observed.replication_factor,
        ));
    }
    for (key, update) in config_updates(&spec.config, &observed.config) {
        let declared = update.unwrap_or_default();
        let current = observed.config.get(&key).cloned().unwrap_or_default();
        drift.push(Drift::new(format!("config.{key}"), declared, current));
    }
    drift
}

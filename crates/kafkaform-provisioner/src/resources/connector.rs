use std::collections::BTreeMap;

use kafkaform_client::{ConnectorGateway, ConnectorInfo};
use tracing::{debug, info};

use crate::error::Result;
use crate::manifest::ConnectorSpec;
use crate::status::Drift;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Config as declared: the cluster echoes the connector `name` back, which
/// would otherwise show up as a difference.
pub fn observed_config(info: &ConnectorInfo) -> BTreeMap<String, String> {
    let mut config = info.config.clone();
    config.remove("name");
    config
}

pub async fn apply(gateway: &dyn ConnectorGateway, spec: &ConnectorSpec) -> Result<ConnectorOutcome> {
    let existing = gateway.get_connector(&spec.name).await?;
    let mut declared = spec.config.clone();
    declared.remove("name");

    let outcome = match &existing {
        Some(info) if observed_config(info) == declared => {
            debug!(connector = %spec.name, "Connector config unchanged");
            return Ok(ConnectorOutcome::Unchanged);
        }
        Some(_) => ConnectorOutcome::Updated,
        None => ConnectorOutcome::Created,
    };

    info!(connector = %spec.name, ?outcome, "Putting connector config");
    let info = gateway.put_connector_config(&spec.name, &spec.config).await?;
    debug!(connector = %info.name, tasks = info.tasks.len(), "Connector accepted");
    Ok(outcome)
}

/// Differences between declared and running config, `None` when the
/// connector does not exist.
pub async fn refresh(gateway: &dyn ConnectorGateway, spec: &ConnectorSpec) -> Result<Option<Vec<Drift>>> {
    let Some(info) = gateway.get_connector(&spec.name).await? else {
        return Ok(None);
    };
    let observed = observed_config(&info);

    let mut drift = Vec::new();
    for (key, value) in spec.config.iter().filter(|(k, _)| k.as_str() != "name") {
        let current = observed.get(key).cloned().unwrap_or_default();
        if &current != value {
            drift.push(Drift::new(format!("config.{key}"), value, current));
        }
    }
    for (key, value) in &observed {
        if !spec.config.contains_key(key) {
            drift.push(Drift::new(format!("config.{key}"), "", value));
        }
    }
    Ok(Some(drift))
}

pub async fn destroy(gateway: &dyn ConnectorGateway, spec: &ConnectorSpec) -> Result<()> {
    info!(connector = %spec.name, "Deleting connector");
    gateway.delete_connector(&spec.name).await?;
    Ok(())
}

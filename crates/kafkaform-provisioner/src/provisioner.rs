use std::sync::Arc;

use kafkaform_acl::{AccessIntent, AclResourceSet, Grant, ResourceEntity};
use kafkaform_client::{AclGateway, ConnectorGateway, InMemoryCluster, TopicDescription, TopicGateway};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ProvisionError, Result};
use crate::manifest::{ConnectorSpec, Manifest, ResourceSpec};
use crate::resources::connector::{self, ConnectorOutcome};
use crate::resources::{acl, topic};
use crate::resources::topic::TopicOutcome;
use crate::status::{Phase, ResourceStatus, RunReport};

/// The grants one ACL resource expands to, computed offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedAcl {
    pub kind: &'static str,
    pub name: String,
    pub id: String,
    pub grants: Vec<Grant>,
}

/// Drives manifest runs against a set of gateways.
///
/// Resources are processed one at a time. Apply handles topics first, then
/// ACLs, then connectors; destroy runs in the reverse order. A failing
/// resource is recorded as `Failed` and the run moves on.
#[derive(Clone)]
pub struct Provisioner {
    acls: Arc<dyn AclGateway>,
    topics: Arc<dyn TopicGateway>,
    connectors: Option<Arc<dyn ConnectorGateway>>,
}

impl Provisioner {
    pub fn new(acls: Arc<dyn AclGateway>, topics: Arc<dyn TopicGateway>) -> Self {
        Self {
            acls,
            topics,
            connectors: None,
        }
    }

    pub fn with_connectors(mut self, connectors: Arc<dyn ConnectorGateway>) -> Self {
        self.connectors = Some(connectors);
        self
    }

    /// Every surface backed by the same in-memory cluster.
    pub fn in_memory(cluster: InMemoryCluster) -> Self {
        let shared = Arc::new(cluster);
        Self::new(shared.clone(), shared.clone()).with_connectors(shared)
    }

    fn connect_gateway(&self, spec: &ConnectorSpec) -> Result<&dyn ConnectorGateway> {
        self.connectors
            .as_deref()
            .ok_or_else(|| ProvisionError::ConnectNotConfigured(spec.name.clone()))
    }

    pub async fn apply(&self, manifest: &Manifest) -> RunReport {
        info!(resources = manifest.resources.len(), "Applying manifest");
        let mut report = RunReport::default();
        for resource in ordered(manifest, false) {
            let status = self.apply_one(resource).await;
            report.resources.push(status);
        }
        report
    }

    pub async fn refresh(&self, manifest: &Manifest) -> RunReport {
        info!(resources = manifest.resources.len(), "Refreshing manifest");
        let mut report = RunReport::default();
        for resource in &manifest.resources {
            let status = self.refresh_one(resource).await;
            report.resources.push(status);
        }
        report
    }

    pub async fn destroy(&self, manifest: &Manifest) -> RunReport {
        info!(resources = manifest.resources.len(), "Destroying manifest");
        let mut report = RunReport::default();
        for resource in ordered(manifest, true) {
            let status = self.destroy_one(resource).await;
            report.resources.push(status);
        }
        report
    }

    /// Grants each ACL resource expands to. Touches no gateway.
    pub fn render(manifest: &Manifest) -> Vec<RenderedAcl> {
        manifest
            .acls()
            .map(|(resource, intent)| RenderedAcl {
                kind: resource.kind(),
                name: resource.name().to_string(),
                id: intent.id(),
                grants: intent.build(),
            })
            .collect()
    }

    /// Everything the cluster grants `principal`, grouped by resource.
    pub async fn grants(&self, principal: &str) -> Result<Vec<ResourceEntity>> {
        Ok(self.acls.list_grants(principal).await?)
    }

    pub async fn topics(&self, prefix: &str) -> Result<Vec<TopicDescription>> {
        Ok(self.topics.list_topics(prefix).await?)
    }

    async fn apply_one(&self, resource: &ResourceSpec) -> ResourceStatus {
        let (kind, name) = (resource.kind(), resource.name());
        let result = match resource {
            ResourceSpec::Topic(spec) => topic::apply(&*self.topics, spec).await.map(|outcome| {
                let phase = match outcome {
                    TopicOutcome::Created => Phase::Created,
                    TopicOutcome::Updated => Phase::Updated,
                    TopicOutcome::Unchanged => Phase::Unchanged,
                };
                ResourceStatus::new(kind, name, phase).with_id(&spec.name)
            }),
            ResourceSpec::Connector(spec) => match self.connect_gateway(spec) {
                Ok(gateway) => connector::apply(gateway, spec).await.map(|outcome| {
                    let phase = match outcome {
                        ConnectorOutcome::Created => Phase::Created,
                        ConnectorOutcome::Updated => Phase::Updated,
                        ConnectorOutcome::Unchanged => Phase::Unchanged,
                    };
                    ResourceStatus::new(kind, name, phase).with_id(&spec.name)
                }),
                Err(e) => Err(e),
            },
            acl_resource => match acl_resource.access_intent() {
                Some(intent) => acl::apply(&*self.acls, &intent).await.map(|grants| {
                    ResourceStatus::new(kind, name, Phase::Applied)
                        .with_id(intent.id())
                        .with_grants(grants.len())
                }),
                None => Err(ProvisionError::Manifest(format!("{kind} {name} is not an ACL resource"))),
            },
        };
        settle(kind, name, id_of(resource), result)
    }

    async fn refresh_one(&self, resource: &ResourceSpec) -> ResourceStatus {
        let (kind, name) = (resource.kind(), resource.name());
        let result = match resource {
            ResourceSpec::Topic(spec) => topic::refresh(&*self.topics, spec)
                .await
                .map(|drift| observed_status(kind, name, &spec.name, drift)),
            ResourceSpec::Connector(spec) => match self.connect_gateway(spec) {
                Ok(gateway) => connector::refresh(gateway, spec)
                    .await
                    .map(|drift| observed_status(kind, name, &spec.name, drift)),
                Err(e) => Err(e),
            },
            acl_resource => match acl_resource.access_intent() {
                Some(intent) => acl::refresh(&*self.acls, &intent)
                    .await
                    .map(|observation| acl_status(kind, name, &intent, observation)),
                None => Err(ProvisionError::Manifest(format!("{kind} {name} is not an ACL resource"))),
            },
        };
        settle(kind, name, id_of(resource), result)
    }

    async fn destroy_one(&self, resource: &ResourceSpec) -> ResourceStatus {
        let (kind, name) = (resource.kind(), resource.name());
        let result = match resource {
            ResourceSpec::Topic(spec) => topic::destroy(&*self.topics, spec)
                .await
                .map(|()| ResourceStatus::new(kind, name, Phase::Deleted).with_id(&spec.name)),
            ResourceSpec::Connector(spec) => match self.connect_gateway(spec) {
                Ok(gateway) => connector::destroy(gateway, spec)
                    .await
                    .map(|()| ResourceStatus::new(kind, name, Phase::Deleted).with_id(&spec.name)),
                Err(e) => Err(e),
            },
            acl_resource => match acl_resource.access_intent() {
                Some(intent) => acl::destroy(&*self.acls, &intent).await.map(|removed| {
                    ResourceStatus::new(kind, name, Phase::Deleted)
                        .with_id(intent.id())
                        .with_grants(removed)
                }),
                None => Err(ProvisionError::Manifest(format!("{kind} {name} is not an ACL resource"))),
            },
        };
        settle(kind, name, id_of(resource), result)
    }
}

/// Topics, then ACLs, then connectors; reversed for teardown.
fn ordered(manifest: &Manifest, reverse: bool) -> Vec<&ResourceSpec> {
    let rank = |r: &ResourceSpec| match r {
        ResourceSpec::Topic(_) => 0,
        ResourceSpec::Connector(_) => 2,
        _ => 1,
    };
    let mut resources: Vec<&ResourceSpec> = manifest.resources.iter().collect();
    // Stable: manifest order is kept within a rank.
    resources.sort_by_key(|r| rank(*r));
    if reverse {
        resources.reverse();
    }
    resources
}

fn id_of(resource: &ResourceSpec) -> String {
    match resource.access_intent() {
        Some(intent) => intent.id(),
        None => resource.name().to_string(),
    }
}

fn settle(kind: &'static str, name: &str, id: String, result: Result<ResourceStatus>) -> ResourceStatus {
    match result {
        Ok(status) => status,
        Err(e) => {
            warn!(kind, name, transient = e.is_transient(), "Resource failed: {e}");
            ResourceStatus::new(kind, name, Phase::Failed)
                .with_id(id)
                .with_message(e.to_string())
        }
    }
}

fn observed_status(
    kind: &'static str,
    name: &str,
    id: &str,
    drift: Option<Vec<crate::status::Drift>>,
) -> ResourceStatus {
    match drift {
        None => ResourceStatus::new(kind, name, Phase::Missing).with_id(id),
        Some(drift) if drift.is_empty() => ResourceStatus::new(kind, name, Phase::InSync).with_id(id),
        Some(drift) => ResourceStatus::new(kind, name, Phase::Drifted)
            .with_id(id)
            .with_drift(drift),
    }
}

fn acl_status(
    kind: &'static str,
    name: &str,
    intent: &AccessIntent,
    observation: acl::AclObservation,
) -> ResourceStatus {
    let status = ResourceStatus::new(kind, name, Phase::InSync)
        .with_id(intent.id())
        .with_grants(observation.held);

    if observation.held == 0 {
        return ResourceStatus {
            phase: Phase::Missing,
            ..status
        };
    }
    if observation.in_sync() {
        return status;
    }

    let mut notes = Vec::new();
    if !observation.missing.is_empty() {
        notes.push(format!("{} grant(s) missing", observation.missing.len()));
    }
    if !observation.report.ambiguous.is_empty() {
        notes.push(format!(
            "{} topic(s) granted both read and write",
            observation.report.ambiguous.len()
        ));
    }
    let status = ResourceStatus {
        phase: Phase::Drifted,
        ..status
    }
    .with_drift(observation.drift);
    if notes.is_empty() {
        status
    } else {
        status.with_message(notes.join("; "))
    }
}

//! Reconstruction of intents from the grants a cluster reports.
//!
//! Parsing never fails. Entities that do not fit the intent being read are
//! left out and listed in the returned [`ParseReport`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::grant::{AclOperation, AclPermission, PatternType, ResourceEntity, ResourcePattern, ResourceType};
use crate::intent::{ConnectAccess, ConsumerAccess, StreamsAccess};
use crate::resource_set::AclResourceSet;

/// Why an entity did not contribute to the intent.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum IgnoreReason {
    /// No entry on the entity belongs to the intent's principal.
    PrincipalMismatch,
    /// The entity carries no entries at all.
    EmptyEntity,
    /// The principal's entries on the entity are all non-Allow.
    NotAllowed,
    /// The resource type has no meaning for this intent.
    UnsupportedResource,
    /// The pattern type has no meaning for this resource and intent.
    UnsupportedPattern,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ignored {
    pub pattern: ResourcePattern,
    pub reason: IgnoreReason,
}

/// A literal topic that carries both Read and another operation, and so was
/// placed in both the read and the write list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ambiguity {
    pub topic: String,
    pub operations: Vec<AclOperation>,
}

/// Outcome of one parse.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ParseReport {
    /// Entities that updated the intent.
    pub classified: usize,
    /// Entities dropped by the continuation filter before parsing.
    pub skipped: usize,
    pub ignored: Vec<Ignored>,
    pub ambiguous: Vec<Ambiguity>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.ignored.is_empty() && self.ambiguous.is_empty()
    }

    pub(crate) fn ignore(&mut self, entity: &ResourceEntity, reason: IgnoreReason) {
        debug!(resource = %entity.pattern, ?reason, "Ignoring ACL resource");
        self.ignored.push(Ignored {
            pattern: entity.pattern.clone(),
            reason,
        });
    }
}

/// Parse every entity into `intent`, without the continuation filter.
pub fn parse<T>(entities: &[ResourceEntity], intent: &mut T) -> ParseReport
where
    T: AclResourceSet + ?Sized,
{
    let mut report = ParseReport::default();
    for entity in entities {
        absorb(entity, intent, &mut report);
    }
    report
}

/// The read cycle: drop entities the continuation filter rejects, parse the
/// rest into `intent`.
pub fn read_back<T>(entities: &[ResourceEntity], intent: &mut T) -> ParseReport
where
    T: AclResourceSet + ?Sized,
{
    let mut report = ParseReport::default();
    for entity in entities {
        if intent.should_skip(entity) {
            report.skipped += 1;
            continue;
        }
        debug!(
            resource = %entity.pattern,
            acls = entity.acls.len(),
            "ACL(s) found for resource"
        );
        absorb(entity, intent, &mut report);
    }
    report
}

fn absorb<T>(entity: &ResourceEntity, intent: &mut T, report: &mut ParseReport)
where
    T: AclResourceSet + ?Sized,
{
    if entity.acls.is_empty() {
        report.ignore(entity, IgnoreReason::EmptyEntity);
        return;
    }

    let mut operations = Vec::new();
    let mut owned = false;
    for acl in entity.acls.iter().filter(|acl| acl.principal == intent.principal()) {
        owned = true;
        if acl.permission == AclPermission::Allow && !operations.contains(&acl.operation) {
            operations.push(acl.operation);
        }
    }

    if !owned {
        report.ignore(entity, IgnoreReason::PrincipalMismatch);
        return;
    }
    if operations.is_empty() {
        report.ignore(entity, IgnoreReason::NotAllowed);
        return;
    }

    if intent.absorb_entity(entity, &operations, report) {
        report.classified += 1;
    }
}

pub(crate) fn absorb_consumer(
    acl: &mut ConsumerAccess,
    entity: &ResourceEntity,
    report: &mut ParseReport,
) -> bool {
    match entity.resource_type() {
        ResourceType::Group => acl.group = entity.name().to_string(),
        // Topic entities for a consumer are its single prefixed project grant.
        ResourceType::Topic => acl.project = entity.name().to_string(),
        _ => {
            report.ignore(entity, IgnoreReason::UnsupportedResource);
            return false;
        }
    }
    true
}

pub(crate) fn absorb_streams(
    acl: &mut StreamsAccess,
    entity: &ResourceEntity,
    operations: &[AclOperation],
    report: &mut ParseReport,
) -> bool {
    match (entity.resource_type(), entity.pattern_type()) {
        // The project group grant carries nothing the intent does not already know.
        (ResourceType::Group, _) => true,
        (ResourceType::Topic, PatternType::Prefixed) => {
            acl.project = entity.name().to_string();
            true
        }
        (ResourceType::Topic, PatternType::Literal) => {
            classify_topic(
                entity.name(),
                operations,
                &mut acl.read_topics,
                &mut acl.write_topics,
                report,
            );
            true
        }
        (ResourceType::Topic, _) => {
            report.ignore(entity, IgnoreReason::UnsupportedPattern);
            false
        }
        _ => {
            report.ignore(entity, IgnoreReason::UnsupportedResource);
            false
        }
    }
}

pub(crate) fn absorb_connect(
    acl: &mut ConnectAccess,
    entity: &ResourceEntity,
    operations: &[AclOperation],
    report: &mut ParseReport,
) -> bool {
    let name = entity.name();
    match entity.resource_type() {
        ResourceType::Group => {
            acl.group = name.to_string();
            true
        }
        ResourceType::Cluster => {
            acl.enable_topic_create = true;
            true
        }
        ResourceType::Topic => {
            if name == acl.status_topic {
                acl.status_topic = name.to_string();
            } else if name == acl.offset_topic {
                acl.offset_topic = name.to_string();
            } else if name == acl.configs_topic {
                acl.configs_topic = name.to_string();
            } else if entity.pattern_type() == PatternType::Literal {
                classify_topic(
                    name,
                    operations,
                    &mut acl.read_topics,
                    &mut acl.write_topics,
                    report,
                );
            } else {
                report.ignore(entity, IgnoreReason::UnsupportedPattern);
                return false;
            }
            true
        }
        _ => {
            report.ignore(entity, IgnoreReason::UnsupportedResource);
            false
        }
    }
}

/// Read goes to the read list, any other operation to the write list. A
/// topic carrying both lands in each list once and is reported.
fn classify_topic(
    topic: &str,
    operations: &[AclOperation],
    read_topics: &mut Vec<String>,
    write_topics: &mut Vec<String>,
    report: &mut ParseReport,
) {
    let reads = operations.contains(&AclOperation::Read);
    let writes = operations.iter().any(|op| *op != AclOperation::Read);

    if reads {
        push_unique(read_topics, topic);
    }
    if writes {
        push_unique(write_topics, topic);
    }
    if reads && writes {
        warn!(topic, ?operations, "Literal topic grants both read and write access");
        report.ambiguous.push(Ambiguity {
            topic: topic.to_string(),
            operations: operations.to_vec(),
        });
    }
}

fn push_unique(list: &mut Vec<String>, topic: &str) {
    if !list.iter().any(|t| t == topic) {
        list.push(topic.to_string());
    }
}

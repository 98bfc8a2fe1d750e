use std::collections::HashSet;

use kafkaform_acl::{AccessIntent, AclResourceSet, Grant, GrantFilter, ParseReport};
use kafkaform_client::AclGateway;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::status::Drift;

/// What the cluster currently grants an intent's principal.
#[derive(Debug, Clone)]
pub struct AclObservation {
    /// The declared intent rebuilt from the cluster's entities.
    pub observed: AccessIntent,
    pub report: ParseReport,
    /// Built grants the cluster does not hold.
    pub missing: Vec<Grant>,
    /// Grants held by the principal on the cluster.
    pub held: usize,
    pub drift: Vec<Drift>,
}

impl AclObservation {
    pub fn in_sync(&self) -> bool {
        self.missing.is_empty() && self.drift.is_empty()
    }
}

/// Validate, build and apply every grant of `intent`.
///
/// Grants are sent in build order. On failure the grants already sent stay in
/// place and the gateway error is returned as-is.
pub async fn apply(gateway: &dyn AclGateway, intent: &AccessIntent) -> Result<Vec<Grant>> {
    intent.validate()?;
    let grants = intent.build();
    info!(
        kind = intent.kind(),
        id = %intent.id(),
        grants = grants.len(),
        "Applying ACLs"
    );
    gateway.apply_grants(&grants).await?;
    Ok(grants)
}

/// Read back what the cluster holds for `declared` and compare.
pub async fn refresh(gateway: &dyn AclGateway, declared: &AccessIntent) -> Result<AclObservation> {
    let entities = gateway.list_grants(declared.principal()).await?;

    let mut observed = declared.observation_seed();
    let report = observed.read_back(&entities);
    for ignored in &report.ignored {
        debug!(id = %declared.id(), pattern = %ignored.pattern, reason = ?ignored.reason, "Ignored entity");
    }
    for ambiguity in &report.ambiguous {
        warn!(id = %declared.id(), topic = %ambiguity.topic, "Topic granted both read and write");
    }

    let present: HashSet<Grant> = entities.iter().flat_map(|e| e.grants()).collect();
    let missing: Vec<Grant> = declared
        .build()
        .into_iter()
        .filter(|g| !present.contains(g))
        .collect();

    let drift = drift(declared, &observed);
    Ok(AclObservation {
        observed,
        report,
        missing,
        held: present.len(),
        drift,
    })
}

/// Delete every grant `intent` builds, one exact filter per grant.
pub async fn destroy(gateway: &dyn AclGateway, intent: &AccessIntent) -> Result<usize> {
    let mut removed = 0;
    for grant in intent.build() {
        removed += gateway.delete_grants_matching(&GrantFilter::exact(&grant)).await?;
    }
    info!(kind = intent.kind(), id = %intent.id(), removed, "Deleted ACLs");
    Ok(removed)
}

/// Fields the read cycle recovers that differ between declared and observed.
///
/// Streams topic lists are not compared: the Streams read cycle keeps only
/// entities named after the project, so literal source and sink topics never
/// reach the observed intent. Their absence still shows up as missing grants.
/// The Consumer group is skipped for the same reason: its entity is not named
/// after the project, so a changed group surfaces only as a missing grant.
pub fn drift(declared: &AccessIntent, observed: &AccessIntent) -> Vec<Drift> {
    let mut drift = Vec::new();
    match (declared, observed) {
        (AccessIntent::Consumer(d), AccessIntent::Consumer(o)) => {
            compare(&mut drift, "project", &d.project, &o.project);
        }
        (AccessIntent::Streams(d), AccessIntent::Streams(o)) => {
            compare(&mut drift, "project", &d.project, &o.project);
        }
        (AccessIntent::Connect(d), AccessIntent::Connect(o)) => {
            compare_topics(&mut drift, "readTopics", &d.read_topics, &o.read_topics);
            compare_topics(&mut drift, "writeTopics", &d.write_topics, &o.write_topics);
            compare(&mut drift, "enableTopicCreate", &d.enable_topic_create, &o.enable_topic_create);
        }
        _ => drift.push(Drift::new("kind", declared.kind(), observed.kind())),
    }
    drift
}

fn compare<T: PartialEq + ToString>(drift: &mut Vec<Drift>, field: &str, declared: &T, observed: &T) {
    if declared != observed {
        drift.push(Drift::new(field, declared.to_string(), observed.to_string()));
    }
}

/// Topic lists compare as sets; the cluster reports no order.
fn compare_topics(drift: &mut Vec<Drift>, field: &str, declared: &[String], observed: &[String]) {
    let sorted = |topics: &[String]| {
        let mut topics = topics.to_vec();
        topics.sort();
        topics.dedup();
        topics
    };
    let (declared, observed) = (sorted(declared), sorted(observed));
    if declared != observed {
        drift.push(Drift::new(field, declared.join(","), observed.join(",")));
    }
}

//! Expansion of intents into flat grant lists.
//!
//! Output order is fixed so callers and tests can address grants by index;
//! the broker itself treats ACLs as an unordered set.

use crate::grant::{AclOperation, Grant, ResourcePattern};
use crate::intent::{ConnectAccess, ConsumerAccess, StreamsAccess};

/// Describe and Read on the project prefix, Read on the consumer group.
pub fn build_consumer(acl: &ConsumerAccess) -> Vec<Grant> {
    let project = ResourcePattern::prefixed_topic(&acl.project);
    vec![
        Grant::allow(project.clone(), &acl.principal, AclOperation::Describe),
        Grant::allow(project, &acl.principal, AclOperation::Read),
        Grant::allow(
            ResourcePattern::literal_group(&acl.group),
            &acl.principal,
            AclOperation::Read,
        ),
    ]
}

/// Literal Read/Write per topic, then All on the project topic prefix and
/// Read on the project group prefix.
pub fn build_streams(acl: &StreamsAccess) -> Vec<Grant> {
    let mut grants = Vec::with_capacity(acl.read_topics.len() + acl.write_topics.len() + 2);

    grants.extend(topic_grants(&acl.read_topics, &acl.principal, AclOperation::Read));
    grants.extend(topic_grants(&acl.write_topics, &acl.principal, AclOperation::Write));

    grants.push(Grant::allow(
        ResourcePattern::prefixed_topic(&acl.project),
        &acl.principal,
        AclOperation::All,
    ));
    grants.push(Grant::allow(
        ResourcePattern::prefixed_group(&acl.project),
        &acl.principal,
        AclOperation::Read,
    ));

    grants
}

/// Literal Read/Write per topic, Write+Read on each worker-internal topic,
/// optional cluster Create, and Read on the worker group.
pub fn build_connect(acl: &ConnectAccess) -> Vec<Grant> {
    let capacity = acl.read_topics.len()
        + acl.write_topics.len()
        + 6
        + usize::from(acl.enable_topic_create)
        + 1;
    let mut grants = Vec::with_capacity(capacity);

    grants.extend(topic_grants(&acl.read_topics, &acl.principal, AclOperation::Read));
    grants.extend(topic_grants(&acl.write_topics, &acl.principal, AclOperation::Write));

    for topic in acl.management_topics() {
        let pattern = ResourcePattern::literal_topic(topic);
        grants.push(Grant::allow(pattern.clone(), &acl.principal, AclOperation::Write));
        grants.push(Grant::allow(pattern, &acl.principal, AclOperation::Read));
    }

    if acl.enable_topic_create {
        grants.push(Grant::allow(
            ResourcePattern::cluster(),
            &acl.principal,
            AclOperation::Create,
        ));
    }

    grants.push(Grant::allow(
        ResourcePattern::literal_group(&acl.group),
        &acl.principal,
        AclOperation::Read,
    ));

    grants
}

fn topic_grants<'a>(
    topics: &'a [String],
    principal: &'a str,
    operation: AclOperation,
) -> impl Iterator<Item = Grant> + 'a {
    topics
        .iter()
        .map(move |topic| Grant::allow(ResourcePattern::literal_topic(topic), principal, operation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{AclPermission, PatternType, ResourceType};
    use crate::intent::Metadata;

    fn shape(g: &Grant) -> (ResourceType, &str, PatternType, AclOperation, AclPermission, &str) {
        (
            g.pattern.resource_type,
            g.pattern.name.as_str(),
            g.pattern.pattern_type,
            g.operation,
            g.permission,
            g.principal.as_str(),
        )
    }

    fn connect(enable_topic_create: bool) -> ConnectAccess {
        ConnectAccess {
            principal: "User:connect".into(),
            group: "connect-cluster".into(),
            read_topics: vec!["foo".into()],
            write_topics: vec!["bar".into()],
            status_topic: "connect-status".into(),
            configs_topic: "connect-configs".into(),
            offset_topic: "connect-offsets".into(),
            enable_topic_create,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_consumer_grants() {
        let acl = ConsumerAccess::new("foo", "User:bar", "*", Metadata::new());
        let grants = build_consumer(&acl);
        let shapes: Vec<_> = grants.iter().map(shape).collect();

        use AclOperation::*;
        use PatternType::*;
        use ResourceType::*;
        assert_eq!(
            shapes,
            vec![
                (Topic, "foo", Prefixed, Describe, AclPermission::Allow, "User:bar"),
                (Topic, "foo", Prefixed, Read, AclPermission::Allow, "User:bar"),
                (Group, "*", Literal, Read, AclPermission::Allow, "User:bar"),
            ]
        );
        assert!(grants.iter().all(|g| g.host == "*"));
    }

    #[test]
    fn test_streams_grants() {
        let acl = StreamsAccess::new(
            "foo",
            "User:streams",
            vec!["foo".into()],
            vec!["bar".into()],
            Metadata::new(),
        );
        let grants = build_streams(&acl);
        let shapes: Vec<_> = grants.iter().map(shape).collect();

        use AclOperation::*;
        use PatternType::*;
        use ResourceType::*;
        let allow = AclPermission::Allow;
        assert_eq!(
            shapes,
            vec![
                (Topic, "foo", Literal, Read, allow, "User:streams"),
                (Topic, "bar", Literal, Write, allow, "User:streams"),
                (Topic, "foo", Prefixed, All, allow, "User:streams"),
                (Group, "foo", Prefixed, Read, allow, "User:streams"),
            ]
        );
    }

    #[test]
    fn test_connect_grants_without_topic_create() {
        let grants = build_connect(&connect(false));
        assert_eq!(grants.len(), 9);

        let names: Vec<_> = grants
            .iter()
            .map(|g| (g.pattern.name.as_str(), g.operation))
            .collect();
        assert_eq!(
            names,
            vec![
                ("foo", AclOperation::Read),
                ("bar", AclOperation::Write),
                ("connect-status", AclOperation::Write),
                ("connect-status", AclOperation::Read),
                ("connect-configs", AclOperation::Write),
                ("connect-configs", AclOperation::Read),
                ("connect-offsets", AclOperation::Write),
                ("connect-offsets", AclOperation::Read),
                ("connect-cluster", AclOperation::Read),
            ]
        );
        assert!(grants[..8]
            .iter()
            .all(|g| g.pattern.pattern_type == PatternType::Literal
                && g.pattern.resource_type == ResourceType::Topic));
        assert_eq!(grants[8].pattern.resource_type, ResourceType::Group);
    }

    #[test]
    fn test_connect_grants_with_topic_create() {
        let grants = build_connect(&connect(true));
        assert_eq!(grants.len(), 10);
        assert_eq!(
            shape(&grants[8]),
            (
                ResourceType::Cluster,
                "kafka-cluster",
                PatternType::Literal,
                AclOperation::Create,
                AclPermission::Allow,
                "User:connect"
            )
        );
        assert_eq!(grants[9].pattern.resource_type, ResourceType::Group);
    }

    #[test]
    fn test_cardinality() {
        for reads in 0..4 {
            for writes in 0..4 {
                let topics = |prefix: &str, n: usize| -> Vec<String> {
                    (0..n).map(|i| format!("{prefix}-{i}")).collect()
                };

                let streams = StreamsAccess::new(
                    "p",
                    "User:s",
                    topics("in", reads),
                    topics("out", writes),
                    Metadata::new(),
                );
                assert_eq!(build_streams(&streams).len(), reads + writes + 2);

                for create in [false, true] {
                    let mut c = connect(create);
                    c.read_topics = topics("in", reads);
                    c.write_topics = topics("out", writes);
                    let expected = reads + writes + 6 + 1 + usize::from(create);
                    assert_eq!(build_connect(&c).len(), expected);
                }
            }
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let c = connect(true);
        assert_eq!(build_connect(&c), build_connect(&c));

        let consumer = ConsumerAccess::new("foo", "User:bar", "g", Metadata::new());
        assert_eq!(build_consumer(&consumer), build_consumer(&consumer));
    }
}

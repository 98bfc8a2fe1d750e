//! The builder / parser / filter trio behind one trait, implemented once per
//! intent and dispatched for [`AccessIntent`] by match.

use crate::builder;
use crate::filter;
use crate::grant::{AclOperation, Grant, ResourceEntity};
use crate::intent::{AccessIntent, ConnectAccess, ConsumerAccess, StreamsAccess};
use crate::parser::{self, ParseReport};

pub trait AclResourceSet {
    /// Human-readable intent kind.
    fn kind(&self) -> &'static str;

    /// External identifier of the intent.
    fn id(&self) -> String;

    fn principal(&self) -> &str;

    /// Every grant the intent needs, in build order.
    fn build(&self) -> Vec<Grant>;

    /// Continuation filter for the read cycle.
    fn should_skip(&self, entity: &ResourceEntity) -> bool;

    /// Apply one entity owned by this principal. `operations` holds the
    /// distinct Allow operations of the principal on the entity. Returns
    /// whether the entity was classified.
    fn absorb_entity(
        &mut self,
        entity: &ResourceEntity,
        operations: &[AclOperation],
        report: &mut ParseReport,
    ) -> bool;

    /// A copy carrying only what the caller supplies (principal, metadata,
    /// lookup keys) with every cluster-derived list emptied, ready to be
    /// parsed into.
    fn observation_seed(&self) -> Self
    where
        Self: Sized;

    /// Parse entities into `self` without the continuation filter.
    fn parse(&mut self, entities: &[ResourceEntity]) -> ParseReport
    where
        Self: Sized,
    {
        parser::parse(entities, self)
    }

    /// Filter then parse entities into `self`.
    fn read_back(&mut self, entities: &[ResourceEntity]) -> ParseReport
    where
        Self: Sized,
    {
        parser::read_back(entities, self)
    }
}

impl AclResourceSet for ConsumerAccess {
    fn kind(&self) -> &'static str {
        "ConsumerAccess"
    }

    fn id(&self) -> String {
        ConsumerAccess::id(self)
    }

    fn principal(&self) -> &str {
        &self.principal
    }

    fn build(&self) -> Vec<Grant> {
        builder::build_consumer(self)
    }

    fn should_skip(&self, entity: &ResourceEntity) -> bool {
        filter::consumer_should_skip(entity, self)
    }

    fn absorb_entity(
        &mut self,
        entity: &ResourceEntity,
        _operations: &[AclOperation],
        report: &mut ParseReport,
    ) -> bool {
        parser::absorb_consumer(self, entity, report)
    }

    fn observation_seed(&self) -> Self {
        self.clone()
    }
}

impl AclResourceSet for StreamsAccess {
    fn kind(&self) -> &'static str {
        "StreamsAccess"
    }

    fn id(&self) -> String {
        StreamsAccess::id(self)
    }

    fn principal(&self) -> &str {
        &self.principal
    }

    fn build(&self) -> Vec<Grant> {
        builder::build_streams(self)
    }

    fn should_skip(&self, entity: &ResourceEntity) -> bool {
        filter::streams_should_skip(entity, self)
    }

    fn absorb_entity(
        &mut self,
        entity: &ResourceEntity,
        operations: &[AclOperation],
        report: &mut ParseReport,
    ) -> bool {
        parser::absorb_streams(self, entity, operations, report)
    }

    fn observation_seed(&self) -> Self {
        StreamsAccess {
            read_topics: Vec::new(),
            write_topics: Vec::new(),
            ..self.clone()
        }
    }
}

impl AclResourceSet for ConnectAccess {
    fn kind(&self) -> &'static str {
        "ConnectAccess"
    }

    fn id(&self) -> String {
        ConnectAccess::id(self)
    }

    fn principal(&self) -> &str {
        &self.principal
    }

    fn build(&self) -> Vec<Grant> {
        builder::build_connect(self)
    }

    fn should_skip(&self, entity: &ResourceEntity) -> bool {
        filter::connect_should_skip(entity, self)
    }

    fn absorb_entity(
        &mut self,
        entity: &ResourceEntity,
        operations: &[AclOperation],
        report: &mut ParseReport,
    ) -> bool {
        parser::absorb_connect(self, entity, operations, report)
    }

    fn observation_seed(&self) -> Self {
        ConnectAccess {
            read_topics: Vec::new(),
            write_topics: Vec::new(),
            enable_topic_create: false,
            ..self.clone()
        }
    }
}

impl AclResourceSet for AccessIntent {
    fn kind(&self) -> &'static str {
        AccessIntent::kind(self)
    }

    fn id(&self) -> String {
        match self {
            AccessIntent::Consumer(c) => c.id(),
            AccessIntent::Streams(s) => s.id(),
            AccessIntent::Connect(c) => c.id(),
        }
    }

    fn principal(&self) -> &str {
        match self {
            AccessIntent::Consumer(c) => &c.principal,
            AccessIntent::Streams(s) => &s.principal,
            AccessIntent::Connect(c) => &c.principal,
        }
    }

    fn build(&self) -> Vec<Grant> {
        match self {
            AccessIntent::Consumer(c) => c.build(),
            AccessIntent::Streams(s) => s.build(),
            AccessIntent::Connect(c) => c.build(),
        }
    }

    fn should_skip(&self, entity: &ResourceEntity) -> bool {
        match self {
            AccessIntent::Consumer(c) => c.should_skip(entity),
            AccessIntent::Streams(s) => s.should_skip(entity),
            AccessIntent::Connect(c) => c.should_skip(entity),
        }
    }

    fn absorb_entity(
        &mut self,
        entity: &ResourceEntity,
        operations: &[AclOperation],
        report: &mut ParseReport,
    ) -> bool {
        match self {
            AccessIntent::Consumer(c) => c.absorb_entity(entity, operations, report),
            AccessIntent::Streams(s) => s.absorb_entity(entity, operations, report),
            AccessIntent::Connect(c) => c.absorb_entity(entity, operations, report),
        }
    }

    fn observation_seed(&self) -> Self {
        match self {
            AccessIntent::Consumer(c) => AccessIntent::Consumer(c.observation_seed()),
            AccessIntent::Streams(s) => AccessIntent::Streams(s.observation_seed()),
            AccessIntent::Connect(c) => AccessIntent::Connect(c.observation_seed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{group_into_entities, ResourcePattern};
    use crate::intent::Metadata;

    fn metadata() -> Metadata {
        Metadata::from([("owner".to_string(), "payments".to_string())])
    }

    fn connect(enable_topic_create: bool) -> ConnectAccess {
        ConnectAccess {
            principal: "User:connect".into(),
            group: "connect-cluster".into(),
            read_topics: vec!["foo".into(), "baz".into()],
            write_topics: vec!["bar".into()],
            status_topic: "connect-status".into(),
            configs_topic: "connect-configs".into(),
            offset_topic: "connect-offsets".into(),
            enable_topic_create,
            metadata: metadata(),
        }
    }

    /// Build, group as a cluster would report, and parse into a fresh seed.
    fn round_trip<T: AclResourceSet + Clone>(intent: &T) -> (T, ParseReport) {
        let entities = group_into_entities(intent.build());
        let mut fresh = intent.observation_seed();
        let report = fresh.parse(&entities);
        (fresh, report)
    }

    #[test]
    fn test_consumer_round_trip() {
        let acl = ConsumerAccess::new("foo", "User:bar", "*", metadata());
        let (parsed, report) = round_trip(&acl);
        assert_eq!(parsed, acl);
        assert!(report.is_clean());
    }

    #[test]
    fn test_consumer_round_trip_from_blank_fields() {
        let acl = ConsumerAccess::new("foo", "User:bar", "readers", metadata());
        let mut fresh = ConsumerAccess::new("", "User:bar", "", metadata());
        fresh.parse(&group_into_entities(acl.build()));
        assert_eq!(fresh, acl);
    }

    #[test]
    fn test_streams_round_trip() {
        for (reads, writes) in [
            (vec![], vec![]),
            (vec!["foo"], vec!["bar"]),
            (vec!["a", "b", "c"], vec![]),
            (vec![], vec!["x", "y"]),
        ] {
            let acl = StreamsAccess::new(
                "foo",
                "User:streams",
                reads.into_iter().map(String::from).collect(),
                writes.into_iter().map(String::from).collect(),
                metadata(),
            );
            let (parsed, report) = round_trip(&acl);
            assert_eq!(parsed, acl);
            assert!(report.is_clean());
        }
    }

    #[test]
    fn test_connect_round_trip() {
        for create in [false, true] {
            let acl = connect(create);
            let (parsed, report) = round_trip(&acl);
            assert_eq!(parsed, acl);
            assert!(report.is_clean());
        }
    }

    #[test]
    fn test_access_intent_dispatch() {
        let intent = AccessIntent::from(connect(true));
        assert_eq!(intent.kind(), "ConnectAccess");
        assert_eq!(intent.id(), "connect-cluster#User:connect");
        assert_eq!(intent.principal(), "User:connect");
        assert_eq!(intent.build().len(), 2 + 1 + 6 + 1 + 1);

        let (parsed, _) = round_trip(&intent);
        assert_eq!(parsed, intent);
    }

    #[test]
    fn test_read_back_applies_continuation_filter() {
        let acl = StreamsAccess::new("foo", "User:streams", vec!["foo".into()], vec!["bar".into()], metadata());
        let entities = group_into_entities(acl.build());

        let mut fresh = acl.observation_seed();
        let report = fresh.read_back(&entities);

        // Only entities named after the project survive the filter, so "bar"
        // never reaches the parser.
        assert_eq!(report.skipped, 1);
        assert_eq!(fresh.read_topics, vec!["foo"]);
        assert!(fresh.write_topics.is_empty());
        assert_eq!(fresh.project, "foo");
    }

    #[test]
    fn test_connect_read_back_sweeps_all_owned_entities() {
        let acl = connect(true);
        let mut entities = group_into_entities(acl.build());
        entities.extend(group_into_entities(vec![Grant::allow(
            ResourcePattern::literal_topic("not-mine"),
            "User:other",
            AclOperation::Read,
        )]));

        let mut fresh = acl.observation_seed();
        let report = fresh.read_back(&entities);

        assert_eq!(fresh, acl);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_metadata_is_never_derived() {
        let acl = StreamsAccess::new("foo", "User:streams", vec![], vec![], metadata());
        let mut fresh = StreamsAccess::new("foo", "User:streams", vec![], vec![], Metadata::new());
        fresh.parse(&group_into_entities(acl.build()));
        assert!(fresh.metadata.is_empty());
    }
}

//! Continuation filters: cheap per-intent checks deciding whether a reported
//! entity is parsed at all.
//!
//! Consumer and Streams intents pivot on a single project name. Connect
//! intents span many differently named topics, so their filter only checks
//! ownership by principal.

use crate::grant::ResourceEntity;
use crate::intent::{ConnectAccess, ConsumerAccess, StreamsAccess};

pub fn consumer_should_skip(entity: &ResourceEntity, acl: &ConsumerAccess) -> bool {
    entity.name() != acl.project
}

pub fn streams_should_skip(entity: &ResourceEntity, acl: &StreamsAccess) -> bool {
    entity.name() != acl.project
}

/// Compares the first entry's principal only; the entity name is irrelevant.
pub fn connect_should_skip(entity: &ResourceEntity, acl: &ConnectAccess) -> bool {
    entity.first_principal() != Some(acl.principal.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::{AclEntry, AclOperation, AclPermission, ResourcePattern};
    use crate::intent::Metadata;

    fn entity(name: &str, principals: &[&str]) -> ResourceEntity {
        ResourceEntity {
            pattern: ResourcePattern::literal_topic(name),
            acls: principals
                .iter()
                .map(|p| AclEntry {
                    principal: p.to_string(),
                    host: "*".into(),
                    operation: AclOperation::Read,
                    permission: AclPermission::Allow,
                })
                .collect(),
        }
    }

    #[test]
    fn test_name_based_filters() {
        let consumer = ConsumerAccess::new("foo", "User:a", "*", Metadata::new());
        let streams = StreamsAccess::new("foo", "User:a", vec![], vec![], Metadata::new());

        for name in ["bar", "fo", "foo-internal", "*"] {
            assert!(consumer_should_skip(&entity(name, &["User:a"]), &consumer));
            assert!(streams_should_skip(&entity(name, &["User:a"]), &streams));
        }
        // Principal plays no part for these two.
        assert!(!consumer_should_skip(&entity("foo", &["User:z"]), &consumer));
        assert!(!streams_should_skip(&entity("foo", &["User:z"]), &streams));
    }

    #[test]
    fn test_connect_filter_uses_first_principal() {
        let connect = ConnectAccess {
            principal: "User:connect".into(),
            ..Default::default()
        };

        for name in ["anything", "connect-status", ""] {
            assert!(!connect_should_skip(&entity(name, &["User:connect"]), &connect));
            assert!(connect_should_skip(&entity(name, &["User:other"]), &connect));
        }
        assert!(connect_should_skip(
            &entity("t", &["User:other", "User:connect"]),
            &connect
        ));
        assert!(connect_should_skip(&entity("t", &[]), &connect));
    }
}

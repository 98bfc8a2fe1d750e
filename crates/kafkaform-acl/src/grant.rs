//! Flat ACL grants and the resource entities a cluster reports them in.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Host every grant built by this crate applies to.
pub const ANY_HOST: &str = "*";

/// Name of the single cluster resource in Kafka.
pub const CLUSTER_RESOURCE_NAME: &str = "kafka-cluster";

/// ACL resource type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Topic,
    Group,
    Cluster,
    TransactionalId,
    DelegationToken,
    #[serde(other)]
    Unknown,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Topic => "TOPIC",
            ResourceType::Group => "GROUP",
            ResourceType::Cluster => "CLUSTER",
            ResourceType::TransactionalId => "TRANSACTIONAL_ID",
            ResourceType::DelegationToken => "DELEGATION_TOKEN",
            ResourceType::Unknown => "UNKNOWN",
        }
    }
}

/// ACL resource pattern type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// Exact match on the resource name.
    Literal,
    /// Matches every resource whose name starts with the pattern name.
    Prefixed,
    #[serde(other)]
    Unknown,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Literal => "LITERAL",
            PatternType::Prefixed => "PREFIXED",
            PatternType::Unknown => "UNKNOWN",
        }
    }
}

/// ACL operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclOperation {
    All,
    Read,
    Write,
    Create,
    Delete,
    Alter,
    Describe,
    ClusterAction,
    DescribeConfigs,
    AlterConfigs,
    IdempotentWrite,
    #[serde(other)]
    Unknown,
}

impl AclOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclOperation::All => "ALL",
            AclOperation::Read => "READ",
            AclOperation::Write => "WRITE",
            AclOperation::Create => "CREATE",
            AclOperation::Delete => "DELETE",
            AclOperation::Alter => "ALTER",
            AclOperation::Describe => "DESCRIBE",
            AclOperation::ClusterAction => "CLUSTER_ACTION",
            AclOperation::DescribeConfigs => "DESCRIBE_CONFIGS",
            AclOperation::AlterConfigs => "ALTER_CONFIGS",
            AclOperation::IdempotentWrite => "IDEMPOTENT_WRITE",
            AclOperation::Unknown => "UNKNOWN",
        }
    }
}

/// ACL permission type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermission {
    Allow,
    Deny,
    #[serde(other)]
    Unknown,
}

impl AclPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclPermission::Allow => "ALLOW",
            AclPermission::Deny => "DENY",
            AclPermission::Unknown => "UNKNOWN",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(ResourceType, PatternType, AclOperation, AclPermission);

/// The (name, type, pattern type) triple a grant applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourcePattern {
    pub name: String,
    pub resource_type: ResourceType,
    pub pattern_type: PatternType,
}

impl ResourcePattern {
    pub fn new(name: impl Into<String>, resource_type: ResourceType, pattern_type: PatternType) -> Self {
        Self {
            name: name.into(),
            resource_type,
            pattern_type,
        }
    }

    pub fn literal_topic(name: impl Into<String>) -> Self {
        Self::new(name, ResourceType::Topic, PatternType::Literal)
    }

    pub fn prefixed_topic(name: impl Into<String>) -> Self {
        Self::new(name, ResourceType::Topic, PatternType::Prefixed)
    }

    pub fn literal_group(name: impl Into<String>) -> Self {
        Self::new(name, ResourceType::Group, PatternType::Literal)
    }

    pub fn prefixed_group(name: impl Into<String>) -> Self {
        Self::new(name, ResourceType::Group, PatternType::Prefixed)
    }

    pub fn cluster() -> Self {
        Self::new(CLUSTER_RESOURCE_NAME, ResourceType::Cluster, PatternType::Literal)
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.resource_type, self.pattern_type, self.name)
    }
}

/// One access entry on a resource pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AclEntry {
    pub principal: String,
    pub host: String,
    pub operation: AclOperation,
    pub permission: AclPermission,
}

/// A single flat ACL binding: resource pattern, principal, operation, permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Grant {
    pub pattern: ResourcePattern,
    pub principal: String,
    pub host: String,
    pub operation: AclOperation,
    pub permission: AclPermission,
}

impl Grant {
    /// An Allow grant for any host.
    pub fn allow(pattern: ResourcePattern, principal: impl Into<String>, operation: AclOperation) -> Self {
        Self {
            pattern,
            principal: principal.into(),
            host: ANY_HOST.to_string(),
            operation,
            permission: AclPermission::Allow,
        }
    }

    pub fn from_entry(pattern: ResourcePattern, entry: AclEntry) -> Self {
        Self {
            pattern,
            principal: entry.principal,
            host: entry.host,
            operation: entry.operation,
            permission: entry.permission,
        }
    }

    pub fn entry(&self) -> AclEntry {
        AclEntry {
            principal: self.principal.clone(),
            host: self.host.clone(),
            operation: self.operation,
            permission: self.permission,
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} on {} from {}",
            self.permission, self.principal, self.operation, self.pattern, self.host
        )
    }
}

/// A resource pattern together with every entry the cluster holds on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceEntity {
    pub pattern: ResourcePattern,
    pub acls: Vec<AclEntry>,
}

impl ResourceEntity {
    pub fn name(&self) -> &str {
        &self.pattern.name
    }

    pub fn resource_type(&self) -> ResourceType {
        self.pattern.resource_type
    }

    pub fn pattern_type(&self) -> PatternType {
        self.pattern.pattern_type
    }

    /// Principal of the first entry, if any.
    pub fn first_principal(&self) -> Option<&str> {
        self.acls.first().map(|acl| acl.principal.as_str())
    }

    /// Flatten back into grants.
    pub fn grants(&self) -> impl Iterator<Item = Grant> + '_ {
        self.acls
            .iter()
            .map(|entry| Grant::from_entry(self.pattern.clone(), entry.clone()))
    }
}

/// Group flat grants by resource pattern, keeping first-seen order of both
/// patterns and entries.
pub fn group_into_entities<I>(grants: I) -> Vec<ResourceEntity>
where
    I: IntoIterator<Item = Grant>,
{
    let mut index: HashMap<ResourcePattern, usize> = HashMap::new();
    let mut entities: Vec<ResourceEntity> = Vec::new();

    for grant in grants {
        let entry = grant.entry();
        match index.get(&grant.pattern) {
            Some(&i) => entities[i].acls.push(entry),
            None => {
                index.insert(grant.pattern.clone(), entities.len());
                entities.push(ResourceEntity {
                    pattern: grant.pattern,
                    acls: vec![entry],
                });
            }
        }
    }

    entities
}

/// Filter selecting grants for deletion. `None` matches anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantFilter {
    pub name: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub pattern_type: Option<PatternType>,
    pub principal: Option<String>,
    pub host: Option<String>,
    pub operation: Option<AclOperation>,
    pub permission: Option<AclPermission>,
}

impl GrantFilter {
    /// A filter matching exactly one grant.
    pub fn exact(grant: &Grant) -> Self {
        Self {
            name: Some(grant.pattern.name.clone()),
            resource_type: Some(grant.pattern.resource_type),
            pattern_type: Some(grant.pattern.pattern_type),
            principal: Some(grant.principal.clone()),
            host: Some(grant.host.clone()),
            operation: Some(grant.operation),
            permission: Some(grant.permission),
        }
    }

    /// A filter matching every grant held by `principal`.
    pub fn for_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            ..Default::default()
        }
    }

    /// Whether a stored grant is selected by this filter.
    ///
    /// Names compare literally against the stored pattern name, as the
    /// broker does for delete and describe filters with an explicit pattern
    /// type.
    pub fn matches(&self, grant: &Grant) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }

        eq(&self.name, &grant.pattern.name)
            && eq(&self.resource_type, &grant.pattern.resource_type)
            && eq(&self.pattern_type, &grant.pattern.pattern_type)
            && eq(&self.principal, &grant.principal)
            && eq(&self.host, &grant.host)
            && eq(&self.operation, &grant.operation)
            && eq(&self.permission, &grant.permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(topic: &str) -> Grant {
        Grant::allow(ResourcePattern::literal_topic(topic), "User:a", AclOperation::Read)
    }

    #[test]
    fn test_allow_uses_wildcard_host() {
        let grant = read("orders");
        assert_eq!(grant.host, "*");
        assert_eq!(grant.permission, AclPermission::Allow);
    }

    #[test]
    fn test_group_into_entities_preserves_order() {
        let mut write = read("orders");
        write.operation = AclOperation::Write;
        let grants = vec![read("payments"), read("orders"), write];

        let entities = group_into_entities(grants);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name(), "payments");
        assert_eq!(entities[1].name(), "orders");
        assert_eq!(entities[1].acls.len(), 2);
        assert_eq!(entities[1].acls[1].operation, AclOperation::Write);
    }

    #[test]
    fn test_group_separates_pattern_types() {
        let prefixed = Grant::allow(
            ResourcePattern::prefixed_topic("orders"),
            "User:a",
            AclOperation::All,
        );
        let entities = group_into_entities(vec![read("orders"), prefixed]);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_filter_exact_and_wildcards() {
        let grant = read("orders");
        assert!(GrantFilter::exact(&grant).matches(&grant));
        assert!(GrantFilter::default().matches(&grant));
        assert!(GrantFilter::for_principal("User:a").matches(&grant));
        assert!(!GrantFilter::for_principal("User:b").matches(&grant));

        let mut other = grant.clone();
        other.operation = AclOperation::Write;
        assert!(!GrantFilter::exact(&grant).matches(&other));
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&AclOperation::DescribeConfigs).unwrap();
        assert_eq!(json, "\"DESCRIBE_CONFIGS\"");
        let op: AclOperation = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(op, AclOperation::Unknown);
        let rt: ResourceType = serde_json::from_str("\"TRANSACTIONAL_ID\"").unwrap();
        assert_eq!(rt, ResourceType::TransactionalId);
        assert_eq!(PatternType::Prefixed.to_string(), "PREFIXED");
    }
}

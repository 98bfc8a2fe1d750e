//! Kafka ACL resource sets.
//!
//! Expands workload-level access intents (consumers, Kafka Streams
//! applications, Kafka Connect clusters) into the flat grants a broker
//! stores, and rebuilds those intents from the grants a broker reports.
//! Everything in this crate is pure; applying grants is the job of a
//! gateway in `kafkaform-client`.

pub mod builder;
pub mod error;
pub mod filter;
pub mod grant;
pub mod intent;
pub mod parser;
pub mod resource_set;

pub use error::{AclError, Result};
pub use grant::{
    group_into_entities, AclEntry, AclOperation, AclPermission, Grant, GrantFilter, PatternType,
    ResourceEntity, ResourcePattern, ResourceType, ANY_HOST, CLUSTER_RESOURCE_NAME,
};
pub use intent::{AccessIntent, ConnectAccess, ConsumerAccess, Metadata, StreamsAccess};
pub use parser::{Ambiguity, IgnoreReason, Ignored, ParseReport};
pub use resource_set::AclResourceSet;

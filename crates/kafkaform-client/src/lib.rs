//! Cluster gateways: Kafka REST v3 for ACLs and topics, Kafka Connect REST
//! for connectors, and an in-memory cluster implementing all three.

pub mod connect;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod rest_admin;

pub use connect::KafkaConnectClient;
pub use error::{GatewayError, Result};
pub use gateway::{
    AclGateway, ConnectClusterInfo, ConnectorGateway, ConnectorInfo, ConnectorTask, NewTopic,
    TopicDescription, TopicGateway,
};
pub use http::Credentials;
pub use memory::InMemoryCluster;
pub use rest_admin::RestAdminClient;

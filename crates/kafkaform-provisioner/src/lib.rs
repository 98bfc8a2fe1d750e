//! Declarative provisioning of Kafka topics, ACL intents and connectors.
//!
//! A [`Manifest`] lists resources; a [`Provisioner`] applies, refreshes or
//! destroys them through the gateways in `kafkaform-client` and reports one
//! [`ResourceStatus`] per resource.

pub mod defaults;
pub mod error;
pub mod manifest;
pub mod provisioner;
pub mod resources;
pub mod status;

pub use error::{ProvisionError, Result};
pub use manifest::{
    ConnectAclSpec, ConnectorSpec, ConsumerAclSpec, Manifest, ResourceSpec, StreamsAclSpec, TopicSpec,
};
pub use provisioner::{Provisioner, RenderedAcl};
pub use status::{Drift, Phase, ResourceStatus, RunReport};

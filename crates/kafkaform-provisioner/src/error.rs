use kafkaform_acl::AclError;
use kafkaform_client::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Invalid ACL intent: {0}")]
    Acl(#[from] AclError),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connector {0} requires a Kafka Connect URL")]
    ConnectNotConfigured(String),

    #[error("{kind} {name} must be replaced: {reason}")]
    RequiresReplacement {
        kind: &'static str,
        name: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Whether rerunning the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProvisionError::Gateway(e) if e.is_transient())
    }
}

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Admin API error ({status}): {message}")]
    AdminApi { status: u16, message: String },

    #[error("Kafka Connect rebalance in progress: {0}")]
    Rebalance(String),

    #[error("Cannot resolve Kafka cluster id: {0}")]
    ClusterUnresolved(String),

    #[error("Cluster unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http(_) | GatewayError::Rebalance(_) | GatewayError::Unavailable(_) => true,
            GatewayError::AdminApi { status, .. } => *status >= 500,
            GatewayError::ClusterUnresolved(_) | GatewayError::InvalidUrl(_) => false,
        }
    }
}

/// Error body returned by both the Kafka REST and the Kafka Connect APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Turn a non-success response into an `AdminApi` error, keeping the server's
/// message when it sent one.
pub(crate) async fn api_error(context: &str, resp: reqwest::Response) -> GatewayError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or(text);
    GatewayError::AdminApi {
        status,
        message: format!("{context}: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Rebalance("x".into()).is_transient());
        assert!(GatewayError::Unavailable("x".into()).is_transient());
        assert!(GatewayError::AdminApi {
            status: 503,
            message: "x".into()
        }
        .is_transient());
        assert!(!GatewayError::AdminApi {
            status: 400,
            message: "x".into()
        }
        .is_transient());
        assert!(!GatewayError::ClusterUnresolved("x".into()).is_transient());
    }

    #[test]
    fn test_api_error_body() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"error_code":40002,"message":"Topic 'a' already exists."}"#).unwrap();
        assert_eq!(body.error_code, Some(40002));
        assert_eq!(body.message.as_deref(), Some("Topic 'a' already exists."));
    }
}

use std::time::Duration;

use reqwest::Url;

use crate::error::{GatewayError, Result};

/// HTTP basic-auth credentials shared by the REST and Connect clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

pub(crate) fn build_http(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub(crate) fn authorize(req: reqwest::RequestBuilder, credentials: &Option<Credentials>) -> reqwest::RequestBuilder {
    match credentials {
        Some(c) => req.basic_auth(&c.username, Some(&c.password)),
        None => req,
    }
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Append `segments` to `base`. Each segment is percent-encoded, so names
/// containing `/`, `#`, `?` or spaces stay a single path segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| GatewayError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| GatewayError::InvalidUrl(format!("{base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_each_segment() {
        let url = endpoint("http://connect:8083", &["connectors", "my sink#1", "config"]).unwrap();
        assert_eq!(url.as_str(), "http://connect:8083/connectors/my%20sink%231/config");

        let url = endpoint("http://connect:8083", &["connectors", "a/b?x"]).unwrap();
        assert_eq!(url.path(), "/connectors/a%2Fb%3Fx");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = endpoint("http://proxy/kafka", &["v3", "clusters"]).unwrap();
        assert_eq!(url.as_str(), "http://proxy/kafka/v3/clusters");
    }

    #[test]
    fn test_endpoint_rejects_unparseable_base() {
        let err = endpoint("not a url", &["v3"]).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidUrl(_)));
        assert!(!err.is_transient());
    }
}

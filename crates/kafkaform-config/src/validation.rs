use thiserror::Error;

use crate::ProviderConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {0}")]
    RequiredFieldMissing(String),

    #[error("Value out of range for field {field}: {message}")]
    OutOfRange { field: String, message: String },

    #[error("Invalid format for field {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Check a resolved configuration, reporting every problem at once.
pub fn validate(config: &ProviderConfig) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if config.rest_url.trim().is_empty() {
        errors.push(ValidationError::RequiredFieldMissing("rest_url".into()));
    } else if let Err(e) = check_url("rest_url", &config.rest_url) {
        errors.push(e);
    }
    if let Some(url) = &config.connect_url {
        if let Err(e) = check_url("connect_url", url) {
            errors.push(e);
        }
    }

    match (&config.username, &config.password) {
        (Some(_), None) => errors.push(ValidationError::RequiredFieldMissing("password".into())),
        (None, Some(_)) => errors.push(ValidationError::RequiredFieldMissing("username".into())),
        _ => {}
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::OutOfRange {
            field: "request_timeout_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_url(field: &str, url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: field.into(),
            message: format!("expected an http(s) URL, got {url:?}"),
        })
    }
}

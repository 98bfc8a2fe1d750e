use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AclError {
    #[error("{kind} '{id}': field '{field}' must not be empty")]
    EmptyField {
        kind: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("{kind} '{id}': topic list '{field}' contains an empty name")]
    EmptyTopic {
        kind: &'static str,
        id: String,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, AclError>;

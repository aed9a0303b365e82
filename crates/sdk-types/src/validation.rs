use thiserror::Error;

/// A payload that does not conform to the data model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validation error: {message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

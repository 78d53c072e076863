//! Error types for encode operations

use thiserror::Error;

/// Error type for encode operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid type tag: {0}")]
    Configuration(String),
    #[error("type is not serializable: {0}")]
    NotSerializable(String),
    #[error("accessor failed for field {field}: {message}")]
    Accessor { field: String, message: String },
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Constructs an accessor failure for the given field.
    pub fn accessor(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Accessor {
            field: field.into(),
            message: message.into(),
        }
    }
}

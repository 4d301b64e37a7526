//! Error types for the background core.
//!
//! None of these are fatal: the dispatch layer logs them and drops the
//! operation that produced them, leaving the background ready for the
//! next event.

use thiserror::Error;

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A host tab, window or storage call was rejected.
    #[error("{operation} failed: {message}")]
    Host {
        /// Host API that failed, e.g. `tabs.query`.
        operation: &'static str,
        message: String,
    },

    /// A value could not be converted to or from its wire shape.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The view port went away while a message was being posted.
    #[error("View disconnected")]
    Disconnected,
}

impl Error {
    pub fn host(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Host {
            operation,
            message: message.into(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Error::Serialization {
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err)
    }
}

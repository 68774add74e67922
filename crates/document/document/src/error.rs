use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The targeted document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The store could not be reached or failed transiently.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// A resource with the same id already exists.
    #[error("resource already exists: {0}")]
    Conflict(String),

    /// The store rejected the request.
    #[error("document store rejected request (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code returned by the store.
        status: u16,
        /// Error body returned by the store.
        message: String,
    },

    /// A body did not match the expected document shape.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The request cannot be issued as given.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// The store is misconfigured.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl DocumentError {
    /// Returns `true` if the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

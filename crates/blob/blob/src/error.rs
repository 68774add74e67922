use thiserror::Error;

/// Errors that can occur during object store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlobError {
    /// No binary exists at the given address.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The store could not be reached or failed transiently.
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// The address does not belong to this store or cannot be parsed.
    #[error("invalid blob address: {0}")]
    InvalidAddress(String),

    /// The store rejected the request.
    #[error("object store rejected request: {0}")]
    Rejected(String),

    /// The store is misconfigured.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl BlobError {
    /// Returns `true` if the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(BlobError::Unavailable("reset".into()).is_retryable());
        assert!(!BlobError::NotFound("x".into()).is_retryable());
        assert!(!BlobError::InvalidAddress("x".into()).is_retryable());
        assert!(!BlobError::Rejected("x".into()).is_retryable());
        assert!(!BlobError::Configuration("x".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            BlobError::NotFound("memory://c/a.png".into()).to_string(),
            "blob not found: memory://c/a.png"
        );
        assert_eq!(
            BlobError::Unavailable("timed out".into()).to_string(),
            "object store unavailable: timed out"
        );
    }
}

//! Error types for document stores.

use thiserror::Error;

/// Errors that can occur when talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse a response or a stored document.
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// Failed to turn a value into document fields.
    #[error("Failed to encode document: {0}")]
    Encode(String),

    /// Authentication or permission failure.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// No document with this identifier in the collection.
    #[error("Document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    /// The store refused the operation (quota, maintenance, injected fault).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same call later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::Timeout | StoreError::Unavailable(_)
        )
    }
}

#[cfg(feature = "rest")]
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else if err.is_decode() {
            StoreError::Parse(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::Unavailable("quota".into()).is_transient());
        assert!(!StoreError::Auth("denied".into()).is_transient());
        assert!(!StoreError::NotFound {
            collection: "leaks".into(),
            id: "x".into()
        }
        .is_transient());
    }

    #[test]
    fn not_found_message() {
        let err = StoreError::NotFound {
            collection: "leaks".into(),
            id: "rec-1".into(),
        };
        assert_eq!(err.to_string(), "Document 'rec-1' not found in 'leaks'");
    }
}

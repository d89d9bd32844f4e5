//! Error types for the Upbound client.

use thiserror::Error;

/// Errors that can occur when talking to the Upbound API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from server.
        message: String,
    },

    /// Failed to deserialize a response or token payload.
    #[error("Failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Invalid endpoint URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Login did not yield a session.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The personal access token could not be parsed.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),
}

impl ClientError {
    /// Whether the remote resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    /// Whether the session was rejected by the API.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_only_404() {
        let err = ClientError::Api {
            status: 404,
            message: "control plane not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());

        let err = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_not_found());

        assert!(!ClientError::Auth("no cookie".to_string()).is_not_found());
    }
}

//! Error types for the Upbound operator.

use thiserror::Error;
use upbound_client::ClientError;

/// Errors that can occur during operator operations.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Upbound API error.
    #[error("Upbound API error: {0}")]
    UpboundError(#[from] ClientError),

    /// Resource not found.
    #[error("Resource not found: {kind}/{name}")]
    NotFound {
        /// Resource kind.
        kind: String,
        /// Resource name, namespaced as `namespace/name` when applicable.
        name: String,
    },

    /// Credentials could not be resolved.
    #[error("Cannot resolve credentials: {0}")]
    CredentialsError(String),

    /// A managed resource cannot be reconciled as configured.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote resource is missing data the operator needs.
    #[error("Unexpected response for {name}: {reason}")]
    UnexpectedResponse {
        /// Remote resource name.
        name: String,
        /// What was wrong.
        reason: String,
    },
}

/// Result type for operator operations.
pub type OperatorResult<T> = Result<T, OperatorError>;

impl OperatorError {
    /// Whether the underlying Upbound call was rejected as unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, OperatorError::UpboundError(e) if e.is_unauthorized())
    }
}

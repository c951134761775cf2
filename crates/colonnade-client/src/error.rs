//! Error types for the client library.

use colonnade_marshal::MarshalError;
use thiserror::Error;

use crate::transport::RpcError;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A read matched no columns or rows.
    #[error("not found")]
    NotFound,

    /// Invalid configuration or arguments.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every attempt of a call failed with a transient error.
    #[error("{operation} failed after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Name of the RPC operation.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        #[source]
        last_error: Option<RpcError>,
    },

    /// No configured server accepted a connection.
    #[error("no server available after {attempts} connection attempts")]
    NoServerAvailable {
        /// Number of connection attempts made.
        attempts: usize,
    },

    /// Pool timeout.
    #[error("pool acquisition timeout after {0}ms")]
    PoolTimeout(u64),

    /// The pool has been closed.
    #[error("connection pool closed")]
    PoolClosed,

    /// The store rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Packing or unpacking a key, name or value failed.
    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    /// Any other RPC failure.
    #[error("rpc error: {0}")]
    Rpc(RpcError),
}

impl ClientError {
    /// Returns true for the expected "nothing matched" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound)
    }
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::NotFound => ClientError::NotFound,
            RpcError::InvalidRequest(msg) => ClientError::InvalidRequest(msg),
            RpcError::AuthenticationFailed(msg) => ClientError::AuthenticationFailed(msg),
            other => ClientError::Rpc(other),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

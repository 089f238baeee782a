//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Service unreachable or timed out (status code 0)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Bad credentials, or the refresh token was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rejected locally before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-2xx response from the service
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// Polled status reached a failure state
    #[error("Order {order_id} failed with status {status}")]
    TerminalFailure { order_id: String, status: String },

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 2xx response whose body is missing required fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local session cache could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Message suitable for showing to the person at the terminal.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(msg) => msg.clone(),
            ClientError::Auth(msg) => format!("Authentication failed: {msg}"),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Service { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Service { status, .. } => {
                format!("Request failed (HTTP {status})")
            }
            ClientError::TerminalFailure { order_id, status } => {
                format!("Order {order_id} failed: {status}")
            }
            ClientError::InvalidState(msg) => msg.clone(),
            ClientError::InvalidResponse(msg) => {
                format!("Unexpected response from ordering service: {msg}")
            }
            ClientError::Storage(e) => format!("Could not access local session cache: {e}"),
            ClientError::Serialization(e) => format!("Malformed data: {e}"),
        }
    }

    /// Whether the ordering service could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

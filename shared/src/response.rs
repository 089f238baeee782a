//! Response envelopes
//!
//! Query endpoints wrap their payload as `{"status": "success", "data": ...}`.
//! Failing endpoints answer with plain text or `{"error": "..."}`.

use serde::{Deserialize, Serialize};

/// `{status, data}` envelope used by the ordering service's query endpoints
///
/// ```json
/// {
///     "status": "success",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// `null` when the resource exists but is empty (e.g. no orders yet)
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            status: Some("success".to_string()),
            message: None,
            data: Some(data),
        }
    }

    /// Unwrap the payload
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Error body shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

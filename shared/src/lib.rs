//! Shared types for the grocery ordering client
//!
//! Wire-level request/response types for the external ordering service.
//! `grocery-client` re-exports the ones its callers need.

pub mod client;
pub mod orders;
pub mod response;
pub mod truck;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use client::{LoginRequest, LoginResponse, RefreshResponse, RegisterClientRequest};
pub use orders::{OrderLine, OrderRecord, OrderRef, PreviewRequest, PreviewResponse};
pub use response::{ApiResponse, ErrorBody};
pub use truck::{
    Aisle, RegisterTruckRequest, RestockItem, RestockRecord, RestockRequest, RestockSubmitted,
};

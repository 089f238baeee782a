//! Grocery Client - client-side core for the grocery ordering service
//!
//! Drives a smart refrigerator's orders (preview, confirm, poll) and a
//! supplier truck's restocks against the ordering service's HTTP API.
//! Sessions are persisted so a restarted device can continue without
//! logging in again.

pub mod config;
pub mod error;
pub mod http;
pub mod order;
pub mod poll;
pub mod restock;
pub mod session;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use crate::http::{ApiRequest, HttpResponse, NetworkTransport, Transport};
pub use order::{GroceryClient, OrderOutcome, OrderStatus, PendingOrder};
pub use poll::{PollOutcome, StatusClass, classify_status};
pub use restock::{
    ManifestLine, RestockBatch, RestockOutcome, RestockState, RestockStatus, TruckClient,
    TruckIdentity,
};
pub use session::{AuthState, Session, SessionManager};

// Re-export shared types for convenience
pub use shared::{Aisle, OrderLine, OrderRecord};

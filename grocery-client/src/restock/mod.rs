// grocery-client/src/restock/mod.rs
// 补货模块

pub mod batch;
pub mod client;
pub mod state;

pub use batch::{ManifestLine, RestockBatch, TruckIdentity};
pub use client::TruckClient;
pub use state::{RestockOutcome, RestockState, RestockStatus};

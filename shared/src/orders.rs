//! Grocery order DTOs
//!
//! Bodies for the preview / confirm / cancel endpoints and the order
//! records returned by `/api/client/orders` and `/api/client/orders/last`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// `POST /api/client/order/preview`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub items: Vec<OrderLine>,
}

/// Reservation result. `items` echoes what the service actually reserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(alias = "OrderId", alias = "OrderID")]
    pub order_id: String,
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of confirm and cancel: `{"order_id": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
}

impl OrderRef {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }
}

/// Order row as stored by the ordering service.
///
/// The service serializes its records with PascalCase keys; snake_case
/// keys are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(rename = "OrderID", alias = "order_id", default)]
    pub order_id: String,
    #[serde(rename = "Status", alias = "status", default)]
    pub status: String,
    #[serde(rename = "TotalPrice", alias = "total_price", default)]
    pub total_price: Decimal,
    #[serde(
        rename = "CreatedAt",
        alias = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

//! Truck / restock DTOs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store aisle a restocked item is shelved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aisle {
    Bread,
    Dairy,
    Produce,
    Meat,
    Party,
}

impl Aisle {
    pub const ALL: [Aisle; 5] = [
        Aisle::Bread,
        Aisle::Dairy,
        Aisle::Produce,
        Aisle::Meat,
        Aisle::Party,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aisle::Bread => "bread",
            Aisle::Dairy => "dairy",
            Aisle::Produce => "produce",
            Aisle::Meat => "meat",
            Aisle::Party => "party",
        }
    }
}

impl fmt::Display for Aisle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aisle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Aisle::ALL
            .into_iter()
            .find(|a| a.as_str() == lowered)
            .ok_or_else(|| format!("unknown aisle '{s}'"))
    }
}

/// `POST /api/truck/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterTruckRequest {
    pub truck_id: String,
    pub plate_number: String,
    pub driver_name: String,
}

/// One manifest line as sent on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockItem {
    pub sku: String,
    pub name: String,
    pub aisle_type: Aisle,
    pub quantity: u32,
    /// RFC 3339
    pub mfd_date: String,
    /// RFC 3339
    pub expiry_date: String,
    pub unit_cost: Decimal,
}

/// `POST /api/truck/restock`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockRequest {
    pub truck_id: String,
    pub plate_number: String,
    pub driver_name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub location: String,
    pub supplier_id: String,
    #[serde(default)]
    pub supplier_name: String,
    pub items: Vec<RestockItem>,
}

/// Restock accepted; robots are offloading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockSubmitted {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Restock row returned by `GET /api/truck/restock/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockRecord {
    #[serde(rename = "OrderID", alias = "order_id", default)]
    pub order_id: String,
    #[serde(rename = "Status", alias = "status", default)]
    pub status: String,
    #[serde(rename = "TotalCost", alias = "total_cost", default)]
    pub total_cost: Decimal,
    #[serde(
        rename = "CreatedAt",
        alias = "created_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

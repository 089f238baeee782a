//! Restock batch and its local validation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{Aisle, RegisterTruckRequest, RestockItem, RestockRequest};

use crate::{ClientError, ClientResult};

/// Delivering truck
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TruckIdentity {
    pub truck_id: String,
    pub plate_number: String,
    pub driver_name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub location: String,
}

impl TruckIdentity {
    pub fn new(
        truck_id: impl Into<String>,
        plate_number: impl Into<String>,
        driver_name: impl Into<String>,
    ) -> Self {
        Self {
            truck_id: truck_id.into(),
            plate_number: plate_number.into(),
            driver_name: driver_name.into(),
            ..Default::default()
        }
    }

    pub fn with_contact_info(mut self, contact_info: impl Into<String>) -> Self {
        self.contact_info = contact_info.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        require("truck_id", &self.truck_id)?;
        require("plate_number", &self.plate_number)?;
        require("driver_name", &self.driver_name)
    }

    pub(crate) fn to_register_request(&self) -> RegisterTruckRequest {
        RegisterTruckRequest {
            truck_id: self.truck_id.clone(),
            plate_number: self.plate_number.clone(),
            driver_name: self.driver_name.clone(),
        }
    }
}

/// One manifest line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestLine {
    pub sku: String,
    pub name: String,
    #[serde(alias = "aisle_type")]
    pub aisle: Aisle,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub mfd_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl ManifestLine {
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        aisle: Aisle,
        quantity: u32,
        unit_cost: Decimal,
        mfd_date: NaiveDate,
        expiry_date: NaiveDate,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            aisle,
            quantity,
            unit_cost,
            mfd_date,
            expiry_date,
        }
    }

    /// Quantity × unit cost; `None` when the product overflows.
    pub fn line_cost(&self) -> Option<Decimal> {
        self.unit_cost.checked_mul(Decimal::from(self.quantity))
    }

    fn validate(&self, line_no: usize) -> ClientResult<()> {
        let fail = |reason: &str| {
            Err(ClientError::Validation(format!(
                "Manifest line {line_no} ({}): {reason}",
                self.sku.trim()
            )))
        };
        if self.sku.trim().is_empty() {
            return fail("SKU is required");
        }
        if self.name.trim().is_empty() {
            return fail("name is required");
        }
        if self.quantity == 0 {
            return fail("quantity must be positive");
        }
        if self.unit_cost.is_sign_negative() {
            return fail("unit cost must not be negative");
        }
        if self.expiry_date < self.mfd_date {
            return fail("expiry date precedes manufacture date");
        }
        if self.line_cost().is_none() {
            return fail("line cost is out of range");
        }
        Ok(())
    }

    fn to_wire(&self) -> RestockItem {
        RestockItem {
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            aisle_type: self.aisle,
            quantity: self.quantity,
            mfd_date: midnight_utc(self.mfd_date),
            expiry_date: midnight_utc(self.expiry_date),
            unit_cost: self.unit_cost,
        }
    }
}

/// A supplier delivery: who delivers, from which truck, and what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockBatch {
    pub supplier_id: String,
    #[serde(default)]
    pub supplier_name: String,
    pub truck: TruckIdentity,
    #[serde(default)]
    pub manifest: Vec<ManifestLine>,
}

impl RestockBatch {
    pub fn new(
        supplier_id: impl Into<String>,
        supplier_name: impl Into<String>,
        truck: TruckIdentity,
    ) -> Self {
        Self {
            supplier_id: supplier_id.into(),
            supplier_name: supplier_name.into(),
            truck,
            manifest: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: ManifestLine) -> Self {
        self.manifest.push(line);
        self
    }

    /// Sum of quantity × unit cost; the service computes the authoritative total.
    /// `None` when the sum overflows.
    pub fn estimated_cost(&self) -> Option<Decimal> {
        self.manifest
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.line_cost()?))
    }

    pub fn validate(&self) -> ClientResult<()> {
        require("supplier_id", &self.supplier_id)?;
        self.truck.validate()?;
        if self.manifest.is_empty() {
            return Err(ClientError::Validation(
                "Manifest is empty: add at least one item".into(),
            ));
        }
        for (i, line) in self.manifest.iter().enumerate() {
            line.validate(i + 1)?;
        }
        if self.estimated_cost().is_none() {
            return Err(ClientError::Validation(
                "Manifest total cost is out of range".into(),
            ));
        }
        Ok(())
    }

    /// Validated wire body
    pub fn to_request(&self) -> ClientResult<RestockRequest> {
        self.validate()?;
        Ok(RestockRequest {
            truck_id: self.truck.truck_id.clone(),
            plate_number: self.truck.plate_number.clone(),
            driver_name: self.truck.driver_name.clone(),
            contact_info: self.truck.contact_info.clone(),
            location: self.truck.location.clone(),
            supplier_id: self.supplier_id.trim().to_string(),
            supplier_name: self.supplier_name.clone(),
            items: self.manifest.iter().map(ManifestLine::to_wire).collect(),
        })
    }
}

fn require(field: &str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// `2025-01-01` → `2025-01-01T00:00:00Z`
fn midnight_utc(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00Z").to_string()
}

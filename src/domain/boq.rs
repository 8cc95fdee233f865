//! Bill-of-Quantities line items
//!
//! Amounts are derived at write time and persisted so the markup cascade
//! always reads a stable cost figure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Default per-item markup percentage used by the BOQ editor.
pub const DEFAULT_MARKUP_PERCENT: f64 = 15.0;

/// BOQ line item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqItem {
    pub id: Uuid,
    pub estimate_id: Uuid,
    pub item_number: Option<String>,
    pub section: Option<String>,
    pub trade: Option<String>,
    pub description: String,
    pub unit: String,
    pub qty: f64,
    pub assembly_id: Option<Uuid>,
    pub unit_price: f64,
    /// Persisted `qty * unit_price`, written at rollup time.
    pub amount: f64,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub equipment_cost: f64,
    pub markup_percent: f64,
    /// Direct cost of the item, before markup.
    pub internal_amount: f64,
    /// Client-facing amount: internal amount plus the item markup.
    pub contract_amount: f64,
    pub is_active: bool,
    pub sort_order: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_markup() -> f64 {
    DEFAULT_MARKUP_PERCENT
}

/// One row of a replace-all BOQ write.
///
/// Derived fields (`amount`, `internal_amount`, `contract_amount`) are
/// computed by the rollup, never taken from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoqItemInput {
    #[serde(default)]
    pub item_number: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub trade: Option<String>,
    pub description: String,
    pub unit: String,
    pub qty: f64,
    #[serde(default)]
    pub assembly_id: Option<Uuid>,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub material_cost: f64,
    #[serde(default)]
    pub labor_cost: f64,
    #[serde(default)]
    pub equipment_cost: f64,
    #[serde(default = "default_markup")]
    pub markup_percent: f64,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl BoqItemInput {
    pub fn validate(&self) -> CoreResult<()> {
        if self.description.trim().is_empty() {
            return Err(CoreError::validation("BOQ item description is required"));
        }
        if self.unit.trim().is_empty() {
            return Err(CoreError::validation("BOQ item unit is required"));
        }
        if !self.qty.is_finite() || self.qty < 0.0 {
            return Err(CoreError::validation(format!(
                "BOQ item quantity must be non-negative, got {}",
                self.qty
            )));
        }
        for (field, value) in [
            ("unit_price", self.unit_price),
            ("material_cost", self.material_cost),
            ("labor_cost", self.labor_cost),
            ("equipment_cost", self.equipment_cost),
            ("markup_percent", self.markup_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::validation(format!(
                    "BOQ item {field} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

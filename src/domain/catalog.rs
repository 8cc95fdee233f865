//! Catalog reference records: materials, labor types, equipment
//!
//! Flat priced reference data owned by the external store. Prices are
//! maintained elsewhere; this module only validates and reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Hours in a standard working day; labor daily rates divide by this
/// for hourly-rate derivations.
pub const WORKDAY_HOURS: f64 = 8.0;

/// Approximate working days per month, used to convert monthly equipment
/// rates to a daily equivalent.
pub const WORKING_DAYS_PER_MONTH: f64 = 26.0;

/// Billing basis for an equipment rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Hourly,
    Daily,
    Monthly,
}

impl Default for RateType {
    fn default() -> Self {
        Self::Daily
    }
}

/// Priced construction material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub unit: String,
    /// Unit price at NCR reference level
    pub ncr_price: f64,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Coerce an untyped store row into a validated record.
    pub fn from_row(row: serde_json::Value) -> CoreResult<Self> {
        let material: Material = serde_json::from_value(row)
            .map_err(|e| CoreError::validation(format!("malformed material row: {e}")))?;
        material.validate()?;
        Ok(material)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("material name is required"));
        }
        if !self.ncr_price.is_finite() || self.ncr_price < 0.0 {
            return Err(CoreError::validation(format!(
                "material '{}' has invalid unit price {}",
                self.name, self.ncr_price
            )));
        }
        Ok(())
    }
}

/// Labor trade with a per-day rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaborType {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub trade: String,
    /// Rate per 8-hour working day
    pub daily_rate: f64,
    pub skill_level: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LaborType {
    pub fn from_row(row: serde_json::Value) -> CoreResult<Self> {
        let labor: LaborType = serde_json::from_value(row)
            .map_err(|e| CoreError::validation(format!("malformed labor type row: {e}")))?;
        labor.validate()?;
        Ok(labor)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.trade.trim().is_empty() {
            return Err(CoreError::validation("labor trade is required"));
        }
        if !self.daily_rate.is_finite() || self.daily_rate < 0.0 {
            return Err(CoreError::validation(format!(
                "labor type '{}' has invalid daily rate {}",
                self.trade, self.daily_rate
            )));
        }
        Ok(())
    }

    pub fn hourly_rate(&self) -> f64 {
        self.daily_rate / WORKDAY_HOURS
    }
}

/// Rentable equipment with a rate in its own billing basis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub rate_type: RateType,
    pub rate: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn from_row(row: serde_json::Value) -> CoreResult<Self> {
        let equipment: Equipment = serde_json::from_value(row)
            .map_err(|e| CoreError::validation(format!("malformed equipment row: {e}")))?;
        equipment.validate()?;
        Ok(equipment)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("equipment name is required"));
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(CoreError::validation(format!(
                "equipment '{}' has invalid rate {}",
                self.name, self.rate
            )));
        }
        Ok(())
    }

    /// Effective daily-equivalent rate. Monthly rates spread over the
    /// approximate working days in a month; hourly and daily rates pass
    /// through unchanged.
    pub fn daily_equivalent_rate(&self) -> f64 {
        match self.rate_type {
            RateType::Monthly => self.rate / WORKING_DAYS_PER_MONTH,
            RateType::Hourly | RateType::Daily => self.rate,
        }
    }
}

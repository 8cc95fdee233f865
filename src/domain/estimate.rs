//! Estimate domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Estimate lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
    Revised,
}

impl Default for EstimateStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// How VAT relates to the quoted figures.
///
/// The forward cascade computes exclusive VAT; the inclusive mode is
/// recovered with [`crate::currency::calculate_subtotal_from_total`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VatMode {
    Exclusive,
    Inclusive,
}

impl Default for VatMode {
    fn default() -> Self {
        Self::Exclusive
    }
}

/// Overhead, Contingency and Miscellaneous markup rates plus profit,
/// each a percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OcmRates {
    pub overhead: f64,
    pub contingency: f64,
    pub misc: f64,
    pub profit: f64,
}

impl Default for OcmRates {
    fn default() -> Self {
        Self {
            overhead: 5.0,
            contingency: 5.0,
            misc: 3.0,
            profit: 10.0,
        }
    }
}

impl OcmRates {
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("overhead", self.overhead),
            ("contingency", self.contingency),
            ("misc", self.misc),
            ("profit", self.profit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::validation(format!(
                    "OCM {field} rate must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Estimate entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    /// Period-scoped number, e.g. `EST-202501-0007`.
    pub estimate_number: String,
    pub project_name: String,
    pub client_name: Option<String>,
    pub floor_area: Option<f64>,
    pub location: Option<String>,
    pub ocm: OcmRates,
    pub vat_mode: VatMode,
    pub vat_rate: f64,
    pub status: EstimateStatus,
    pub version: i32,
    /// Persisted cascade outputs, refreshed after every BOQ write.
    pub subtotal: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating an estimate
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEstimateRequest {
    pub project_name: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub floor_area: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    /// Overrides for the configured defaults.
    #[serde(default)]
    pub ocm: Option<OcmRates>,
    #[serde(default)]
    pub vat_rate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateEstimateRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.project_name.trim().is_empty() {
            return Err(CoreError::validation("project name is required"));
        }
        if let Some(ocm) = &self.ocm {
            ocm.validate()?;
        }
        if let Some(rate) = self.vat_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(CoreError::validation(format!(
                    "VAT rate must be non-negative, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

/// Request DTO for updating estimate header fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEstimateRequest {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub floor_area: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ocm: Option<OcmRates>,
    #[serde(default)]
    pub vat_rate: Option<f64>,
    #[serde(default)]
    pub status: Option<EstimateStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Output of the markup cascade, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimateTotals {
    pub direct_cost: f64,
    pub overhead: f64,
    pub contingency: f64,
    pub misc: f64,
    pub subtotal: f64,
    pub profit: f64,
    pub subtotal_with_profit: f64,
    pub vat: f64,
    pub total: f64,
}

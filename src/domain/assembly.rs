//! Assembly domain types
//!
//! An assembly is a reusable recipe of material, labor and equipment
//! components priced as a single unit rate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Kind of catalog record a component points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Material,
    Labor,
    Equipment,
}

/// Assembly entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an assembly recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyComponent {
    pub id: Uuid,
    pub assembly_id: Uuid,
    pub kind: ComponentKind,
    pub ref_id: Uuid,
    pub qty: f64,
    /// Percentage surcharge for site loss, e.g. 5.0 for 5%.
    /// Applied to material quantities only.
    #[serde(default)]
    pub wastage_factor: f64,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AssemblyComponent {
    /// Quantity with the wastage surcharge applied.
    pub fn effective_qty(&self) -> f64 {
        self.qty * (1.0 + self.wastage_factor / 100.0)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.qty.is_finite() || self.qty <= 0.0 {
            return Err(CoreError::validation(format!(
                "component quantity must be positive, got {}",
                self.qty
            )));
        }
        if !self.wastage_factor.is_finite() || self.wastage_factor < 0.0 {
            return Err(CoreError::validation(format!(
                "wastage factor must be non-negative, got {}",
                self.wastage_factor
            )));
        }
        Ok(())
    }
}

/// Request DTO for creating an assembly
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssemblyRequest {
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl CreateAssemblyRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("assembly name is required"));
        }
        if self.unit.trim().is_empty() {
            return Err(CoreError::validation("assembly unit is required"));
        }
        Ok(())
    }
}

/// Request DTO for updating an assembly
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssemblyRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Request DTO for adding a component to an assembly
#[derive(Debug, Clone, Deserialize)]
pub struct AddComponentRequest {
    pub kind: ComponentKind,
    pub ref_id: Uuid,
    pub qty: f64,
    #[serde(default)]
    pub wastage_factor: f64,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl AddComponentRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.qty.is_finite() || self.qty <= 0.0 {
            return Err(CoreError::validation(format!(
                "component quantity must be positive, got {}",
                self.qty
            )));
        }
        if !self.wastage_factor.is_finite() || self.wastage_factor < 0.0 {
            return Err(CoreError::validation(format!(
                "wastage factor must be non-negative, got {}",
                self.wastage_factor
            )));
        }
        Ok(())
    }
}

/// Component with its catalog record resolved and costed.
///
/// Catalog fields are `None` when the referenced record is missing; such
/// components contribute nothing to the assembly price and are reported
/// through [`PricedAssembly::unresolved`].
#[derive(Debug, Clone, Serialize)]
pub struct PricedComponent {
    pub id: Uuid,
    pub kind: ComponentKind,
    pub ref_id: Uuid,
    pub qty: f64,
    pub wastage_factor: f64,
    pub effective_qty: f64,
    pub remarks: Option<String>,
    pub item_name: Option<String>,
    pub item_unit: Option<String>,
    pub item_price: Option<f64>,
    pub cost: Option<f64>,
}

/// An assembly with all components resolved and the unit price derived.
#[derive(Debug, Clone, Serialize)]
pub struct PricedAssembly {
    pub assembly: Assembly,
    pub components: Vec<PricedComponent>,
    /// Component ids whose catalog reference could not be resolved.
    /// The unit price covers resolvable components only; callers decide
    /// whether to warn or block on an incomplete assembly.
    pub unresolved: Vec<Uuid>,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub equipment_cost: f64,
    pub unit_price: f64,
}

impl PricedAssembly {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Group components by kind for the cost breakdown view.
    pub fn breakdown(&self) -> AssemblyBreakdown {
        let by_kind = |kind: ComponentKind| -> Vec<PricedComponent> {
            self.components
                .iter()
                .filter(|c| c.kind == kind)
                .cloned()
                .collect()
        };

        AssemblyBreakdown {
            materials: by_kind(ComponentKind::Material),
            labor: by_kind(ComponentKind::Labor),
            equipment: by_kind(ComponentKind::Equipment),
            material_cost: self.material_cost,
            labor_cost: self.labor_cost,
            equipment_cost: self.equipment_cost,
            total_cost: self.unit_price,
        }
    }
}

/// Per-kind cost breakdown of a priced assembly
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyBreakdown {
    pub materials: Vec<PricedComponent>,
    pub labor: Vec<PricedComponent>,
    pub equipment: Vec<PricedComponent>,
    pub material_cost: f64,
    pub labor_cost: f64,
    pub equipment_cost: f64,
    pub total_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(qty: f64, wastage: f64) -> AssemblyComponent {
        AssemblyComponent {
            id: Uuid::new_v4(),
            assembly_id: Uuid::new_v4(),
            kind: ComponentKind::Material,
            ref_id: Uuid::new_v4(),
            qty,
            wastage_factor: wastage,
            remarks: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn effective_qty_applies_wastage() {
        assert_eq!(component(10.0, 5.0).effective_qty(), 10.5);
    }

    #[test]
    fn zero_wastage_leaves_qty_unchanged() {
        assert_eq!(component(10.0, 0.0).effective_qty(), 10.0);
    }

    #[test]
    fn empty_quantity_is_rejected() {
        let err = component(0.0, 0.0).validate().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn negative_wastage_is_rejected() {
        assert!(component(1.0, -5.0).validate().is_err());
    }
}

//! Assembly costing
//!
//! Resolves an assembly's components against the catalog and derives the
//! unit price. Pure read/compute: nothing here writes to the store.
//!
//! There are two distinct pricing rules. [`price_assembly`] is the
//! standard costing used by the assembly views: wastage applies to
//! material quantities, labor is charged per manday, equipment per unit
//! of its own rate basis. [`assembly_unit_price_for_boq`] is the quote
//! used when a BOQ line is backed by an assembly: no wastage, labor is
//! charged hourly and monthly equipment rates are spread to a daily
//! equivalent.

use futures::future::try_join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    AssemblyComponent, ComponentKind, PricedAssembly, PricedComponent, RateType,
};
use crate::error::{CoreError, CoreResult};
use crate::store::{AssemblyStore, CatalogStore};

/// Unit price derived for a BOQ line backed by an assembly.
#[derive(Debug, Clone)]
pub struct UnitPriceQuote {
    pub unit_price: f64,
    /// Component ids whose catalog reference could not be resolved.
    pub unresolved: Vec<Uuid>,
}

/// Resolve and cost every component of an assembly.
///
/// Components whose catalog record is missing are excluded from the sum
/// and reported in [`PricedAssembly::unresolved`] so callers can warn or
/// block instead of silently under-costing.
pub async fn price_assembly<S>(store: &S, assembly_id: Uuid) -> CoreResult<PricedAssembly>
where
    S: CatalogStore + AssemblyStore,
{
    let assembly = store
        .find_assembly(assembly_id)
        .await?
        .ok_or_else(|| CoreError::not_found("assembly", assembly_id))?;
    let components = store.list_components(assembly_id).await?;

    // Resolve concurrently; try_join_all preserves component order.
    let priced: Vec<PricedComponent> =
        try_join_all(components.iter().map(|c| resolve_component(store, c))).await?;

    let mut material_cost = 0.0;
    let mut labor_cost = 0.0;
    let mut equipment_cost = 0.0;
    let mut unresolved = Vec::new();

    for component in &priced {
        match component.cost {
            Some(cost) => match component.kind {
                ComponentKind::Material => material_cost += cost,
                ComponentKind::Labor => labor_cost += cost,
                ComponentKind::Equipment => equipment_cost += cost,
            },
            None => unresolved.push(component.id),
        }
    }

    // Defined as the sum of the per-kind subtotals so the breakdown
    // reconstructs it exactly.
    let unit_price = material_cost + labor_cost + equipment_cost;

    if !unresolved.is_empty() {
        warn!(
            assembly_id = %assembly_id,
            unresolved = unresolved.len(),
            "Assembly has unresolved component references; unit price excludes them"
        );
    }
    debug!(
        assembly_id = %assembly_id,
        components = priced.len(),
        unit_price,
        "Priced assembly"
    );

    Ok(PricedAssembly {
        assembly,
        components: priced,
        unresolved,
        material_cost,
        labor_cost,
        equipment_cost,
        unit_price,
    })
}

async fn resolve_component<C: CatalogStore>(
    catalog: &C,
    component: &AssemblyComponent,
) -> CoreResult<PricedComponent> {
    let effective_qty = component.effective_qty();
    let mut priced = PricedComponent {
        id: component.id,
        kind: component.kind,
        ref_id: component.ref_id,
        qty: component.qty,
        wastage_factor: component.wastage_factor,
        effective_qty,
        remarks: component.remarks.clone(),
        item_name: None,
        item_unit: None,
        item_price: None,
        cost: None,
    };

    match component.kind {
        ComponentKind::Material => {
            if let Some(material) = catalog.find_material(component.ref_id).await? {
                priced.cost = Some(material.ncr_price * effective_qty);
                priced.item_name = Some(material.name);
                priced.item_unit = Some(material.unit);
                priced.item_price = Some(material.ncr_price);
            }
        }
        ComponentKind::Labor => {
            if let Some(labor) = catalog.find_labor_type(component.ref_id).await? {
                // Quantity is already in mandays; wastage is stored on the
                // component but never costed for labor.
                priced.cost = Some(labor.daily_rate * component.qty);
                priced.item_name = Some(labor.trade);
                priced.item_unit = Some("manday".to_string());
                priced.item_price = Some(labor.daily_rate);
            }
        }
        ComponentKind::Equipment => {
            if let Some(equipment) = catalog.find_equipment(component.ref_id).await? {
                // Quantity is expressed in the equipment's own rate basis.
                priced.cost = Some(equipment.rate * component.qty);
                priced.item_name = Some(equipment.name);
                priced.item_unit = Some(rate_unit(equipment.rate_type).to_string());
                priced.item_price = Some(equipment.rate);
            }
        }
    }

    Ok(priced)
}

fn rate_unit(rate_type: RateType) -> &'static str {
    match rate_type {
        RateType::Hourly => "hour",
        RateType::Daily => "day",
        RateType::Monthly => "month",
    }
}

/// Derive the unit price an assembly contributes to a BOQ line.
///
/// Distinct from [`price_assembly`]: materials are charged without
/// wastage, labor at the hourly rate, and monthly equipment rates are
/// converted to their daily equivalent.
pub async fn assembly_unit_price_for_boq<S>(
    store: &S,
    assembly_id: Uuid,
) -> CoreResult<UnitPriceQuote>
where
    S: CatalogStore + AssemblyStore,
{
    if store.find_assembly(assembly_id).await?.is_none() {
        return Err(CoreError::not_found("assembly", assembly_id));
    }
    let components = store.list_components(assembly_id).await?;

    let mut unit_price = 0.0;
    let mut unresolved = Vec::new();

    for component in &components {
        let cost = match component.kind {
            ComponentKind::Material => catalog_cost(
                store.find_material(component.ref_id).await?,
                |m| m.ncr_price * component.qty,
            ),
            ComponentKind::Labor => catalog_cost(
                store.find_labor_type(component.ref_id).await?,
                |l| l.hourly_rate() * component.qty,
            ),
            ComponentKind::Equipment => catalog_cost(
                store.find_equipment(component.ref_id).await?,
                |e| e.daily_equivalent_rate() * component.qty,
            ),
        };
        match cost {
            Some(cost) => unit_price += cost,
            None => unresolved.push(component.id),
        }
    }

    if !unresolved.is_empty() {
        warn!(
            assembly_id = %assembly_id,
            unresolved = unresolved.len(),
            "BOQ unit price excludes unresolved component references"
        );
    }

    Ok(UnitPriceQuote {
        unit_price,
        unresolved,
    })
}

fn catalog_cost<T>(record: Option<T>, cost: impl FnOnce(&T) -> f64) -> Option<f64> {
    record.as_ref().map(cost)
}

//! BOQ rollup
//!
//! Aggregates an estimate's line items into direct cost. Amounts are
//! derived at write time so the markup cascade always reads stable
//! figures, and the full item list is replaced as one unit.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::{BoqItem, BoqItemInput};
use crate::error::{CoreError, CoreResult};
use crate::services::{cascade, costing};
use crate::store::{AssemblyStore, CatalogStore, EstimateStore};

/// Derive a persisted item from one replace-all input row.
pub fn build_item(estimate_id: Uuid, input: &BoqItemInput, now: DateTime<Utc>) -> CoreResult<BoqItem> {
    input.validate()?;

    // Rows not backed by an assembly may carry a manual cost breakdown;
    // the unit price is then the sum of its parts.
    let mut unit_price = input.unit_price;
    if input.assembly_id.is_none() {
        let breakdown_sum = input.material_cost + input.labor_cost + input.equipment_cost;
        if breakdown_sum > 0.0 {
            unit_price = breakdown_sum;
        }
    }

    let amount = input.qty * unit_price;
    let markup = amount * input.markup_percent / 100.0;

    Ok(BoqItem {
        id: Uuid::new_v4(),
        estimate_id,
        item_number: input.item_number.clone(),
        section: input.section.clone(),
        trade: input.trade.clone(),
        description: input.description.clone(),
        unit: input.unit.clone(),
        qty: input.qty,
        assembly_id: input.assembly_id,
        unit_price,
        amount,
        material_cost: input.material_cost,
        labor_cost: input.labor_cost,
        equipment_cost: input.equipment_cost,
        markup_percent: input.markup_percent,
        internal_amount: amount,
        contract_amount: amount + markup,
        is_active: true,
        sort_order: input.sort_order,
        created_at: now,
        updated_at: now,
    })
}

/// Direct cost of an estimate: sum of amounts over active items.
pub fn direct_cost(items: &[BoqItem]) -> f64 {
    items
        .iter()
        .filter(|item| item.is_active)
        .map(|item| item.amount)
        .sum()
}

/// Fill assembly-backed input rows with the assembly's price and cost
/// breakdown (standard assembly costing, wastage applied).
pub async fn price_inputs_from_assemblies<S>(
    store: &S,
    inputs: &mut [BoqItemInput],
) -> CoreResult<()>
where
    S: CatalogStore + AssemblyStore,
{
    for input in inputs.iter_mut() {
        let Some(assembly_id) = input.assembly_id else {
            continue;
        };
        let priced = costing::price_assembly(store, assembly_id).await?;
        input.unit_price = priced.unit_price;
        input.material_cost = priced.material_cost;
        input.labor_cost = priced.labor_cost;
        input.equipment_cost = priced.equipment_cost;
        input.unit = priced.assembly.unit.clone();
        if input.description.trim().is_empty() {
            input.description = priced.assembly.name.clone();
        }
    }
    Ok(())
}

/// Atomic replace-all of an estimate's BOQ items.
///
/// Every row is validated before anything is written; a failure leaves
/// the previous item set untouched. A concurrent replace on the same
/// estimate surfaces as `Conflict` and must be retried by the caller.
/// On success the estimate's persisted totals are refreshed.
pub async fn replace_items<S: EstimateStore>(
    store: &S,
    estimate_id: Uuid,
    inputs: &[BoqItemInput],
) -> CoreResult<Vec<BoqItem>> {
    let estimate = store
        .find_estimate(estimate_id)
        .await?
        .ok_or_else(|| CoreError::not_found("estimate", estimate_id))?;

    // Every row is validated while building, before anything is written.
    let revision = store.boq_revision(estimate_id).await?;
    let now = Utc::now();
    let items: Vec<BoqItem> = inputs
        .iter()
        .map(|input| build_item(estimate_id, input, now))
        .collect::<CoreResult<_>>()?;

    store
        .replace_boq_items(estimate_id, revision, items.clone())
        .await?;

    let totals = cascade::calculate_totals(&items, &estimate.ocm, estimate.vat_rate);
    store
        .update_totals(estimate_id, totals.subtotal, totals.total)
        .await?;

    info!(
        estimate_id = %estimate_id,
        items = items.len(),
        direct_cost = totals.direct_cost,
        total = totals.total,
        "Replaced BOQ items"
    );

    Ok(items)
}

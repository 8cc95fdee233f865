//! Estimate lifecycle operations

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::config::EstimateDefaults;
use crate::domain::{
    CreateEstimateRequest, Estimate, EstimateStatus, EstimateTotals, OcmRates, VatMode,
};
use crate::error::{CoreError, CoreResult};
use crate::services::{cascade, numbering};
use crate::store::EstimateStore;

/// Create an estimate: reserve a number, apply the configured markup
/// defaults for anything the request leaves unset, and persist it.
pub async fn create_estimate<S: EstimateStore>(
    store: &S,
    defaults: &EstimateDefaults,
    organization_id: Uuid,
    request: CreateEstimateRequest,
) -> CoreResult<Estimate> {
    request.validate()?;

    let now = Utc::now();
    let estimate_number = numbering::reserve_number(store, organization_id, now).await?;

    let ocm = request.ocm.unwrap_or(OcmRates {
        overhead: defaults.ocm_overhead,
        contingency: defaults.ocm_contingency,
        misc: defaults.ocm_misc,
        profit: defaults.ocm_profit,
    });
    ocm.validate()?;

    let estimate = Estimate {
        id: Uuid::new_v4(),
        organization_id,
        project_id: request.project_id,
        estimate_number: estimate_number.clone(),
        project_name: request.project_name,
        client_name: request.client_name,
        floor_area: request.floor_area,
        location: request.location,
        ocm,
        vat_mode: VatMode::Exclusive,
        vat_rate: request.vat_rate.unwrap_or(defaults.vat_rate),
        status: EstimateStatus::Draft,
        version: 1,
        subtotal: 0.0,
        total_amount: 0.0,
        notes: request.notes,
        created_at: now,
        updated_at: now,
    };

    store.insert_estimate(estimate.clone()).await?;

    info!(
        estimate_id = %estimate.id,
        estimate_number = %estimate_number,
        organization_id = %organization_id,
        "Created estimate"
    );

    Ok(estimate)
}

/// Recompute the cascade from the persisted item set and store the
/// resulting subtotal and total on the estimate header.
pub async fn refresh_totals<S: EstimateStore>(
    store: &S,
    estimate_id: Uuid,
) -> CoreResult<EstimateTotals> {
    let estimate = store
        .find_estimate(estimate_id)
        .await?
        .ok_or_else(|| CoreError::not_found("estimate", estimate_id))?;
    let items = store.list_boq_items(estimate_id).await?;

    let totals = cascade::calculate_totals(&items, &estimate.ocm, estimate.vat_rate);
    store
        .update_totals(estimate_id, totals.subtotal, totals.total)
        .await?;

    Ok(totals)
}

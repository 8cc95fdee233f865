//! Estimate markup cascade
//!
//! Converts direct cost into a contract total through a fixed sequence of
//! percentage markups. The order is contractual: overhead, contingency
//! and miscellaneous are taken on direct cost, profit compounds on the
//! marked-up subtotal, and VAT (exclusive mode) is added on top of the
//! profit-bearing subtotal. No rounding happens here; formatting is a
//! display concern.

use crate::domain::{BoqItem, EstimateTotals, OcmRates};
use crate::services::rollup;

/// Roll the given BOQ items up and run the cascade.
pub fn calculate_totals(items: &[BoqItem], ocm: &OcmRates, vat_rate: f64) -> EstimateTotals {
    totals_from_direct_cost(rollup::direct_cost(items), ocm, vat_rate)
}

/// Run the cascade on an already-rolled-up direct cost.
pub fn totals_from_direct_cost(direct_cost: f64, ocm: &OcmRates, vat_rate: f64) -> EstimateTotals {
    let overhead = direct_cost * ocm.overhead / 100.0;
    let contingency = direct_cost * ocm.contingency / 100.0;
    let misc = direct_cost * ocm.misc / 100.0;

    let subtotal = direct_cost + overhead + contingency + misc;

    // Profit is taken on the subtotal, not on direct cost: OCM markups
    // compound before profit applies.
    let profit = subtotal * ocm.profit / 100.0;
    let subtotal_with_profit = subtotal + profit;

    let vat = subtotal_with_profit * vat_rate / 100.0;
    let total = subtotal_with_profit + vat;

    EstimateTotals {
        direct_cost,
        overhead,
        contingency,
        misc,
        subtotal,
        profit,
        subtotal_with_profit,
        vat,
        total,
    }
}

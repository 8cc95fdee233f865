//! Service layer: the estimation computations
//!
//! Assembly costing, BOQ rollup and the markup cascade are synchronous,
//! side-effect-free computations over already-fetched records; numbering
//! and the replace-all write path talk to the store.

pub mod cascade;
pub mod costing;
pub mod estimates;
pub mod numbering;
pub mod rollup;

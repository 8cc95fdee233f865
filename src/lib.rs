//! costbook — cost estimation and BOQ rollup core
//!
//! Turns reusable assemblies (bundles of material, labor and equipment
//! components) into unit prices, rolls BOQ line items into a project
//! estimate, and cascades overhead, contingency, miscellaneous, profit
//! and VAT markups into a final contract amount. Estimate numbers are
//! period-scoped and strictly increasing per organization.
//!
//! Persistence, transport and auth live behind the [`store`] traits;
//! [`store::MemoryStore`] is the in-process reference implementation.

pub mod config;
pub mod currency;
pub mod domain;
pub mod error;
pub mod logging;
pub mod services;
pub mod store;

pub use error::{CoreError, CoreResult};

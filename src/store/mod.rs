//! Store collaborator seams
//!
//! The core consumes and produces plain records; persistence lives in an
//! external data service. These traits are the only path records take in
//! or out of the computations. [`memory::MemoryStore`] is the in-process
//! reference implementation used by tests.

pub mod memory;

pub use memory::MemoryStore;

use uuid::Uuid;

use crate::domain::{
    AddComponentRequest, Assembly, AssemblyComponent, BoqItem, CreateAssemblyRequest, Equipment,
    Estimate, LaborType, Material, UpdateAssemblyRequest, UpdateEstimateRequest,
};
use crate::error::CoreResult;

/// Lookup of priced catalog records by reference id.
#[allow(async_fn_in_trait)]
pub trait CatalogStore: Send + Sync {
    async fn find_material(&self, id: Uuid) -> CoreResult<Option<Material>>;
    async fn find_labor_type(&self, id: Uuid) -> CoreResult<Option<LaborType>>;
    async fn find_equipment(&self, id: Uuid) -> CoreResult<Option<Equipment>>;

    async fn list_materials(&self, organization_id: Uuid) -> CoreResult<Vec<Material>>;
    async fn list_labor_types(&self, organization_id: Uuid) -> CoreResult<Vec<LaborType>>;
    async fn list_equipment(&self, organization_id: Uuid) -> CoreResult<Vec<Equipment>>;
}

/// Assembly and component read-write access.
#[allow(async_fn_in_trait)]
pub trait AssemblyStore: Send + Sync {
    async fn find_assembly(&self, id: Uuid) -> CoreResult<Option<Assembly>>;

    /// Active assemblies for an organization, ordered by code.
    async fn list_assemblies(&self, organization_id: Uuid) -> CoreResult<Vec<Assembly>>;

    async fn create_assembly(
        &self,
        organization_id: Uuid,
        request: CreateAssemblyRequest,
    ) -> CoreResult<Assembly>;
    async fn update_assembly(&self, id: Uuid, updates: UpdateAssemblyRequest)
        -> CoreResult<Assembly>;

    /// Soft delete: flips `is_active`, the record stays addressable.
    async fn deactivate_assembly(&self, id: Uuid) -> CoreResult<()>;

    /// Hard delete. Refused with `Conflict` while any BOQ item still
    /// references the assembly.
    async fn delete_assembly(&self, id: Uuid) -> CoreResult<()>;

    async fn list_components(&self, assembly_id: Uuid) -> CoreResult<Vec<AssemblyComponent>>;
    async fn add_component(
        &self,
        assembly_id: Uuid,
        request: AddComponentRequest,
    ) -> CoreResult<AssemblyComponent>;
    async fn update_component(
        &self,
        component_id: Uuid,
        qty: f64,
        wastage_factor: f64,
        remarks: Option<String>,
    ) -> CoreResult<AssemblyComponent>;
    async fn remove_component(&self, component_id: Uuid) -> CoreResult<()>;
}

/// Estimate, BOQ item and numbering access.
#[allow(async_fn_in_trait)]
pub trait EstimateStore: Send + Sync {
    async fn find_estimate(&self, id: Uuid) -> CoreResult<Option<Estimate>>;

    /// Estimates for an organization, optionally narrowed to a project,
    /// newest first.
    async fn list_estimates(
        &self,
        organization_id: Uuid,
        project_id: Option<Uuid>,
    ) -> CoreResult<Vec<Estimate>>;

    async fn insert_estimate(&self, estimate: Estimate) -> CoreResult<()>;
    async fn update_estimate(&self, id: Uuid, updates: UpdateEstimateRequest)
        -> CoreResult<Estimate>;
    async fn delete_estimate(&self, id: Uuid) -> CoreResult<()>;

    /// Persist cascade outputs on the estimate header.
    async fn update_totals(&self, id: Uuid, subtotal: f64, total_amount: f64) -> CoreResult<()>;

    async fn list_boq_items(&self, estimate_id: Uuid) -> CoreResult<Vec<BoqItem>>;

    /// Revision counter for an estimate's item set, bumped by every
    /// successful replace. Read it before building a replacement set.
    async fn boq_revision(&self, estimate_id: Uuid) -> CoreResult<u64>;

    /// Atomic replace-all of an estimate's items. Fails with `Conflict`
    /// when `expected_revision` is stale; either every item is written
    /// or none are.
    async fn replace_boq_items(
        &self,
        estimate_id: Uuid,
        expected_revision: u64,
        items: Vec<BoqItem>,
    ) -> CoreResult<()>;

    /// Most recently reserved estimate number for an organization.
    async fn last_estimate_number(&self, organization_id: Uuid) -> CoreResult<Option<String>>;

    /// Atomically reserve a number for an organization. `Conflict` when
    /// the number is already taken.
    async fn reserve_estimate_number(
        &self,
        organization_id: Uuid,
        number: &str,
    ) -> CoreResult<()>;
}

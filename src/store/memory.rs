//! In-memory store implementation
//!
//! Reference implementation of the store traits. Backs the test suite and
//! pins down the transactional semantics an external store must provide:
//! replace-all is all-or-nothing behind a revision check, and estimate
//! numbers are unique per organization.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{
    AddComponentRequest, Assembly, AssemblyComponent, BoqItem, CreateAssemblyRequest, Equipment,
    Estimate, LaborType, Material, UpdateAssemblyRequest, UpdateEstimateRequest,
};
use crate::error::{CoreError, CoreResult};
use crate::store::{AssemblyStore, CatalogStore, EstimateStore};

#[derive(Default)]
struct Inner {
    materials: HashMap<Uuid, Material>,
    labor_types: HashMap<Uuid, LaborType>,
    equipment: HashMap<Uuid, Equipment>,

    assemblies: HashMap<Uuid, Assembly>,
    components: HashMap<Uuid, AssemblyComponent>,

    estimates: HashMap<Uuid, Estimate>,
    /// Items per estimate; the whole vector is swapped on replace.
    boq_items: HashMap<Uuid, Vec<BoqItem>>,
    boq_revisions: HashMap<Uuid, u64>,

    /// Reserved numbers per organization, in reservation order.
    numbers: HashMap<Uuid, Vec<String>>,
    numbers_taken: HashSet<(Uuid, String)>,

    /// Insertion order for newest-first listings.
    estimate_order: Vec<Uuid>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for catalog data, which the core never mutates.

    pub fn seed_material(&self, material: Material) {
        self.inner.write().materials.insert(material.id, material);
    }

    pub fn seed_labor_type(&self, labor: LaborType) {
        self.inner.write().labor_types.insert(labor.id, labor);
    }

    pub fn seed_equipment(&self, equipment: Equipment) {
        self.inner.write().equipment.insert(equipment.id, equipment);
    }
}

impl CatalogStore for MemoryStore {
    async fn find_material(&self, id: Uuid) -> CoreResult<Option<Material>> {
        Ok(self.inner.read().materials.get(&id).cloned())
    }

    async fn find_labor_type(&self, id: Uuid) -> CoreResult<Option<LaborType>> {
        Ok(self.inner.read().labor_types.get(&id).cloned())
    }

    async fn find_equipment(&self, id: Uuid) -> CoreResult<Option<Equipment>> {
        Ok(self.inner.read().equipment.get(&id).cloned())
    }

    async fn list_materials(&self, organization_id: Uuid) -> CoreResult<Vec<Material>> {
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .materials
            .values()
            .filter(|m| m.organization_id == organization_id && m.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.category, &a.code).cmp(&(&b.category, &b.code)));
        Ok(rows)
    }

    async fn list_labor_types(&self, organization_id: Uuid) -> CoreResult<Vec<LaborType>> {
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .labor_types
            .values()
            .filter(|l| l.organization_id == organization_id && l.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (&a.skill_level, &a.trade).cmp(&(&b.skill_level, &b.trade)));
        Ok(rows)
    }

    async fn list_equipment(&self, organization_id: Uuid) -> CoreResult<Vec<Equipment>> {
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .equipment
            .values()
            .filter(|e| e.organization_id == organization_id && e.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }
}

impl AssemblyStore for MemoryStore {
    async fn find_assembly(&self, id: Uuid) -> CoreResult<Option<Assembly>> {
        Ok(self.inner.read().assemblies.get(&id).cloned())
    }

    async fn list_assemblies(&self, organization_id: Uuid) -> CoreResult<Vec<Assembly>> {
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .assemblies
            .values()
            .filter(|a| a.organization_id == organization_id && a.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn create_assembly(
        &self,
        organization_id: Uuid,
        request: CreateAssemblyRequest,
    ) -> CoreResult<Assembly> {
        request.validate()?;
        let now = Utc::now();
        let assembly = Assembly {
            id: Uuid::new_v4(),
            organization_id,
            code: request.code,
            name: request.name,
            unit: request.unit,
            description: request.description,
            category: request.category,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .assemblies
            .insert(assembly.id, assembly.clone());
        Ok(assembly)
    }

    async fn update_assembly(
        &self,
        id: Uuid,
        updates: UpdateAssemblyRequest,
    ) -> CoreResult<Assembly> {
        let mut inner = self.inner.write();
        let assembly = inner
            .assemblies
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("assembly", id))?;

        if let Some(code) = updates.code {
            assembly.code = Some(code);
        }
        if let Some(name) = updates.name {
            assembly.name = name;
        }
        if let Some(unit) = updates.unit {
            assembly.unit = unit;
        }
        if let Some(description) = updates.description {
            assembly.description = Some(description);
        }
        if let Some(category) = updates.category {
            assembly.category = Some(category);
        }
        assembly.updated_at = Utc::now();
        Ok(assembly.clone())
    }

    async fn deactivate_assembly(&self, id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let assembly = inner
            .assemblies
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("assembly", id))?;
        assembly.is_active = false;
        assembly.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_assembly(&self, id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.assemblies.contains_key(&id) {
            return Err(CoreError::not_found("assembly", id));
        }
        let referenced = inner
            .boq_items
            .values()
            .flatten()
            .any(|item| item.assembly_id == Some(id));
        if referenced {
            return Err(CoreError::conflict(format!(
                "assembly {id} is referenced by BOQ items; deactivate it instead"
            )));
        }
        inner.assemblies.remove(&id);
        inner.components.retain(|_, c| c.assembly_id != id);
        Ok(())
    }

    async fn list_components(&self, assembly_id: Uuid) -> CoreResult<Vec<AssemblyComponent>> {
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .components
            .values()
            .filter(|c| c.assembly_id == assembly_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn add_component(
        &self,
        assembly_id: Uuid,
        request: AddComponentRequest,
    ) -> CoreResult<AssemblyComponent> {
        request.validate()?;
        let mut inner = self.inner.write();
        if !inner.assemblies.contains_key(&assembly_id) {
            return Err(CoreError::not_found("assembly", assembly_id));
        }
        let component = AssemblyComponent {
            id: Uuid::new_v4(),
            assembly_id,
            kind: request.kind,
            ref_id: request.ref_id,
            qty: request.qty,
            wastage_factor: request.wastage_factor,
            remarks: request.remarks,
            created_at: Utc::now(),
        };
        inner.components.insert(component.id, component.clone());
        Ok(component)
    }

    async fn update_component(
        &self,
        component_id: Uuid,
        qty: f64,
        wastage_factor: f64,
        remarks: Option<String>,
    ) -> CoreResult<AssemblyComponent> {
        let mut inner = self.inner.write();
        let component = inner
            .components
            .get_mut(&component_id)
            .ok_or_else(|| CoreError::not_found("assembly component", component_id))?;

        let mut updated = component.clone();
        updated.qty = qty;
        updated.wastage_factor = wastage_factor;
        updated.remarks = remarks;
        updated.validate()?;
        *component = updated.clone();
        Ok(updated)
    }

    async fn remove_component(&self, component_id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner
            .components
            .remove(&component_id)
            .ok_or_else(|| CoreError::not_found("assembly component", component_id))?;
        Ok(())
    }
}

impl EstimateStore for MemoryStore {
    async fn find_estimate(&self, id: Uuid) -> CoreResult<Option<Estimate>> {
        Ok(self.inner.read().estimates.get(&id).cloned())
    }

    async fn list_estimates(
        &self,
        organization_id: Uuid,
        project_id: Option<Uuid>,
    ) -> CoreResult<Vec<Estimate>> {
        let inner = self.inner.read();
        let rows = inner
            .estimate_order
            .iter()
            .rev()
            .filter_map(|id| inner.estimates.get(id))
            .filter(|e| e.organization_id == organization_id)
            .filter(|e| project_id.is_none() || e.project_id == project_id)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn insert_estimate(&self, estimate: Estimate) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner.estimate_order.push(estimate.id);
        inner.boq_items.entry(estimate.id).or_default();
        inner.boq_revisions.entry(estimate.id).or_insert(0);
        inner.estimates.insert(estimate.id, estimate);
        Ok(())
    }

    async fn update_estimate(
        &self,
        id: Uuid,
        updates: UpdateEstimateRequest,
    ) -> CoreResult<Estimate> {
        let mut inner = self.inner.write();
        let estimate = inner
            .estimates
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("estimate", id))?;

        if let Some(project_name) = updates.project_name {
            estimate.project_name = project_name;
        }
        if let Some(project_id) = updates.project_id {
            estimate.project_id = Some(project_id);
        }
        if let Some(client_name) = updates.client_name {
            estimate.client_name = Some(client_name);
        }
        if let Some(floor_area) = updates.floor_area {
            estimate.floor_area = Some(floor_area);
        }
        if let Some(location) = updates.location {
            estimate.location = Some(location);
        }
        if let Some(ocm) = updates.ocm {
            ocm.validate()?;
            estimate.ocm = ocm;
        }
        if let Some(vat_rate) = updates.vat_rate {
            estimate.vat_rate = vat_rate;
        }
        if let Some(status) = updates.status {
            estimate.status = status;
        }
        if let Some(notes) = updates.notes {
            estimate.notes = Some(notes);
        }
        estimate.updated_at = Utc::now();
        Ok(estimate.clone())
    }

    async fn delete_estimate(&self, id: Uuid) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner
            .estimates
            .remove(&id)
            .ok_or_else(|| CoreError::not_found("estimate", id))?;
        inner.boq_items.remove(&id);
        inner.boq_revisions.remove(&id);
        inner.estimate_order.retain(|e| *e != id);
        Ok(())
    }

    async fn update_totals(&self, id: Uuid, subtotal: f64, total_amount: f64) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let estimate = inner
            .estimates
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("estimate", id))?;
        estimate.subtotal = subtotal;
        estimate.total_amount = total_amount;
        estimate.updated_at = Utc::now();
        Ok(())
    }

    async fn list_boq_items(&self, estimate_id: Uuid) -> CoreResult<Vec<BoqItem>> {
        Ok(self
            .inner
            .read()
            .boq_items
            .get(&estimate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn boq_revision(&self, estimate_id: Uuid) -> CoreResult<u64> {
        Ok(self
            .inner
            .read()
            .boq_revisions
            .get(&estimate_id)
            .copied()
            .unwrap_or(0))
    }

    async fn replace_boq_items(
        &self,
        estimate_id: Uuid,
        expected_revision: u64,
        items: Vec<BoqItem>,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.estimates.contains_key(&estimate_id) {
            return Err(CoreError::not_found("estimate", estimate_id));
        }
        let revision = inner.boq_revisions.entry(estimate_id).or_insert(0);
        if *revision != expected_revision {
            return Err(CoreError::conflict(format!(
                "BOQ items for estimate {estimate_id} changed concurrently (revision {revision}, expected {expected_revision})"
            )));
        }
        *revision += 1;
        // The whole vector is swapped under one write lock: no partial set
        // is ever observable.
        inner.boq_items.insert(estimate_id, items);
        Ok(())
    }

    async fn last_estimate_number(&self, organization_id: Uuid) -> CoreResult<Option<String>> {
        Ok(self
            .inner
            .read()
            .numbers
            .get(&organization_id)
            .and_then(|v| v.last().cloned()))
    }

    async fn reserve_estimate_number(
        &self,
        organization_id: Uuid,
        number: &str,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let key = (organization_id, number.to_string());
        if inner.numbers_taken.contains(&key) {
            return Err(CoreError::conflict(format!(
                "estimate number {number} is already taken"
            )));
        }
        inner.numbers_taken.insert(key);
        inner
            .numbers
            .entry(organization_id)
            .or_default()
            .push(number.to_string());
        Ok(())
    }
}

//! End-to-end estimation flows against the in-memory store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use costbook::config::EstimateDefaults;
use costbook::domain::{
    AddComponentRequest, BoqItemInput, ComponentKind, CreateAssemblyRequest,
    CreateEstimateRequest, Equipment, EstimateStatus, LaborType, Material, RateType,
    DEFAULT_MARKUP_PERCENT,
};
use costbook::services::{costing, estimates, numbering, rollup};
use costbook::store::{AssemblyStore, EstimateStore, MemoryStore};

fn material(organization_id: Uuid, name: &str, ncr_price: f64) -> Material {
    Material {
        id: Uuid::new_v4(),
        organization_id,
        code: None,
        name: name.to_string(),
        unit: "bag".to_string(),
        ncr_price,
        category: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn labor(organization_id: Uuid, trade: &str, daily_rate: f64) -> LaborType {
    LaborType {
        id: Uuid::new_v4(),
        organization_id,
        trade: trade.to_string(),
        daily_rate,
        skill_level: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn equipment(organization_id: Uuid, name: &str, rate: f64, rate_type: RateType) -> Equipment {
    Equipment {
        id: Uuid::new_v4(),
        organization_id,
        code: None,
        name: name.to_string(),
        rate_type,
        rate,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn assembly_request(name: &str) -> CreateAssemblyRequest {
    CreateAssemblyRequest {
        code: Some("ASM-001".to_string()),
        name: name.to_string(),
        unit: "sqm".to_string(),
        description: None,
        category: None,
    }
}

fn component_request(
    kind: ComponentKind,
    ref_id: Uuid,
    qty: f64,
    wastage_factor: f64,
) -> AddComponentRequest {
    AddComponentRequest {
        kind,
        ref_id,
        qty,
        wastage_factor,
        remarks: None,
    }
}

fn boq_input(description: &str, qty: f64, unit_price: f64) -> BoqItemInput {
    BoqItemInput {
        item_number: None,
        section: None,
        trade: None,
        description: description.to_string(),
        unit: "lot".to_string(),
        qty,
        assembly_id: None,
        unit_price,
        material_cost: 0.0,
        labor_cost: 0.0,
        equipment_cost: 0.0,
        markup_percent: DEFAULT_MARKUP_PERCENT,
        sort_order: None,
    }
}

fn create_request(project_name: &str) -> CreateEstimateRequest {
    CreateEstimateRequest {
        project_name: project_name.to_string(),
        project_id: None,
        client_name: None,
        floor_area: None,
        location: None,
        ocm: None,
        vat_rate: None,
        notes: None,
    }
}

/// Store seeded with one assembly: cement w/ wastage, mason labor, and a
/// monthly-rated crane.
async fn seed_costing_fixture(store: &MemoryStore, organization_id: Uuid) -> Uuid {
    let cement = material(organization_id, "Portland Cement 40kg", 100.0);
    let mason = labor(organization_id, "Mason", 800.0);
    let crane = equipment(organization_id, "Tower Crane", 26_000.0, RateType::Monthly);

    let asm = store
        .create_assembly(organization_id, assembly_request("CHB Wall Laying"))
        .await
        .unwrap();
    let assembly_id = asm.id;
    store
        .add_component(
            assembly_id,
            component_request(ComponentKind::Material, cement.id, 10.0, 5.0),
        )
        .await
        .unwrap();
    store
        .add_component(
            assembly_id,
            component_request(ComponentKind::Labor, mason.id, 2.0, 0.0),
        )
        .await
        .unwrap();
    store
        .add_component(
            assembly_id,
            component_request(ComponentKind::Equipment, crane.id, 2.0, 0.0),
        )
        .await
        .unwrap();

    store.seed_material(cement);
    store.seed_labor_type(mason);
    store.seed_equipment(crane);

    assembly_id
}

#[tokio::test]
async fn standard_costing_applies_wastage_to_materials_only() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let assembly_id = seed_costing_fixture(&store, organization_id).await;

    let priced = costing::price_assembly(&store, assembly_id).await.unwrap();

    // Material: 100 * 10 * 1.05; labor: 800 * 2 mandays; equipment:
    // 26000 * 2 with no monthly conversion at this call site.
    assert_eq!(priced.material_cost, 1_050.0);
    assert_eq!(priced.labor_cost, 1_600.0);
    assert_eq!(priced.equipment_cost, 52_000.0);
    assert_eq!(priced.unit_price, 54_650.0);
    assert!(priced.is_complete());
}

#[tokio::test]
async fn breakdown_subtotals_reconstruct_unit_price_exactly() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let assembly_id = seed_costing_fixture(&store, organization_id).await;

    let priced = costing::price_assembly(&store, assembly_id).await.unwrap();
    let breakdown = priced.breakdown();

    assert_eq!(
        breakdown.material_cost + breakdown.labor_cost + breakdown.equipment_cost,
        breakdown.total_cost
    );
    assert_eq!(breakdown.total_cost, priced.unit_price);
    assert_eq!(breakdown.materials.len(), 1);
    assert_eq!(breakdown.labor.len(), 1);
    assert_eq!(breakdown.equipment.len(), 1);

    let per_component: f64 = priced.components.iter().filter_map(|c| c.cost).sum();
    assert!((per_component - priced.unit_price).abs() < 1e-9);
}

#[tokio::test]
async fn boq_unit_price_uses_hourly_labor_and_daily_equivalent_equipment() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let assembly_id = seed_costing_fixture(&store, organization_id).await;

    let quote = costing::assembly_unit_price_for_boq(&store, assembly_id)
        .await
        .unwrap();

    // Material: 100 * 10 with no wastage; labor: (800/8) * 2 hourly;
    // equipment: (26000/26) * 2 daily equivalent.
    assert_eq!(quote.unit_price, 1_000.0 + 200.0 + 2_000.0);
    assert!(quote.unresolved.is_empty());
}

#[tokio::test]
async fn unresolved_components_are_skipped_and_reported() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();

    let cement = material(organization_id, "Portland Cement 40kg", 255.0);
    let asm = store
        .create_assembly(organization_id, assembly_request("Slab on Grade"))
        .await
        .unwrap();
    let assembly_id = asm.id;
    store
        .add_component(
            assembly_id,
            component_request(ComponentKind::Material, cement.id, 4.0, 0.0),
        )
        .await
        .unwrap();
    let dangling = store
        .add_component(
            assembly_id,
            component_request(ComponentKind::Labor, Uuid::new_v4(), 1.0, 0.0),
        )
        .await
        .unwrap();
    store.seed_material(cement);

    let priced = costing::price_assembly(&store, assembly_id).await.unwrap();

    assert_eq!(priced.unit_price, 1_020.0);
    assert!(!priced.is_complete());
    assert_eq!(priced.unresolved, vec![dangling.id]);
    // The dangling component is still listed, just unpriced.
    assert_eq!(priced.components.len(), 2);
}

#[tokio::test]
async fn pricing_a_missing_assembly_is_not_found() {
    let store = MemoryStore::new();
    let err = costing::price_assembly(&store, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn replace_all_derives_amounts_and_persists_cascade_totals() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let estimate = estimates::create_estimate(
        &store,
        &EstimateDefaults::default(),
        organization_id,
        create_request("Two-Storey Residence"),
    )
    .await
    .unwrap();

    let items = rollup::replace_items(
        &store,
        estimate.id,
        &[
            boq_input("Earthworks", 1.0, 60_000.0),
            boq_input("Concreting", 2.0, 20_000.0),
        ],
    )
    .await
    .unwrap();

    assert_eq!(items[0].amount, 60_000.0);
    assert_eq!(items[1].amount, 40_000.0);
    assert_eq!(rollup::direct_cost(&items), 100_000.0);

    // OCM 5/5/3, profit 10 on subtotal, VAT 12 exclusive.
    let stored = store.find_estimate(estimate.id).await.unwrap().unwrap();
    assert_eq!(stored.subtotal, 113_000.0);
    assert_eq!(stored.total_amount, 139_216.0);
}

#[tokio::test]
async fn replace_all_rejects_invalid_rows_without_touching_existing_items() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let estimate = estimates::create_estimate(
        &store,
        &EstimateDefaults::default(),
        organization_id,
        create_request("Warehouse"),
    )
    .await
    .unwrap();

    rollup::replace_items(&store, estimate.id, &[boq_input("Mobilization", 1.0, 5_000.0)])
        .await
        .unwrap();

    let mut bad = boq_input("Demobilization", 1.0, 5_000.0);
    bad.qty = -1.0;
    let err = rollup::replace_items(
        &store,
        estimate.id,
        &[boq_input("Site clearing", 1.0, 2_000.0), bad],
    )
    .await
    .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    // Previous set intact: no partial application.
    let items = store.list_boq_items(estimate.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].description, "Mobilization");
}

#[tokio::test]
async fn concurrent_replace_on_the_same_estimate_conflicts() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let estimate = estimates::create_estimate(
        &store,
        &EstimateDefaults::default(),
        organization_id,
        create_request("Clubhouse"),
    )
    .await
    .unwrap();

    let stale_revision = store.boq_revision(estimate.id).await.unwrap();

    rollup::replace_items(&store, estimate.id, &[boq_input("Painting", 1.0, 8_000.0)])
        .await
        .unwrap();

    // A writer still holding the old revision must get a conflict, not a
    // silent overwrite.
    let now = Utc::now();
    let late_items = vec![rollup::build_item(
        estimate.id,
        &boq_input("Roofing", 1.0, 9_000.0),
        now,
    )
    .unwrap()];
    let err = store
        .replace_boq_items(estimate.id, stale_revision, late_items)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn assembly_backed_rows_take_price_and_breakdown_from_the_assembly() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let assembly_id = seed_costing_fixture(&store, organization_id).await;

    let mut inputs = vec![boq_input("", 3.0, 0.0)];
    inputs[0].assembly_id = Some(assembly_id);
    rollup::price_inputs_from_assemblies(&store, &mut inputs)
        .await
        .unwrap();

    assert_eq!(inputs[0].unit_price, 54_650.0);
    assert_eq!(inputs[0].material_cost, 1_050.0);
    assert_eq!(inputs[0].labor_cost, 1_600.0);
    assert_eq!(inputs[0].equipment_cost, 52_000.0);
    assert_eq!(inputs[0].unit, "sqm");
    assert_eq!(inputs[0].description, "CHB Wall Laying");
}

#[tokio::test]
async fn estimate_numbers_continue_within_a_period_and_reset_across() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();

    let january = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();
    let february = Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0).unwrap();

    let first = numbering::reserve_number(&store, organization_id, january)
        .await
        .unwrap();
    let second = numbering::reserve_number(&store, organization_id, january)
        .await
        .unwrap();
    let third = numbering::reserve_number(&store, organization_id, february)
        .await
        .unwrap();

    assert_eq!(first, "EST-202501-0001");
    assert_eq!(second, "EST-202501-0002");
    assert_eq!(third, "EST-202502-0001");
}

#[tokio::test]
async fn numbering_is_scoped_per_organization() {
    let store = MemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0).unwrap();

    let a = numbering::reserve_number(&store, Uuid::new_v4(), now)
        .await
        .unwrap();
    let b = numbering::reserve_number(&store, Uuid::new_v4(), now)
        .await
        .unwrap();

    assert_eq!(a, "EST-202501-0001");
    assert_eq!(b, "EST-202501-0001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creation_never_duplicates_numbers() {
    let store = Arc::new(MemoryStore::new());
    let organization_id = Uuid::new_v4();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            estimates::create_estimate(
                store.as_ref(),
                &EstimateDefaults::default(),
                organization_id,
                create_request(&format!("Project {i}")),
            )
            .await
            .unwrap()
            .estimate_number
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 10, "duplicate estimate numbers were issued");
}

#[tokio::test]
async fn estimate_creation_applies_configured_defaults() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();

    let estimate = estimates::create_estimate(
        &store,
        &EstimateDefaults::default(),
        organization_id,
        create_request("Bungalow"),
    )
    .await
    .unwrap();

    assert_eq!(estimate.ocm.overhead, 5.0);
    assert_eq!(estimate.ocm.contingency, 5.0);
    assert_eq!(estimate.ocm.misc, 3.0);
    assert_eq!(estimate.ocm.profit, 10.0);
    assert_eq!(estimate.vat_rate, 12.0);
    assert_eq!(estimate.status, EstimateStatus::Draft);
    assert_eq!(estimate.version, 1);
    assert_eq!(estimate.subtotal, 0.0);
    assert_eq!(estimate.total_amount, 0.0);
}

#[tokio::test]
async fn referenced_assemblies_cannot_be_hard_deleted() {
    let store = MemoryStore::new();
    let organization_id = Uuid::new_v4();
    let assembly_id = seed_costing_fixture(&store, organization_id).await;

    let estimate = estimates::create_estimate(
        &store,
        &EstimateDefaults::default(),
        organization_id,
        create_request("Perimeter Fence"),
    )
    .await
    .unwrap();

    let mut inputs = vec![boq_input("Wall laying", 5.0, 0.0)];
    inputs[0].assembly_id = Some(assembly_id);
    rollup::price_inputs_from_assemblies(&store, &mut inputs)
        .await
        .unwrap();
    rollup::replace_items(&store, estimate.id, &inputs).await.unwrap();

    let err = store.delete_assembly(assembly_id).await.unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");

    // Soft delete still works and hides it from the active listing.
    store.deactivate_assembly(assembly_id).await.unwrap();
    let listed = store.list_assemblies(organization_id).await.unwrap();
    assert!(listed.is_empty());
    assert!(store.find_assembly(assembly_id).await.unwrap().is_some());
}

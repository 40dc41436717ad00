//! End-to-end scenarios across the registry, LCA engine, scope aggregator,
//! classifier and persistence.

use carbon_core::calculations::lca::compute_material_lca;
use carbon_core::calculations::{aggregate_project_lca, CrossCheckPolicy, MaterialEntry, Scope};
use carbon_core::compliance::{classify, ClassificationInput, NccTier, Outcome, ProjectType, Standard};
use carbon_core::narrative::{NarrativeWriter, TemplateNarrative};
use carbon_core::registry::{
    EmissionFactorRegistry, EquipmentKey, FactorSource, MaterialCategory, MaterialUnit, TransportMode,
    WasteMethod,
};
use carbon_core::store::{FileSnapshotStore, SnapshotStore};
use carbon_core::units::{KgCo2e, SquareMeters};
use carbon_core::{Advisory, CalcError, Project, ScopeAggregator};

fn registry() -> &'static EmissionFactorRegistry {
    EmissionFactorRegistry::builtin()
}

fn classification(intensity: f64, project_type: ProjectType) -> ClassificationInput {
    ClassificationInput {
        carbon_intensity: intensity,
        project_type,
        floor_area: SquareMeters(1_000.0),
        total_carbon: KgCo2e(intensity * 1_000.0),
        company_size: None,
        recycled_content_pct: None,
    }
}

#[test]
fn concrete_product_stage_split() {
    let entry = MaterialEntry::new(MaterialCategory::Concrete, "concrete-32mpa", 100.0, MaterialUnit::CubicMeter);
    let factor = registry().material(MaterialCategory::Concrete, "concrete-32mpa").unwrap();

    let result = compute_material_lca(&entry, &factor, 60.0).unwrap();
    assert_eq!(result.product_stage_total.0, 31_000.0);
    assert!((result.a1a3_total.0 - 27_900.0).abs() < 1e-6);
    assert!((result.a1.0 + result.a2.0 + result.a3.0 - result.a1a3_total.0).abs() < 1e-6);
}

#[test]
fn replacement_cycles_follow_design_life() {
    let concrete = MaterialEntry::new(MaterialCategory::Concrete, "concrete-32mpa", 10.0, MaterialUnit::CubicMeter);
    let glass = MaterialEntry::new(MaterialCategory::Glass, "glass-float", 10.0, MaterialUnit::SquareMeter);

    let lca = aggregate_project_lca(&[concrete, glass], registry(), 50.0, CrossCheckPolicy::Fail).unwrap();
    assert_eq!(lca.materials[0].replacement_cycles, 0);
    assert_eq!(lca.materials[1].replacement_cycles, 1);
}

#[test]
fn electric_plant_is_rejected_from_scope_one() {
    let mut session = ScopeAggregator::new(registry());
    let crane = EquipmentKey::nested("lifting", "crane", "tower-crane");

    let err = session.add_equipment(&crane, 8.0, None).unwrap_err();
    assert!(matches!(err, CalcError::WrongScope { expected_scope: 2, .. }));
    assert!(session.is_empty());

    session.add_electric_equipment(&crane, 8.0, "nsw").unwrap();
    assert_eq!(session.entries_in(Scope::Scope2).len(), 1);
}

#[test]
fn zero_intensity_gets_best_result_everywhere() {
    for project_type in ProjectType::ALL {
        let reports = classify(&classification(0.0, project_type));
        for report in &reports {
            match &report.outcome {
                Outcome::CodeTier { tier } => assert_eq!(*tier, NccTier::Excellent),
                Outcome::Stars { rating } => assert_eq!(rating.stars(), 6.0),
                Outcome::Points { breakdown } => assert_eq!(breakdown.star_tier, Some(6)),
                Outcome::Disclosure { assessment } => assert!(!assessment.reporting_required),
            }
            assert!(report.compliant, "{} failed", report.standard);
        }
    }
}

#[test]
fn classification_is_repeatable() {
    let input = classification(733.3, ProjectType::Residential);
    assert_eq!(classify(&input), classify(&input));
}

#[test]
fn project_lifecycle_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::open(dir.path(), "assessor@example.com").unwrap();

    let mut project = Project::new("Warehouse 7", "26-031", "Assessor");
    project.settings.project_type = ProjectType::Industrial;
    project.settings.floor_area = SquareMeters(3_000.0);
    project.add_material(MaterialEntry::new(
        MaterialCategory::Concrete,
        "concrete-40mpa",
        900.0,
        MaterialUnit::CubicMeter,
    ));
    project.add_material(MaterialEntry::new(MaterialCategory::Steel, "steel-structural", 120.0, MaterialUnit::Tonne));

    let mut session = project.session(registry());
    session
        .add_equipment(&EquipmentKey::nested("earthmoving", "excavator", "20t"), 300.0, None)
        .unwrap();
    session.add_transport_leg(TransportMode::RoadArticulated, 180.0, 2_000.0).unwrap();
    session.add_waste_stream(WasteMethod::Recycled, 40.0, "").unwrap();
    project.store_session(&session);

    project.refresh_totals(registry(), CrossCheckPolicy::Flag).unwrap();
    store.save(&project).unwrap();

    let loaded = store.load(&project.meta.id).unwrap();
    assert_eq!(loaded, project);

    let totals = loaded.totals.as_ref().unwrap();
    assert!(totals.lca.is_complete());
    assert!(totals.emissions.scope1.total.0 > 0.0);
    assert!(totals.compliance.report_for(Standard::Nabers).is_some());
    assert!(totals.waste_diversion.unwrap().meets_target);
    assert!(totals.advisories.is_empty());

    let text = TemplateNarrative.narrate(&totals.compliance);
    assert!(text.starts_with("# Warehouse 7"));
}

#[test]
fn purchased_material_already_in_bill_is_flagged() {
    let mut project = Project::new("Podium", "26-077", "Assessor");
    project.settings.floor_area = SquareMeters(800.0);
    let rebar = MaterialEntry::new(MaterialCategory::Steel, "steel-rebar", 30.0, MaterialUnit::Tonne);
    project.add_material(rebar.clone());

    let mut session = project.session(registry());
    session.add_material(&rebar).unwrap();
    session.add_waste_stream(WasteMethod::Landfill, 10.0, "Mixed skip").unwrap();
    project.store_session(&session);

    let totals = project.evaluate(registry(), CrossCheckPolicy::Fail).unwrap();
    assert_eq!(totals.waste_diversion.unwrap().diversion_pct, 0.0);
    assert!(matches!(totals.advisories[0], Advisory::WasteDiversionBelowTarget { .. }));
    assert!(matches!(
        &totals.advisories[1],
        Advisory::DoubleCounted { material_id, .. } if material_id == "steel-rebar"
    ));
    assert_eq!(totals.advisories.len(), 2);
}

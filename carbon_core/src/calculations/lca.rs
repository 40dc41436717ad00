//! # Embodied Carbon (LCA)
//!
//! Life-cycle assessment of construction materials across EN 15978
//! stages A1-D. One [`MaterialEntry`] plus its [`MaterialFactor`] gives
//! one [`LcaResult`]; [`aggregate_project_lca`] folds a whole bill of
//! materials, resolving factors through any [`FactorSource`].
//!
//! ## Stage Model
//!
//! With `P = embodied_carbon_per_unit × quantity`:
//!
//! - A1/A2/A3: 40/10/50% of `P × product_stage_fraction`
//! - A4: `P × transport_to_site_fraction`
//! - A5: `P × install_fraction`
//! - B2-B5: see [`use_stage`](super::use_stage)
//! - C1-C4 and D: see [`end_of_life`](super::end_of_life)
//!
//! The 40/10/50 sub-split of A1-A3 is a fixed heuristic applied to every
//! category. It is not a sourced coefficient; treat a1/a2/a3 as
//! indicative and rely on `a1a3_total`.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::calculations::lca::{compute_material_lca, MaterialEntry};
//! use carbon_core::registry::{EmissionFactorRegistry, FactorSource, MaterialCategory, MaterialUnit};
//!
//! let registry = EmissionFactorRegistry::builtin();
//! let factor = registry.material(MaterialCategory::Concrete, "concrete-32mpa").unwrap();
//! let entry = MaterialEntry::new(MaterialCategory::Concrete, "concrete-32mpa", 100.0, MaterialUnit::CubicMeter);
//!
//! let result = compute_material_lca(&entry, &factor, 60.0).unwrap();
//! assert_eq!(result.product_stage_total.0, 31_000.0);
//! assert!((result.a1a3_total.0 - 27_900.0).abs() < 1e-6);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::registry::{lifecycle, FactorSource, MaterialCategory, MaterialFactor, MaterialUnit};
use crate::units::{KgCo2e, SquareMeters};

use super::end_of_life::{compute_end_of_life, compute_stage_d};
use super::use_stage::{compute_use_stage, UseStageBasis};

/// A1 (raw material supply) share of the product stage
pub const A1_SHARE: f64 = 0.40;
/// A2 (transport to factory) share of the product stage
pub const A2_SHARE: f64 = 0.10;
/// A3 (manufacturing) share of the product stage
pub const A3_SHARE: f64 = 0.50;

// ============================================================================
// Input
// ============================================================================

/// One line of a project's bill of materials.
///
/// ## JSON Example
///
/// ```json
/// {
///   "category": "steel",
///   "material_id": "steel-rebar",
///   "quantity": 42.5,
///   "unit": "t"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub category: MaterialCategory,
    pub material_id: String,
    /// Quantity in `unit`; must be positive
    pub quantity: f64,
    /// Must match the factor's declared unit
    pub unit: MaterialUnit,
}

impl MaterialEntry {
    pub fn new(
        category: MaterialCategory,
        material_id: impl Into<String>,
        quantity: f64,
        unit: MaterialUnit,
    ) -> Self {
        MaterialEntry {
            category,
            material_id: material_id.into(),
            quantity,
            unit,
        }
    }

    /// Validate the entry on its own and against its factor.
    pub fn validate_against(&self, factor: &MaterialFactor) -> CalcResult<()> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(CalcError::invalid_input(
                "quantity",
                self.quantity.to_string(),
                "Quantity must be a positive number",
            ));
        }
        if self.category != factor.category {
            return Err(CalcError::invalid_input(
                "category",
                self.category.code(),
                format!("{} belongs to {}", factor.qualified_id(), factor.category.code()),
            ));
        }
        if self.unit != factor.unit {
            return Err(CalcError::invalid_input(
                "unit",
                self.unit.symbol(),
                format!(
                    "{} is declared per {}; convert the quantity before entry",
                    factor.qualified_id(),
                    factor.unit.symbol()
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Result
// ============================================================================

/// Stage-by-stage life-cycle result for one material (kg CO2-e).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcaResult {
    pub entry: MaterialEntry,
    pub material_name: String,

    /// `embodied_carbon_per_unit × quantity`
    pub product_stage_total: KgCo2e,

    pub a1: KgCo2e,
    pub a2: KgCo2e,
    pub a3: KgCo2e,
    pub a4: KgCo2e,
    pub a5: KgCo2e,
    pub b2: KgCo2e,
    pub b3: KgCo2e,
    pub b4: KgCo2e,
    pub b5: KgCo2e,
    pub c1: KgCo2e,
    pub c2: KgCo2e,
    pub c3: KgCo2e,
    pub c4: KgCo2e,
    pub d: KgCo2e,

    pub a1a3_total: KgCo2e,
    pub a4a5_total: KgCo2e,
    /// B2 + B3 + B4 + B5 (B1, B6, B7 not modelled)
    pub b1b7_total: KgCo2e,
    pub c1c4_total: KgCo2e,

    /// A1-A5
    pub embodied_carbon: KgCo2e,
    /// A-C
    pub whole_life_carbon: KgCo2e,
    /// A-D
    pub net_carbon: KgCo2e,

    pub replacement_cycles: u32,
    pub use_stage_basis: UseStageBasis,
}

/// Product-stage (A1-A3) carbon only, for callers that account the
/// material as a purchased good rather than over its life.
pub fn product_stage_carbon(entry: &MaterialEntry, factor: &MaterialFactor) -> CalcResult<KgCo2e> {
    entry.validate_against(factor)?;
    factor.life_cycle_split.check(&factor.qualified_id())?;
    Ok(KgCo2e(factor.embodied_carbon_per_unit * entry.quantity)
        * factor.life_cycle_split.product_stage_fraction)
}

/// Compute A1-D for one material.
///
/// # Errors
///
/// - `InvalidInput` for a non-positive quantity, a category or unit
///   mismatch with the factor, or a non-finite design life
/// - `CrossCheckFailure` when the factor's split does not sum to one
pub fn compute_material_lca(
    entry: &MaterialEntry,
    factor: &MaterialFactor,
    design_life_years: f64,
) -> CalcResult<LcaResult> {
    entry.validate_against(factor)?;
    if !design_life_years.is_finite() {
        return Err(CalcError::invalid_input(
            "design_life_years",
            design_life_years.to_string(),
            "Design life must be a finite number of years",
        ));
    }
    let split = factor.life_cycle_split;
    split.check(&factor.qualified_id())?;

    let product = KgCo2e(factor.embodied_carbon_per_unit * entry.quantity);

    // Product stage (A1-A3)
    let a1a3_total = product * split.product_stage_fraction;
    let a1 = a1a3_total * A1_SHARE;
    let a2 = a1a3_total * A2_SHARE;
    let a3 = a1a3_total * A3_SHARE;

    // Construction process (A4-A5)
    let a4 = product * split.transport_to_site_fraction;
    let a5 = product * split.install_fraction;
    let a4a5_total = a4 + a5;

    let use_stage = compute_use_stage(factor.category, product, design_life_years);
    let end_of_life = compute_end_of_life(factor.category, product);
    let d = compute_stage_d(factor.category, product);

    let embodied_carbon = a1a3_total + a4a5_total;
    let b1b7_total = use_stage.total();
    let c1c4_total = end_of_life.total();
    let whole_life_carbon = embodied_carbon + b1b7_total + c1c4_total;
    let net_carbon = whole_life_carbon + d;

    tracing::debug!(
        material = %factor.qualified_id(),
        quantity = entry.quantity,
        embodied_kg = embodied_carbon.0,
        whole_life_kg = whole_life_carbon.0,
        "computed material LCA"
    );

    Ok(LcaResult {
        entry: entry.clone(),
        material_name: factor.name.clone(),
        product_stage_total: product,
        a1,
        a2,
        a3,
        a4,
        a5,
        b2: use_stage.b2,
        b3: use_stage.b3,
        b4: use_stage.b4,
        b5: use_stage.b5,
        c1: end_of_life.c1,
        c2: end_of_life.c2,
        c3: end_of_life.c3,
        c4: end_of_life.c4,
        d,
        a1a3_total,
        a4a5_total,
        b1b7_total,
        c1c4_total,
        embodied_carbon,
        whole_life_carbon,
        net_carbon,
        replacement_cycles: use_stage.replacement_cycles,
        use_stage_basis: use_stage.basis,
    })
}

// ============================================================================
// Project aggregation
// ============================================================================

/// What to do with a material whose reference data fails a cross-check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossCheckPolicy {
    /// Abort the aggregation
    Fail,
    /// Log, skip the material and list it in `flagged`
    #[default]
    Flag,
}

impl CrossCheckPolicy {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail" | "abort" => Ok(CrossCheckPolicy::Fail),
            "flag" | "skip" => Ok(CrossCheckPolicy::Flag),
            _ => Err(CalcError::invalid_input(
                "cross_check",
                s,
                "Expected 'fail' or 'flag'",
            )),
        }
    }
}

/// A material left out of the totals because its data failed a cross-check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedMaterial {
    pub entry_index: usize,
    pub material_id: String,
    pub reason: CalcError,
}

/// Life-cycle totals for a bill of materials (kg CO2-e).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectLcaResult {
    pub design_life_years: f64,
    pub materials: Vec<LcaResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flagged: Vec<FlaggedMaterial>,

    pub a1a3_total: KgCo2e,
    pub a4a5_total: KgCo2e,
    pub b1b7_total: KgCo2e,
    pub c1c4_total: KgCo2e,
    pub d_total: KgCo2e,
    pub embodied_carbon: KgCo2e,
    pub whole_life_carbon: KgCo2e,
    pub net_carbon: KgCo2e,

    /// Embodied carbon (A1-A5) per category
    pub by_category: BTreeMap<MaterialCategory, KgCo2e>,
}

impl ProjectLcaResult {
    fn push(&mut self, result: LcaResult) {
        self.a1a3_total += result.a1a3_total;
        self.a4a5_total += result.a4a5_total;
        self.b1b7_total += result.b1b7_total;
        self.c1c4_total += result.c1c4_total;
        self.d_total += result.d;
        self.embodied_carbon += result.embodied_carbon;
        self.whole_life_carbon += result.whole_life_carbon;
        self.net_carbon += result.net_carbon;
        *self
            .by_category
            .entry(result.entry.category)
            .or_insert(KgCo2e(0.0)) += result.embodied_carbon;
        self.materials.push(result);
    }

    /// Recycled content of the whole bill, as a percentage, estimated from
    /// each category's typical content weighted by product-stage carbon.
    ///
    /// `None` when there is nothing to weight.
    pub fn estimated_recycled_content_pct(&self) -> Option<f64> {
        let (weighted, weight) = self.materials.iter().fold((0.0, 0.0), |(sum, w), m| {
            let mass = m.product_stage_total.0.abs();
            let content = lifecycle::typical_recycled_content(m.entry.category);
            (sum + mass * content, w + mass)
        });
        if weight > 0.0 {
            Some(weighted / weight * 100.0)
        } else {
            None
        }
    }

    /// True when every entry made it into the totals
    pub fn is_complete(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Compute life-cycle totals for a bill of materials.
///
/// A missing factor or an invalid entry aborts the whole aggregation (a
/// partial total would understate the project); the error names the
/// failing entry. Cross-check failures follow `policy`.
pub fn aggregate_project_lca(
    entries: &[MaterialEntry],
    source: &dyn FactorSource,
    design_life_years: f64,
    policy: CrossCheckPolicy,
) -> CalcResult<ProjectLcaResult> {
    let mut project = ProjectLcaResult {
        design_life_years,
        ..ProjectLcaResult::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        let factor = source
            .material(entry.category, &entry.material_id)
            .map_err(|e| e.for_material_entry(index, &entry.material_id))?;

        match compute_material_lca(entry, &factor, design_life_years) {
            Ok(result) => project.push(result),
            Err(e @ CalcError::CrossCheckFailure { .. }) if policy == CrossCheckPolicy::Flag => {
                tracing::error!(
                    entry_index = index,
                    material = %entry.material_id,
                    error = %e,
                    "reference data failed cross-check; material excluded from totals"
                );
                project.flagged.push(FlaggedMaterial {
                    entry_index: index,
                    material_id: entry.material_id.clone(),
                    reason: e,
                });
            }
            Err(e) => return Err(e.for_material_entry(index, &entry.material_id)),
        }
    }

    tracing::debug!(
        materials = project.materials.len(),
        flagged = project.flagged.len(),
        embodied_kg = project.embodied_carbon.0,
        "aggregated project LCA"
    );
    Ok(project)
}

/// Carbon intensity in kg CO2-e per m² of floor area.
pub fn carbon_intensity(total: KgCo2e, floor_area: SquareMeters) -> CalcResult<f64> {
    if !floor_area.0.is_finite() || floor_area.0 <= 0.0 {
        return Err(CalcError::invalid_input(
            "floor_area",
            floor_area.0.to_string(),
            "Floor area must be positive",
        ));
    }
    if !total.0.is_finite() {
        return Err(CalcError::invalid_input(
            "total_carbon",
            total.0.to_string(),
            "Total carbon must be finite",
        ));
    }
    Ok(total.0 / floor_area.0)
}

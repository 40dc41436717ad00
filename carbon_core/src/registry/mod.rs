//! # Emission Factor Registry
//!
//! Immutable reference data consumed by the LCA engine and the scope
//! aggregator. Every factor is addressed by a [`FactorKey`]
//! (`kind`, optional `category`, optional `subcategory`, `id`) and served
//! through the [`FactorSource`] trait, so the built-in tables and an
//! external materials catalog answer the same `lookup` contract.
//!
//! ## Data Domains
//!
//! | Kind            | Value                                | Module        |
//! |-----------------|--------------------------------------|---------------|
//! | material        | kg CO2-e per unit + A1-A5 split      | [`materials`] |
//! | fuel            | kg CO2-e per L / kg / m³             | [`energy`]    |
//! | equipment       | fuel or kWh per operating hour       | [`energy`]    |
//! | vehicle         | fuel or kWh per km                   | [`energy`]    |
//! | refrigerant     | GWP100                               | [`energy`]    |
//! | grid            | kg CO2-e per kWh, per region         | [`energy`]    |
//! | site facility   | kWh per day                          | [`energy`]    |
//! | transport       | kg CO2-e per tonne-km                | [`logistics`] |
//! | waste           | kg CO2-e per tonne                   | [`logistics`] |
//! | water           | kg CO2-e per kL                      | [`logistics`] |
//! | commuting       | kg CO2-e per passenger-km            | [`logistics`] |
//! | temporary works | kg CO2-e per m², amortized per use   | [`logistics`] |
//!
//! Stage B/C/D assumptions per material category live in [`lifecycle`].
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::registry::{EmissionFactorRegistry, FactorSource, MaterialCategory};
//!
//! let registry = EmissionFactorRegistry::builtin();
//! let concrete = registry.material(MaterialCategory::Concrete, "concrete-32mpa").unwrap();
//! assert_eq!(concrete.embodied_carbon_per_unit, 310.0);
//!
//! assert!(registry.grid("atlantis").is_err());
//! ```

pub mod energy;
pub mod lifecycle;
pub mod logistics;
pub mod materials;

pub use energy::{ConsumptionRate, Fuel, FuelBasis, FuelFactor};
pub use lifecycle::{CycleYears, RecyclingProfile};
pub use logistics::{CommuteMode, TemporaryWorksFactor, TransportMode, WasteMethod, WaterSource};
pub use materials::{LifeCycleSplit, MaterialCategory, MaterialFactor, MaterialUnit};

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Keys
// ============================================================================

/// Reference-data domain of a factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Material,
    Fuel,
    Equipment,
    Vehicle,
    Refrigerant,
    Grid,
    SiteFacility,
    Transport,
    Waste,
    Water,
    Commuting,
    TemporaryWorks,
}

impl FactorKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FactorKind::Material => "material",
            FactorKind::Fuel => "fuel",
            FactorKind::Equipment => "equipment",
            FactorKind::Vehicle => "vehicle",
            FactorKind::Refrigerant => "refrigerant",
            FactorKind::Grid => "electricity region",
            FactorKind::SiteFacility => "site facility",
            FactorKind::Transport => "transport mode",
            FactorKind::Waste => "waste method",
            FactorKind::Water => "water source",
            FactorKind::Commuting => "commute mode",
            FactorKind::TemporaryWorks => "temporary works",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Address of one factor in a [`FactorSource`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactorKey {
    pub kind: FactorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub id: String,
}

impl FactorKey {
    /// Key for a flat table (no category level)
    pub fn flat(kind: FactorKind, id: &str) -> Self {
        FactorKey {
            kind,
            category: None,
            subcategory: None,
            id: normalize(id),
        }
    }

    pub fn material(category: MaterialCategory, id: &str) -> Self {
        FactorKey {
            kind: FactorKind::Material,
            category: Some(category.code().to_string()),
            subcategory: None,
            id: normalize(id),
        }
    }

    pub fn equipment(key: &EquipmentKey) -> Self {
        FactorKey {
            kind: FactorKind::Equipment,
            category: Some(normalize(&key.category)),
            subcategory: key.subcategory.as_deref().map(normalize),
            id: normalize(&key.equipment_type),
        }
    }

    /// `category/subcategory/id` path for messages
    pub fn path(&self) -> String {
        [self.category.as_deref(), self.subcategory.as_deref(), Some(self.id.as_str())]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("/")
    }

    fn not_found(&self) -> CalcError {
        CalcError::factor_not_found(self.kind.display_name(), self.path())
    }
}

impl fmt::Display for FactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.path())
    }
}

/// Plant item address: category → optional subcategory → type.
///
/// Flat classes (e.g. `generators`) leave `subcategory` empty; nested
/// classes (e.g. `earthmoving/excavator`) must name it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentKey {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub equipment_type: String,
}

impl EquipmentKey {
    pub fn flat(category: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        EquipmentKey {
            category: category.into(),
            subcategory: None,
            equipment_type: equipment_type.into(),
        }
    }

    pub fn nested(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        equipment_type: impl Into<String>,
    ) -> Self {
        EquipmentKey {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            equipment_type: equipment_type.into(),
        }
    }

    /// Parse `category/type` or `category/subcategory/type`
    pub fn parse(path: &str) -> CalcResult<Self> {
        let parts: Vec<&str> = path.split('/').map(str::trim).collect();
        match parts.as_slice() {
            [category, ty] if !category.is_empty() && !ty.is_empty() => {
                Ok(EquipmentKey::flat(*category, *ty))
            }
            [category, sub, ty] if !category.is_empty() && !sub.is_empty() && !ty.is_empty() => {
                Ok(EquipmentKey::nested(*category, *sub, *ty))
            }
            _ => Err(CalcError::invalid_input(
                "equipment",
                path,
                "Expected 'category/type' or 'category/subcategory/type'",
            )),
        }
    }
}

impl fmt::Display for EquipmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcategory {
            Some(sub) => write!(f, "{}/{}/{}", self.category, sub, self.equipment_type),
            None => write!(f, "{}/{}", self.category, self.equipment_type),
        }
    }
}

// ============================================================================
// Factors
// ============================================================================

/// A reference value returned by a lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "factor", rename_all = "snake_case")]
pub enum Factor {
    Material(MaterialFactor),
    Fuel(FuelFactor),
    Equipment(ConsumptionRate),
    Vehicle(ConsumptionRate),
    /// Global warming potential
    Refrigerant(f64),
    /// kg CO2-e per kWh
    Grid(f64),
    /// kWh per day
    SiteFacility(f64),
    /// kg CO2-e per tonne-km
    Transport(f64),
    /// kg CO2-e per tonne
    Waste(f64),
    /// kg CO2-e per kL
    Water(f64),
    /// kg CO2-e per passenger-km
    Commuting(f64),
    TemporaryWorks(TemporaryWorksFactor),
}

/// Extracts one `Factor` variant or reports the key as not found.
macro_rules! expect_factor {
    ($source:expr, $key:expr, $variant:ident) => {{
        let key = $key;
        match $source.lookup(&key) {
            Some(Factor::$variant(value)) => Ok(value),
            _ => Err(key.not_found()),
        }
    }};
}

/// Anything that can answer factor lookups.
///
/// Implementors only provide [`lookup`](FactorSource::lookup); the typed
/// accessors turn a miss into [`CalcError::FactorNotFound`] so no caller
/// ever sees a silent zero.
pub trait FactorSource: Send + Sync {
    /// Raw lookup; `None` when the key is unknown to this source
    fn lookup(&self, key: &FactorKey) -> Option<Factor>;

    fn material(&self, category: MaterialCategory, id: &str) -> CalcResult<MaterialFactor> {
        expect_factor!(self, FactorKey::material(category, id), Material)
    }

    fn fuel(&self, fuel: Fuel) -> CalcResult<FuelFactor> {
        expect_factor!(self, FactorKey::flat(FactorKind::Fuel, fuel.code()), Fuel)
    }

    fn equipment(&self, key: &EquipmentKey) -> CalcResult<ConsumptionRate> {
        expect_factor!(self, FactorKey::equipment(key), Equipment)
    }

    fn vehicle(&self, vehicle_type: &str) -> CalcResult<ConsumptionRate> {
        expect_factor!(self, FactorKey::flat(FactorKind::Vehicle, vehicle_type), Vehicle)
    }

    fn refrigerant_gwp(&self, gas: &str) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Refrigerant, gas), Refrigerant)
    }

    fn grid(&self, region: &str) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Grid, region), Grid)
    }

    fn site_facility(&self, facility: &str) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::SiteFacility, facility), SiteFacility)
    }

    fn transport(&self, mode: TransportMode) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Transport, mode.code()), Transport)
    }

    fn waste(&self, method: WasteMethod) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Waste, method.code()), Waste)
    }

    fn water(&self, source: WaterSource) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Water, source.code()), Water)
    }

    fn commuting(&self, mode: CommuteMode) -> CalcResult<f64> {
        expect_factor!(self, FactorKey::flat(FactorKind::Commuting, mode.code()), Commuting)
    }

    fn temporary_works(&self, system: &str) -> CalcResult<TemporaryWorksFactor> {
        expect_factor!(self, FactorKey::flat(FactorKind::TemporaryWorks, system), TemporaryWorks)
    }
}

impl<T: FactorSource + ?Sized> FactorSource for &T {
    fn lookup(&self, key: &FactorKey) -> Option<Factor> {
        (**self).lookup(key)
    }
}

// ============================================================================
// Built-in registry
// ============================================================================

static BUILTIN: Lazy<EmissionFactorRegistry> = Lazy::new(EmissionFactorRegistry::from_tables);

/// Read-only factor tables, indexed by key.
#[derive(Debug, Clone, Default)]
pub struct EmissionFactorRegistry {
    factors: BTreeMap<FactorKey, Factor>,
}

impl EmissionFactorRegistry {
    /// The process-wide built-in registry. Built once, never mutated.
    pub fn builtin() -> &'static EmissionFactorRegistry {
        &BUILTIN
    }

    fn from_tables() -> Self {
        let mut factors = BTreeMap::new();

        for row in materials::MATERIALS {
            factors.insert(
                FactorKey::material(row.category, row.id),
                Factor::Material(row.to_factor()),
            );
        }
        for fuel in energy::FUELS {
            factors.insert(FactorKey::flat(FactorKind::Fuel, fuel.fuel.code()), Factor::Fuel(*fuel));
        }
        for row in energy::EQUIPMENT {
            let key = match row.subcategory {
                Some(sub) => EquipmentKey::nested(row.category, sub, row.id),
                None => EquipmentKey::flat(row.category, row.id),
            };
            factors.insert(FactorKey::equipment(&key), Factor::Equipment(row.rate));
        }
        for (id, rate) in energy::VEHICLES {
            factors.insert(FactorKey::flat(FactorKind::Vehicle, id), Factor::Vehicle(*rate));
        }
        for (id, gwp) in energy::REFRIGERANTS {
            factors.insert(FactorKey::flat(FactorKind::Refrigerant, id), Factor::Refrigerant(*gwp));
        }
        for (id, intensity) in energy::GRID_REGIONS {
            factors.insert(FactorKey::flat(FactorKind::Grid, id), Factor::Grid(*intensity));
        }
        for (id, kwh) in energy::SITE_FACILITIES {
            factors.insert(FactorKey::flat(FactorKind::SiteFacility, id), Factor::SiteFacility(*kwh));
        }
        for (mode, value) in logistics::TRANSPORT {
            factors.insert(FactorKey::flat(FactorKind::Transport, mode.code()), Factor::Transport(*value));
        }
        for (method, value) in logistics::WASTE {
            factors.insert(FactorKey::flat(FactorKind::Waste, method.code()), Factor::Waste(*value));
        }
        for (source, value) in logistics::WATER {
            factors.insert(FactorKey::flat(FactorKind::Water, source.code()), Factor::Water(*value));
        }
        for (mode, value) in logistics::COMMUTING {
            factors.insert(FactorKey::flat(FactorKind::Commuting, mode.code()), Factor::Commuting(*value));
        }
        for (id, value) in logistics::TEMPORARY_WORKS {
            factors.insert(FactorKey::flat(FactorKind::TemporaryWorks, id), Factor::TemporaryWorks(*value));
        }

        EmissionFactorRegistry { factors }
    }

    /// Number of factors held
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// All factors in key order
    pub fn iter(&self) -> impl Iterator<Item = (&FactorKey, &Factor)> {
        self.factors.iter()
    }

    /// Factors of one kind, in key order
    pub fn of_kind(&self, kind: FactorKind) -> impl Iterator<Item = (&FactorKey, &Factor)> {
        self.factors.iter().filter(move |(k, _)| k.kind == kind)
    }

    /// Cross-check the reference data; returns every violation found.
    pub fn validate(&self) -> Vec<CalcError> {
        self.factors
            .iter()
            .filter_map(|(key, factor)| match factor {
                Factor::Material(m) => m.life_cycle_split.check(&key.path()).err(),
                _ => None,
            })
            .collect()
    }
}

impl FactorSource for EmissionFactorRegistry {
    fn lookup(&self, key: &FactorKey) -> Option<Factor> {
        self.factors.get(key).cloned()
    }
}

// ============================================================================
// External sources
// ============================================================================

/// Additional material factors supplied from outside the built-in tables,
/// e.g. records pulled from an external materials database.
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    materials: BTreeMap<FactorKey, MaterialFactor>,
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, rejecting splits that do not sum to one.
    pub fn insert(&mut self, factor: MaterialFactor) -> CalcResult<()> {
        if !factor.embodied_carbon_per_unit.is_finite() {
            return Err(CalcError::invalid_input(
                "embodied_carbon_per_unit",
                factor.embodied_carbon_per_unit.to_string(),
                "Factor must be finite",
            ));
        }
        factor.life_cycle_split.check(&factor.qualified_id())?;
        self.materials
            .insert(FactorKey::material(factor.category, &factor.id), factor);
        Ok(())
    }

    /// Load records from a JSON array of [`MaterialFactor`]
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let records: Vec<MaterialFactor> =
            serde_json::from_str(json).map_err(|e| CalcError::serialization(e.to_string()))?;
        let mut catalog = MaterialCatalog::new();
        for record in records {
            catalog.insert(record)?;
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl FactorSource for MaterialCatalog {
    fn lookup(&self, key: &FactorKey) -> Option<Factor> {
        self.materials.get(key).cloned().map(Factor::Material)
    }
}

/// Two sources consulted in order: `primary` first, then `fallback`.
#[derive(Debug, Clone)]
pub struct LayeredSource<P, F> {
    pub primary: P,
    pub fallback: F,
}

impl<P: FactorSource, F: FactorSource> LayeredSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        LayeredSource { primary, fallback }
    }
}

impl<P: FactorSource, F: FactorSource> FactorSource for LayeredSource<P, F> {
    fn lookup(&self, key: &FactorKey) -> Option<Factor> {
        self.primary.lookup(key).or_else(|| self.fallback.lookup(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let registry = EmissionFactorRegistry::builtin();
        assert!(registry.validate().is_empty());
        assert!(registry.len() > 80);
    }

    #[test]
    fn test_material_lookup() {
        let registry = EmissionFactorRegistry::builtin();
        let clt = registry.material(MaterialCategory::Timber, "timber-clt").unwrap();
        assert!(clt.embodied_carbon_per_unit < 0.0);
        assert_eq!(clt.unit, MaterialUnit::CubicMeter);
    }

    #[test]
    fn test_material_wrong_category_is_not_found() {
        let registry = EmissionFactorRegistry::builtin();
        let err = registry
            .material(MaterialCategory::Steel, "concrete-32mpa")
            .unwrap_err();
        assert_eq!(
            err,
            CalcError::factor_not_found("material", "steel/concrete-32mpa")
        );
    }

    #[test]
    fn test_nested_and_flat_equipment() {
        let registry = EmissionFactorRegistry::builtin();

        let excavator = EquipmentKey::nested("earthmoving", "excavator", "20t");
        let rate = registry.equipment(&excavator).unwrap();
        assert_eq!(rate.fuel, Fuel::Diesel);
        assert_eq!(rate.per_unit, 14.0);

        let generator = EquipmentKey::flat("generators", "generator-100kva");
        assert_eq!(registry.equipment(&generator).unwrap().per_unit, 20.0);

        // Nested class addressed without its subcategory
        let missing_level = EquipmentKey::flat("earthmoving", "20t");
        assert!(registry.equipment(&missing_level).is_err());
    }

    #[test]
    fn test_equipment_key_parse() {
        let key = EquipmentKey::parse("lifting/crane/tower-crane").unwrap();
        assert_eq!(key.subcategory.as_deref(), Some("crane"));
        assert_eq!(key.to_string(), "lifting/crane/tower-crane");

        assert!(EquipmentKey::parse("crane").is_err());
        assert!(EquipmentKey::parse("a//b").is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = EmissionFactorRegistry::builtin();
        assert_eq!(registry.grid("VIC").unwrap(), 0.77);
        assert_eq!(registry.refrigerant_gwp(" R410A ").unwrap(), 2088.0);
    }

    #[test]
    fn test_electricity_has_no_fuel_factor() {
        let registry = EmissionFactorRegistry::builtin();
        let err = registry.fuel(Fuel::Electricity).unwrap_err();
        assert_eq!(err.error_code(), "FACTOR_NOT_FOUND");
    }

    #[test]
    fn test_catalog_layering() {
        let json = r#"[{
            "category": "concrete",
            "id": "concrete-32mpa-50scm",
            "name": "32 MPa with 50% slag",
            "unit": "m3",
            "embodied_carbon_per_unit": 205.0,
            "life_cycle_split": {
                "product_stage_fraction": 0.9,
                "transport_to_site_fraction": 0.06,
                "install_fraction": 0.04
            }
        }]"#;
        let catalog = MaterialCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);

        let layered = LayeredSource::new(EmissionFactorRegistry::builtin(), catalog);
        let custom = layered
            .material(MaterialCategory::Concrete, "concrete-32mpa-50scm")
            .unwrap();
        assert_eq!(custom.embodied_carbon_per_unit, 205.0);

        // Built-in values still come from the primary layer
        let builtin = layered
            .material(MaterialCategory::Concrete, "concrete-32mpa")
            .unwrap();
        assert_eq!(builtin.embodied_carbon_per_unit, 310.0);
    }

    #[test]
    fn test_catalog_rejects_bad_split() {
        let mut catalog = MaterialCatalog::new();
        let mut factor = EmissionFactorRegistry::builtin()
            .material(MaterialCategory::Glass, "glass-float")
            .unwrap();
        factor.id = "glass-broken".to_string();
        factor.life_cycle_split.install_fraction = 0.5;
        let err = catalog.insert(factor).unwrap_err();
        assert_eq!(err.error_code(), "CROSS_CHECK_FAILURE");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_factor_serialization() {
        let factor = Factor::Grid(0.66);
        let json = serde_json::to_string(&factor).unwrap();
        assert_eq!(json, r#"{"kind":"grid","factor":0.66}"#);
    }
}

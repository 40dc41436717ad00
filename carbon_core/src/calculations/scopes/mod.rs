//! # Scope 1/2/3 Aggregator
//!
//! Per-session activity log for GHG Protocol reporting. A
//! [`ScopeAggregator`] borrows a [`FactorSource`] and owns the activity
//! lists for one project; there is no shared or global instance, so
//! concurrent sessions never see each other's entries.
//!
//! Every `add_*` operation validates its inputs, resolves a factor,
//! computes kg CO2-e and records the activity in tonnes.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::calculations::scopes::ScopeAggregator;
//! use carbon_core::registry::{EmissionFactorRegistry, EquipmentKey, TransportMode};
//!
//! let mut session = ScopeAggregator::new(EmissionFactorRegistry::builtin());
//!
//! let excavator = EquipmentKey::nested("earthmoving", "excavator", "20t");
//! session.add_equipment(&excavator, 100.0, None).unwrap();
//! session.add_transport_leg(TransportMode::RoadArticulated, 250.0, 40.0).unwrap();
//!
//! // Tower cranes run on grid power and belong to Scope 2
//! let crane = EquipmentKey::nested("lifting", "crane", "tower-crane");
//! assert!(session.add_equipment(&crane, 8.0, None).is_err());
//!
//! let totals = session.compute_totals();
//! assert!((totals.scope1.total.0 - 3.78).abs() < 1e-9);
//! ```

mod activities;
mod totals;

pub use activities::{ActivityCategory, ActivityEntry, ActivityKind, Scope};
pub use totals::{EmissionsSummary, ScopeTotals, WasteDiversion, WASTE_DIVERSION_TARGET_PCT};

use uuid::Uuid;

use crate::calculations::lca::{product_stage_carbon, MaterialEntry};
use crate::errors::{CalcError, CalcResult};
use crate::registry::{
    CommuteMode, EquipmentKey, FactorSource, TransportMode, WasteMethod, WaterSource,
};
use crate::units::{KgCo2e, TonnesCo2e};

/// Rejects zero, negative and non-finite quantities.
fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Value must be a positive number",
        ));
    }
    Ok(())
}

fn require_nonzero(field: &str, value: u32) -> CalcResult<()> {
    if value == 0 {
        return Err(CalcError::invalid_input(field, "0", "Value must be at least 1"));
    }
    Ok(())
}

fn require_explicit_fuel(explicit_fuel: Option<f64>) -> CalcResult<()> {
    match explicit_fuel {
        Some(quantity) => require_positive("explicit_fuel", quantity),
        None => Ok(()),
    }
}

/// Activity log for one calculation session.
pub struct ScopeAggregator<'a> {
    source: &'a dyn FactorSource,
    scope1: Vec<ActivityEntry>,
    scope2: Vec<ActivityEntry>,
    scope3: Vec<ActivityEntry>,
}

impl<'a> ScopeAggregator<'a> {
    pub fn new(source: &'a dyn FactorSource) -> Self {
        ScopeAggregator {
            source,
            scope1: Vec::new(),
            scope2: Vec::new(),
            scope3: Vec::new(),
        }
    }

    /// Rebuild a session from previously recorded entries (e.g. a snapshot).
    ///
    /// Entries keep their ids and emissions; nothing is recomputed.
    pub fn from_entries(
        source: &'a dyn FactorSource,
        entries: impl IntoIterator<Item = ActivityEntry>,
    ) -> Self {
        let mut session = ScopeAggregator::new(source);
        for entry in entries {
            session.list_mut(entry.scope).push(entry);
        }
        session
    }

    fn list(&self, scope: Scope) -> &[ActivityEntry] {
        match scope {
            Scope::Scope1 => &self.scope1,
            Scope::Scope2 => &self.scope2,
            Scope::Scope3 => &self.scope3,
        }
    }

    fn list_mut(&mut self, scope: Scope) -> &mut Vec<ActivityEntry> {
        match scope {
            Scope::Scope1 => &mut self.scope1,
            Scope::Scope2 => &mut self.scope2,
            Scope::Scope3 => &mut self.scope3,
        }
    }

    fn record(
        &mut self,
        category: ActivityCategory,
        description: String,
        emissions: KgCo2e,
        kind: ActivityKind,
    ) -> ActivityEntry {
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            scope: category.scope(),
            category,
            description,
            emissions: TonnesCo2e::from(emissions),
            kind,
        };
        tracing::debug!(
            id = %entry.id,
            scope = entry.scope.number(),
            category = ?entry.category,
            tonnes = entry.emissions.0,
            "recorded activity"
        );
        self.list_mut(entry.scope).push(entry.clone());
        entry
    }

    // ========================================================================
    // Scope 1
    // ========================================================================

    /// Fuel burned by plant. `explicit_fuel` (measured litres/kg/m³)
    /// replaces the rate × hours estimate when given.
    ///
    /// Electric plant is rejected with `WrongScope`; log it with
    /// [`add_electric_equipment`](Self::add_electric_equipment).
    pub fn add_equipment(
        &mut self,
        equipment: &EquipmentKey,
        hours: f64,
        explicit_fuel: Option<f64>,
    ) -> CalcResult<ActivityEntry> {
        require_positive("hours", hours)?;
        require_explicit_fuel(explicit_fuel)?;

        let rate = self.source.equipment(equipment)?;
        if rate.is_electric() {
            return Err(CalcError::wrong_scope(
                equipment.to_string(),
                2,
                "add_electric_equipment",
            ));
        }
        let fuel = self.source.fuel(rate.fuel)?;
        let fuel_used = explicit_fuel.unwrap_or(rate.per_unit * hours);
        let kg = KgCo2e(fuel_used * fuel.kg_co2e_per_unit);

        Ok(self.record(
            ActivityCategory::Equipment,
            format!("{equipment}: {hours} h, {fuel_used:.1} {} {}", fuel.basis.symbol(), rate.fuel),
            kg,
            ActivityKind::Equipment {
                equipment: equipment.clone(),
                hours,
                fuel: rate.fuel,
                fuel_used,
            },
        ))
    }

    /// Fuel burned by site vehicles. Electric vehicles belong to Scope 2
    /// and are logged through [`add_electricity`](Self::add_electricity).
    pub fn add_vehicle(
        &mut self,
        vehicle_type: &str,
        distance_km: f64,
        explicit_fuel: Option<f64>,
    ) -> CalcResult<ActivityEntry> {
        require_positive("distance_km", distance_km)?;
        require_explicit_fuel(explicit_fuel)?;

        let rate = self.source.vehicle(vehicle_type)?;
        if rate.is_electric() {
            return Err(CalcError::wrong_scope(vehicle_type, 2, "add_electricity"));
        }
        let fuel = self.source.fuel(rate.fuel)?;
        let fuel_used = explicit_fuel.unwrap_or(rate.per_unit * distance_km);
        let kg = KgCo2e(fuel_used * fuel.kg_co2e_per_unit);

        Ok(self.record(
            ActivityCategory::Vehicles,
            format!("{vehicle_type}: {distance_km} km"),
            kg,
            ActivityKind::Vehicle {
                vehicle_type: vehicle_type.to_string(),
                distance_km,
                fuel: rate.fuel,
                fuel_used,
            },
        ))
    }

    /// Fugitive refrigerant: leaked kg × GWP
    pub fn add_refrigerant_leak(&mut self, gas: &str, leaked_kg: f64) -> CalcResult<ActivityEntry> {
        require_positive("leaked_kg", leaked_kg)?;
        let gwp = self.source.refrigerant_gwp(gas)?;

        Ok(self.record(
            ActivityCategory::Refrigerants,
            format!("{gas} leakage: {leaked_kg} kg"),
            KgCo2e(leaked_kg * gwp),
            ActivityKind::Refrigerant {
                gas: gas.to_string(),
                leaked_kg,
                gwp,
            },
        ))
    }

    // ========================================================================
    // Scope 2
    // ========================================================================

    /// Grid electricity, net of the renewable share (0 to 1).
    pub fn add_electricity(
        &mut self,
        region: &str,
        kwh: f64,
        renewable_fraction: f64,
    ) -> CalcResult<ActivityEntry> {
        require_positive("kwh", kwh)?;
        if !(0.0..=1.0).contains(&renewable_fraction) {
            return Err(CalcError::invalid_input(
                "renewable_fraction",
                renewable_fraction.to_string(),
                "Renewable fraction must be between 0 and 1",
            ));
        }
        let grid = self.source.grid(region)?;

        Ok(self.record(
            ActivityCategory::Electricity,
            format!("Grid electricity ({region}): {kwh} kWh"),
            KgCo2e(kwh * (1.0 - renewable_fraction) * grid),
            ActivityKind::Electricity {
                region: region.to_string(),
                kwh,
                renewable_fraction,
            },
        ))
    }

    /// Temporary facility powered from the grid for `days`
    pub fn add_site_facility(
        &mut self,
        facility: &str,
        region: &str,
        days: f64,
    ) -> CalcResult<ActivityEntry> {
        require_positive("days", days)?;
        let kwh_per_day = self.source.site_facility(facility)?;
        let grid = self.source.grid(region)?;
        let kwh = kwh_per_day * days;

        Ok(self.record(
            ActivityCategory::SiteFacilities,
            format!("{facility} ({region}): {days} days"),
            KgCo2e(kwh * grid),
            ActivityKind::SiteFacility {
                facility: facility.to_string(),
                region: region.to_string(),
                days,
                kwh,
            },
        ))
    }

    /// Grid-powered plant. Fuel-burning plant is rejected with `WrongScope`.
    pub fn add_electric_equipment(
        &mut self,
        equipment: &EquipmentKey,
        hours: f64,
        region: &str,
    ) -> CalcResult<ActivityEntry> {
        require_positive("hours", hours)?;
        let rate = self.source.equipment(equipment)?;
        if !rate.is_electric() {
            return Err(CalcError::wrong_scope(equipment.to_string(), 1, "add_equipment"));
        }
        let grid = self.source.grid(region)?;
        let kwh = rate.per_unit * hours;

        Ok(self.record(
            ActivityCategory::ElectricEquipment,
            format!("{equipment} ({region}): {hours} h"),
            KgCo2e(kwh * grid),
            ActivityKind::ElectricEquipment {
                equipment: equipment.clone(),
                hours,
                region: region.to_string(),
                kwh,
            },
        ))
    }

    // ========================================================================
    // Scope 3
    // ========================================================================

    /// Freight: tonnes × km × mode factor
    pub fn add_transport_leg(
        &mut self,
        mode: TransportMode,
        distance_km: f64,
        tonnes: f64,
    ) -> CalcResult<ActivityEntry> {
        require_positive("distance_km", distance_km)?;
        require_positive("tonnes", tonnes)?;
        let factor = self.source.transport(mode)?;

        Ok(self.record(
            ActivityCategory::Transport,
            format!("{mode}: {tonnes} t over {distance_km} km"),
            KgCo2e(tonnes * distance_km * factor),
            ActivityKind::Transport {
                mode,
                distance_km,
                tonnes,
            },
        ))
    }

    pub fn add_waste_stream(
        &mut self,
        method: WasteMethod,
        tonnes: f64,
        description: &str,
    ) -> CalcResult<ActivityEntry> {
        require_positive("tonnes", tonnes)?;
        let factor = self.source.waste(method)?;
        let description = if description.trim().is_empty() {
            format!("Waste to {method}: {tonnes} t")
        } else {
            description.trim().to_string()
        };

        Ok(self.record(
            ActivityCategory::Waste,
            description,
            KgCo2e(tonnes * factor),
            ActivityKind::Waste { method, tonnes },
        ))
    }

    pub fn add_water_use(&mut self, source: WaterSource, kilolitres: f64) -> CalcResult<ActivityEntry> {
        require_positive("kilolitres", kilolitres)?;
        let factor = self.source.water(source)?;

        Ok(self.record(
            ActivityCategory::Water,
            format!("{source} water: {kilolitres} kL"),
            KgCo2e(kilolitres * factor),
            ActivityKind::Water { source, kilolitres },
        ))
    }

    /// Worker travel, counted as a round trip per day
    pub fn add_commuting(
        &mut self,
        mode: CommuteMode,
        workers: u32,
        days: f64,
        one_way_km: f64,
    ) -> CalcResult<ActivityEntry> {
        require_nonzero("workers", workers)?;
        require_positive("days", days)?;
        require_positive("one_way_km", one_way_km)?;
        let factor = self.source.commuting(mode)?;
        let passenger_km = f64::from(workers) * days * 2.0 * one_way_km;

        Ok(self.record(
            ActivityCategory::Commuting,
            format!("{workers} workers by {mode}, {days} days"),
            KgCo2e(passenger_km * factor),
            ActivityKind::Commuting {
                mode,
                workers,
                days,
                one_way_km,
            },
        ))
    }

    /// Share of a reusable system's embodied carbon charged to this project
    pub fn add_temporary_works_use(
        &mut self,
        system: &str,
        area_m2: f64,
        uses: u32,
    ) -> CalcResult<ActivityEntry> {
        require_positive("area_m2", area_m2)?;
        require_nonzero("uses", uses)?;
        let factor = self.source.temporary_works(system)?;
        let kg = KgCo2e(area_m2 * f64::from(uses) * factor.per_m2_per_use());

        Ok(self.record(
            ActivityCategory::TemporaryWorks,
            format!("{system}: {area_m2} m² × {uses} uses"),
            kg,
            ActivityKind::TemporaryWorks {
                system: system.to_string(),
                area_m2,
                uses,
            },
        ))
    }

    /// Purchased material, counted at its product stage (A1-A3)
    pub fn add_material(&mut self, entry: &MaterialEntry) -> CalcResult<ActivityEntry> {
        let factor = self.source.material(entry.category, &entry.material_id)?;
        let kg = product_stage_carbon(entry, &factor)?;

        Ok(self.record(
            ActivityCategory::PurchasedMaterials,
            format!("{}: {} {}", factor.name, entry.quantity, entry.unit),
            kg,
            ActivityKind::Material {
                entry: entry.clone(),
            },
        ))
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Remove an activity. Unknown ids are ignored.
    pub fn remove(&mut self, scope: Scope, id: Uuid) -> Option<ActivityEntry> {
        let list = self.list_mut(scope);
        let index = list.iter().position(|e| e.id == id)?;
        Some(list.remove(index))
    }

    /// Totals per scope and category, folded from the current entries.
    pub fn compute_totals(&self) -> EmissionsSummary {
        EmissionsSummary::from_scopes(&self.scope1, &self.scope2, &self.scope3)
    }

    /// Clear every scope.
    pub fn reset(&mut self) {
        tracing::info!(
            cleared = self.len(),
            "scope aggregator reset"
        );
        self.scope1.clear();
        self.scope2.clear();
        self.scope3.clear();
    }

    /// All entries, Scope 1 first, each scope in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.scope1.iter().chain(&self.scope2).chain(&self.scope3)
    }

    pub fn entries_in(&self, scope: Scope) -> &[ActivityEntry] {
        self.list(scope)
    }

    pub fn len(&self) -> usize {
        self.scope1.len() + self.scope2.len() + self.scope3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Share of logged waste that avoided landfill, or `None` with no waste logged.
    pub fn waste_diversion(&self) -> Option<WasteDiversion> {
        WasteDiversion::from_entries(&self.scope3)
    }
}

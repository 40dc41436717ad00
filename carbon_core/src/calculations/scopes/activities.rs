//! Activity records logged against a GHG scope.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::lca::MaterialEntry;
use crate::errors::{CalcError, CalcResult};
use crate::registry::{CommuteMode, EquipmentKey, Fuel, TransportMode, WasteMethod, WaterSource};
use crate::units::TonnesCo2e;

/// GHG Protocol scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Direct emissions from owned or controlled sources
    Scope1,
    /// Purchased electricity
    Scope2,
    /// Value chain
    Scope3,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Scope1, Scope::Scope2, Scope::Scope3];

    pub fn number(&self) -> u8 {
        match self {
            Scope::Scope1 => 1,
            Scope::Scope2 => 2,
            Scope::Scope3 => 3,
        }
    }

    pub fn from_number(n: u8) -> CalcResult<Self> {
        match n {
            1 => Ok(Scope::Scope1),
            2 => Ok(Scope::Scope2),
            3 => Ok(Scope::Scope3),
            _ => Err(CalcError::invalid_input("scope", n.to_string(), "Scope must be 1, 2 or 3")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope {}", self.number())
    }
}

/// Reporting category within a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    // Scope 1
    Equipment,
    Vehicles,
    Refrigerants,
    // Scope 2
    Electricity,
    SiteFacilities,
    ElectricEquipment,
    // Scope 3
    PurchasedMaterials,
    Transport,
    Waste,
    Water,
    Commuting,
    TemporaryWorks,
}

impl ActivityCategory {
    pub fn scope(&self) -> Scope {
        match self {
            ActivityCategory::Equipment
            | ActivityCategory::Vehicles
            | ActivityCategory::Refrigerants => Scope::Scope1,
            ActivityCategory::Electricity
            | ActivityCategory::SiteFacilities
            | ActivityCategory::ElectricEquipment => Scope::Scope2,
            ActivityCategory::PurchasedMaterials
            | ActivityCategory::Transport
            | ActivityCategory::Waste
            | ActivityCategory::Water
            | ActivityCategory::Commuting
            | ActivityCategory::TemporaryWorks => Scope::Scope3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityCategory::Equipment => "Plant & equipment",
            ActivityCategory::Vehicles => "Vehicles",
            ActivityCategory::Refrigerants => "Refrigerant leakage",
            ActivityCategory::Electricity => "Grid electricity",
            ActivityCategory::SiteFacilities => "Site facilities",
            ActivityCategory::ElectricEquipment => "Electric equipment",
            ActivityCategory::PurchasedMaterials => "Purchased materials",
            ActivityCategory::Transport => "Freight transport",
            ActivityCategory::Waste => "Construction waste",
            ActivityCategory::Water => "Water",
            ActivityCategory::Commuting => "Worker commuting",
            ActivityCategory::TemporaryWorks => "Temporary works",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The quantities behind one activity, tagged by kind.
///
/// ## JSON Example
///
/// ```json
/// { "kind": "Transport", "mode": "road-articulated", "distance_km": 120.0, "tonnes": 24.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActivityKind {
    Equipment {
        equipment: EquipmentKey,
        hours: f64,
        fuel: Fuel,
        /// Fuel burned, in the fuel's consumption unit
        fuel_used: f64,
    },
    Vehicle {
        vehicle_type: String,
        distance_km: f64,
        fuel: Fuel,
        fuel_used: f64,
    },
    Refrigerant {
        gas: String,
        leaked_kg: f64,
        gwp: f64,
    },
    Electricity {
        region: String,
        kwh: f64,
        renewable_fraction: f64,
    },
    SiteFacility {
        facility: String,
        region: String,
        days: f64,
        kwh: f64,
    },
    ElectricEquipment {
        equipment: EquipmentKey,
        hours: f64,
        region: String,
        kwh: f64,
    },
    Transport {
        mode: TransportMode,
        distance_km: f64,
        tonnes: f64,
    },
    Waste {
        method: WasteMethod,
        tonnes: f64,
    },
    Water {
        source: WaterSource,
        kilolitres: f64,
    },
    Commuting {
        mode: CommuteMode,
        workers: u32,
        days: f64,
        one_way_km: f64,
    },
    TemporaryWorks {
        system: String,
        area_m2: f64,
        uses: u32,
    },
    Material {
        entry: MaterialEntry,
    },
}

/// One logged activity and its emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Assigned on insertion
    pub id: Uuid,
    pub scope: Scope,
    pub category: ActivityCategory,
    pub description: String,
    pub emissions: TonnesCo2e,
    #[serde(flatten)]
    pub kind: ActivityKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_scopes() {
        assert_eq!(ActivityCategory::Refrigerants.scope(), Scope::Scope1);
        assert_eq!(ActivityCategory::ElectricEquipment.scope(), Scope::Scope2);
        assert_eq!(ActivityCategory::PurchasedMaterials.scope(), Scope::Scope3);
    }

    #[test]
    fn test_scope_numbers() {
        for scope in Scope::ALL {
            assert_eq!(Scope::from_number(scope.number()).unwrap(), scope);
        }
        assert!(Scope::from_number(4).is_err());
    }

    #[test]
    fn test_entry_serialization() {
        let entry = ActivityEntry {
            id: Uuid::nil(),
            scope: Scope::Scope3,
            category: ActivityCategory::Waste,
            description: "Mixed C&D waste".to_string(),
            emissions: TonnesCo2e(1.8),
            kind: ActivityKind::Waste {
                method: WasteMethod::Landfill,
                tonnes: 10.0,
            },
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"Waste\""));
        assert!(json.contains("\"category\":\"waste\""));
        assert!(json.contains("\"scope\":\"scope3\""));

        let back: ActivityEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}

//! Value-chain (Scope 3) factors: freight, waste, water, commuting and
//! temporary works.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Declares a closed set of keyed options with a code string per variant.
macro_rules! keyed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $code:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $code)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Code used in factor keys
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Parse from common string representations
            pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
                let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
                match normalized.as_str() {
                    $($code $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(CalcError::factor_not_found($kind, s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }
    };
}

keyed_enum! {
    /// Freight mode for a transport leg
    TransportMode, "transport mode" {
        RoadRigid => "road-rigid" | "road" | "truck",
        RoadArticulated => "road-articulated" | "semi",
        Rail => "rail",
        Sea => "sea" | "ship",
        Air => "air",
    }
}

keyed_enum! {
    /// Disposal route for a construction waste stream
    WasteMethod, "waste method" {
        Landfill => "landfill",
        Recycled => "recycled" | "recycling",
        Reused => "reused" | "reuse",
        Incinerated => "incinerated" | "incineration",
        Hazardous => "hazardous",
    }
}

impl WasteMethod {
    /// Counts toward landfill diversion
    pub fn is_diverted(&self) -> bool {
        matches!(self, WasteMethod::Recycled | WasteMethod::Reused)
    }
}

keyed_enum! {
    /// Supply source of site water
    WaterSource, "water source" {
        Mains => "mains" | "potable",
        Recycled => "recycled",
        Bore => "bore" | "groundwater",
        Rainwater => "rainwater" | "rain",
    }
}

keyed_enum! {
    /// Mode of worker travel to site
    CommuteMode, "commute mode" {
        CarPetrol => "car-petrol" | "car",
        CarDiesel => "car-diesel",
        CarElectric => "car-electric" | "ev",
        Carpool => "carpool",
        Motorcycle => "motorcycle",
        Bus => "bus",
        Train => "train" | "rail",
        Active => "active" | "walk" | "bicycle" | "bike",
    }
}

/// Freight intensity, kg CO2-e per tonne-km
pub(crate) const TRANSPORT: &[(TransportMode, f64)] = &[
    (TransportMode::RoadRigid, 0.21),
    (TransportMode::RoadArticulated, 0.08),
    (TransportMode::Rail, 0.025),
    (TransportMode::Sea, 0.015),
    (TransportMode::Air, 1.13),
];

/// kg CO2-e per tonne of waste handled
pub(crate) const WASTE: &[(WasteMethod, f64)] = &[
    (WasteMethod::Landfill, 180.0),
    (WasteMethod::Recycled, 20.0),
    (WasteMethod::Reused, 5.0),
    (WasteMethod::Incinerated, 420.0),
    (WasteMethod::Hazardous, 650.0),
];

/// kg CO2-e per kilolitre supplied
pub(crate) const WATER: &[(WaterSource, f64)] = &[
    (WaterSource::Mains, 0.92),
    (WaterSource::Recycled, 0.55),
    (WaterSource::Bore, 0.35),
    (WaterSource::Rainwater, 0.05),
];

/// kg CO2-e per passenger-km
pub(crate) const COMMUTING: &[(CommuteMode, f64)] = &[
    (CommuteMode::CarPetrol, 0.192),
    (CommuteMode::CarDiesel, 0.171),
    (CommuteMode::CarElectric, 0.05),
    (CommuteMode::Carpool, 0.096),
    (CommuteMode::Motorcycle, 0.114),
    (CommuteMode::Bus, 0.089),
    (CommuteMode::Train, 0.041),
    (CommuteMode::Active, 0.0),
];

/// Reusable temporary works, amortized over its typical number of uses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporaryWorksFactor {
    /// kg CO2-e embodied per m² of system
    pub embodied_kg_per_m2: f64,
    /// Uses the system is expected to survive
    pub typical_reuses: u32,
}

impl TemporaryWorksFactor {
    /// kg CO2-e charged per m² each time the system is used
    pub fn per_m2_per_use(&self) -> f64 {
        self.embodied_kg_per_m2 / f64::from(self.typical_reuses.max(1))
    }
}

pub(crate) const TEMPORARY_WORKS: &[(&str, TemporaryWorksFactor)] = &[
    ("formwork-plywood", TemporaryWorksFactor { embodied_kg_per_m2: 15.0, typical_reuses: 8 }),
    ("formwork-steel", TemporaryWorksFactor { embodied_kg_per_m2: 45.0, typical_reuses: 100 }),
    ("formwork-aluminium", TemporaryWorksFactor { embodied_kg_per_m2: 60.0, typical_reuses: 200 }),
    ("scaffolding-steel", TemporaryWorksFactor { embodied_kg_per_m2: 30.0, typical_reuses: 150 }),
    ("hoarding-plywood", TemporaryWorksFactor { embodied_kg_per_m2: 12.0, typical_reuses: 3 }),
    ("shoring-props", TemporaryWorksFactor { embodied_kg_per_m2: 20.0, typical_reuses: 100 }),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_cover_every_option() {
        for mode in TransportMode::ALL {
            assert!(TRANSPORT.iter().any(|(m, _)| m == mode), "{mode}");
        }
        for method in WasteMethod::ALL {
            assert!(WASTE.iter().any(|(m, _)| m == method), "{method}");
        }
        for source in WaterSource::ALL {
            assert!(WATER.iter().any(|(s, _)| s == source), "{source}");
        }
        for mode in CommuteMode::ALL {
            assert!(COMMUTING.iter().any(|(m, _)| m == mode), "{mode}");
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(TransportMode::from_str_flexible("Truck").unwrap(), TransportMode::RoadRigid);
        assert_eq!(CommuteMode::from_str_flexible("bike").unwrap(), CommuteMode::Active);
        let err = WasteMethod::from_str_flexible("compost").unwrap_err();
        assert_eq!(err.error_code(), "FACTOR_NOT_FOUND");
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&TransportMode::RoadArticulated).unwrap();
        assert_eq!(json, "\"road-articulated\"");
        let method: WasteMethod = serde_json::from_str("\"reused\"").unwrap();
        assert!(method.is_diverted());
    }

    #[test]
    fn test_temporary_works_amortization() {
        let plywood = TEMPORARY_WORKS
            .iter()
            .find(|(id, _)| *id == "formwork-plywood")
            .map(|(_, f)| *f)
            .unwrap();
        assert!((plywood.per_m2_per_use() - 1.875).abs() < 1e-12);
    }
}

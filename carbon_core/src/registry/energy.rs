//! Fuel, plant, vehicle and electricity factors.
//!
//! Scope 1 and Scope 2 reference data: combustion factors per fuel, the
//! consumption rate of each plant item per operating hour, vehicle
//! consumption per kilometre, refrigerant GWPs and grid intensities.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Fuel or energy carrier consumed by plant and vehicles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fuel {
    Diesel,
    Petrol,
    Lpg,
    #[serde(rename = "biodiesel-b20")]
    BiodieselB20,
    NaturalGas,
    Acetylene,
    /// Grid electricity; never burned on site, so it has no combustion factor
    Electricity,
}

impl Fuel {
    pub const ALL: [Fuel; 7] = [
        Fuel::Diesel,
        Fuel::Petrol,
        Fuel::Lpg,
        Fuel::BiodieselB20,
        Fuel::NaturalGas,
        Fuel::Acetylene,
        Fuel::Electricity,
    ];

    /// Code used in factor keys
    pub fn code(&self) -> &'static str {
        match self {
            Fuel::Diesel => "diesel",
            Fuel::Petrol => "petrol",
            Fuel::Lpg => "lpg",
            Fuel::BiodieselB20 => "biodiesel-b20",
            Fuel::NaturalGas => "natural-gas",
            Fuel::Acetylene => "acetylene",
            Fuel::Electricity => "electricity",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace([' ', '_'], "-").as_str() {
            "diesel" => Ok(Fuel::Diesel),
            "petrol" | "gasoline" | "ulp" => Ok(Fuel::Petrol),
            "lpg" => Ok(Fuel::Lpg),
            "biodiesel-b20" | "b20" => Ok(Fuel::BiodieselB20),
            "natural-gas" | "gas" => Ok(Fuel::NaturalGas),
            "acetylene" => Ok(Fuel::Acetylene),
            "electricity" | "electric" => Ok(Fuel::Electricity),
            _ => Err(CalcError::factor_not_found("fuel", s)),
        }
    }

    pub fn is_electric(&self) -> bool {
        matches!(self, Fuel::Electricity)
    }

    /// Unit in which consumption of this fuel is measured
    pub fn consumption_unit(&self) -> &'static str {
        match FUELS.iter().find(|f| f.fuel == *self) {
            Some(row) => row.basis.symbol(),
            None => "kWh",
        }
    }
}

impl std::fmt::Display for Fuel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Physical basis of a fuel factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelBasis {
    PerLiter,
    PerKilogram,
    PerCubicMeter,
}

impl FuelBasis {
    pub fn symbol(&self) -> &'static str {
        match self {
            FuelBasis::PerLiter => "L",
            FuelBasis::PerKilogram => "kg",
            FuelBasis::PerCubicMeter => "m³",
        }
    }
}

/// Combustion emission factor for a fuel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelFactor {
    pub fuel: Fuel,
    /// kg CO2-e per basis unit burned
    pub kg_co2e_per_unit: f64,
    pub basis: FuelBasis,
}

pub(crate) const FUELS: &[FuelFactor] = &[
    FuelFactor { fuel: Fuel::Diesel, kg_co2e_per_unit: 2.70, basis: FuelBasis::PerLiter },
    FuelFactor { fuel: Fuel::Petrol, kg_co2e_per_unit: 2.31, basis: FuelBasis::PerLiter },
    FuelFactor { fuel: Fuel::Lpg, kg_co2e_per_unit: 1.61, basis: FuelBasis::PerLiter },
    FuelFactor { fuel: Fuel::BiodieselB20, kg_co2e_per_unit: 2.16, basis: FuelBasis::PerLiter },
    FuelFactor { fuel: Fuel::NaturalGas, kg_co2e_per_unit: 1.96, basis: FuelBasis::PerCubicMeter },
    FuelFactor { fuel: Fuel::Acetylene, kg_co2e_per_unit: 3.39, basis: FuelBasis::PerKilogram },
];

/// Fuel or energy drawn per operating hour (plant) or per km (vehicles)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRate {
    pub fuel: Fuel,
    /// Litres, kg or m³ of fuel, or kWh for electric items
    pub per_unit: f64,
}

impl ConsumptionRate {
    pub fn is_electric(&self) -> bool {
        self.fuel.is_electric()
    }
}

pub(crate) struct EquipmentRow {
    pub category: &'static str,
    pub subcategory: Option<&'static str>,
    pub id: &'static str,
    pub rate: ConsumptionRate,
}

macro_rules! plant {
    ($cat:literal, $sub:expr, $id:literal, $fuel:ident, $rate:expr) => {
        EquipmentRow {
            category: $cat,
            subcategory: $sub,
            id: $id,
            rate: ConsumptionRate { fuel: Fuel::$fuel, per_unit: $rate },
        }
    };
}

// Earthmoving and lifting are nested by machine class; the rest are flat.
pub(crate) const EQUIPMENT: &[EquipmentRow] = &[
    plant!("earthmoving", Some("excavator"), "mini", Diesel, 3.5),
    plant!("earthmoving", Some("excavator"), "20t", Diesel, 14.0),
    plant!("earthmoving", Some("excavator"), "30t", Diesel, 22.0),
    plant!("earthmoving", Some("bulldozer"), "d6", Diesel, 20.0),
    plant!("earthmoving", Some("bulldozer"), "d9", Diesel, 45.0),
    plant!("earthmoving", Some("loader"), "skid-steer", Diesel, 5.0),
    plant!("earthmoving", Some("loader"), "wheel-loader", Diesel, 15.0),
    plant!("lifting", Some("crane"), "tower-crane", Electricity, 45.0),
    plant!("lifting", Some("crane"), "mobile-crane-50t", Diesel, 18.0),
    plant!("lifting", Some("crane"), "crawler-crane", Diesel, 25.0),
    plant!("lifting", Some("hoist"), "electric-hoist", Electricity, 7.5),
    plant!("lifting", Some("hoist"), "diesel-hoist", Diesel, 4.0),
    plant!("generators", None, "generator-20kva", Diesel, 5.0),
    plant!("generators", None, "generator-100kva", Diesel, 20.0),
    plant!("generators", None, "generator-250kva", Diesel, 45.0),
    plant!("concrete", None, "concrete-pump", Diesel, 12.0),
    plant!("concrete", None, "agitator-truck", Diesel, 10.0),
    plant!("concrete", None, "poker-vibrator", Electricity, 1.5),
    plant!("compaction", None, "plate-compactor", Petrol, 1.2),
    plant!("compaction", None, "roller-10t", Diesel, 9.0),
    plant!("access", None, "scissor-lift", Electricity, 1.2),
    plant!("access", None, "boom-lift", Diesel, 4.0),
];

/// Vehicle consumption per kilometre
pub(crate) const VEHICLES: &[(&str, ConsumptionRate)] = &[
    ("light-commercial", ConsumptionRate { fuel: Fuel::Diesel, per_unit: 0.12 }),
    ("ute", ConsumptionRate { fuel: Fuel::Diesel, per_unit: 0.11 }),
    ("car", ConsumptionRate { fuel: Fuel::Petrol, per_unit: 0.09 }),
    ("heavy-rigid-truck", ConsumptionRate { fuel: Fuel::Diesel, per_unit: 0.30 }),
    ("articulated-truck", ConsumptionRate { fuel: Fuel::Diesel, per_unit: 0.50 }),
    ("ev-ute", ConsumptionRate { fuel: Fuel::Electricity, per_unit: 0.20 }),
];

/// Refrigerant global warming potentials (100-year)
pub(crate) const REFRIGERANTS: &[(&str, f64)] = &[
    ("r410a", 2088.0),
    ("r32", 675.0),
    ("r134a", 1430.0),
    ("r404a", 3922.0),
    ("r22", 1810.0),
];

/// Location-based grid intensity, kg CO2-e per kWh consumed
pub(crate) const GRID_REGIONS: &[(&str, f64)] = &[
    ("nsw", 0.66),
    ("act", 0.66),
    ("vic", 0.77),
    ("qld", 0.71),
    ("sa", 0.23),
    ("wa", 0.50),
    ("tas", 0.15),
    ("nt", 0.54),
];

/// Typical daily electricity draw of temporary site facilities, kWh/day
pub(crate) const SITE_FACILITIES: &[(&str, f64)] = &[
    ("site-office", 25.0),
    ("crib-room", 18.0),
    ("toilet-block", 6.0),
    ("lighting-tower", 12.0),
    ("security-hut", 8.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_combustion_fuel_has_factor() {
        for fuel in Fuel::ALL {
            let has_factor = FUELS.iter().any(|f| f.fuel == fuel);
            assert_eq!(has_factor, !fuel.is_electric(), "{fuel}");
        }
    }

    #[test]
    fn test_equipment_uses_known_fuels() {
        for row in EQUIPMENT {
            assert!(row.rate.per_unit > 0.0, "{}", row.id);
            assert!(
                row.rate.is_electric() || FUELS.iter().any(|f| f.fuel == row.rate.fuel),
                "{}",
                row.id
            );
        }
    }

    #[test]
    fn test_fuel_parsing() {
        assert_eq!(Fuel::from_str_flexible("Natural Gas").unwrap(), Fuel::NaturalGas);
        assert_eq!(Fuel::from_str_flexible("B20").unwrap(), Fuel::BiodieselB20);
        assert!(Fuel::from_str_flexible("kerosene").is_err());
    }

    #[test]
    fn test_consumption_units() {
        assert_eq!(Fuel::Diesel.consumption_unit(), "L");
        assert_eq!(Fuel::Acetylene.consumption_unit(), "kg");
        assert_eq!(Fuel::Electricity.consumption_unit(), "kWh");
    }
}

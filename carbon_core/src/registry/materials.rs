//! Construction material embodied-carbon factors.
//!
//! Cradle-to-gate coefficients in kg CO2-e per declared unit, with the
//! share of the product-stage figure attributed to transport to site (A4)
//! and installation (A5). Timber carries negative coefficients: the
//! biogenic carbon stored in the product outweighs its manufacture.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Allowed drift when checking that a life-cycle split sums to one
pub const SPLIT_TOLERANCE: f64 = 1e-6;

/// Material categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Concrete,
    Steel,
    Timber,
    Aluminium,
    Glass,
    Insulation,
    Masonry,
    Finishes,
}

impl MaterialCategory {
    /// All categories, in reporting order
    pub const ALL: [MaterialCategory; 8] = [
        MaterialCategory::Concrete,
        MaterialCategory::Steel,
        MaterialCategory::Timber,
        MaterialCategory::Aluminium,
        MaterialCategory::Glass,
        MaterialCategory::Insulation,
        MaterialCategory::Masonry,
        MaterialCategory::Finishes,
    ];

    /// Code used in factor keys (e.g., "concrete")
    pub fn code(&self) -> &'static str {
        match self {
            MaterialCategory::Concrete => "concrete",
            MaterialCategory::Steel => "steel",
            MaterialCategory::Timber => "timber",
            MaterialCategory::Aluminium => "aluminium",
            MaterialCategory::Glass => "glass",
            MaterialCategory::Insulation => "insulation",
            MaterialCategory::Masonry => "masonry",
            MaterialCategory::Finishes => "finishes",
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "concrete" => Ok(MaterialCategory::Concrete),
            "steel" => Ok(MaterialCategory::Steel),
            "timber" | "wood" => Ok(MaterialCategory::Timber),
            "aluminium" | "aluminum" => Ok(MaterialCategory::Aluminium),
            "glass" | "glazing" => Ok(MaterialCategory::Glass),
            "insulation" => Ok(MaterialCategory::Insulation),
            "masonry" | "brick" => Ok(MaterialCategory::Masonry),
            "finishes" | "finish" => Ok(MaterialCategory::Finishes),
            _ => Err(CalcError::factor_not_found("material category", s)),
        }
    }
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Declared unit of a material factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialUnit {
    #[serde(rename = "m3")]
    CubicMeter,
    #[serde(rename = "t")]
    Tonne,
    #[serde(rename = "m2")]
    SquareMeter,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "each")]
    Each,
}

impl MaterialUnit {
    /// Unit symbol for display
    pub fn symbol(&self) -> &'static str {
        match self {
            MaterialUnit::CubicMeter => "m³",
            MaterialUnit::Tonne => "t",
            MaterialUnit::SquareMeter => "m²",
            MaterialUnit::Kilogram => "kg",
            MaterialUnit::Meter => "m",
            MaterialUnit::Each => "each",
        }
    }
}

impl std::fmt::Display for MaterialUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How a material's cradle-to-gate figure is shared across A1-A3, A4 and A5
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifeCycleSplit {
    /// Share attributed to the product stage (A1-A3)
    pub product_stage_fraction: f64,
    /// Share attributed to transport to site (A4)
    pub transport_to_site_fraction: f64,
    /// Share attributed to construction and installation (A5)
    pub install_fraction: f64,
}

impl LifeCycleSplit {
    pub const fn new(product: f64, transport: f64, install: f64) -> Self {
        LifeCycleSplit {
            product_stage_fraction: product,
            transport_to_site_fraction: transport,
            install_fraction: install,
        }
    }

    /// Sum of the three fractions
    pub fn sum(&self) -> f64 {
        self.product_stage_fraction + self.transport_to_site_fraction + self.install_fraction
    }

    /// Check that the fractions are finite, non-negative and sum to one.
    pub fn check(&self, subject: &str) -> CalcResult<()> {
        let parts = [
            self.product_stage_fraction,
            self.transport_to_site_fraction,
            self.install_fraction,
        ];
        if parts.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(CalcError::cross_check(
                subject,
                "life-cycle fractions must be finite and non-negative",
            ));
        }
        if (self.sum() - 1.0).abs() > SPLIT_TOLERANCE {
            return Err(CalcError::cross_check(
                subject,
                format!("life-cycle fractions sum to {:.6}, expected 1.0", self.sum()),
            ));
        }
        Ok(())
    }
}

/// Embodied-carbon reference record for one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialFactor {
    pub category: MaterialCategory,
    pub id: String,
    pub name: String,
    pub unit: MaterialUnit,
    /// kg CO2-e per declared unit (negative for carbon-storing products)
    pub embodied_carbon_per_unit: f64,
    pub life_cycle_split: LifeCycleSplit,
}

impl MaterialFactor {
    /// `category/id` form used in keys and messages
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.category.code(), self.id)
    }
}

pub(crate) struct MaterialRow {
    pub category: MaterialCategory,
    pub id: &'static str,
    pub name: &'static str,
    pub unit: MaterialUnit,
    pub factor: f64,
    pub split: LifeCycleSplit,
}

impl MaterialRow {
    pub fn to_factor(&self) -> MaterialFactor {
        MaterialFactor {
            category: self.category,
            id: self.id.to_string(),
            name: self.name.to_string(),
            unit: self.unit,
            embodied_carbon_per_unit: self.factor,
            life_cycle_split: self.split,
        }
    }
}

const CONCRETE_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.90, 0.06, 0.04);
const METAL_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.95, 0.03, 0.02);
const TIMBER_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.85, 0.10, 0.05);
const GLASS_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.92, 0.05, 0.03);
const INSULATION_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.90, 0.05, 0.05);
const MASONRY_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.88, 0.08, 0.04);
const FINISHES_SPLIT: LifeCycleSplit = LifeCycleSplit::new(0.85, 0.05, 0.10);

macro_rules! material {
    ($cat:ident, $id:literal, $name:literal, $unit:ident, $factor:expr, $split:ident) => {
        MaterialRow {
            category: MaterialCategory::$cat,
            id: $id,
            name: $name,
            unit: MaterialUnit::$unit,
            factor: $factor,
            split: $split,
        }
    };
}

pub(crate) const MATERIALS: &[MaterialRow] = &[
    material!(Concrete, "concrete-20mpa", "Concrete 20 MPa", CubicMeter, 260.0, CONCRETE_SPLIT),
    material!(Concrete, "concrete-25mpa", "Concrete 25 MPa", CubicMeter, 280.0, CONCRETE_SPLIT),
    material!(Concrete, "concrete-32mpa", "Concrete 32 MPa", CubicMeter, 310.0, CONCRETE_SPLIT),
    material!(Concrete, "concrete-40mpa", "Concrete 40 MPa", CubicMeter, 360.0, CONCRETE_SPLIT),
    material!(Concrete, "concrete-50mpa", "Concrete 50 MPa", CubicMeter, 410.0, CONCRETE_SPLIT),
    material!(Concrete, "concrete-32mpa-geopolymer", "Geopolymer concrete 32 MPa", CubicMeter, 180.0, CONCRETE_SPLIT),
    material!(Steel, "steel-structural", "Structural steel sections", Tonne, 1550.0, METAL_SPLIT),
    material!(Steel, "steel-rebar", "Reinforcing bar", Tonne, 1400.0, METAL_SPLIT),
    material!(Steel, "steel-sheet", "Galvanised steel sheet", Tonne, 2800.0, METAL_SPLIT),
    material!(Steel, "steel-stainless", "Stainless steel", Tonne, 6150.0, METAL_SPLIT),
    material!(Timber, "timber-softwood-framing", "Softwood framing", CubicMeter, -650.0, TIMBER_SPLIT),
    material!(Timber, "timber-hardwood", "Hardwood", CubicMeter, -820.0, TIMBER_SPLIT),
    material!(Timber, "timber-clt", "Cross-laminated timber", CubicMeter, -500.0, TIMBER_SPLIT),
    material!(Timber, "timber-glulam", "Glued laminated timber", CubicMeter, -520.0, TIMBER_SPLIT),
    material!(Timber, "timber-plywood", "Structural plywood", CubicMeter, -450.0, TIMBER_SPLIT),
    material!(Aluminium, "aluminium-extruded", "Extruded aluminium", Tonne, 8240.0, METAL_SPLIT),
    material!(Aluminium, "aluminium-sheet", "Aluminium sheet", Tonne, 9800.0, METAL_SPLIT),
    material!(Aluminium, "aluminium-recycled", "Recycled aluminium", Tonne, 2100.0, METAL_SPLIT),
    material!(Glass, "glass-float", "Float glass 6 mm", SquareMeter, 25.0, GLASS_SPLIT),
    material!(Glass, "glass-double-glazed", "Double-glazed unit", SquareMeter, 60.0, GLASS_SPLIT),
    material!(Glass, "glass-laminated", "Laminated glass", SquareMeter, 45.0, GLASS_SPLIT),
    material!(Insulation, "insulation-glasswool", "Glasswool batts", SquareMeter, 3.5, INSULATION_SPLIT),
    material!(Insulation, "insulation-rockwool", "Rockwool batts", SquareMeter, 5.2, INSULATION_SPLIT),
    material!(Insulation, "insulation-eps", "Expanded polystyrene board", SquareMeter, 7.8, INSULATION_SPLIT),
    material!(Insulation, "insulation-xps", "Extruded polystyrene board", SquareMeter, 15.6, INSULATION_SPLIT),
    material!(Masonry, "masonry-clay-brick", "Clay brick wall", SquareMeter, 58.0, MASONRY_SPLIT),
    material!(Masonry, "masonry-concrete-block", "Concrete block wall", SquareMeter, 32.0, MASONRY_SPLIT),
    material!(Masonry, "masonry-aac-block", "AAC block wall", SquareMeter, 25.0, MASONRY_SPLIT),
    material!(Finishes, "finishes-plasterboard", "Plasterboard lining", SquareMeter, 4.2, FINISHES_SPLIT),
    material!(Finishes, "finishes-carpet", "Carpet tiles", SquareMeter, 18.0, FINISHES_SPLIT),
    material!(Finishes, "finishes-ceramic-tile", "Ceramic tiles", SquareMeter, 14.0, FINISHES_SPLIT),
    material!(Finishes, "finishes-paint", "Paint system", SquareMeter, 1.8, FINISHES_SPLIT),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_splits_sum_to_one() {
        for row in MATERIALS {
            let subject = format!("{}/{}", row.category, row.id);
            assert!(row.split.check(&subject).is_ok(), "{subject}");
        }
    }

    #[test]
    fn test_split_check_rejects_bad_sum() {
        let split = LifeCycleSplit::new(0.9, 0.2, 0.05);
        let err = split.check("bad").unwrap_err();
        assert_eq!(err.error_code(), "CROSS_CHECK_FAILURE");
    }

    #[test]
    fn test_every_category_has_materials() {
        for category in MaterialCategory::ALL {
            assert!(MATERIALS.iter().any(|m| m.category == category), "{category}");
        }
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            MaterialCategory::from_str_flexible("Aluminum").unwrap(),
            MaterialCategory::Aluminium
        );
        assert!(MaterialCategory::from_str_flexible("plastic").is_err());
    }

    #[test]
    fn test_unit_serialization() {
        let json = serde_json::to_string(&MaterialUnit::CubicMeter).unwrap();
        assert_eq!(json, "\"m3\"");
        let unit: MaterialUnit = serde_json::from_str("\"t\"").unwrap();
        assert_eq!(unit, MaterialUnit::Tonne);
    }
}

//! # Use Stage (B1-B7)
//!
//! Maintenance, repair, replacement and refurbishment carbon over the
//! design life, expressed as multiples of the product-stage total.
//!
//! B1 (use), B6 (operational energy) and B7 (operational water) are not
//! modelled here; operational carbon is outside the embodied scope.
//!
//! | Stage | Formula                                   |
//! |-------|-------------------------------------------|
//! | B2    | floor(L / maintenance) × 2% × P            |
//! | B3    | floor(L / 15) × 5% × P                     |
//! | B4    | floor(L / replacement) × P                 |
//! | B5    | 30% × P when L ≥ 30 years, else 0          |

use serde::{Deserialize, Serialize};

use crate::registry::lifecycle;
use crate::registry::MaterialCategory;
use crate::units::KgCo2e;

/// Share of the product stage spent per maintenance event (B2)
pub const MAINTENANCE_RATE: f64 = 0.02;

/// Years between repairs, independent of category (B3)
pub const REPAIR_INTERVAL_YEARS: f64 = 15.0;

/// Share of the product stage spent per repair (B3)
pub const REPAIR_RATE: f64 = 0.05;

/// Share of the product stage spent on one refurbishment (B5)
pub const REFURBISHMENT_RATE: f64 = 0.30;

/// Design life at which a refurbishment is assumed (B5)
pub const REFURBISHMENT_MIN_LIFE_YEARS: f64 = 30.0;

/// Whether the use stage was computed from a cycle table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseStageBasis {
    #[default]
    Modelled,
    /// The category has no maintenance/replacement cycle; all B values are 0
    NotModelled,
}

/// Use-stage breakdown for one material
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UseStage {
    pub b2: KgCo2e,
    pub b3: KgCo2e,
    pub b4: KgCo2e,
    pub b5: KgCo2e,
    pub maintenance_events: u32,
    pub repair_events: u32,
    pub replacement_cycles: u32,
    pub basis: UseStageBasis,
}

impl UseStage {
    /// B2 + B3 + B4 + B5
    pub fn total(&self) -> KgCo2e {
        self.b2 + self.b3 + self.b4 + self.b5
    }
}

/// Whole cycles completed within the design life; zero for non-positive lives.
fn whole_cycles(design_life_years: f64, interval_years: f64) -> u32 {
    if design_life_years <= 0.0 || interval_years <= 0.0 {
        return 0;
    }
    (design_life_years / interval_years).floor() as u32
}

/// Compute B2-B5 for a material of `category` with product-stage total `product`.
///
/// `design_life_years` must already be finite; a non-positive value yields
/// an all-zero result.
pub fn compute_use_stage(
    category: MaterialCategory,
    product: KgCo2e,
    design_life_years: f64,
) -> UseStage {
    let Some(cycle) = lifecycle::cycle_years(category) else {
        tracing::warn!(
            category = %category,
            "no maintenance/replacement cycle for category; use stage not modelled"
        );
        return UseStage {
            basis: UseStageBasis::NotModelled,
            ..UseStage::default()
        };
    };

    if design_life_years <= 0.0 {
        return UseStage::default();
    }

    let maintenance_events = whole_cycles(design_life_years, cycle.maintenance_years);
    let repair_events = whole_cycles(design_life_years, REPAIR_INTERVAL_YEARS);
    let replacement_cycles = whole_cycles(design_life_years, cycle.replacement_years);

    let b5 = if design_life_years >= REFURBISHMENT_MIN_LIFE_YEARS {
        product * REFURBISHMENT_RATE
    } else {
        KgCo2e(0.0)
    };

    UseStage {
        b2: product * (f64::from(maintenance_events) * MAINTENANCE_RATE),
        b3: product * (f64::from(repair_events) * REPAIR_RATE),
        b4: product * f64::from(replacement_cycles),
        b5,
        maintenance_events,
        repair_events,
        replacement_cycles,
        basis: UseStageBasis::Modelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_cycles_over_fifty_years() {
        // Concrete replaces every 100 years, glass every 30
        let concrete = compute_use_stage(MaterialCategory::Concrete, KgCo2e(1000.0), 50.0);
        assert_eq!(concrete.replacement_cycles, 0);
        assert_eq!(concrete.b4.0, 0.0);

        let glass = compute_use_stage(MaterialCategory::Glass, KgCo2e(1000.0), 50.0);
        assert_eq!(glass.replacement_cycles, 1);
        assert_eq!(glass.b4.0, 1000.0);
    }

    #[test]
    fn test_sixty_year_concrete() {
        let stage = compute_use_stage(MaterialCategory::Concrete, KgCo2e(27_900.0), 60.0);
        assert_eq!(stage.maintenance_events, 2);
        assert_eq!(stage.repair_events, 4);
        assert!((stage.b2.0 - 1116.0).abs() < 1e-9);
        assert!((stage.b3.0 - 5580.0).abs() < 1e-9);
        assert!((stage.b5.0 - 8370.0).abs() < 1e-9);
        assert_eq!(stage.basis, UseStageBasis::Modelled);
    }

    #[test]
    fn test_non_positive_life_is_zero() {
        for life in [0.0, -10.0] {
            let stage = compute_use_stage(MaterialCategory::Steel, KgCo2e(5000.0), life);
            assert_eq!(stage.total().0, 0.0);
            assert_eq!(stage.replacement_cycles, 0);
        }
    }

    #[test]
    fn test_short_life_has_no_refurbishment() {
        let stage = compute_use_stage(MaterialCategory::Timber, KgCo2e(-500.0), 29.0);
        assert_eq!(stage.b5.0, 0.0);
        assert_eq!(stage.maintenance_events, 2);
    }

    #[test]
    fn test_finishes_not_modelled() {
        let stage = compute_use_stage(MaterialCategory::Finishes, KgCo2e(800.0), 60.0);
        assert_eq!(stage.basis, UseStageBasis::NotModelled);
        assert_eq!(stage.total().0, 0.0);
    }
}

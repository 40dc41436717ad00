//! # End of Life (C1-C4) and Beyond the Life Cycle (D)

use serde::{Deserialize, Serialize};

use crate::registry::lifecycle;
use crate::registry::MaterialCategory;
use crate::units::KgCo2e;

/// Deconstruction / demolition share of the end-of-life total
pub const C1_SHARE: f64 = 0.40;
/// Transport to processing
pub const C2_SHARE: f64 = 0.30;
/// Waste processing
pub const C3_SHARE: f64 = 0.20;
/// Disposal
pub const C4_SHARE: f64 = 0.10;

/// End-of-life breakdown for one material
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EndOfLife {
    pub c1: KgCo2e,
    pub c2: KgCo2e,
    pub c3: KgCo2e,
    pub c4: KgCo2e,
}

impl EndOfLife {
    pub fn total(&self) -> KgCo2e {
        self.c1 + self.c2 + self.c3 + self.c4
    }
}

/// Split `product × eol_fraction(category)` across C1-C4.
pub fn compute_end_of_life(category: MaterialCategory, product: KgCo2e) -> EndOfLife {
    let total = product * lifecycle::end_of_life_fraction(category);
    EndOfLife {
        c1: total * C1_SHARE,
        c2: total * C2_SHARE,
        c3: total * C3_SHARE,
        c4: total * C4_SHARE,
    }
}

/// Stage D credit: `-|product| × recycling rate × benefit factor`.
///
/// Always ≤ 0; categories without a recycling profile get no credit.
pub fn compute_stage_d(category: MaterialCategory, product: KgCo2e) -> KgCo2e {
    KgCo2e(-product.0.abs() * lifecycle::recycling_benefit(category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_sum_to_one() {
        assert!((C1_SHARE + C2_SHARE + C3_SHARE + C4_SHARE - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_concrete_end_of_life() {
        let eol = compute_end_of_life(MaterialCategory::Concrete, KgCo2e(27_900.0));
        assert!((eol.total().0 - 1395.0).abs() < 1e-9);
        assert!((eol.c1.0 - 558.0).abs() < 1e-9);
        assert!((eol.c4.0 - 139.5).abs() < 1e-9);
    }

    #[test]
    fn test_stage_d_is_a_credit() {
        let steel = compute_stage_d(MaterialCategory::Steel, KgCo2e(10_000.0));
        assert!((steel.0 + 4500.0).abs() < 1e-9);

        // Timber's negative product stage still earns a credit, not a charge
        let timber = compute_stage_d(MaterialCategory::Timber, KgCo2e(-1000.0));
        assert!(timber.0 < 0.0);

        let insulation = compute_stage_d(MaterialCategory::Insulation, KgCo2e(100.0));
        assert_eq!(insulation.0, 0.0);
    }
}

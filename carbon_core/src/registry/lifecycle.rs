//! Per-category life-cycle assumptions for stages B, C and D.
//!
//! This module is the single place where a missing category entry turns
//! into a value. Each fallback is a named constant; formulas elsewhere
//! never supply their own defaults.

use serde::{Deserialize, Serialize};

use super::materials::MaterialCategory;

/// End-of-life share of the product stage for categories without an entry
pub const DEFAULT_END_OF_LIFE_FRACTION: f64 = 0.08;

/// Stage D benefit for categories without a recycling profile
pub const DEFAULT_RECYCLING_BENEFIT: f64 = 0.0;

/// Recycled content assumed for categories without an entry
pub const DEFAULT_RECYCLED_CONTENT: f64 = 0.0;

/// Maintenance and replacement intervals for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleYears {
    pub maintenance_years: f64,
    pub replacement_years: f64,
}

/// End-of-life recovery for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecyclingProfile {
    /// Share of the material recovered at end of life
    pub recycling_rate: f64,
    /// Avoided burden per unit of recovered product-stage carbon
    pub benefit_factor: f64,
}

const CYCLES: &[(MaterialCategory, CycleYears)] = &[
    (MaterialCategory::Concrete, CycleYears { maintenance_years: 25.0, replacement_years: 100.0 }),
    (MaterialCategory::Steel, CycleYears { maintenance_years: 20.0, replacement_years: 80.0 }),
    (MaterialCategory::Timber, CycleYears { maintenance_years: 10.0, replacement_years: 50.0 }),
    (MaterialCategory::Aluminium, CycleYears { maintenance_years: 15.0, replacement_years: 60.0 }),
    (MaterialCategory::Glass, CycleYears { maintenance_years: 10.0, replacement_years: 30.0 }),
    (MaterialCategory::Insulation, CycleYears { maintenance_years: 25.0, replacement_years: 40.0 }),
    (MaterialCategory::Masonry, CycleYears { maintenance_years: 30.0, replacement_years: 100.0 }),
];

const END_OF_LIFE: &[(MaterialCategory, f64)] = &[
    (MaterialCategory::Concrete, 0.05),
    (MaterialCategory::Steel, 0.03),
    (MaterialCategory::Timber, 0.10),
    (MaterialCategory::Aluminium, 0.02),
    (MaterialCategory::Glass, 0.04),
    (MaterialCategory::Insulation, 0.12),
    (MaterialCategory::Masonry, 0.06),
];

const RECYCLING: &[(MaterialCategory, RecyclingProfile)] = &[
    (MaterialCategory::Concrete, RecyclingProfile { recycling_rate: 0.70, benefit_factor: 0.05 }),
    (MaterialCategory::Steel, RecyclingProfile { recycling_rate: 0.90, benefit_factor: 0.50 }),
    (MaterialCategory::Timber, RecyclingProfile { recycling_rate: 0.40, benefit_factor: 0.30 }),
    (MaterialCategory::Aluminium, RecyclingProfile { recycling_rate: 0.95, benefit_factor: 0.85 }),
    (MaterialCategory::Glass, RecyclingProfile { recycling_rate: 0.30, benefit_factor: 0.20 }),
    (MaterialCategory::Masonry, RecyclingProfile { recycling_rate: 0.50, benefit_factor: 0.05 }),
];

const RECYCLED_CONTENT: &[(MaterialCategory, f64)] = &[
    (MaterialCategory::Concrete, 0.05),
    (MaterialCategory::Steel, 0.35),
    (MaterialCategory::Timber, 0.0),
    (MaterialCategory::Aluminium, 0.30),
    (MaterialCategory::Glass, 0.20),
    (MaterialCategory::Insulation, 0.25),
    (MaterialCategory::Masonry, 0.10),
    (MaterialCategory::Finishes, 0.10),
];

fn find<T: Copy>(table: &[(MaterialCategory, T)], category: MaterialCategory) -> Option<T> {
    table.iter().find(|(c, _)| *c == category).map(|(_, v)| *v)
}

/// Maintenance/replacement intervals, or `None` when the category is not modelled
pub fn cycle_years(category: MaterialCategory) -> Option<CycleYears> {
    find(CYCLES, category)
}

/// Share of the product stage emitted at end of life (C1-C4)
pub fn end_of_life_fraction(category: MaterialCategory) -> f64 {
    find(END_OF_LIFE, category).unwrap_or(DEFAULT_END_OF_LIFE_FRACTION)
}

/// Recycling profile for stage D, or `None` when the category has none
pub fn recycling_profile(category: MaterialCategory) -> Option<RecyclingProfile> {
    find(RECYCLING, category)
}

/// Stage D multiplier (rate × benefit factor)
pub fn recycling_benefit(category: MaterialCategory) -> f64 {
    recycling_profile(category)
        .map(|p| p.recycling_rate * p.benefit_factor)
        .unwrap_or(DEFAULT_RECYCLING_BENEFIT)
}

/// Typical recycled content as a fraction of the product
pub fn typical_recycled_content(category: MaterialCategory) -> f64 {
    find(RECYCLED_CONTENT, category).unwrap_or(DEFAULT_RECYCLED_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finishes_have_no_cycle_entry() {
        assert!(cycle_years(MaterialCategory::Finishes).is_none());
        assert!(cycle_years(MaterialCategory::Concrete).is_some());
    }

    #[test]
    fn test_end_of_life_default() {
        assert_eq!(end_of_life_fraction(MaterialCategory::Finishes), DEFAULT_END_OF_LIFE_FRACTION);
        assert_eq!(end_of_life_fraction(MaterialCategory::Steel), 0.03);
    }

    #[test]
    fn test_recycling_benefit() {
        assert!((recycling_benefit(MaterialCategory::Steel) - 0.45).abs() < 1e-12);
        assert_eq!(recycling_benefit(MaterialCategory::Insulation), DEFAULT_RECYCLING_BENEFIT);
    }
}

//! Green Star Buildings points estimate.
//!
//! Only the upfront-carbon and recycled-content credits are computed from
//! project data. The remaining categories are outside this engine and are
//! entered as a fixed assumed contribution, so the star tier is an
//! indicative estimate rather than a certified rating.

use serde::{Deserialize, Serialize};

use super::{Outcome, Standard, StandardReport};

/// Reference building intensity, kg CO2-e/m²
pub const BENCHMARK_INTENSITY: f64 = 800.0;

/// Recycled content assumed when the project does not supply one
pub const DEFAULT_RECYCLED_CONTENT_PCT: f64 = 15.0;

/// (minimum reduction vs benchmark %, points)
pub const CARBON_REDUCTION_BANDS: [(f64, u32); 4] = [(40.0, 20), (30.0, 15), (20.0, 10), (10.0, 5)];

/// (minimum recycled content %, points)
pub const RECYCLED_CONTENT_BANDS: [(f64, u32); 4] = [(50.0, 10), (30.0, 7), (15.0, 4), (5.0, 2)];

/// Assumed points from categories not assessed here
pub const FIXED_CONTRIBUTIONS: [(&str, u32); 7] = [
    ("management", 8),
    ("indoor_environment", 9),
    ("energy", 10),
    ("transport", 4),
    ("water", 4),
    ("land_use_ecology", 2),
    ("emissions", 3),
];

/// (minimum total points, star tier)
pub const STAR_BANDS: [(u32, u8); 3] = [(60, 6), (50, 5), (45, 4)];

/// Points breakdown behind a Green Star estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenStarPoints {
    pub carbon_reduction_pct: f64,
    pub carbon_points: u32,
    pub recycled_content_pct: f64,
    pub recycled_content_assumed: bool,
    pub recycled_content_points: u32,
    pub fixed_points: u32,
    pub total_points: u32,
    /// `None` below the 4 Star threshold
    pub star_tier: Option<u8>,
}

fn band_points(value: f64, bands: &[(f64, u32)]) -> u32 {
    bands
        .iter()
        .find(|(min, _)| value >= *min)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

pub fn fixed_points() -> u32 {
    FIXED_CONTRIBUTIONS.iter().map(|(_, p)| p).sum()
}

/// Points and star tier for an intensity and optional recycled content
pub fn score(intensity: f64, recycled_content_pct: Option<f64>) -> GreenStarPoints {
    let carbon_reduction_pct = (BENCHMARK_INTENSITY - intensity) / BENCHMARK_INTENSITY * 100.0;
    let carbon_points = band_points(carbon_reduction_pct, &CARBON_REDUCTION_BANDS);

    let recycled = recycled_content_pct.unwrap_or(DEFAULT_RECYCLED_CONTENT_PCT);
    let recycled_content_points = band_points(recycled, &RECYCLED_CONTENT_BANDS);

    let fixed = fixed_points();
    let total_points = carbon_points + recycled_content_points + fixed;
    let star_tier = STAR_BANDS
        .iter()
        .find(|(min, _)| total_points >= *min)
        .map(|(_, stars)| *stars);

    GreenStarPoints {
        carbon_reduction_pct,
        carbon_points,
        recycled_content_pct: recycled,
        recycled_content_assumed: recycled_content_pct.is_none(),
        recycled_content_points,
        fixed_points: fixed,
        total_points,
        star_tier,
    }
}

pub(crate) fn assess(intensity: f64, recycled_content_pct: Option<f64>) -> StandardReport {
    let points = score(intensity, recycled_content_pct);
    let tier = match points.star_tier {
        Some(stars) => format!("{stars} Star"),
        None => "Not Rated".to_string(),
    };

    let mut report = StandardReport::new(
        Standard::GreenStar,
        tier,
        points.star_tier.is_some(),
        BENCHMARK_INTENSITY,
        Outcome::Points {
            breakdown: points.clone(),
        },
    )
    .metric("carbon_intensity", intensity)
    .metric("carbon_reduction_pct", points.carbon_reduction_pct)
    .metric("carbon_points", f64::from(points.carbon_points))
    .metric("recycled_content_pct", points.recycled_content_pct)
    .metric("recycled_content_points", f64::from(points.recycled_content_points))
    .metric("total_points", f64::from(points.total_points));

    if points.carbon_points < CARBON_REDUCTION_BANDS[0].1 {
        report = report.recommend(format!(
            "Upfront carbon is {:.0}% below the {:.0} kg CO2-e/m² reference; a 40% reduction earns the full 20 points",
            points.carbon_reduction_pct, BENCHMARK_INTENSITY
        ));
    }
    if points.recycled_content_assumed {
        report = report.recommend(format!(
            "Recycled content assumed at {DEFAULT_RECYCLED_CONTENT_PCT:.0}%; supply supplier declarations to claim the actual figure"
        ));
    } else if points.recycled_content_points < RECYCLED_CONTENT_BANDS[0].1 {
        report = report.recommend("Raise recycled content toward 50% (recycled steel, aggregate, aluminium)");
    }
    if points.star_tier.is_none() {
        report = report.recommend(format!(
            "{} more points are needed for a 4 Star rating",
            STAR_BANDS[2].0 - points.total_points
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_block_is_forty() {
        assert_eq!(fixed_points(), 40);
    }

    #[test]
    fn test_zero_intensity_is_six_star() {
        let points = score(0.0, None);
        assert_eq!(points.carbon_reduction_pct, 100.0);
        assert_eq!(points.carbon_points, 20);
        assert_eq!(points.recycled_content_points, 4);
        assert_eq!(points.total_points, 64);
        assert_eq!(points.star_tier, Some(6));
    }

    #[test]
    fn test_band_edges() {
        // 20% reduction → 640 kg/m²
        assert_eq!(score(640.0, Some(0.0)).carbon_points, 10);
        assert_eq!(score(640.1, Some(0.0)).carbon_points, 5);
        assert_eq!(score(900.0, Some(0.0)).carbon_points, 0);
        assert_eq!(score(900.0, Some(50.0)).recycled_content_points, 10);
        assert_eq!(score(900.0, Some(4.9)).recycled_content_points, 0);
    }

    #[test]
    fn test_not_rated() {
        // 0 carbon points + 2 recycled + 40 fixed
        let report = assess(850.0, Some(5.0));
        assert!(!report.compliant);
        assert_eq!(report.rating_tier, "Not Rated");
        assert!(report.recommendations.iter().any(|r| r.contains("3 more points")));
    }

    #[test]
    fn test_four_and_five_star() {
        assert_eq!(score(700.0, Some(15.0)).star_tier, Some(4)); // 5 + 4 + 40
        assert_eq!(score(500.0, Some(0.0)).star_tier, Some(5)); // 15 + 0 + 40 = 55
    }
}

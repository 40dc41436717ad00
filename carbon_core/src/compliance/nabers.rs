//! NABERS embodied-carbon star rating.
//!
//! Half-star levels from 1 to 6, each with a maximum intensity. The rating
//! is the highest level whose ceiling the intensity satisfies; anything
//! above the 1-star ceiling rates 0 stars.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Outcome, Standard, StandardReport};

/// (half-stars, maximum kg CO2-e/m²), most stringent first
pub const STAR_CEILINGS: [(u8, f64); 11] = [
    (12, 200.0),
    (11, 275.0),
    (10, 350.0),
    (9, 425.0),
    (8, 500.0),
    (7, 575.0),
    (6, 650.0),
    (5, 725.0),
    (4, 800.0),
    (3, 875.0),
    (2, 950.0),
];

/// Lowest rating that counts as compliant (3 stars)
pub const COMPLIANT_HALF_STARS: u8 = 6;

/// Star rating held as a count of half stars
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct StarRating {
    pub half_stars: u8,
}

impl StarRating {
    pub fn stars(&self) -> f64 {
        f64::from(self.half_stars) / 2.0
    }

    pub fn is_rated(&self) -> bool {
        self.half_stars > 0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stars = if self.half_stars % 2 == 0 {
            format!("{}", self.half_stars / 2)
        } else {
            format!("{:.1}", self.stars())
        };
        let plural = if self.half_stars == 2 { "" } else { "s" };
        write!(f, "{stars} Star{plural}")
    }
}

/// Star rating for an intensity; NaN rates 0 stars.
pub fn rate(intensity: f64) -> StarRating {
    STAR_CEILINGS
        .iter()
        .find(|(_, ceiling)| intensity <= *ceiling)
        .map(|(half_stars, _)| StarRating { half_stars: *half_stars })
        .unwrap_or_default()
}

/// The next half-star level up and its ceiling, if any
fn next_level(rating: StarRating) -> Option<(StarRating, f64)> {
    STAR_CEILINGS
        .iter()
        .rev()
        .find(|(half_stars, _)| *half_stars > rating.half_stars)
        .map(|(half_stars, ceiling)| (StarRating { half_stars: *half_stars }, *ceiling))
}

fn ceiling_for(half_stars: u8) -> f64 {
    STAR_CEILINGS
        .iter()
        .find(|(h, _)| *h == half_stars)
        .map(|(_, c)| *c)
        .unwrap_or(f64::INFINITY)
}

pub(crate) fn assess(intensity: f64) -> StandardReport {
    let rating = rate(intensity);
    let compliant = rating.half_stars >= COMPLIANT_HALF_STARS;

    let mut report = StandardReport::new(
        Standard::Nabers,
        rating.to_string(),
        compliant,
        ceiling_for(COMPLIANT_HALF_STARS),
        Outcome::Stars { rating },
    )
    .metric("carbon_intensity", intensity)
    .metric("stars", rating.stars());

    if let Some((next, ceiling)) = next_level(rating) {
        report = report
            .metric("next_level_ceiling", ceiling)
            .metric("reduction_to_next_level", intensity - ceiling);
        if compliant {
            report = report.recommend(format!(
                "Reduce intensity by {:.0} kg CO2-e/m² to achieve {next}",
                intensity - ceiling
            ));
        }
    }

    if !compliant {
        report = report
            .recommend(format!(
                "Below the 3 Star market benchmark of {:.0} kg CO2-e/m²; prioritise the \
                 structural frame and envelope for material substitution",
                ceiling_for(COMPLIANT_HALF_STARS)
            ))
            .recommend("Source low-carbon concrete and steel with verified EPDs");
    } else if rating.half_stars == STAR_CEILINGS[0].0 {
        report = report.recommend("Maximum star rating achieved; maintain specifications through procurement");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ceilings_ascend() {
        for pair in STAR_CEILINGS.windows(2) {
            assert!(pair[0].0 > pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
    }

    #[test]
    fn test_half_star_levels() {
        assert_eq!(rate(0.0).stars(), 6.0);
        assert_eq!(rate(200.0).stars(), 6.0);
        assert_eq!(rate(200.5).stars(), 5.5);
        assert_eq!(rate(650.0).stars(), 3.0);
        assert_eq!(rate(950.0).stars(), 1.0);
        assert_eq!(rate(950.5).stars(), 0.0);
        assert_eq!(rate(f64::NAN).stars(), 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(StarRating { half_stars: 9 }.to_string(), "4.5 Stars");
        assert_eq!(StarRating { half_stars: 2 }.to_string(), "1 Star");
        assert_eq!(StarRating { half_stars: 0 }.to_string(), "0 Stars");
    }

    #[test]
    fn test_compliance_threshold() {
        assert!(assess(650.0).compliant);
        assert!(!assess(651.0).compliant);
        assert_eq!(assess(651.0).benchmark_used, 650.0);
    }

    #[test]
    fn test_top_rating_recommendation() {
        let report = assess(150.0);
        assert!(report.recommendations[0].contains("Maximum"));
        assert!(!report.metrics.contains_key("next_level_ceiling"));
    }

    #[test]
    fn test_next_level_metric() {
        let report = assess(480.0);
        assert_eq!(report.metrics["next_level_ceiling"], 425.0);
        assert_eq!(report.metrics["reduction_to_next_level"], 55.0);
    }

    proptest! {
        #[test]
        fn prop_rating_is_monotonic(x in -500.0..2_000.0f64, y in -500.0..2_000.0f64) {
            let (lo, hi) = if x < y { (x, y) } else { (y, x) };
            prop_assert!(rate(lo) >= rate(hi));
        }
    }
}

//! NCC embodied-carbon benchmark: four ascending intensity thresholds per
//! building class. The first threshold the intensity does not exceed sets
//! the tier; anything above the minimum threshold is non-compliant.

use serde::{Deserialize, Serialize};

use super::{Outcome, ProjectType, Standard, StandardReport};

/// Code tier, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NccTier {
    Excellent,
    Good,
    Average,
    Minimum,
    NonCompliant,
}

impl NccTier {
    pub fn label(&self) -> &'static str {
        match self {
            NccTier::Excellent => "Excellent",
            NccTier::Good => "Good",
            NccTier::Average => "Average",
            NccTier::Minimum => "Minimum",
            NccTier::NonCompliant => "Non-Compliant",
        }
    }
}

/// Tier ceilings in kg CO2-e/m²
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NccThresholds {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub minimum: f64,
}

impl NccThresholds {
    fn tiers(&self) -> [(NccTier, f64); 4] {
        [
            (NccTier::Excellent, self.excellent),
            (NccTier::Good, self.good),
            (NccTier::Average, self.average),
            (NccTier::Minimum, self.minimum),
        ]
    }
}

pub const NCC_THRESHOLDS: [(ProjectType, NccThresholds); 4] = [
    (
        ProjectType::Residential,
        NccThresholds { excellent: 350.0, good: 500.0, average: 650.0, minimum: 800.0 },
    ),
    (
        ProjectType::Commercial,
        NccThresholds { excellent: 450.0, good: 600.0, average: 750.0, minimum: 850.0 },
    ),
    (
        ProjectType::Industrial,
        NccThresholds { excellent: 400.0, good: 550.0, average: 700.0, minimum: 900.0 },
    ),
    (
        ProjectType::Infrastructure,
        NccThresholds { excellent: 500.0, good: 700.0, average: 900.0, minimum: 1100.0 },
    ),
];

pub fn thresholds(project_type: ProjectType) -> NccThresholds {
    match project_type {
        ProjectType::Residential => NCC_THRESHOLDS[0].1,
        ProjectType::Commercial => NCC_THRESHOLDS[1].1,
        ProjectType::Industrial => NCC_THRESHOLDS[2].1,
        ProjectType::Infrastructure => NCC_THRESHOLDS[3].1,
    }
}

/// Tier for an intensity; NaN falls through to `NonCompliant`.
pub fn classify_tier(intensity: f64, project_type: ProjectType) -> NccTier {
    thresholds(project_type)
        .tiers()
        .into_iter()
        .find(|(_, ceiling)| intensity <= *ceiling)
        .map(|(tier, _)| tier)
        .unwrap_or(NccTier::NonCompliant)
}

pub(crate) fn assess(intensity: f64, project_type: ProjectType) -> StandardReport {
    let limits = thresholds(project_type);
    let tier = classify_tier(intensity, project_type);

    let report = StandardReport::new(
        Standard::Ncc,
        tier.label(),
        tier != NccTier::NonCompliant,
        limits.minimum,
        Outcome::CodeTier { tier },
    )
    .metric("carbon_intensity", intensity)
    .metric("threshold_excellent", limits.excellent)
    .metric("threshold_good", limits.good)
    .metric("threshold_average", limits.average)
    .metric("threshold_minimum", limits.minimum)
    .metric("margin_to_minimum", limits.minimum - intensity);

    match tier {
        NccTier::NonCompliant => report
            .recommend(format!(
                "Carbon intensity exceeds the {project_type} minimum of {:.0} kg CO2-e/m² by {:.0}; \
                 substitute the highest-carbon materials before approval",
                limits.minimum,
                intensity - limits.minimum
            ))
            .recommend("Specify concrete with supplementary cementitious materials (fly ash, slag)")
            .recommend("Consider timber or hybrid structure to replace steel and concrete framing"),
        NccTier::Minimum | NccTier::Average => report
            .recommend(format!(
                "Reduce intensity by {:.0} kg CO2-e/m² to reach the Good tier",
                intensity - limits.good
            ))
            .recommend("Increase recycled content in steel and aluminium"),
        NccTier::Good => report.recommend(format!(
            "Reduce intensity by {:.0} kg CO2-e/m² to reach the Excellent tier",
            intensity - limits.excellent
        )),
        NccTier::Excellent => report
            .recommend("Record material specifications as evidence for the Excellent tier"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_project_type() {
        for pt in ProjectType::ALL {
            assert!(NCC_THRESHOLDS.iter().any(|(t, _)| *t == pt));
            let limits = thresholds(pt);
            assert!(limits.excellent < limits.good);
            assert!(limits.good < limits.average);
            assert!(limits.average < limits.minimum);
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let pt = ProjectType::Residential;
        assert_eq!(classify_tier(350.0, pt), NccTier::Excellent);
        assert_eq!(classify_tier(350.1, pt), NccTier::Good);
        assert_eq!(classify_tier(800.0, pt), NccTier::Minimum);
        assert_eq!(classify_tier(800.1, pt), NccTier::NonCompliant);
    }

    #[test]
    fn test_commercial_tiers() {
        let pt = ProjectType::Commercial;
        assert_eq!(classify_tier(0.0, pt), NccTier::Excellent);
        assert_eq!(classify_tier(-120.0, pt), NccTier::Excellent);
        assert_eq!(classify_tier(700.0, pt), NccTier::Average);
        assert_eq!(classify_tier(f64::NAN, pt), NccTier::NonCompliant);
    }

    #[test]
    fn test_non_compliant_report() {
        let report = assess(1200.0, ProjectType::Infrastructure);
        assert!(!report.compliant);
        assert_eq!(report.rating_tier, "Non-Compliant");
        assert_eq!(report.benchmark_used, 1100.0);
        assert!(report.recommendations[0].contains("exceeds"));
        assert_eq!(report.metrics["margin_to_minimum"], -100.0);
    }
}

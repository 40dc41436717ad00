//! Climate-related financial disclosure trigger.
//!
//! Converts the project total to tonnes and compares it with the emissions
//! threshold for the reporting entity's size. There is no tiering: the
//! result is a reporting obligation, never a failure.

use serde::{Deserialize, Serialize};

use super::{CompanySize, Outcome, Standard, StandardReport};
use crate::units::{KgCo2e, TonnesCo2e};

/// Emissions above which disclosure is required, tonnes CO2-e
pub const DISCLOSURE_THRESHOLDS: [(CompanySize, f64); 3] = [
    (CompanySize::Large, 25_000.0),
    (CompanySize::Medium, 50_000.0),
    (CompanySize::Small, 100_000.0),
];

pub fn threshold_tonnes(size: CompanySize) -> f64 {
    match size {
        CompanySize::Large => DISCLOSURE_THRESHOLDS[0].1,
        CompanySize::Medium => DISCLOSURE_THRESHOLDS[1].1,
        CompanySize::Small => DISCLOSURE_THRESHOLDS[2].1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureAssessment {
    pub emissions_tonnes: TonnesCo2e,
    pub threshold_tonnes: f64,
    pub company_size: CompanySize,
    pub reporting_required: bool,
}

pub fn evaluate(total_carbon: KgCo2e, company_size: CompanySize) -> DisclosureAssessment {
    let emissions_tonnes = TonnesCo2e::from(total_carbon);
    let threshold = threshold_tonnes(company_size);
    DisclosureAssessment {
        emissions_tonnes,
        threshold_tonnes: threshold,
        company_size,
        reporting_required: emissions_tonnes.0 >= threshold,
    }
}

pub(crate) fn assess(total_carbon: KgCo2e, company_size: CompanySize) -> StandardReport {
    let assessment = evaluate(total_carbon, company_size);
    let tier = if assessment.reporting_required {
        "Reporting Required"
    } else {
        "Below Threshold"
    };

    let report = StandardReport::new(
        Standard::ClimateDisclosure,
        tier,
        true,
        assessment.threshold_tonnes,
        Outcome::Disclosure {
            assessment: assessment.clone(),
        },
    )
    .metric("emissions_tonnes", assessment.emissions_tonnes.0)
    .metric("threshold_tonnes", assessment.threshold_tonnes)
    .metric(
        "threshold_utilisation_pct",
        assessment.emissions_tonnes.0 / assessment.threshold_tonnes * 100.0,
    );

    if assessment.reporting_required {
        report
            .recommend("Include project emissions in the entity's mandatory climate disclosure")
            .recommend("Retain activity data and emission factor sources as assurance evidence")
    } else {
        report.recommend(format!(
            "Project emissions are {:.0} t below the {} entity threshold; voluntary disclosure remains available",
            assessment.threshold_tonnes - assessment.emissions_tonnes.0,
            company_size
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_by_size() {
        assert_eq!(threshold_tonnes(CompanySize::Large), 25_000.0);
        assert_eq!(threshold_tonnes(CompanySize::default()), 50_000.0);
    }

    #[test]
    fn test_trigger_is_inclusive() {
        let at = evaluate(KgCo2e(25_000_000.0), CompanySize::Large);
        assert!(at.reporting_required);
        let below = evaluate(KgCo2e(24_999_999.0), CompanySize::Large);
        assert!(!below.reporting_required);
    }

    #[test]
    fn test_always_compliant() {
        let report = assess(KgCo2e(200_000_000.0), CompanySize::Small);
        assert!(report.compliant);
        assert_eq!(report.rating_tier, "Reporting Required");
        assert_eq!(report.metrics["emissions_tonnes"], 200_000.0);
    }
}

//! # Report Narrative
//!
//! Prose for a [`ProjectComplianceReport`]. Writers only ever see a shared
//! borrow of the report, so ratings and compliance flags stay exactly as
//! the classifier produced them.
//!
//! [`TemplateNarrative`] is deterministic: the same report always yields
//! the same text. [`NarrativeWriter::narrate_checked`] rejects prose that
//! claims to make a compliance decision itself, which matters for writers
//! backed by other services.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::compliance::{generate_compliance_report, ComplianceInput, ProjectType};
//! use carbon_core::narrative::{NarrativeWriter, TemplateNarrative};
//! use carbon_core::units::{KgCo2e, SquareMeters};
//!
//! let report = generate_compliance_report(&ComplianceInput {
//!     project_name: "Harbour Offices".to_string(),
//!     project_type: ProjectType::Commercial,
//!     floor_area: SquareMeters(5_000.0),
//!     total_carbon: KgCo2e(2_400_000.0),
//!     company_size: None,
//!     recycled_content_pct: None,
//! }).unwrap();
//!
//! let text = TemplateNarrative.narrate(&report);
//! assert!(text.starts_with("# Harbour Offices"));
//! ```

use std::fmt::Write;

use crate::compliance::{ProjectComplianceReport, StandardReport};
use crate::errors::{CalcError, CalcResult};

/// Produces prose from a finished report.
pub trait NarrativeWriter {
    fn narrate(&self, report: &ProjectComplianceReport) -> String;

    /// Narrate, failing with `InvalidInput` when the prose presents a
    /// compliance decision as the writer's own.
    fn narrate_checked(&self, report: &ProjectComplianceReport) -> CalcResult<String> {
        let text = self.narrate(report);
        let found = decision_language(&text);
        if !found.is_empty() {
            tracing::warn!(project = %report.project_name, phrases = ?found, "narrative rejected");
            return Err(CalcError::invalid_input(
                "narrative",
                found.join(", "),
                "Narrative must describe the classifier's ratings, not make its own determination",
            ));
        }
        Ok(text)
    }
}

/// Phrases that present a compliance decision as the writer's own
const DECISION_PHRASES: [&str; 6] = [
    "i determine",
    "i conclude",
    "i find that",
    "my analysis shows",
    "based on my evaluation",
    "i evaluated",
];

/// Decision phrases found in `text`, case-insensitively
fn decision_language(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    DECISION_PHRASES
        .iter()
        .copied()
        .filter(|phrase| lower.contains(phrase))
        .collect()
}

/// Maximum recommendations listed under priority actions
pub const MAX_PRIORITY_ACTIONS: usize = 5;

/// Fixed-template narrative
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrative;

impl TemplateNarrative {
    fn executive_summary(out: &mut String, report: &ProjectComplianceReport) {
        let passed = report.standards.iter().filter(|r| r.compliant).count();
        let _ = writeln!(out, "## Executive summary\n");
        let _ = writeln!(
            out,
            "The {} project has {:.0} kg CO2-e of embodied carbon over {:.0} m², an intensity of \
             {:.1} kg CO2-e/m² ({} of comparable buildings).",
            report.project_type,
            report.total_carbon.0,
            report.floor_area.0,
            report.carbon_intensity,
            report.industry_percentile,
        );
        let status = if report.overall_compliant {
            "meets every assessed standard"
        } else {
            "does not yet meet every assessed standard"
        };
        let _ = writeln!(
            out,
            "It {status}: {passed} of {} standards passed.\n",
            report.standards.len()
        );
    }

    fn finding(out: &mut String, standard: &StandardReport) {
        let status = if standard.compliant { "pass" } else { "FAIL" };
        let _ = writeln!(out, "### {}\n", standard.standard_name);
        let _ = writeln!(out, "- Rating: {} ({status})", standard.rating_tier);
        let _ = writeln!(out, "- Benchmark: {}", standard.benchmark_used);
        for (name, value) in &standard.metrics {
            let _ = writeln!(out, "- {name}: {value:.2}");
        }
        out.push('\n');
    }

    /// Failing standards' recommendations first, then the rest, deduplicated.
    fn priority_actions(report: &ProjectComplianceReport) -> Vec<&str> {
        let failing = report.standards.iter().filter(|r| !r.compliant);
        let passing = report.standards.iter().filter(|r| r.compliant);

        let mut actions: Vec<&str> = Vec::new();
        for text in failing.chain(passing).flat_map(|r| r.recommendations.iter()) {
            if !actions.contains(&text.as_str()) {
                actions.push(text);
            }
            if actions.len() == MAX_PRIORITY_ACTIONS {
                break;
            }
        }
        actions
    }

    fn readiness(out: &mut String, report: &ProjectComplianceReport) {
        let _ = writeln!(out, "## Certification readiness\n");
        let failures: Vec<&str> = report.failures().map(|r| r.standard_name.as_str()).collect();
        if failures.is_empty() {
            let _ = writeln!(
                out,
                "All assessed standards are met. Confirm material quantities against \
                 procurement records and supplier EPDs before submission."
            );
        } else {
            let _ = writeln!(
                out,
                "Outstanding before submission: {}. Address the priority actions and \
                 re-run the assessment.",
                failures.join(", ")
            );
        }
    }
}

impl NarrativeWriter for TemplateNarrative {
    fn narrate(&self, report: &ProjectComplianceReport) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", report.project_name);

        Self::executive_summary(&mut out, report);

        let _ = writeln!(out, "## Findings\n");
        for standard in &report.standards {
            Self::finding(&mut out, standard);
        }

        let actions = Self::priority_actions(report);
        if !actions.is_empty() {
            let _ = writeln!(out, "## Priority actions\n");
            for (i, action) in actions.iter().enumerate() {
                let _ = writeln!(out, "{}. {action}", i + 1);
            }
            out.push('\n');
        }

        Self::readiness(&mut out, report);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::{generate_compliance_report, CompanySize, ComplianceInput, ProjectType};
    use crate::units::{KgCo2e, SquareMeters};

    fn report(total_kg: f64) -> ProjectComplianceReport {
        generate_compliance_report(&ComplianceInput {
            project_name: "Depot".to_string(),
            project_type: ProjectType::Industrial,
            floor_area: SquareMeters(1_000.0),
            total_carbon: KgCo2e(total_kg),
            company_size: Some(CompanySize::Large),
            recycled_content_pct: Some(30.0),
        })
        .unwrap()
    }

    #[test]
    fn test_sections_present() {
        let text = TemplateNarrative.narrate(&report(500_000.0));
        for heading in ["## Executive summary", "## Findings", "## Certification readiness"] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("### NABERS Embodied Carbon"));
    }

    #[test]
    fn test_failing_report_lists_outstanding_standards() {
        let report = report(1_200_000.0);
        assert!(!report.overall_compliant);
        let text = TemplateNarrative.narrate(&report);
        assert!(text.contains("does not yet meet"));
        assert!(text.contains("Outstanding before submission"));
        assert!(text.contains("FAIL"));
    }

    #[test]
    fn test_narration_is_deterministic_and_leaves_report_alone() {
        let report = report(700_000.0);
        let before = report.clone();
        assert_eq!(TemplateNarrative.narrate(&report), TemplateNarrative.narrate(&report));
        assert_eq!(report, before);
    }

    #[test]
    fn test_priority_actions_are_capped_and_unique() {
        let report = report(1_200_000.0);
        let actions = TemplateNarrative::priority_actions(&report);
        assert!(actions.len() <= MAX_PRIORITY_ACTIONS);
        let first_failing = report.failures().next().unwrap();
        assert_eq!(actions[0], first_failing.recommendations[0]);
    }

    #[test]
    fn test_decision_language() {
        assert_eq!(decision_language("Based on my evaluation, this passes"), vec!["based on my evaluation"]);
        assert!(decision_language("The classifier rated the project 4 Stars.").is_empty());
    }

    /// Writer that rules on compliance itself
    struct Opinionated;

    impl NarrativeWriter for Opinionated {
        fn narrate(&self, report: &ProjectComplianceReport) -> String {
            format!("I conclude that {} is compliant.", report.project_name)
        }
    }

    #[test]
    fn test_narrate_checked() {
        let report = report(700_000.0);
        assert_eq!(
            TemplateNarrative.narrate_checked(&report).unwrap(),
            TemplateNarrative.narrate(&report)
        );

        match Opinionated.narrate_checked(&report).unwrap_err() {
            CalcError::InvalidInput { field, value, .. } => {
                assert_eq!(field, "narrative");
                assert_eq!(value, "i conclude");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! # Compliance Classification
//!
//! Deterministic, rule-based assessment of a project's carbon intensity
//! against four Australian schemes:
//!
//! | Standard | Kind | Module |
//! |----------|------|--------|
//! | NCC embodied-carbon benchmark | threshold tiers | [`ncc`] |
//! | NABERS embodied carbon | half-star ceilings | [`nabers`] |
//! | Green Star Buildings | points → stars | [`green_star`] |
//! | Climate-related financial disclosure | reporting trigger | [`disclosure`] |
//!
//! Every threshold lives in a named `const` table in its module.
//! [`classify`] is a pure function: the same input always yields a
//! deep-equal output. Recommendations are fixed templates chosen by
//! threshold branching.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::compliance::{classify, ClassificationInput, ProjectType};
//! use carbon_core::units::{KgCo2e, SquareMeters};
//!
//! let input = ClassificationInput {
//!     carbon_intensity: 480.0,
//!     project_type: ProjectType::Commercial,
//!     floor_area: SquareMeters(5_000.0),
//!     total_carbon: KgCo2e(2_400_000.0),
//!     company_size: None,
//!     recycled_content_pct: None,
//! };
//!
//! let reports = classify(&input);
//! assert_eq!(reports.len(), 4);
//! assert_eq!(reports[0].rating_tier, "Good");
//! assert_eq!(reports[1].rating_tier, "4 Stars");
//! ```

pub mod disclosure;
pub mod green_star;
pub mod nabers;
pub mod ncc;
pub mod percentile;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calculations::lca::carbon_intensity;
use crate::errors::{CalcError, CalcResult};
use crate::units::{KgCo2e, SquareMeters};

pub use disclosure::DisclosureAssessment;
pub use green_star::GreenStarPoints;
pub use nabers::StarRating;
pub use ncc::NccTier;

// ============================================================================
// Classification inputs
// ============================================================================

/// Building class used to select benchmark thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Residential,
    Commercial,
    Industrial,
    Infrastructure,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Residential,
        ProjectType::Commercial,
        ProjectType::Industrial,
        ProjectType::Infrastructure,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ProjectType::Residential => "residential",
            ProjectType::Commercial => "commercial",
            ProjectType::Industrial => "industrial",
            ProjectType::Infrastructure => "infrastructure",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "residential" | "res" => Ok(ProjectType::Residential),
            "commercial" | "com" | "office" => Ok(ProjectType::Commercial),
            "industrial" | "ind" => Ok(ProjectType::Industrial),
            "infrastructure" | "infra" | "civil" => Ok(ProjectType::Infrastructure),
            _ => Err(CalcError::invalid_input(
                "project_type",
                s,
                "Expected residential, commercial, industrial or infrastructure",
            )),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reporting entity size for the disclosure trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Large,
    #[default]
    Medium,
    Small,
}

impl CompanySize {
    pub fn code(&self) -> &'static str {
        match self {
            CompanySize::Large => "large",
            CompanySize::Medium => "medium",
            CompanySize::Small => "small",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "large" | "group-1" | "group1" => Ok(CompanySize::Large),
            "medium" | "group-2" | "group2" => Ok(CompanySize::Medium),
            "small" | "group-3" | "group3" => Ok(CompanySize::Small),
            _ => Err(CalcError::invalid_input(
                "company_size",
                s,
                "Expected large, medium or small",
            )),
        }
    }
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Everything the classifier looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInput {
    /// kg CO2-e per m²
    pub carbon_intensity: f64,
    pub project_type: ProjectType,
    pub floor_area: SquareMeters,
    pub total_carbon: KgCo2e,
    #[serde(default)]
    pub company_size: Option<CompanySize>,
    /// Recycled content of the bill of materials, percent
    #[serde(default)]
    pub recycled_content_pct: Option<f64>,
}

impl ClassificationInput {
    /// Reject inputs that [`classify`] would otherwise rate without complaint.
    pub fn validate(&self) -> CalcResult<()> {
        if !self.floor_area.0.is_finite() || self.floor_area.0 <= 0.0 {
            return Err(CalcError::invalid_input(
                "floor_area",
                self.floor_area.0.to_string(),
                "Floor area must be positive",
            ));
        }
        if !self.carbon_intensity.is_finite() {
            return Err(CalcError::invalid_input(
                "carbon_intensity",
                self.carbon_intensity.to_string(),
                "Carbon intensity must be finite",
            ));
        }
        if !self.total_carbon.0.is_finite() {
            return Err(CalcError::invalid_input(
                "total_carbon",
                self.total_carbon.0.to_string(),
                "Total carbon must be finite",
            ));
        }
        if let Some(pct) = self.recycled_content_pct {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(CalcError::invalid_input(
                    "recycled_content_pct",
                    pct.to_string(),
                    "Recycled content must be between 0 and 100 percent",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Assessed scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standard {
    Ncc,
    Nabers,
    GreenStar,
    ClimateDisclosure,
}

impl Standard {
    pub fn display_name(&self) -> &'static str {
        match self {
            Standard::Ncc => "NCC Embodied Carbon Benchmark",
            Standard::Nabers => "NABERS Embodied Carbon",
            Standard::GreenStar => "Green Star Buildings",
            Standard::ClimateDisclosure => "Climate-related Financial Disclosure",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Typed result of one standard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    CodeTier { tier: NccTier },
    Stars { rating: StarRating },
    Points { breakdown: GreenStarPoints },
    Disclosure { assessment: DisclosureAssessment },
}

/// Result of assessing one standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardReport {
    pub standard: Standard,
    pub standard_name: String,
    pub rating_tier: String,
    pub compliant: bool,
    pub metrics: BTreeMap<String, f64>,
    /// Headline threshold the project was measured against
    pub benchmark_used: f64,
    pub recommendations: Vec<String>,
    pub outcome: Outcome,
}

impl StandardReport {
    pub(crate) fn new(
        standard: Standard,
        rating_tier: impl Into<String>,
        compliant: bool,
        benchmark_used: f64,
        outcome: Outcome,
    ) -> Self {
        StandardReport {
            standard,
            standard_name: standard.display_name().to_string(),
            rating_tier: rating_tier.into(),
            compliant,
            metrics: BTreeMap::new(),
            benchmark_used,
            recommendations: Vec::new(),
            outcome,
        }
    }

    pub(crate) fn metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub(crate) fn recommend(mut self, text: impl Into<String>) -> Self {
        self.recommendations.push(text.into());
        self
    }
}

/// Assess every standard, in fixed order: NCC, NABERS, Green Star, disclosure.
pub fn classify(input: &ClassificationInput) -> Vec<StandardReport> {
    vec![
        ncc::assess(input.carbon_intensity, input.project_type),
        nabers::assess(input.carbon_intensity),
        green_star::assess(input.carbon_intensity, input.recycled_content_pct),
        disclosure::assess(input.total_carbon, input.company_size.unwrap_or_default()),
    ]
}

// ============================================================================
// Project report
// ============================================================================

/// Project-level inputs for a full compliance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceInput {
    pub project_name: String,
    pub project_type: ProjectType,
    pub floor_area: SquareMeters,
    /// Embodied carbon used for intensity and disclosure
    pub total_carbon: KgCo2e,
    #[serde(default)]
    pub company_size: Option<CompanySize>,
    #[serde(default)]
    pub recycled_content_pct: Option<f64>,
}

/// Every standard's result for one project.
///
/// Carries no timestamps so identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectComplianceReport {
    pub project_name: String,
    pub project_type: ProjectType,
    pub floor_area: SquareMeters,
    pub total_carbon: KgCo2e,
    pub carbon_intensity: f64,
    pub industry_percentile: String,
    pub standards: Vec<StandardReport>,
    pub overall_compliant: bool,
}

impl ProjectComplianceReport {
    pub fn report_for(&self, standard: Standard) -> Option<&StandardReport> {
        self.standards.iter().find(|r| r.standard == standard)
    }

    /// Reports that did not pass
    pub fn failures(&self) -> impl Iterator<Item = &StandardReport> {
        self.standards.iter().filter(|r| !r.compliant)
    }
}

/// Compute intensity, run [`classify`] and add the industry percentile.
pub fn generate_compliance_report(input: &ComplianceInput) -> CalcResult<ProjectComplianceReport> {
    let intensity = carbon_intensity(input.total_carbon, input.floor_area)?;
    let classification = ClassificationInput {
        carbon_intensity: intensity,
        project_type: input.project_type,
        floor_area: input.floor_area,
        total_carbon: input.total_carbon,
        company_size: input.company_size,
        recycled_content_pct: input.recycled_content_pct,
    };
    classification.validate()?;

    let standards = classify(&classification);
    let overall_compliant = standards.iter().all(|r| r.compliant);

    tracing::debug!(
        project = %input.project_name,
        intensity,
        overall_compliant,
        "generated compliance report"
    );

    Ok(ProjectComplianceReport {
        project_name: input.project_name.clone(),
        project_type: input.project_type,
        floor_area: input.floor_area,
        total_carbon: input.total_carbon,
        carbon_intensity: intensity,
        industry_percentile: percentile::industry_percentile(intensity).to_string(),
        standards,
        overall_compliant,
    })
}

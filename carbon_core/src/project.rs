//! # Project Container
//!
//! The `Project` struct holds everything one assessment needs: the bill of
//! materials, the activity log and the settings the calculations read.
//! Projects serialize to `.emb` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (schema version, id, name, job, timestamps)
//! ├── settings: ProjectSettings (project type, floor area, design life, grid region)
//! ├── materials: Vec<MaterialEntry> (bill of materials)
//! ├── activities: Vec<ActivityEntry> (Scope 1/2/3 log)
//! └── totals: Option<ProjectTotals> (last evaluation and its advisories)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::project::Project;
//! use carbon_core::calculations::{CrossCheckPolicy, MaterialEntry};
//! use carbon_core::registry::{EmissionFactorRegistry, MaterialCategory, MaterialUnit};
//! use carbon_core::units::SquareMeters;
//!
//! let mut project = Project::new("Harbour Offices", "26-014", "J. Assessor");
//! project.settings.floor_area = SquareMeters(1_200.0);
//! project.add_material(MaterialEntry::new(
//!     MaterialCategory::Concrete,
//!     "concrete-32mpa",
//!     400.0,
//!     MaterialUnit::CubicMeter,
//! ));
//!
//! let totals = project
//!     .refresh_totals(EmissionFactorRegistry::builtin(), CrossCheckPolicy::Flag)
//!     .unwrap();
//! assert_eq!(totals.compliance.standards.len(), 4);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::lca::{aggregate_project_lca, CrossCheckPolicy, MaterialEntry, ProjectLcaResult};
use crate::calculations::scopes::{ActivityEntry, ActivityKind, EmissionsSummary, ScopeAggregator, WasteDiversion};
use crate::compliance::{
    generate_compliance_report, CompanySize, ComplianceInput, ProjectComplianceReport, ProjectType,
};
use crate::config::EngineConfig;
use crate::errors::CalcResult;
use crate::registry::{FactorSource, MaterialCategory};
use crate::units::SquareMeters;

/// Current schema version for .emb files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Project file extension
pub const PROJECT_EXTENSION: &str = "emb";

/// Root project container.
///
/// This is the top-level struct that gets serialized to `.emb` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,
    pub settings: ProjectSettings,

    /// Bill of materials, in entry order. Aggregation errors refer to
    /// entries by their index here.
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,

    /// Scope 1/2/3 activities with their recorded emissions
    #[serde(default)]
    pub activities: Vec<ActivityEntry>,

    /// Result of the last [`refresh_totals`](Project::refresh_totals)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<ProjectTotals>,
}

impl Project {
    /// Create a new empty project with default settings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use carbon_core::project::Project;
    ///
    /// let project = Project::new("Harbour Offices", "26-014", "J. Assessor");
    /// assert_eq!(project.meta.assessor, "J. Assessor");
    /// assert!(project.materials.is_empty());
    /// ```
    pub fn new(name: impl Into<String>, job_id: impl Into<String>, assessor: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                name: name.into(),
                job_id: job_id.into(),
                assessor: assessor.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            materials: Vec::new(),
            activities: Vec::new(),
            totals: None,
        }
    }

    /// Append a material row. Returns its index.
    pub fn add_material(&mut self, entry: MaterialEntry) -> usize {
        self.materials.push(entry);
        self.touch();
        self.materials.len() - 1
    }

    /// Remove a material row by index.
    pub fn remove_material(&mut self, index: usize) -> Option<MaterialEntry> {
        if index >= self.materials.len() {
            return None;
        }
        let entry = self.materials.remove(index);
        self.touch();
        Some(entry)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Open a scope session pre-loaded with this project's activities.
    pub fn session<'a>(&self, source: &'a dyn FactorSource) -> ScopeAggregator<'a> {
        ScopeAggregator::from_entries(source, self.activities.iter().cloned())
    }

    /// Replace the activity log with a session's entries.
    pub fn store_session(&mut self, session: &ScopeAggregator<'_>) {
        self.activities = session.entries().cloned().collect();
        self.touch();
    }

    /// Materials that sit in the bill of materials and are also logged as
    /// Scope 3 purchased materials, matched on category and id.
    pub fn double_counted_materials(&self) -> Vec<Advisory> {
        let key = |entry: &MaterialEntry| (entry.category, entry.material_id.trim().to_lowercase());

        let mut bill: BTreeMap<(MaterialCategory, String), Vec<usize>> = BTreeMap::new();
        for (index, entry) in self.materials.iter().enumerate() {
            bill.entry(key(entry)).or_default().push(index);
        }

        let mut logged: BTreeMap<(MaterialCategory, String), Vec<Uuid>> = BTreeMap::new();
        for activity in &self.activities {
            if let ActivityKind::Material { entry } = &activity.kind {
                if bill.contains_key(&key(entry)) {
                    logged.entry(key(entry)).or_default().push(activity.id);
                }
            }
        }

        logged
            .into_iter()
            .map(|((category, material_id), activity_ids)| Advisory::DoubleCounted {
                bill_indices: bill.remove(&(category, material_id.clone())).unwrap_or_default(),
                category,
                material_id,
                activity_ids,
            })
            .collect()
    }

    /// Run the LCA, fold the activity log and classify the embodied carbon.
    ///
    /// Does not modify the project; see [`refresh_totals`](Self::refresh_totals).
    pub fn evaluate(&self, source: &dyn FactorSource, policy: CrossCheckPolicy) -> CalcResult<ProjectTotals> {
        let lca = aggregate_project_lca(&self.materials, source, self.settings.design_life_years, policy)?;
        let session = self.session(source);
        let emissions = session.compute_totals();
        let waste_diversion = session.waste_diversion();

        let mut advisories = Vec::new();
        if let Some(diversion) = waste_diversion.filter(|d| !d.meets_target) {
            advisories.push(Advisory::WasteDiversionBelowTarget {
                diversion_pct: diversion.diversion_pct,
                target_pct: diversion.target_pct,
            });
        }
        advisories.extend(self.double_counted_materials());
        for advisory in &advisories {
            tracing::warn!(project = %self.meta.id, "{advisory}");
        }

        let compliance = generate_compliance_report(&ComplianceInput {
            project_name: self.meta.name.clone(),
            project_type: self.settings.project_type,
            floor_area: self.settings.floor_area,
            total_carbon: lca.embodied_carbon,
            company_size: Some(self.settings.company_size),
            recycled_content_pct: lca.estimated_recycled_content_pct(),
        })?;

        Ok(ProjectTotals {
            lca,
            emissions,
            waste_diversion,
            compliance,
            advisories,
        })
    }

    /// Evaluate and keep the result on the project.
    pub fn refresh_totals(
        &mut self,
        source: &dyn FactorSource,
        policy: CrossCheckPolicy,
    ) -> CalcResult<&ProjectTotals> {
        let totals = self.evaluate(source, policy)?;
        tracing::info!(
            project = %self.meta.id,
            embodied_kg = totals.lca.embodied_carbon.0,
            operational_t = totals.emissions.grand_total.0,
            compliant = totals.compliance.overall_compliant,
            "project totals refreshed"
        );
        self.touch();
        Ok(self.totals.insert(totals))
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Snapshot key
    pub id: Uuid,

    pub name: String,

    /// Job/project number
    pub job_id: String,

    /// Person responsible for the assessment
    pub assessor: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Settings the calculations read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub project_type: ProjectType,

    /// Gross floor area used for carbon intensity
    pub floor_area: SquareMeters,

    pub design_life_years: f64,

    /// Default electricity grid region for Scope 2 entries
    pub grid_region: String,

    pub company_size: CompanySize,
}

impl ProjectSettings {
    /// Settings seeded from engine defaults.
    pub fn from_config(config: &EngineConfig, project_type: ProjectType, floor_area: SquareMeters) -> Self {
        ProjectSettings {
            project_type,
            floor_area,
            design_life_years: config.design_life_years,
            grid_region: config.grid_region.clone(),
            company_size: config.company_size,
        }
    }
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings::from_config(&EngineConfig::default(), ProjectType::Commercial, SquareMeters(0.0))
    }
}

/// Everything one evaluation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub lca: ProjectLcaResult,
    pub emissions: EmissionsSummary,
    /// `None` when no waste is logged
    #[serde(default)]
    pub waste_diversion: Option<WasteDiversion>,
    pub compliance: ProjectComplianceReport,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

/// A finding that does not change any rating but should be resolved
/// before the totals are relied on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Advisory {
    WasteDiversionBelowTarget {
        diversion_pct: f64,
        target_pct: f64,
    },
    /// Counted once in the LCA and again as a Scope 3 purchase
    DoubleCounted {
        category: MaterialCategory,
        material_id: String,
        bill_indices: Vec<usize>,
        activity_ids: Vec<Uuid>,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::WasteDiversionBelowTarget {
                diversion_pct,
                target_pct,
            } => write!(
                f,
                "Waste diversion is {diversion_pct:.1}%, below the {target_pct:.0}% target. \
                 Separate recyclable streams on site."
            ),
            Advisory::DoubleCounted {
                category,
                material_id,
                ..
            } => write!(
                f,
                "{}/{material_id} is in both the bill of materials and the Scope 3 purchased \
                 materials. Remove one to avoid double counting.",
                category.code()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::scopes::Scope;
    use crate::registry::{EmissionFactorRegistry, MaterialCategory, MaterialUnit, WasteMethod};

    fn concrete(quantity: f64) -> MaterialEntry {
        MaterialEntry::new(MaterialCategory::Concrete, "concrete-32mpa", quantity, MaterialUnit::CubicMeter)
    }

    #[test]
    fn test_new_project() {
        let project = Project::new("Test", "TEST-001", "Assessor");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.settings.design_life_years, 60.0);
        assert_eq!(project.settings.grid_region, "nsw");
        assert!(project.totals.is_none());
    }

    #[test]
    fn test_material_rows() {
        let mut project = Project::default();
        assert_eq!(project.add_material(concrete(10.0)), 0);
        assert_eq!(project.add_material(concrete(20.0)), 1);
        assert_eq!(project.remove_material(0).unwrap().quantity, 10.0);
        assert!(project.remove_material(5).is_none());
        assert_eq!(project.materials.len(), 1);
    }

    #[test]
    fn test_session_round_trip() {
        let registry = EmissionFactorRegistry::builtin();
        let mut project = Project::default();

        let mut session = project.session(registry);
        session.add_waste_stream(WasteMethod::Recycled, 12.0, "").unwrap();
        session.add_electricity("vic", 1_000.0, 0.0).unwrap();
        project.store_session(&session);
        assert_eq!(project.activities.len(), 2);

        let reopened = project.session(registry);
        assert_eq!(reopened.entries_in(Scope::Scope2).len(), 1);
        assert_eq!(reopened.compute_totals(), session.compute_totals());
    }

    #[test]
    fn test_evaluate_requires_floor_area() {
        let mut project = Project::default();
        project.add_material(concrete(100.0));
        let err = project
            .evaluate(EmissionFactorRegistry::builtin(), CrossCheckPolicy::Flag)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_refresh_totals() {
        let mut project = Project::new("Depot", "26-002", "Assessor");
        project.settings = ProjectSettings::from_config(
            &EngineConfig::default(),
            ProjectType::Industrial,
            SquareMeters(2_000.0),
        );
        project.add_material(concrete(100.0));

        let totals = project
            .refresh_totals(EmissionFactorRegistry::builtin(), CrossCheckPolicy::Flag)
            .unwrap()
            .clone();
        assert_eq!(totals.compliance.total_carbon, totals.lca.embodied_carbon);
        assert_eq!(totals.compliance.project_name, "Depot");
        assert_eq!(project.totals, Some(totals));
    }

    fn evaluable(name: &str) -> Project {
        let mut project = Project::new(name, "26-040", "Assessor");
        project.settings.floor_area = SquareMeters(1_000.0);
        project.add_material(concrete(100.0));
        project
    }

    #[test]
    fn test_waste_diversion_in_totals() {
        let registry = EmissionFactorRegistry::builtin();
        let mut project = evaluable("Yard");

        let totals = project.evaluate(registry, CrossCheckPolicy::Flag).unwrap();
        assert!(totals.waste_diversion.is_none());
        assert!(totals.advisories.is_empty());

        let mut session = project.session(registry);
        session.add_waste_stream(WasteMethod::Recycled, 30.0, "").unwrap();
        session.add_waste_stream(WasteMethod::Landfill, 70.0, "").unwrap();
        project.store_session(&session);

        let totals = project.evaluate(registry, CrossCheckPolicy::Flag).unwrap();
        let diversion = totals.waste_diversion.unwrap();
        assert!((diversion.diversion_pct - 30.0).abs() < 1e-9);
        assert!(!diversion.meets_target);
        assert!(matches!(
            totals.advisories.as_slice(),
            [Advisory::WasteDiversionBelowTarget { target_pct, .. }] if *target_pct == 70.0
        ));
    }

    #[test]
    fn test_diverted_waste_raises_no_advisory() {
        let registry = EmissionFactorRegistry::builtin();
        let mut project = evaluable("Yard");
        let mut session = project.session(registry);
        session.add_waste_stream(WasteMethod::Reused, 80.0, "").unwrap();
        session.add_waste_stream(WasteMethod::Landfill, 20.0, "").unwrap();
        project.store_session(&session);

        let totals = project.evaluate(registry, CrossCheckPolicy::Flag).unwrap();
        assert!(totals.waste_diversion.unwrap().meets_target);
        assert!(totals.advisories.is_empty());
    }

    #[test]
    fn test_double_counted_material() {
        let registry = EmissionFactorRegistry::builtin();
        let mut project = evaluable("Slab");
        project.add_material(MaterialEntry::new(MaterialCategory::Steel, "steel-rebar", 4.0, MaterialUnit::Tonne));

        let mut session = project.session(registry);
        let logged = session
            .add_material(&MaterialEntry::new(
                MaterialCategory::Concrete,
                "Concrete-32MPa",
                20.0,
                MaterialUnit::CubicMeter,
            ))
            .unwrap();
        project.store_session(&session);

        let totals = project.evaluate(registry, CrossCheckPolicy::Flag).unwrap();
        match totals.advisories.as_slice() {
            [Advisory::DoubleCounted { category, material_id, bill_indices, activity_ids }] => {
                assert_eq!(*category, MaterialCategory::Concrete);
                assert_eq!(material_id, "concrete-32mpa");
                assert_eq!(bill_indices, &vec![0]);
                assert_eq!(activity_ids, &vec![logged.id]);
            }
            other => panic!("unexpected advisories: {other:?}"),
        }
        assert!(totals.advisories[0].to_string().contains("double counting"));
    }

    #[test]
    fn test_distinct_scope3_material_is_not_double_counted() {
        let registry = EmissionFactorRegistry::builtin();
        let mut project = evaluable("Slab");
        let mut session = project.session(registry);
        session
            .add_material(&MaterialEntry::new(MaterialCategory::Steel, "steel-rebar", 2.0, MaterialUnit::Tonne))
            .unwrap();
        project.store_session(&session);

        assert!(project.double_counted_materials().is_empty());
    }

    #[test]
    fn test_serialization_omits_empty_totals() {
        let project = Project::new("A", "B", "C");
        let json = serde_json::to_string(&project).unwrap();
        assert!(!json.contains("\"totals\""));
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }
}

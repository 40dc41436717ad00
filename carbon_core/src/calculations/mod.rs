//! # Carbon Calculations
//!
//! Two independent engines over the factor registry:
//!
//! - [`lca`] - embodied carbon per material across life-cycle stages
//!   A1-D, with [`use_stage`] and [`end_of_life`] as its sub-models.
//!   Pure functions; results in kg CO2-e.
//! - [`scopes`] - Scope 1/2/3 activity log for a single session.
//!   Results in tonnes CO2-e.
//!
//! Inputs and results are plain serde records, so they round-trip
//! through JSON unchanged.

pub mod end_of_life;
pub mod lca;
pub mod scopes;
pub mod use_stage;

pub use lca::{
    aggregate_project_lca, carbon_intensity, compute_material_lca, CrossCheckPolicy,
    FlaggedMaterial, LcaResult, MaterialEntry, ProjectLcaResult,
};
pub use scopes::{ActivityEntry, EmissionsSummary, Scope, ScopeAggregator, ScopeTotals};
pub use use_stage::UseStageBasis;

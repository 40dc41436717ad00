//! # carbon_core - Carbon Accounting and Compliance Engine
//!
//! `carbon_core` is the computational heart of Embodia. It turns a bill of
//! materials and a log of site activities into life-cycle (EN 15978 stages
//! A1-D) and GHG Protocol (Scope 1/2/3) totals, then classifies the result
//! against Australian building standards. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: the same inputs always produce identical reports
//! - **Explicit lookups**: a missing emission factor is an error, never a zero
//! - **Per-session state**: activity logs live in a [`ScopeAggregator`] you own
//! - **Rich Errors**: every failure names the input that caused it
//!
//! ## Quick Start
//!
//! ```rust
//! use carbon_core::calculations::{aggregate_project_lca, carbon_intensity, CrossCheckPolicy, MaterialEntry};
//! use carbon_core::registry::{EmissionFactorRegistry, MaterialCategory, MaterialUnit};
//! use carbon_core::units::SquareMeters;
//!
//! let materials = vec![
//!     MaterialEntry::new(MaterialCategory::Concrete, "concrete-32mpa", 100.0, MaterialUnit::CubicMeter),
//!     MaterialEntry::new(MaterialCategory::Steel, "steel-rebar", 8.0, MaterialUnit::Tonne),
//! ];
//!
//! let lca = aggregate_project_lca(
//!     &materials,
//!     EmissionFactorRegistry::builtin(),
//!     60.0,
//!     CrossCheckPolicy::Flag,
//! ).unwrap();
//!
//! let intensity = carbon_intensity(lca.embodied_carbon, SquareMeters(400.0)).unwrap();
//! assert!(intensity > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`registry`] - Emission factor tables and the [`FactorSource`] lookup contract
//! - [`calculations`] - Material LCA and the Scope 1/2/3 aggregator
//! - [`compliance`] - NCC, NABERS, Green Star and disclosure classification
//! - [`narrative`] - Prose from a finished compliance report
//! - [`project`] - Project container, metadata, and settings
//! - [`config`] - Engine defaults from TOML
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - `file_io` - `.emb` files with atomic saves and locking (native only)
//! - `store` - Project snapshots keyed by id (native only)

pub mod calculations;
pub mod compliance;
pub mod config;
pub mod errors;
pub mod narrative;
pub mod project;
pub mod registry;
pub mod units;

#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
#[cfg(not(target_arch = "wasm32"))]
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use calculations::ScopeAggregator;
pub use compliance::{generate_compliance_report, ProjectComplianceReport};
pub use config::EngineConfig;
pub use errors::{CalcError, CalcResult};
pub use project::{Advisory, Project, ProjectMetadata, ProjectSettings, ProjectTotals};
pub use registry::{EmissionFactorRegistry, FactorSource};

#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_project, save_project, FileLock};
#[cfg(not(target_arch = "wasm32"))]
pub use store::{FileSnapshotStore, SnapshotStore};

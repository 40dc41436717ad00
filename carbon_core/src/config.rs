//! # Engine Configuration
//!
//! Defaults for new projects and for the CLI, loaded from TOML.
//!
//! Search order:
//! 1. Explicit path (`--config` CLI flag)
//! 2. `embodia.toml` in the working directory
//! 3. Built-in defaults
//!
//! Every field is optional; CLI flags take precedence over file values.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::config::EngineConfig;
//! use carbon_core::compliance::CompanySize;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     design_life_years = 50
//!     company_size = "large"
//! "#).unwrap();
//!
//! assert_eq!(config.design_life_years, 50.0);
//! assert_eq!(config.company_size, CompanySize::Large);
//! assert_eq!(config.grid_region, "nsw");
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calculations::CrossCheckPolicy;
use crate::compliance::CompanySize;
use crate::errors::{CalcError, CalcResult};
use crate::registry::{EmissionFactorRegistry, FactorSource};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "embodia.toml";

pub const DEFAULT_DESIGN_LIFE_YEARS: f64 = 60.0;
pub const DEFAULT_GRID_REGION: &str = "nsw";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Design life used for use-stage modelling, years
    pub design_life_years: f64,
    /// Default electricity grid region
    pub grid_region: String,
    /// Reporting entity size for the disclosure trigger
    pub company_size: CompanySize,
    /// Handling of materials whose reference data fails a cross-check
    pub cross_check: CrossCheckPolicy,
    /// Where the config was read from; not part of the file
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            design_life_years: DEFAULT_DESIGN_LIFE_YEARS,
            grid_region: DEFAULT_GRID_REGION.to_string(),
            company_size: CompanySize::default(),
            cross_check: CrossCheckPolicy::default(),
            source_path: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(toml_str: &str) -> CalcResult<Self> {
        let config: EngineConfig = toml::from_str(toml_str)
            .map_err(|e| CalcError::serialization(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read config", path.display().to_string(), e.to_string()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.source_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Explicit path if given, else `embodia.toml` in `dir` if present, else defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> CalcResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    /// Check values for logical errors, including that the grid region exists
    pub fn validate(&self) -> CalcResult<()> {
        if !self.design_life_years.is_finite() || self.design_life_years < 0.0 {
            return Err(CalcError::invalid_input(
                "design_life_years",
                self.design_life_years.to_string(),
                "Design life must be a non-negative number of years",
            ));
        }
        EmissionFactorRegistry::builtin().grid(&self.grid_region)?;
        Ok(())
    }
}

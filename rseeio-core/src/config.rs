//! Pipeline configuration
//!
//! All inputs that select what to compute (data location, region, impact
//! category, stressor group, electricity sectors and reporting unit) are
//! explicit parameters. Configurations are usually read from TOML:
//!
//! ```
//! use rseeio_core::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_toml_str(r#"
//!     data_dir = "IOT_2019_pxp"
//!     region = "DE"
//!     target_unit = "kt"
//! "#).unwrap();
//!
//! assert_eq!(config.region, "DE");
//! assert_eq!(config.stressor_pattern, "CO2");
//! assert!((config.scale().unwrap() - 1e-6).abs() < 1e-18);
//! ```

use crate::errors::{EEIOError, EEIOResult};
use crate::scope::ElectricitySectors;
use crate::units::conversion_factor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Impact row used for GHG footprints in EXIOBASE 3
pub const GWP100_IMPACT: &str = "GHG emissions (GWP100) | Problem oriented approach: baseline (CML, 2001) | GWP100 (IPCC, 2007)";

/// Parameters of a footprint and scope analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extracted EXIOBASE directory holding `A.txt`, `Y.txt`, `impacts/` and `satellite/`
    ///
    /// Default: `IOT_2019_pxp`
    pub data_dir: PathBuf,

    /// Region reported in detail
    ///
    /// Default: `CA`
    pub region: String,

    /// Exact label of the impact row used for footprints
    ///
    /// Default: [`GWP100_IMPACT`]
    pub impact: String,

    /// Satellite stressor rows whose label contains this text are summed
    /// for the scope calculation
    ///
    /// Default: `CO2`
    pub stressor_pattern: String,

    /// Unit of the impact and stressor tables
    ///
    /// Default: `kg`
    pub source_unit: String,

    /// Unit results are reported in
    ///
    /// Default: `Mt`
    pub target_unit: String,

    /// Relative tolerance of the global production/consumption reconciliation
    ///
    /// Default: 1e-6
    pub reconciliation_tolerance: f64,

    /// Number of sectors listed per scope in reports
    ///
    /// Default: 10
    pub top_sectors: usize,

    /// Sectors treated as electricity for scope 2
    ///
    /// Default: positions 128 to 141 within each region
    pub electricity: ElectricitySectors,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("IOT_2019_pxp"),
            region: "CA".to_string(),
            impact: GWP100_IMPACT.to_string(),
            stressor_pattern: "CO2".to_string(),
            source_unit: "kg".to_string(),
            target_unit: "Mt".to_string(),
            reconciliation_tolerance: 1e-6,
            top_sectors: 10,
            electricity: ElectricitySectors::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> EEIOResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EEIOError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    ///
    /// A relative `data_dir` is resolved against the directory of the file.
    pub fn from_file(path: impl AsRef<Path>) -> EEIOResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EEIOError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> EEIOResult<String> {
        toml::to_string(self).map_err(|e| EEIOError::InvalidConfig(e.to_string()))
    }

    /// Multiplier from `source_unit` to `target_unit`
    pub fn scale(&self) -> EEIOResult<f64> {
        conversion_factor(&self.source_unit, &self.target_unit)
    }

    pub fn validate(&self) -> EEIOResult<()> {
        if self.region.trim().is_empty() {
            return Err(EEIOError::InvalidConfig("region must not be empty".into()));
        }
        if self.impact.trim().is_empty() {
            return Err(EEIOError::InvalidConfig("impact must not be empty".into()));
        }
        if self.stressor_pattern.is_empty() {
            return Err(EEIOError::InvalidConfig(
                "stressor_pattern must not be empty".into(),
            ));
        }
        if self.reconciliation_tolerance.is_nan() || self.reconciliation_tolerance < 0.0 {
            return Err(EEIOError::InvalidConfig(format!(
                "reconciliation_tolerance must be non-negative, got {}",
                self.reconciliation_tolerance
            )));
        }
        match &self.electricity {
            ElectricitySectors::Positions { first, last } if *first == 0 || first > last => {
                return Err(EEIOError::InvalidConfig(format!(
                    "electricity sectors {first}..={last} must be a 1-based, non-empty range"
                )));
            }
            ElectricitySectors::LabelContains { text } if text.is_empty() => {
                return Err(EEIOError::InvalidConfig(
                    "electricity label text must not be empty".into(),
                ));
            }
            _ => {}
        }
        self.scale()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.region, "CA");
        assert_eq!(config.impact, GWP100_IMPACT);
        assert_eq!(
            config.electricity,
            ElectricitySectors::Positions {
                first: 128,
                last: 141
            }
        );
        assert!((config.scale().unwrap() - 1e-9).abs() < 1e-24);
        config.validate().unwrap();
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn electricity_by_label() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [electricity]
            kind = "label_contains"
            text = "Electricity"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.electricity,
            ElectricitySectors::LabelContains {
                text: "Electricity".to_string()
            }
        );
    }

    #[test]
    fn toml_round_trip() {
        let config = PipelineConfig {
            region: "NO".to_string(),
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(PipelineConfig::from_toml_str("region = \"\"").is_err());
        assert!(PipelineConfig::from_toml_str("target_unit = \"lb\"").is_err());
        assert!(PipelineConfig::from_toml_str("reconciliation_tolerance = -1.0").is_err());
        assert!(PipelineConfig::from_toml_str(
            "[electricity]\nkind = \"positions\"\nfirst = 10\nlast = 2"
        )
        .is_err());
        assert!(PipelineConfig::from_toml_str("unknown_number = 3").is_ok());
    }
}

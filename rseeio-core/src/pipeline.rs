//! End-to-end footprint and scope analysis
//!
//! Runs the full sequence on one dataset:
//!
//! 1. Leontief inverse and total output
//! 2. Production and consumption footprints of the configured impact
//! 3. Global reconciliation check
//! 4. Scope 1/2/3 emissions of the configured stressor group
//! 5. Direct final-demand emissions of the same stressor group

use crate::config::PipelineConfig;
use crate::errors::EEIOResult;
use crate::footprint::{FootprintCalculator, Footprints, RegionFootprint};
use crate::leontief::IOSystem;
use crate::loader::ExiobaseTables;
use crate::scope::{household_direct, RegionalScopes, Scope, ScopeCalculator, SectorScopes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Everything a pipeline run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Total world output, $\sum x$, in the monetary unit of the tables
    pub world_output: f64,
    pub footprints: Footprints,
    /// Footprints of the configured region
    pub region: RegionFootprint,
    /// $\sum p / \sum q$
    pub reconciliation_ratio: f64,
    pub reconciled: bool,
    pub scopes: RegionalScopes,
    /// Per-sector scopes of the configured region
    pub region_sectors: Vec<SectorScopes>,
    /// Largest sectors of the configured region, per scope
    pub top_sectors: BTreeMap<String, Vec<SectorScopes>>,
    /// Direct final-demand emissions of the stressor group, per region in
    /// table order
    pub household_direct: Vec<(String, f64)>,
}

/// Runs a configured analysis
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> EEIOResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the tables from `config.data_dir` and run
    pub fn run_from_disk(&self) -> EEIOResult<PipelineReport> {
        let tables = ExiobaseTables::load(&self.config.data_dir)?;
        self.run(tables)
    }

    pub fn run(&self, tables: ExiobaseTables) -> EEIOResult<PipelineReport> {
        let config = &self.config;
        let scale = config.scale()?;
        let ExiobaseTables {
            a,
            y,
            impacts,
            impacts_y,
            satellite,
            satellite_y,
        } = tables;

        let system = IOSystem::calc(a, y)?;
        let world_output = system.x.sum();

        let footprints = FootprintCalculator::new(&system)?.calc_checked(
            &impacts,
            &impacts_y,
            &config.impact,
            scale,
            &config.target_unit,
            config.reconciliation_tolerance,
        )?;
        let region = footprints.region(&config.region)?;
        info!(
            region = %region.region,
            production = region.production,
            consumption = region.consumption,
            unit = %config.target_unit,
            "Regional footprint"
        );

        let scope_calculator = ScopeCalculator::new(&system, &config.electricity)?;
        let scopes = scope_calculator.calc(
            &satellite,
            &config.stressor_pattern,
            scale,
            &config.target_unit,
        )?;
        let region_sectors = scopes.for_region(&config.region)?;
        let top_sectors = Scope::ALL
            .iter()
            .map(|&scope| {
                scopes
                    .top_sectors(&config.region, scope, config.top_sectors)
                    .map(|top| (scope.to_string(), top))
            })
            .collect::<EEIOResult<BTreeMap<_, _>>>()?;

        let (regions, direct) = household_direct(&satellite_y, &config.stressor_pattern, scale)?;

        Ok(PipelineReport {
            world_output,
            reconciliation_ratio: footprints.reconciliation_ratio(),
            reconciled: footprints.is_reconciled(config.reconciliation_tolerance),
            footprints,
            region,
            scopes: scopes.by_region()?,
            region_sectors,
            top_sectors,
            household_direct: regions.into_iter().zip(direct.iter().copied()).collect(),
        })
    }
}

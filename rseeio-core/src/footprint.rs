//! Production and consumption footprints
//!
//! For an impact matrix $F$ (impacts × sectors) and direct final-demand
//! impacts $F_Y$ (impacts × demand columns), with $f = F \hat{x}^{-1}$:
//!
//! - **Production** (territorial): $p = (F_{agg} + F_{Y,agg})_k \cdot s$
//! - **Consumption**: $q = (f_k L Y_{agg} + F_{Y,agg,k}) \cdot s$
//!
//! where $k$ is the chosen impact row, $s$ a unit scale factor, and the
//! subscript $agg$ denotes summation over sectors within each region.
//!
//! Globally the two must reconcile: $\sum_r p_r = \sum_r q_r$. The
//! per-region difference is the net import of embodied impacts.

use crate::errors::{EEIOError, EEIOResult};
use crate::leontief::IOSystem;
use crate::table::{row_times, Table};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Footprints of one impact category for every region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprints {
    /// Impact row label
    pub impact: String,
    /// Unit of the scaled values
    pub unit: String,
    /// Regions in table order
    pub regions: Vec<String>,
    /// Territorial footprint per region
    pub production: Array1<f64>,
    /// Consumption footprint per region
    pub consumption: Array1<f64>,
}

/// Footprints of a single region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFootprint {
    pub region: String,
    pub production: f64,
    pub consumption: f64,
}

impl RegionFootprint {
    /// Positive when the region consumes more embodied impact than it emits
    pub fn net_imports(&self) -> f64 {
        self.consumption - self.production
    }

    pub fn is_net_importer(&self) -> bool {
        self.net_imports() > 0.0
    }
}

impl Footprints {
    pub fn global_production(&self) -> f64 {
        self.production.sum()
    }

    pub fn global_consumption(&self) -> f64 {
        self.consumption.sum()
    }

    /// $\sum p / \sum q$, which should be 1 on any consistent dataset
    pub fn reconciliation_ratio(&self) -> f64 {
        self.global_production() / self.global_consumption()
    }

    /// Whether global production and consumption agree within `rel_tol`
    pub fn is_reconciled(&self, rel_tol: f64) -> bool {
        let p = self.global_production();
        let q = self.global_consumption();
        let scale = p.abs().max(q.abs());
        scale == 0.0 || (p - q).abs() <= rel_tol * scale
    }

    /// Consumption minus production, per region
    pub fn net_imports(&self) -> Array1<f64> {
        &self.consumption - &self.production
    }

    pub fn region(&self, code: &str) -> EEIOResult<RegionFootprint> {
        let i = self
            .regions
            .iter()
            .position(|r| r == code)
            .ok_or_else(|| EEIOError::LookupError {
                label: code.to_string(),
                axis: "footprint regions".to_string(),
            })?;
        Ok(RegionFootprint {
            region: code.to_string(),
            production: self.production[i],
            consumption: self.consumption[i],
        })
    }

    /// All regions as individual records, in table order
    pub fn iter(&self) -> impl Iterator<Item = RegionFootprint> + '_ {
        self.regions
            .iter()
            .enumerate()
            .map(move |(i, region)| RegionFootprint {
                region: region.clone(),
                production: self.production[i],
                consumption: self.consumption[i],
            })
    }
}

/// Calculates footprints from a solved [`IOSystem`]
pub struct FootprintCalculator<'a> {
    system: &'a IOSystem,
    y_agg: Table,
}

impl<'a> FootprintCalculator<'a> {
    pub fn new(system: &'a IOSystem) -> EEIOResult<Self> {
        let y_agg = system.y.aggregate_columns_by_region()?;
        Ok(Self { system, y_agg })
    }

    /// Final demand summed to region level, $Y_{agg}$ (sectors × regions)
    pub fn aggregated_demand(&self) -> &Table {
        &self.y_agg
    }

    /// Impact per unit output, $f = F \hat{x}^{-1}$
    ///
    /// Columns of sectors with zero output are zero.
    pub fn intensities(&self, f: &Table) -> EEIOResult<Table> {
        f.columns()
            .ensure_matches(self.system.a.columns(), "impact intensities (F columns)")?;
        let normalised = self.system.output_normaliser().right_apply(f.values())?;
        f.with_values(normalised)
    }

    /// Production and consumption footprints of the impact row `impact`
    ///
    /// `scale` converts the native impact unit into `unit` (e.g. `1e-9` for
    /// kg to Mt).
    pub fn calc(
        &self,
        f: &Table,
        f_y: &Table,
        impact: &str,
        scale: f64,
        unit: &str,
    ) -> EEIOResult<Footprints> {
        f.rows()
            .ensure_matches(f_y.rows(), "footprint (F rows vs F_Y rows)")?;
        f_y.columns()
            .ensure_matches(self.system.y.columns(), "footprint (F_Y columns vs Y columns)")?;

        let f_agg = f.aggregate_columns_by_region()?;
        let f_y_agg = f_y.aggregate_columns_by_region()?;
        f_agg.columns().ensure_matches(
            f_y_agg.columns(),
            "footprint (production regions vs final demand regions)",
        )?;
        f_y_agg
            .columns()
            .ensure_matches(self.y_agg.columns(), "footprint (F_Y regions vs Y regions)")?;

        let direct_fd = f_y_agg.row(&[impact])?;
        let production = (&f_agg.row(&[impact])? + &direct_fd) * scale;

        let intensity = self.intensities(f)?;
        let multipliers = row_times(&intensity.row(&[impact])?, &self.system.l, "f · L")?;
        let embodied = row_times(&multipliers.view(), &self.y_agg, "f · L · Y")?;
        let consumption = (embodied + &direct_fd) * scale;

        let footprints = Footprints {
            impact: impact.to_string(),
            unit: unit.to_string(),
            regions: self.y_agg.columns().regions(),
            production,
            consumption,
        };
        debug!(
            impact,
            global_production = footprints.global_production(),
            global_consumption = footprints.global_consumption(),
            "Calculated footprints"
        );
        Ok(footprints)
    }

    /// As [`calc`](Self::calc), logging the global reconciliation
    pub fn calc_checked(
        &self,
        f: &Table,
        f_y: &Table,
        impact: &str,
        scale: f64,
        unit: &str,
        rel_tol: f64,
    ) -> EEIOResult<Footprints> {
        let footprints = self.calc(f, f_y, impact, scale, unit)?;
        let ratio = footprints.reconciliation_ratio();
        if footprints.is_reconciled(rel_tol) {
            info!(ratio, "Production and consumption footprints reconcile");
        } else {
            warn!(
                ratio,
                rel_tol,
                "Global production and consumption footprints do not reconcile; \
                 check for impacts attributed to sectors with zero output"
            );
        }
        Ok(footprints)
    }
}

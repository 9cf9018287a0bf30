//! Scope 1, 2 and 3 emissions per industry
//!
//! For a group of stressor rows (e.g. every row whose label contains
//! `"CO2"`) summed into $F_g$, with intensities $f_g = F_g \hat{x}^{-1}$,
//! an electricity indicator $e$ and inter-industry flows $Z = A \hat{x}$:
//!
//! - Scope 1: $F_g \cdot s$ (direct emissions of each industry)
//! - Scope 2: $f_g \hat{e} Z \cdot s$ (emissions of the electricity each
//!   industry buys)
//! - Scope 3: $f_g L Z \cdot s$ (emissions embodied in every upstream
//!   purchase of each industry)
//!
//! Scope 2 here covers purchased electricity only and scope 3 is the full
//! upstream supply chain including the electricity already counted in
//! scope 2. The scopes are therefore not additive and are reported as
//! calculated.

use crate::diagonal::DiagonalOperator;
use crate::errors::{EEIOError, EEIOResult};
use crate::index::MultiIndex;
use crate::leontief::IOSystem;
use crate::table::{row_times, Table};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One of the three emission scopes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Direct emissions
    Scope1,
    /// Emissions embodied in purchased electricity
    Scope2,
    /// Emissions embodied in the upstream supply chain
    Scope3,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Scope1, Scope::Scope2, Scope::Scope3];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Scope1 => write!(f, "Scope 1"),
            Scope::Scope2 => write!(f, "Scope 2"),
            Scope::Scope3 => write!(f, "Scope 3"),
        }
    }
}

/// Selects which sectors count as electricity producers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElectricitySectors {
    /// 1-based, inclusive range of sector positions within every region block
    Positions { first: usize, last: usize },
    /// Sectors whose label contains this text (case-insensitive)
    LabelContains { text: String },
}

impl Default for ElectricitySectors {
    /// Sectors 128 to 141 of the 200-product EXIOBASE classification
    fn default() -> Self {
        ElectricitySectors::Positions {
            first: 128,
            last: 141,
        }
    }
}

impl ElectricitySectors {
    /// Build the indicator vector $\hat{e}$ over a (region, sector) index
    pub fn indicator(&self, index: &MultiIndex) -> EEIOResult<DiagonalOperator> {
        let positions: Vec<usize> = match self {
            ElectricitySectors::Positions { first, last } => {
                if *first == 0 || first > last {
                    return Err(EEIOError::InvalidConfig(format!(
                        "electricity sector range {first}..={last} must be 1-based and non-empty"
                    )));
                }
                let mut positions = Vec::new();
                for block in index.region_blocks()? {
                    let block_len = block.range.len();
                    if *last > block_len {
                        return Err(EEIOError::dimension(
                            format!("electricity sectors of region {}", block.region),
                            format!("at least {last} sectors"),
                            block_len,
                        ));
                    }
                    positions.extend((first - 1..*last).map(|offset| block.range.start + offset));
                }
                positions
            }
            ElectricitySectors::LabelContains { text } => {
                let needle = text.to_lowercase();
                (0..index.len())
                    .filter(|&i| {
                        index
                            .leaf_of(i)
                            .map(|label| label.to_lowercase().contains(&needle))
                            .unwrap_or(false)
                    })
                    .collect()
            }
        };

        if positions.is_empty() {
            return Err(EEIOError::LookupError {
                label: format!("{self:?}"),
                axis: "electricity sectors".to_string(),
            });
        }
        debug!(count = positions.len(), "Built electricity indicator");
        DiagonalOperator::mask(index.len(), positions)
    }
}

/// Per-industry scope emissions, keyed by the (region, sector) index of $A$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeEmissions {
    /// Description of the stressor group
    pub stressor: String,
    pub unit: String,
    pub index: MultiIndex,
    pub scope1: Array1<f64>,
    pub scope2: Array1<f64>,
    pub scope3: Array1<f64>,
}

/// Scope emissions of one industry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorScopes {
    pub sector: String,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
}

impl SectorScopes {
    pub fn get(&self, scope: Scope) -> f64 {
        match scope {
            Scope::Scope1 => self.scope1,
            Scope::Scope2 => self.scope2,
            Scope::Scope3 => self.scope3,
        }
    }
}

/// Scope emissions summed over the sectors of each region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalScopes {
    pub unit: String,
    pub regions: Vec<String>,
    pub scope1: Array1<f64>,
    pub scope2: Array1<f64>,
    pub scope3: Array1<f64>,
}

impl RegionalScopes {
    pub fn get(&self, scope: Scope) -> &Array1<f64> {
        match scope {
            Scope::Scope1 => &self.scope1,
            Scope::Scope2 => &self.scope2,
            Scope::Scope3 => &self.scope3,
        }
    }
}

impl ScopeEmissions {
    pub fn get(&self, scope: Scope) -> &Array1<f64> {
        match scope {
            Scope::Scope1 => &self.scope1,
            Scope::Scope2 => &self.scope2,
            Scope::Scope3 => &self.scope3,
        }
    }

    /// Sum each scope over sectors within each region, keeping region order
    pub fn by_region(&self) -> EEIOResult<RegionalScopes> {
        let blocks = self.index.region_blocks()?;
        let sum = |values: &Array1<f64>| -> Array1<f64> {
            blocks
                .iter()
                .map(|b| values.slice(ndarray::s![b.range.clone()]).sum())
                .collect()
        };
        Ok(RegionalScopes {
            unit: self.unit.clone(),
            regions: blocks.iter().map(|b| b.region.clone()).collect(),
            scope1: sum(&self.scope1),
            scope2: sum(&self.scope2),
            scope3: sum(&self.scope3),
        })
    }

    /// Per-sector scopes of one region, in sector order
    pub fn for_region(&self, code: &str) -> EEIOResult<Vec<SectorScopes>> {
        let block = self
            .index
            .region_blocks()?
            .into_iter()
            .find(|b| b.region == code)
            .ok_or_else(|| EEIOError::LookupError {
                label: code.to_string(),
                axis: "scope regions".to_string(),
            })?;

        Ok(block
            .range
            .map(|i| SectorScopes {
                sector: self.index.leaf_of(i).unwrap_or_default().to_string(),
                scope1: self.scope1[i],
                scope2: self.scope2[i],
                scope3: self.scope3[i],
            })
            .collect())
    }

    /// The `n` largest sectors of a region for one scope, largest first
    pub fn top_sectors(&self, code: &str, scope: Scope, n: usize) -> EEIOResult<Vec<SectorScopes>> {
        let mut sectors = self.for_region(code)?;
        sectors.sort_by(|a, b| b.get(scope).total_cmp(&a.get(scope)));
        sectors.truncate(n);
        Ok(sectors)
    }
}

/// Calculates scope emissions from a solved [`IOSystem`]
pub struct ScopeCalculator<'a> {
    system: &'a IOSystem,
    electricity: DiagonalOperator,
    flows: Table,
}

impl<'a> ScopeCalculator<'a> {
    pub fn new(system: &'a IOSystem, electricity: &ElectricitySectors) -> EEIOResult<Self> {
        let electricity = electricity.indicator(system.a.columns())?;
        let flows = system.flows()?;
        Ok(Self {
            system,
            electricity,
            flows,
        })
    }

    pub fn electricity(&self) -> &DiagonalOperator {
        &self.electricity
    }

    /// Inter-industry flows $Z$
    pub fn flows(&self) -> &Table {
        &self.flows
    }

    /// Scope 1/2/3 emissions of the stressor rows of `fr` whose label
    /// contains `pattern`
    pub fn calc(
        &self,
        fr: &Table,
        pattern: &str,
        scale: f64,
        unit: &str,
    ) -> EEIOResult<ScopeEmissions> {
        fr.columns()
            .ensure_matches(self.system.a.columns(), "scope emissions (stressor columns)")?;

        let direct = fr.sum_rows_matching(pattern, |label| label.contains(pattern))?;
        let intensity = self.system.output_normaliser().apply_to_row(&direct.view())?;

        let scope1 = &direct * scale;

        let electricity_intensity = self.electricity.apply_to_row(&intensity.view())?;
        let scope2 = row_times(&electricity_intensity.view(), &self.flows, "f · ê · Z")? * scale;

        let multipliers = row_times(&intensity.view(), &self.system.l, "f · L")?;
        let scope3 = row_times(&multipliers.view(), &self.flows, "f · L · Z")? * scale;

        info!(
            stressor = pattern,
            scope1 = scope1.sum(),
            scope2 = scope2.sum(),
            scope3 = scope3.sum(),
            "Calculated scope emissions"
        );

        Ok(ScopeEmissions {
            stressor: pattern.to_string(),
            unit: unit.to_string(),
            index: self.system.a.columns().clone(),
            scope1,
            scope2,
            scope3,
        })
    }
}

/// Direct final-demand emissions of a stressor group, per region
///
/// These occur in households and government (e.g. private vehicles) and
/// belong to no industry scope.
pub fn household_direct(
    f_yr: &Table,
    pattern: &str,
    scale: f64,
) -> EEIOResult<(Vec<String>, Array1<f64>)> {
    let aggregated = f_yr.aggregate_columns_by_region()?;
    let values = aggregated.sum_rows_matching(pattern, |label| label.contains(pattern))? * scale;
    Ok((aggregated.columns().regions(), values))
}

//! Mass units for reporting emissions
//!
//! EXIOBASE reports stressors in kg. Footprints are usually reported in Mt,
//! so results are multiplied by a scale factor derived here.
//!
//! # Conversion Factor Convention
//!
//! Every unit is registered with the multiplier that converts it TO
//! kilograms. The factor from `a` to `b` is therefore `to_kg(a) / to_kg(b)`.
//!
//! ```
//! use rseeio_core::units::conversion_factor;
//!
//! let factor = conversion_factor("kg", "Mt").unwrap();
//! assert!((factor - 1e-9).abs() < 1e-24);
//! ```

use crate::errors::{EEIOError, EEIOResult};
use std::collections::HashMap;
use std::sync::LazyLock;

/// The global mass unit registry.
pub static MASS_UNITS: LazyLock<MassUnitRegistry> = LazyLock::new(MassUnitRegistry::new);

/// Registry of mass units and their size in kilograms
#[derive(Debug)]
pub struct MassUnitRegistry {
    to_kg: HashMap<&'static str, f64>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for MassUnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MassUnitRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            to_kg: HashMap::new(),
            aliases: HashMap::new(),
        };
        for (symbol, factor) in [
            ("mg", 1e-6),
            ("g", 1e-3),
            ("kg", 1.0),
            ("t", 1e3),
            ("kt", 1e6),
            ("Mt", 1e9),
            ("Gt", 1e12),
        ] {
            registry.to_kg.insert(symbol, factor);
        }
        for (alias, canonical) in [
            ("tonne", "t"),
            ("tonnes", "t"),
            ("Tg", "Mt"),
            ("Pg", "Gt"),
            ("Gg", "kt"),
            ("Mg", "t"),
        ] {
            registry.aliases.insert(alias, canonical);
        }
        registry
    }

    /// Size of `symbol` in kilograms
    ///
    /// A trailing gas name separated by a space (e.g. `"kg CO2-eq"`) is
    /// ignored: the scale factor only depends on the mass prefix.
    pub fn to_kg(&self, symbol: &str) -> EEIOResult<f64> {
        let mass = symbol.split_whitespace().next().unwrap_or_default();
        let canonical = self.aliases.get(mass).copied().unwrap_or(mass);
        self.to_kg
            .get(canonical)
            .copied()
            .ok_or_else(|| EEIOError::UnknownUnit(symbol.to_string()))
    }
}

/// Multiplier converting a quantity in `from` into `to`
pub fn conversion_factor(from: &str, to: &str) -> EEIOResult<f64> {
    Ok(MASS_UNITS.to_kg(from)? / MASS_UNITS.to_kg(to)?)
}

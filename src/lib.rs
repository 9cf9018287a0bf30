//! Python extension for RSEEIO
//!
//! The numerical core lives in [`rseeio_core`]; this crate only exposes it
//! to Python as `rseeio._lib`.

pub mod python;

pub use rseeio_core::*;

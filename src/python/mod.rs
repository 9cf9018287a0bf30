//! Python bindings
//!
//! ```python
//! import numpy as np
//! from rseeio._lib import leontief_inverse, total_output, run_pipeline
//!
//! A = np.array([[0.1, 0.2], [0.05, 0.3]])
//! L = leontief_inverse(A)
//! x = total_output(L, np.array([[10.0], [5.0]]))
//!
//! report = json.loads(run_pipeline({"data_dir": "IOT_2019_pxp", "region": "CA"}))
//! ```
//!
//! Arrays passed from Python carry no labels, so they are given positional
//! labels and only their shapes are checked.

use ndarray::{Array2, ArrayView2};
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rseeio_core::config::PipelineConfig;
use rseeio_core::diagonal;
use rseeio_core::index::MultiIndex;
use rseeio_core::leontief;
use rseeio_core::pipeline::Pipeline;
use rseeio_core::table::Table;
use rseeio_core::EEIOError;

fn to_py_err(e: EEIOError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn positional_index(name: &str, len: usize) -> PyResult<MultiIndex> {
    MultiIndex::single_level(name, (0..len).map(|i| i.to_string())).map_err(to_py_err)
}

fn positional_table(values: ArrayView2<'_, f64>, columns: &str) -> PyResult<Table> {
    let rows = positional_index("sector", values.nrows())?;
    let cols = positional_index(columns, values.ncols())?;
    Table::new(rows, cols, values.to_owned()).map_err(to_py_err)
}

/// Leontief inverse ``(I - A)^-1`` of a square coefficient matrix
///
/// Raises ``ValueError`` if ``A`` is not square or ``I - A`` is singular.
#[pyfunction]
fn leontief_inverse<'py>(
    py: Python<'py>,
    a: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let table = positional_table(a.as_array(), "sector")?;
    let l = py
        .allow_threads(|| leontief::leontief_inverse(&table))
        .map_err(to_py_err)?;
    Ok(l.into_values().into_pyarray(py))
}

/// Total output ``x = L @ Y.sum(axis=1)``
#[pyfunction]
fn total_output<'py>(
    py: Python<'py>,
    l: PyReadonlyArray2<'py, f64>,
    y: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let l = positional_table(l.as_array(), "sector")?;
    let y = positional_table(y.as_array(), "category")?;
    let x = leontief::total_output(&l, &y).map_err(to_py_err)?;
    Ok(x.into_pyarray(py))
}

/// Elementwise ``1 / v`` leaving zero entries at zero
#[pyfunction]
fn safe_reciprocal<'py>(
    py: Python<'py>,
    v: PyReadonlyArray1<'py, f64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    Ok(diagonal::safe_reciprocal(&v.as_array()).into_pyarray(py))
}

/// Inter-industry flows ``Z = A @ diag(x)``
#[pyfunction]
fn flow_matrix<'py>(
    py: Python<'py>,
    a: PyReadonlyArray2<'py, f64>,
    x: PyReadonlyArray1<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let a = positional_table(a.as_array(), "sector")?;
    let z: Array2<f64> = leontief::flow_matrix(&a, &x.as_array().to_owned())
        .map_err(to_py_err)?
        .into_values();
    Ok(z.into_pyarray(py))
}

/// Run the full analysis described by a configuration dict and return the
/// report as a JSON string
#[pyfunction]
fn run_pipeline(py: Python<'_>, config: Bound<'_, PyAny>) -> PyResult<String> {
    let config = pythonize::depythonize::<PipelineConfig>(&config)
        .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
    let pipeline = Pipeline::new(config).map_err(to_py_err)?;
    let report = py
        .allow_threads(|| pipeline.run_from_disk())
        .map_err(to_py_err)?;
    serde_json::to_string(&report).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Default configuration as a TOML string
#[pyfunction]
fn default_config() -> PyResult<String> {
    PipelineConfig::default()
        .to_toml_string()
        .map_err(to_py_err)
}

#[pymodule]
#[pyo3(name = "_lib")]
fn rseeio(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_function(wrap_pyfunction!(leontief_inverse, m)?)?;
    m.add_function(wrap_pyfunction!(total_output, m)?)?;
    m.add_function(wrap_pyfunction!(safe_reciprocal, m)?)?;
    m.add_function(wrap_pyfunction!(flow_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(run_pipeline, m)?)?;
    m.add_function(wrap_pyfunction!(default_config, m)?)?;
    Ok(())
}

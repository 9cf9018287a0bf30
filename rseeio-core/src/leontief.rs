//! Leontief inverse and total output
//!
//! Given the technical coefficient matrix $A$ and final demand $Y$, total
//! output satisfies
//!
//! $$ x = A x + Y \mathbf{1} \quad\Rightarrow\quad x = (I - A)^{-1} Y \mathbf{1} = L\, Y \mathbf{1} $$
//!
//! $L$ is computed densely via an LU decomposition. For EXIOBASE
//! ($n \approx 9800$) this is a single ~770 MB matrix; no sparse path is
//! provided.

use crate::diagonal::DiagonalOperator;
use crate::errors::{EEIOError, EEIOResult};
use crate::table::Table;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ShapeBuilder};
use tracing::{debug, info, warn};

/// Compute $L = (I - A)^{-1}$
///
/// Rows and columns of the result carry the labels of `a`.
///
/// # Errors
///
/// * [`EEIOError::DimensionError`] if `a` is not square
/// * [`EEIOError::SingularMatrix`] if $(I - A)$ cannot be factorised or the
///   inverse contains non-finite values. This is fatal; no regularisation
///   or retry is attempted.
pub fn leontief_inverse(a: &Table) -> EEIOResult<Table> {
    if !a.is_square() {
        let (r, c) = a.shape();
        return Err(EEIOError::dimension(
            "Leontief inverse",
            "a square coefficient matrix",
            format!("({r}, {c})"),
        ));
    }
    a.rows()
        .ensure_matches(a.columns(), "Leontief inverse (row vs column labels)")?;

    check_productivity(a.values());

    let n = a.shape().0;
    let values = a.values();
    debug!(n, "Factorising (I - A)");
    let i_minus_a = DMatrix::from_fn(n, n, |i, j| {
        let identity = if i == j { 1.0 } else { 0.0 };
        identity - values[[i, j]]
    });

    let inverse = i_minus_a
        .lu()
        .try_inverse()
        .ok_or_else(|| EEIOError::SingularMatrix("LU factorisation has a zero pivot".into()))?;

    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(EEIOError::SingularMatrix(
            "inverse contains non-finite values".into(),
        ));
    }

    // nalgebra stores column-major
    let buffer: Vec<f64> = inverse.data.into();
    let l = Array2::from_shape_vec((n, n).f(), buffer)
        .map_err(|e| EEIOError::dimension("Leontief inverse", n * n, e))?;
    a.with_values(l)
}

/// Warn when a column of $A$ sums to one or more
///
/// A column sum below one in every column is sufficient for the spectral
/// radius of a non-negative $A$ to be below one. Failing it does not
/// guarantee a singular system, so the inversion is still attempted.
fn check_productivity(a: &Array2<f64>) {
    let column_sums = a.sum_axis(ndarray::Axis(0));
    let unproductive = column_sums.iter().filter(|&&s| s >= 1.0).count();
    if unproductive > 0 {
        let max = column_sums.fold(f64::NEG_INFINITY, |acc, &s| acc.max(s));
        warn!(
            unproductive,
            max_column_sum = max,
            "Coefficient matrix has columns summing to >= 1; (I - A) may not be invertible"
        );
    }
    if a.iter().any(|&v| v < 0.0) {
        warn!("Coefficient matrix has negative entries");
    }
}

/// Total output $x = L \cdot Y \mathbf{1}$
///
/// Final demand is summed over all demand categories of all regions before
/// multiplying.
pub fn total_output(l: &Table, y: &Table) -> EEIOResult<Array1<f64>> {
    l.columns().ensure_matches(y.rows(), "total output (L columns vs Y rows)")?;
    Ok(l.values().dot(&y.row_sums()))
}

/// Inter-industry flows $Z = A \hat{x}$
pub fn flow_matrix(a: &Table, x: &Array1<f64>) -> EEIOResult<Table> {
    let z = DiagonalOperator::new(x.clone()).right_apply(a.values())?;
    a.with_values(z)
}

/// The calculated core of an input-output system
#[derive(Debug, Clone)]
pub struct IOSystem {
    /// Technical coefficients $A$
    pub a: Table,
    /// Final demand $Y$
    pub y: Table,
    /// Leontief inverse $L$
    pub l: Table,
    /// Total output $x$
    pub x: Array1<f64>,
}

impl IOSystem {
    /// Calculate $L$ and $x$ from $A$ and $Y$
    pub fn calc(a: Table, y: Table) -> EEIOResult<Self> {
        a.columns()
            .ensure_matches(y.rows(), "input-output system (A columns vs Y rows)")?;

        info!(sectors = a.shape().0, "Computing Leontief inverse");
        let l = leontief_inverse(&a)?;
        let x = total_output(&l, &y)?;
        info!(total_output = x.sum(), "Computed total output");

        Ok(Self { a, y, l, x })
    }

    /// Number of (region, sector) pairs
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// $\hat{x}^{-1}$ with zero-output sectors left at zero
    pub fn output_normaliser(&self) -> DiagonalOperator {
        DiagonalOperator::inverse_of(&self.x.view())
    }

    /// Inter-industry flows $Z = A \hat{x}$
    pub fn flows(&self) -> EEIOResult<Table> {
        flow_matrix(&self.a, &self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MultiIndex;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn index() -> MultiIndex {
        MultiIndex::region_sector(&["AT", "BE"], &["Wheat", "Steel"]).unwrap()
    }

    fn coefficients() -> Table {
        Table::new(
            index(),
            index(),
            array![
                [0.10, 0.05, 0.02, 0.00],
                [0.20, 0.30, 0.01, 0.05],
                [0.00, 0.04, 0.15, 0.10],
                [0.03, 0.10, 0.20, 0.25]
            ],
        )
        .unwrap()
    }

    #[test]
    fn inverse_times_i_minus_a_is_identity() {
        let a = coefficients();
        let l = leontief_inverse(&a).unwrap();
        let i_minus_a = Array2::<f64>::eye(4) - a.values();
        let product = l.values().dot(&i_minus_a);

        for ((i, j), v) in product.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(*v, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn inverse_of_zero_matrix_is_identity() {
        let a = Table::new(index(), index(), Array2::zeros((4, 4))).unwrap();
        let l = leontief_inverse(&a).unwrap();
        for ((i, j), v) in l.values().indexed_iter() {
            assert_abs_diff_eq!(*v, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-15);
        }
    }

    #[test]
    fn inverse_keeps_orientation() {
        let idx = MultiIndex::region_sector(&["AT"], &["Wheat", "Steel"]).unwrap();
        // Steel uses 0.5 Wheat per unit, so L[Wheat, Steel] = 0.5 and L[Steel, Wheat] = 0
        let a = Table::new(idx.clone(), idx, array![[0.0, 0.5], [0.0, 0.0]]).unwrap();
        let l = leontief_inverse(&a).unwrap();
        assert_abs_diff_eq!(l.values()[[0, 0]], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(l.values()[[0, 1]], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(l.values()[[1, 0]], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(l.values()[[1, 1]], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn leontief_entries_are_at_least_identity() {
        // For non-negative productive A, L = I + A + A^2 + ... >= I elementwise
        let l = leontief_inverse(&coefficients()).unwrap();
        for ((i, j), v) in l.values().indexed_iter() {
            let floor = if i == j { 1.0 } else { 0.0 };
            assert!(*v >= floor - 1e-15, "L[{i},{j}] = {v}");
        }
    }

    #[test]
    fn singular_system_is_fatal() {
        let idx = MultiIndex::region_sector(&["AT"], &["Wheat", "Steel"]).unwrap();
        // (I - A) = [[0, 0], [0, 1]] is singular
        let a = Table::new(idx.clone(), idx, array![[1.0, 0.0], [0.0, 0.0]]).unwrap();
        assert!(matches!(
            leontief_inverse(&a),
            Err(EEIOError::SingularMatrix(_))
        ));
    }

    #[test]
    fn non_square_is_a_dimension_error() {
        let rows = index();
        let cols = MultiIndex::region_sector(&["AT"], &["Wheat", "Steel"]).unwrap();
        let a = Table::new(rows, cols, Array2::zeros((4, 2))).unwrap();
        assert!(matches!(
            leontief_inverse(&a),
            Err(EEIOError::DimensionError { .. })
        ));
    }

    #[test]
    fn output_satisfies_balance() {
        let a = coefficients();
        let y = Table::new(
            index(),
            MultiIndex::from_pairs(
                "region",
                "category",
                &[("AT", "Households"), ("BE", "Households")],
            )
            .unwrap(),
            array![[10.0, 2.0], [5.0, 1.0], [0.0, 8.0], [3.0, 3.0]],
        )
        .unwrap();

        let system = IOSystem::calc(a.clone(), y.clone()).unwrap();
        // x = A x + y
        let reconstructed = a.values().dot(&system.x) + y.row_sums();
        for (lhs, rhs) in system.x.iter().zip(reconstructed.iter()) {
            assert_abs_diff_eq!(*lhs, *rhs, epsilon = 1e-10);
        }
    }

    #[test]
    fn flows_scale_columns_by_output() {
        let a = coefficients();
        let x = array![100.0, 50.0, 0.0, 10.0];
        let z = flow_matrix(&a, &x).unwrap();
        assert_abs_diff_eq!(z.values()[[1, 0]], 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.values()[[3, 1]], 5.0, epsilon = 1e-12);
        assert_eq!(z.values().column(2).sum(), 0.0);
    }
}

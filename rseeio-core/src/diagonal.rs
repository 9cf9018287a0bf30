//! Diagonal operators
//!
//! Input-output analysis repeatedly turns a vector into a diagonal matrix,
//! e.g. $\hat{x}^{-1}$ to normalise flows by output or $\hat{e}$ to mask
//! electricity sectors. Materialising an $n \times n$ diagonal matrix for
//! $n \approx 9800$ costs ~770 MB, so [`DiagonalOperator`] keeps only the
//! diagonal and applies it by scaling rows or columns.

use crate::errors::{EEIOError, EEIOResult};
use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Elementwise reciprocal that leaves zero entries at zero
///
/// $$ v'_i = \begin{cases} 1 / v_i & v_i \neq 0 \\ 0 & v_i = 0 \end{cases} $$
///
/// Sectors with no output would otherwise produce `inf`/`NaN` intensities
/// that propagate through every later product.
pub fn safe_reciprocal(v: &ArrayView1<'_, f64>) -> Array1<f64> {
    v.mapv(|value| if value != 0.0 { 1.0 / value } else { 0.0 })
}

/// A diagonal matrix stored as its diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagonalOperator {
    diagonal: Array1<f64>,
}

impl DiagonalOperator {
    pub fn new(diagonal: Array1<f64>) -> Self {
        Self { diagonal }
    }

    /// $\hat{v}^{-1}$ using [`safe_reciprocal`]
    pub fn inverse_of(v: &ArrayView1<'_, f64>) -> Self {
        Self::new(safe_reciprocal(v))
    }

    /// Binary mask with ones at `positions`
    pub fn mask(len: usize, positions: impl IntoIterator<Item = usize>) -> EEIOResult<Self> {
        let mut diagonal = Array1::zeros(len);
        for p in positions {
            if p >= len {
                return Err(EEIOError::dimension(
                    "diagonal mask",
                    format!("position < {len}"),
                    p,
                ));
            }
            diagonal[p] = 1.0;
        }
        Ok(Self::new(diagonal))
    }

    pub fn len(&self) -> usize {
        self.diagonal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagonal.is_empty()
    }

    pub fn diagonal(&self) -> &Array1<f64> {
        &self.diagonal
    }

    /// Dense $n \times n$ representation, for small systems and tests
    pub fn to_dense(&self) -> Array2<f64> {
        Array2::from_diag(&self.diagonal)
    }

    /// $\hat{d} \cdot M$: scales row `i` of `matrix` by `d_i`
    pub fn left_apply(&self, matrix: &Array2<f64>) -> EEIOResult<Array2<f64>> {
        self.check_len(matrix.nrows(), "diagonal left product")?;
        let mut out = matrix.clone();
        Zip::from(out.axis_iter_mut(Axis(0)))
            .and(&self.diagonal)
            .for_each(|mut row, &d| row *= d);
        Ok(out)
    }

    /// $M \cdot \hat{d}$: scales column `j` of `matrix` by `d_j`
    pub fn right_apply(&self, matrix: &Array2<f64>) -> EEIOResult<Array2<f64>> {
        self.check_len(matrix.ncols(), "diagonal right product")?;
        let mut out = matrix.clone();
        Zip::from(out.axis_iter_mut(Axis(1)))
            .and(&self.diagonal)
            .for_each(|mut column, &d| column *= d);
        Ok(out)
    }

    /// $v \cdot \hat{d}$ for a row vector, i.e. the elementwise product
    pub fn apply_to_row(&self, v: &ArrayView1<'_, f64>) -> EEIOResult<Array1<f64>> {
        self.check_len(v.len(), "diagonal vector product")?;
        Ok(v * &self.diagonal)
    }

    fn check_len(&self, actual: usize, context: &str) -> EEIOResult<()> {
        if actual != self.diagonal.len() {
            return Err(EEIOError::dimension(context, self.diagonal.len(), actual));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn safe_reciprocal_skips_zeros() {
        let v = array![2.0, 0.0, -4.0, 0.5];
        let r = safe_reciprocal(&v.view());
        assert_eq!(r, array![0.5, 0.0, -0.25, 2.0]);
    }

    #[test]
    fn safe_reciprocal_products_are_zero_or_one() {
        let v = array![1e-300, 0.0, 3.0, 157_028_217.76, 0.0, -7.0];
        let r = safe_reciprocal(&v.view());
        for (vi, ri) in v.iter().zip(r.iter()) {
            let product = vi * ri;
            if *vi == 0.0 {
                assert_eq!(product, 0.0);
            } else {
                assert!((product - 1.0).abs() < 1e-12, "product was {product}");
            }
        }
    }

    #[test]
    fn left_and_right_match_dense_products() {
        let d = DiagonalOperator::new(array![1.0, 2.0, 3.0]);
        let m = array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]];

        assert_eq!(d.left_apply(&m).unwrap(), d.to_dense().dot(&m));
        assert_eq!(d.right_apply(&m).unwrap(), m.dot(&d.to_dense()));
    }

    #[test]
    fn non_square_right_apply() {
        let d = DiagonalOperator::new(array![10.0, 0.0]);
        let m = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        assert_eq!(
            d.right_apply(&m).unwrap(),
            array![[10.0, 0.0], [30.0, 0.0], [50.0, 0.0]]
        );
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let d = DiagonalOperator::new(array![1.0, 2.0]);
        let m = Array2::<f64>::zeros((3, 3));
        assert!(matches!(
            d.left_apply(&m),
            Err(EEIOError::DimensionError { .. })
        ));
        assert!(d.apply_to_row(&array![1.0, 2.0, 3.0].view()).is_err());
    }

    #[test]
    fn mask() {
        let d = DiagonalOperator::mask(5, [1, 3]).unwrap();
        assert_eq!(d.diagonal(), &array![0.0, 1.0, 0.0, 1.0, 0.0]);
        assert!(DiagonalOperator::mask(2, [2]).is_err());
    }
}

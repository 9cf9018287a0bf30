//! Labelled numeric tables
//!
//! A [`Table`] couples a dense `f64` matrix with the [`MultiIndex`] of each
//! axis. Operations that combine tables check the labels as well as the
//! shapes, so a stale or reordered table surfaces as an error instead of a
//! silently wrong footprint.

use crate::errors::{EEIOError, EEIOResult};
use crate::index::MultiIndex;
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// A dense matrix with labelled rows and columns
///
/// Deserialisation goes through [`Table::new`], so the shape is always
/// checked against the labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    rows: MultiIndex,
    columns: MultiIndex,
    values: Array2<f64>,
}

#[derive(Deserialize)]
struct RawTable {
    rows: MultiIndex,
    columns: MultiIndex,
    values: Array2<f64>,
}

impl TryFrom<RawTable> for Table {
    type Error = EEIOError;

    fn try_from(raw: RawTable) -> EEIOResult<Self> {
        Table::new(raw.rows, raw.columns, raw.values)
    }
}

impl Table {
    pub fn new(rows: MultiIndex, columns: MultiIndex, values: Array2<f64>) -> EEIOResult<Self> {
        if values.nrows() != rows.len() || values.ncols() != columns.len() {
            return Err(EEIOError::dimension(
                "table construction",
                format!("({}, {})", rows.len(), columns.len()),
                format!("({}, {})", values.nrows(), values.ncols()),
            ));
        }
        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    pub fn rows(&self) -> &MultiIndex {
        &self.rows
    }

    pub fn columns(&self) -> &MultiIndex {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_square(&self) -> bool {
        self.values.nrows() == self.values.ncols()
    }

    /// Position of a row by its full key
    pub fn row_position(&self, key: &[&str]) -> EEIOResult<usize> {
        self.rows
            .position(key)
            .ok_or_else(|| EEIOError::LookupError {
                label: key.join(" / "),
                axis: "table rows".to_string(),
            })
    }

    /// A single row by its full key
    ///
    /// Labels are matched exactly.
    pub fn row(&self, key: &[&str]) -> EEIOResult<ArrayView1<'_, f64>> {
        let i = self.row_position(key)?;
        Ok(self.values.row(i))
    }

    /// Positions of the rows whose last-level label satisfies `predicate`
    pub fn rows_matching<P>(&self, predicate: P) -> Vec<usize>
    where
        P: Fn(&str) -> bool,
    {
        (0..self.rows.len())
            .filter(|&i| self.rows.leaf_of(i).map(&predicate).unwrap_or(false))
            .collect()
    }

    /// Sum of all rows whose last-level label satisfies `predicate`
    ///
    /// Fails with a lookup error when no row matches, rather than returning
    /// a row of zeros that would look like a genuine zero-emission result.
    pub fn sum_rows_matching<P>(&self, description: &str, predicate: P) -> EEIOResult<Array1<f64>>
    where
        P: Fn(&str) -> bool,
    {
        let matching = self.rows_matching(predicate);
        if matching.is_empty() {
            return Err(EEIOError::LookupError {
                label: description.to_string(),
                axis: "table rows".to_string(),
            });
        }

        let mut total = Array1::zeros(self.values.ncols());
        for i in matching {
            total += &self.values.row(i);
        }
        Ok(total)
    }

    pub fn row_sums(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(1))
    }

    pub fn column_sums(&self) -> Array1<f64> {
        self.values.sum_axis(Axis(0))
    }

    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Sum columns over sectors within each region block
    ///
    /// Region order is preserved. Applying this to an already aggregated
    /// table returns an identical table.
    pub fn aggregate_columns_by_region(&self) -> EEIOResult<Table> {
        let blocks = self.columns.region_blocks()?;
        let mut values = Array2::zeros((self.values.nrows(), blocks.len()));
        for (j, block) in blocks.iter().enumerate() {
            let summed = self
                .values
                .slice(s![.., block.range.clone()])
                .sum_axis(Axis(1));
            values.column_mut(j).assign(&summed);
        }
        Table::new(self.rows.clone(), self.columns.aggregated_by_region()?, values)
    }

    /// Sum rows over sectors within each region block
    pub fn aggregate_rows_by_region(&self) -> EEIOResult<Table> {
        let blocks = self.rows.region_blocks()?;
        let mut values = Array2::zeros((blocks.len(), self.values.ncols()));
        for (i, block) in blocks.iter().enumerate() {
            let summed = self
                .values
                .slice(s![block.range.clone(), ..])
                .sum_axis(Axis(0));
            values.row_mut(i).assign(&summed);
        }
        Table::new(self.rows.aggregated_by_region()?, self.columns.clone(), values)
    }

    /// Matrix product `self · other`
    ///
    /// The columns of `self` must carry exactly the same labels, in the same
    /// order, as the rows of `other`.
    pub fn matmul(&self, other: &Table) -> EEIOResult<Table> {
        self.columns
            .ensure_matches(&other.rows, "matrix product")?;
        Table::new(
            self.rows.clone(),
            other.columns.clone(),
            self.values.dot(&other.values),
        )
    }

    /// Replace the values keeping the labels
    pub fn with_values(&self, values: Array2<f64>) -> EEIOResult<Table> {
        Table::new(self.rows.clone(), self.columns.clone(), values)
    }
}

/// Row vector times a labelled matrix, checking the vector length
pub(crate) fn row_times(
    row: &ArrayView1<'_, f64>,
    matrix: &Table,
    context: &str,
) -> EEIOResult<Array1<f64>> {
    if row.len() != matrix.rows().len() {
        return Err(EEIOError::dimension(
            context,
            format!("row vector of length {}", matrix.rows().len()),
            format!("length {}", row.len()),
        ));
    }
    Ok(row.dot(matrix.values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sectors() -> MultiIndex {
        MultiIndex::region_sector(&["AT", "BE"], &["Wheat", "Steel"]).unwrap()
    }

    fn stressors() -> MultiIndex {
        MultiIndex::single_level("stressor", ["CO2 - combustion - air", "CH4 - air", "CO2 - waste"])
            .unwrap()
    }

    fn stressor_table() -> Table {
        Table::new(
            stressors(),
            sectors(),
            array![
                [1.0, 2.0, 3.0, 4.0],
                [10.0, 20.0, 30.0, 40.0],
                [0.5, 0.5, 0.5, 0.5]
            ],
        )
        .unwrap()
    }

    #[test]
    fn construction_checks_shape() {
        let result = Table::new(stressors(), sectors(), Array2::zeros((2, 4)));
        assert!(matches!(result, Err(EEIOError::DimensionError { .. })));
    }

    #[test]
    fn deserialisation_checks_shape() {
        let table = stressor_table();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(serde_json::from_value::<Table>(json.clone()).unwrap(), table);

        let mut wrong_shape = json;
        wrong_shape["values"] = serde_json::to_value(Array2::<f64>::zeros((1, 1))).unwrap();
        assert!(serde_json::from_value::<Table>(wrong_shape).is_err());
    }

    #[test]
    fn row_lookup() {
        let table = stressor_table();
        assert_eq!(table.row(&["CH4 - air"]).unwrap(), array![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn missing_row_is_a_lookup_error() {
        let table = stressor_table();
        let err = table.row(&["CH4"]).unwrap_err();
        assert!(matches!(err, EEIOError::LookupError { .. }));
    }

    #[test]
    fn sum_rows_matching_pattern() {
        let table = stressor_table();
        let co2 = table
            .sum_rows_matching("CO2", |label| label.contains("CO2"))
            .unwrap();
        assert_eq!(co2, array![1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn sum_rows_matching_nothing_fails() {
        let table = stressor_table();
        assert!(table
            .sum_rows_matching("N2O", |label| label.contains("N2O"))
            .is_err());
    }

    #[test]
    fn sums() {
        let table = stressor_table();
        assert_eq!(table.row_sums(), array![10.0, 100.0, 2.0]);
        assert_eq!(table.column_sums(), array![11.5, 22.5, 33.5, 44.5]);
        assert_eq!(table.total(), 112.0);
    }

    #[test]
    fn aggregate_columns() {
        let aggregated = stressor_table().aggregate_columns_by_region().unwrap();
        assert_eq!(aggregated.shape(), (3, 2));
        assert_eq!(aggregated.values().row(0), array![3.0, 7.0]);
        assert_eq!(aggregated.columns().regions(), vec!["AT", "BE"]);
    }

    #[test]
    fn aggregate_columns_twice_is_identity() {
        let once = stressor_table().aggregate_columns_by_region().unwrap();
        let twice = once.aggregate_columns_by_region().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn aggregate_rows() {
        let table = Table::new(
            sectors(),
            MultiIndex::single_level("category", ["Households"]).unwrap(),
            array![[1.0], [2.0], [3.0], [4.0]],
        )
        .unwrap();
        let aggregated = table.aggregate_rows_by_region().unwrap();
        assert_eq!(aggregated.values(), &array![[3.0], [7.0]]);
    }

    #[test]
    fn matmul_requires_matching_labels() {
        let left = stressor_table();
        let reordered = MultiIndex::region_sector(&["BE", "AT"], &["Wheat", "Steel"]).unwrap();
        let right = Table::new(reordered.clone(), reordered, Array2::eye(4)).unwrap();

        let err = left.matmul(&right).unwrap_err();
        assert!(matches!(err, EEIOError::IndexMismatch { .. }));
    }

    #[test]
    fn matmul_with_identity() {
        let left = stressor_table();
        let right = Table::new(sectors(), sectors(), Array2::eye(4)).unwrap();
        let product = left.matmul(&right).unwrap();
        assert_eq!(product, left);
    }
}

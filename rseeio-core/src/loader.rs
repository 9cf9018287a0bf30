//! Reading EXIOBASE tables from tab-separated text
//!
//! EXIOBASE distributes each table as a `.txt` file with several header rows
//! (one per column level, e.g. region and sector) followed by data rows whose
//! first cells hold the row labels:
//!
//! ```text
//! region          AT      AT      BE
//! sector          Wheat   Steel   Wheat
//! region  sector
//! AT      Wheat   0.01    0.0     0.002
//! ...
//! ```
//!
//! Column level names sit in the first cell of each header row. The row
//! directly after the headers may hold only the row index names (third row
//! above); it carries no values and is skipped.

use crate::errors::{EEIOError, EEIOResult};
use crate::index::MultiIndex;
use crate::table::Table;
use csv::{ReaderBuilder, StringRecord};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Layout of the label rows and columns of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// Number of leading columns holding row labels
    pub index_levels: usize,
    /// Number of leading rows holding column labels
    pub header_levels: usize,
}

impl TableLayout {
    /// (region, sector) rows and (region, sector|category) columns, as in `A.txt`
    pub const REGION_SECTOR: TableLayout = TableLayout {
        index_levels: 2,
        header_levels: 2,
    };
    /// Stressor/impact rows and (region, sector|category) columns, as in `F.txt`
    pub const STRESSOR: TableLayout = TableLayout {
        index_levels: 1,
        header_levels: 2,
    };
}

fn default_level_names(levels: usize) -> Vec<String> {
    match levels {
        1 => vec!["stressor".to_string()],
        2 => vec!["region".to_string(), "sector".to_string()],
        n => (0..n).map(|i| format!("level_{i}")).collect(),
    }
}

fn line_of(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or_default()
}

/// Read one labelled table
pub fn read_table<R: Read>(reader: R, layout: TableLayout) -> EEIOResult<Table> {
    let TableLayout {
        index_levels,
        header_levels,
    } = layout;
    if index_levels == 0 || header_levels == 0 {
        return Err(EEIOError::MalformedTable(
            "tables need at least one label row and one label column".to_string(),
        ));
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = rdr.records();

    // Column labels
    let mut header_rows: Vec<StringRecord> = Vec::with_capacity(header_levels);
    for _ in 0..header_levels {
        match records.next() {
            Some(record) => header_rows.push(record?),
            None => {
                return Err(EEIOError::MalformedTable(format!(
                    "expected {header_levels} header rows"
                )))
            }
        }
    }
    let n_columns = header_rows[0].len().saturating_sub(index_levels);
    if n_columns == 0 {
        return Err(EEIOError::MalformedTable("table has no columns".to_string()));
    }
    for record in &header_rows {
        if record.len() != index_levels + n_columns {
            return Err(EEIOError::MalformedTable(format!(
                "header row at line {} has {} cells, expected {}",
                line_of(record),
                record.len(),
                index_levels + n_columns
            )));
        }
    }
    let column_level_names: Vec<String> = header_rows
        .iter()
        .enumerate()
        .map(|(level, record)| {
            let name = record[0].trim();
            if name.is_empty() {
                format!("level_{level}")
            } else {
                name.to_string()
            }
        })
        .collect();
    let column_keys: Vec<Vec<String>> = (0..n_columns)
        .map(|j| {
            header_rows
                .iter()
                .map(|record| record[index_levels + j].trim().to_string())
                .collect()
        })
        .collect();

    // Data rows
    let mut row_level_names = default_level_names(index_levels);
    let mut row_keys: Vec<Vec<String>> = Vec::new();
    let mut data: Vec<f64> = Vec::new();
    for (i, record) in records.enumerate() {
        let record = record?;
        let line = line_of(&record);
        let is_names_row = i == 0
            && record.len() == index_levels + n_columns
            && record.iter().skip(index_levels).all(|c| c.trim().is_empty());
        if is_names_row {
            let names: Vec<String> = record
                .iter()
                .take(index_levels)
                .map(|c| c.trim().to_string())
                .collect();
            if names.len() == index_levels && names.iter().all(|n| !n.is_empty()) {
                row_level_names = names;
            }
            continue;
        }
        if record.len() != index_levels + n_columns {
            return Err(EEIOError::MalformedTable(format!(
                "row at line {line} has {} cells, expected {}",
                record.len(),
                index_levels + n_columns
            )));
        }

        row_keys.push(
            record
                .iter()
                .take(index_levels)
                .map(|c| c.trim().to_string())
                .collect(),
        );
        for (j, cell) in record.iter().enumerate().skip(index_levels) {
            let cell = cell.trim();
            let value = if cell.is_empty() {
                0.0
            } else {
                cell.parse::<f64>().map_err(|_| EEIOError::ParseError {
                    line,
                    column: j + 1,
                    value: cell.to_string(),
                })?
            };
            data.push(value);
        }
    }

    let rows = MultiIndex::new(row_level_names, row_keys)?;
    let columns = MultiIndex::new(column_level_names, column_keys)?;
    let values = Array2::from_shape_vec((rows.len(), columns.len()), data)
        .map_err(|e| EEIOError::MalformedTable(e.to_string()))?;
    debug!(rows = rows.len(), columns = columns.len(), "Read table");
    Table::new(rows, columns, values)
}

/// Read one labelled table from a file
pub fn read_table_file(path: &Path, layout: TableLayout) -> EEIOResult<Table> {
    let file = File::open(path).map_err(|source| EEIOError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table(file, layout)?;
    let (rows, columns) = table.shape();
    info!(path = %path.display(), rows, columns, "Loaded table");
    Ok(table)
}

/// Paths of the tables relative to an extracted EXIOBASE directory
pub const A_FILE: &str = "A.txt";
pub const Y_FILE: &str = "Y.txt";
pub const IMPACTS_F_FILE: &str = "impacts/F.txt";
pub const IMPACTS_F_Y_FILE: &str = "impacts/F_Y.txt";
pub const SATELLITE_F_FILE: &str = "satellite/F.txt";
pub const SATELLITE_F_Y_FILE: &str = "satellite/F_Y.txt";

/// The six tables an EEIO footprint and scope analysis needs
#[derive(Debug, Clone)]
pub struct ExiobaseTables {
    /// Technical coefficients $A$
    pub a: Table,
    /// Final demand $Y$
    pub y: Table,
    /// Characterised impacts of industries $F$
    pub impacts: Table,
    /// Characterised impacts of final demand $F_Y$
    pub impacts_y: Table,
    /// Raw stressors of industries $F_r$
    pub satellite: Table,
    /// Raw stressors of final demand $F_{Y,r}$
    pub satellite_y: Table,
}

impl ExiobaseTables {
    /// Assemble tables, checking that every axis shares the same ordering
    pub fn new(
        a: Table,
        y: Table,
        impacts: Table,
        impacts_y: Table,
        satellite: Table,
        satellite_y: Table,
    ) -> EEIOResult<Self> {
        let tables = Self {
            a,
            y,
            impacts,
            impacts_y,
            satellite,
            satellite_y,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Load all tables from an extracted EXIOBASE directory
    pub fn load(root: impl AsRef<Path>) -> EEIOResult<Self> {
        let root = root.as_ref();
        info!(root = %root.display(), "Loading EXIOBASE tables");
        let path = |name: &str| -> PathBuf { root.join(name) };

        Self::new(
            read_table_file(&path(A_FILE), TableLayout::REGION_SECTOR)?,
            read_table_file(&path(Y_FILE), TableLayout::REGION_SECTOR)?,
            read_table_file(&path(IMPACTS_F_FILE), TableLayout::STRESSOR)?,
            read_table_file(&path(IMPACTS_F_Y_FILE), TableLayout::STRESSOR)?,
            read_table_file(&path(SATELLITE_F_FILE), TableLayout::STRESSOR)?,
            read_table_file(&path(SATELLITE_F_Y_FILE), TableLayout::STRESSOR)?,
        )
    }

    fn validate(&self) -> EEIOResult<()> {
        let sectors = self.a.columns();
        self.a.rows().ensure_matches(sectors, "A rows vs A columns")?;
        self.y.rows().ensure_matches(sectors, "Y rows vs A columns")?;
        self.impacts
            .columns()
            .ensure_matches(sectors, "impacts F columns vs A columns")?;
        self.satellite
            .columns()
            .ensure_matches(sectors, "satellite F columns vs A columns")?;

        let demand = self.y.columns();
        self.impacts_y
            .columns()
            .ensure_matches(demand, "impacts F_Y columns vs Y columns")?;
        self.satellite_y
            .columns()
            .ensure_matches(demand, "satellite F_Y columns vs Y columns")?;

        self.impacts
            .rows()
            .ensure_matches(self.impacts_y.rows(), "impacts F rows vs F_Y rows")?;
        self.satellite
            .rows()
            .ensure_matches(self.satellite_y.rows(), "satellite F rows vs F_Y rows")?;
        Ok(())
    }
}

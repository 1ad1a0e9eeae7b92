//! Tabular batches of feature rows.
//!
//! A `Table` is the input of the prediction API: a rectangular, finite
//! `f64` matrix where each row is one sample. Tables are built from nested
//! vectors, JSON arrays, or delimited text files.
use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Array2<f64>,
}

impl Table {
    /// Build a table from row vectors. Rows must all have the width of the
    /// first row and every value must be finite.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());

        let mut data = Vec::with_capacity(nrows * ncols);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(Error::RaggedRow {
                    row: r,
                    expected: ncols,
                    found: row.len(),
                });
            }
            if let Some(c) = row.iter().position(|v| !v.is_finite()) {
                return Err(Error::NonFinite { row: r, col: c });
            }
            data.extend(row);
        }

        let rows = Array2::from_shape_vec((nrows, ncols), data).map_err(|e| {
            Error::InvalidDataset(format!("cannot shape {}x{} table: {}", nrows, ncols, e))
        })?;
        Ok(Table { rows })
    }

    /// Parse a JSON array of numeric arrays, e.g. `[[5.1, 3.5, 1.4, 0.2]]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<Vec<f64>> = serde_json::from_str(json)?;
        Table::from_rows(rows)
    }

    pub fn from_array(rows: Array2<f64>) -> Result<Self> {
        if let Some(((r, c), _)) = rows.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFinite { row: r, col: c });
        }
        Ok(Table { rows })
    }

    pub fn nrows(&self) -> usize {
        self.rows.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.rows.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.rows
    }

    /// Check that the table has exactly `expected` feature columns.
    ///
    /// An empty table carries no width information and always passes.
    pub fn check_width(&self, expected: usize) -> Result<()> {
        if !self.is_empty() && self.ncols() != expected {
            return Err(Error::FeatureCount {
                expected,
                found: self.ncols(),
            });
        }
        Ok(())
    }
}

/// Configuration for reading delimited feature files.
#[derive(Debug, Clone)]
pub struct TableReaderConfig {
    pub delimiter: u8,
    /// Skip the first line as a header row.
    pub has_headers: bool,
}

impl Default for TableReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

impl TableReaderConfig {
    /// Pick the delimiter from the file extension: tab for `.tsv`, comma otherwise.
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let is_tsv = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        Self {
            delimiter: if is_tsv { b'\t' } else { b',' },
            ..Self::default()
        }
    }
}

/// Read a delimited text file of numeric feature rows into a `Table`.
pub fn read_table_csv<P: AsRef<Path>>(path: P, config: &TableReaderConfig) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.has_headers)
        .trim(csv::Trim::All)
        .from_path(&path)?;

    let mut rows = Vec::new();
    for (r, record) in reader.records().enumerate() {
        let record = record?;
        let mut row = Vec::with_capacity(record.len());
        for (c, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().map_err(|_| {
                Error::InvalidDataset(format!(
                    "{}: row {}, column {}: '{}' is not a number",
                    path.as_ref().display(),
                    r,
                    c,
                    field
                ))
            })?;
            row.push(value);
        }
        rows.push(row);
    }

    log::debug!(
        "Read {} feature rows from {}",
        rows.len(),
        path.as_ref().display()
    );
    Table::from_rows(rows)
}

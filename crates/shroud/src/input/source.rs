//! Data source abstraction and metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ShroudError};

/// Metadata about the source data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// Represents parsed tabular data.
///
/// Every row has exactly one cell per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
}

impl DataTable {
    /// Create a new data table without checking row arity.
    pub(crate) fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    /// Build a table from in-memory records, rejecting ragged rows.
    ///
    /// # Example
    ///
    /// ```
    /// use shroud::DataTable;
    ///
    /// let table = DataTable::from_records(
    ///     ["age", "zipcode"],
    ///     vec![vec!["34", "81667"], vec!["45", "81675"]],
    /// )
    /// .unwrap();
    /// assert_eq!(table.row_count(), 2);
    /// assert_eq!(table.get(1, 1), Some("81675"));
    /// ```
    pub fn from_records<H, R, S>(headers: H, rows: Vec<R>) -> Result<Self>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        if headers.is_empty() {
            return Err(ShroudError::EmptyData("No columns found".to_string()));
        }

        let mut table_rows = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            let row: Vec<String> = row.into_iter().map(Into::into).collect();
            if row.len() != headers.len() {
                return Err(ShroudError::Parse {
                    row: row_idx + 1,
                    column: row.len().min(headers.len()) + 1,
                    message: format!(
                        "expected {} fields, found {}",
                        headers.len(),
                        row.len()
                    ),
                });
            }
            table_rows.push(row);
        }

        Ok(Self::new(headers, table_rows, b','))
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.column_values(index).collect())
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// SHA-256 over headers and cells, independent of the delimiter.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for line in std::iter::once(&self.headers).chain(self.rows.iter()) {
            for cell in line {
                hasher.update((cell.len() as u64).to_le_bytes());
                hasher.update(cell.as_bytes());
            }
            hasher.update([0xff]);
        }
        format!("sha256:{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_records_rejects_ragged_row() {
        let err = DataTable::from_records(["a", "b"], vec![vec!["1", "2"], vec!["3"]]).unwrap_err();
        assert!(matches!(err, ShroudError::Parse { row: 2, .. }));
    }

    #[test]
    fn test_from_records_rejects_no_columns() {
        let headers: Vec<String> = Vec::new();
        let rows: Vec<Vec<String>> = Vec::new();
        assert!(matches!(
            DataTable::from_records(headers, rows),
            Err(ShroudError::EmptyData(_))
        ));
    }

    #[test]
    fn test_fingerprint_distinguishes_cell_boundaries() {
        let a = DataTable::from_records(["x", "y"], vec![vec!["ab", "c"]]).unwrap();
        let b = DataTable::from_records(["x", "y"], vec![vec!["a", "bc"]]).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn test_column_by_name() {
        let table = DataTable::from_records(["x", "y"], vec![vec!["1", "2"], vec!["3", "4"]]).unwrap();
        assert_eq!(table.column_by_name("y"), Some(vec!["2", "4"]));
        assert_eq!(table.column_by_name("z"), None);
    }
}

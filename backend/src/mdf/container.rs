//! Abstract access to a multi-table Mask Description File.
//!
//! The on-disk container format is owned by an external reader; ingestion only
//! needs table presence, column names and kinds, row counts and typed scalar
//! cells, addressed by table name, column name and row index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Column data-kinds a container can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Integer,
    Float,
    Text,
    CharArray,
}

impl DataKind {
    /// Whether a column declared as `actual` satisfies an expectation of `self`.
    ///
    /// Floats accept integer columns (FITS writers narrow whole-number data).
    /// Text and character-array columns are interchangeable.
    pub fn accepts(self, actual: DataKind) -> bool {
        match self {
            DataKind::Integer => actual == DataKind::Integer,
            DataKind::Float => matches!(actual, DataKind::Float | DataKind::Integer),
            DataKind::Text | DataKind::CharArray => {
                matches!(actual, DataKind::Text | DataKind::CharArray)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Integer => "integer",
            DataKind::Float => "float",
            DataKind::Text => "text",
            DataKind::CharArray => "char array",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            CellValue::Null => "null".to_string(),
            CellValue::Integer(v) => format!("integer {}", v),
            CellValue::Float(v) => format!("float {}", v),
            CellValue::Text(s) => format!("text '{}'", s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<i32> for CellValue {
    fn from(v: i32) -> Self {
        CellValue::Integer(v.into())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Errors raised while opening or reading a container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("cannot open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed container '{path}': {message}")]
    Format { path: String, message: String },

    #[error("table {0} not present")]
    MissingTable(String),

    #[error("column {table}.{column} not present")]
    MissingColumn { table: String, column: String },

    #[error("row {row} out of range for table {table} ({count} rows)")]
    RowOutOfRange {
        table: String,
        row: usize,
        count: usize,
    },
}

/// Read access to an opened container. Tables and columns are addressed by
/// name; rows by zero-based index in file order.
pub trait MdfContainer: Send {
    /// Path or label the container was opened from.
    fn source(&self) -> &str;

    fn table_names(&self) -> Vec<String>;

    fn has_table(&self, table: &str) -> bool {
        self.table_names().iter().any(|t| t == table)
    }

    /// Column names of `table` in file order, `None` when the table is absent.
    fn column_names(&self, table: &str) -> Option<Vec<String>>;

    fn column_kind(&self, table: &str, column: &str) -> Option<DataKind>;

    /// Number of rows, zero when the table is absent.
    fn row_count(&self, table: &str) -> usize;

    fn value(&self, table: &str, column: &str, row: usize) -> Result<CellValue, ContainerError>;
}

impl<'c> dyn MdfContainer + 'c {
    /// Iterate the rows of `table` in file order.
    pub fn rows<'a>(&'a self, table: &'a str) -> Rows<'a, 'c> {
        Rows {
            container: self,
            table,
            next: 0,
            count: self.row_count(table),
        }
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.column_kind(table, column).is_some()
    }
}

/// Iterator over the rows of one table.
pub struct Rows<'a, 'c> {
    container: &'a (dyn MdfContainer + 'c),
    table: &'a str,
    next: usize,
    count: usize,
}

impl<'a, 'c> Iterator for Rows<'a, 'c> {
    type Item = RowView<'a, 'c>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(RowView {
            container: self.container,
            table: self.table,
            index,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

/// One row of a table.
#[derive(Clone, Copy)]
pub struct RowView<'a, 'c> {
    container: &'a (dyn MdfContainer + 'c),
    table: &'a str,
    index: usize,
}

impl<'a, 'c> RowView<'a, 'c> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &str {
        self.table
    }

    pub fn get(&self, column: &str) -> Result<CellValue, ContainerError> {
        self.container.value(self.table, column, self.index)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.container.has_column(self.table, column)
    }
}

/// Opens containers from paths.
pub trait ContainerReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn MdfContainer>, ContainerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_compatibility() {
        assert!(DataKind::Integer.accepts(DataKind::Integer));
        assert!(!DataKind::Integer.accepts(DataKind::Float));
        assert!(DataKind::Float.accepts(DataKind::Integer));
        assert!(DataKind::Float.accepts(DataKind::Float));
        assert!(!DataKind::Float.accepts(DataKind::Text));
        assert!(DataKind::Text.accepts(DataKind::CharArray));
        assert!(DataKind::CharArray.accepts(DataKind::Text));
        assert!(!DataKind::Text.accepts(DataKind::Integer));
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(CellValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(CellValue::Float(3.5).as_i64(), None);
        assert_eq!(CellValue::Integer(2).as_f64(), Some(2.0));
        assert_eq!(CellValue::Text("x".into()).as_f64(), None);
        assert_eq!(CellValue::from(None::<i64>), CellValue::Null);
        assert_eq!(CellValue::from("abc").describe(), "text 'abc'");
    }
}

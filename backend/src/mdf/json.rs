//! JSON export of an MDF.
//!
//! Layout:
//!
//! ```text
//! {
//!   "tables": {
//!     "MaskDesign": {
//!       "columns": [{"name": "DesId", "kind": "integer"}, ...],
//!       "rows": [[42, "my mask", ...], ...]
//!     },
//!     ...
//!   }
//! }
//! ```
//!
//! Cells are JSON numbers, strings or `null`. Integral numbers are read as
//! integers, anything else as floats.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::container::{CellValue, ContainerError, ContainerReader, DataKind, MdfContainer};
use super::memory::{MemoryContainer, MemoryTable};

#[derive(Debug, Serialize, Deserialize)]
struct JsonMdf {
    tables: BTreeMap<String, JsonTable>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonTable {
    columns: Vec<JsonColumn>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonColumn {
    name: String,
    kind: DataKind,
}

/// Reads JSON-exported MDFs into a [`MemoryContainer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContainerReader;

impl JsonContainerReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON document. `source` labels the result and its errors.
    pub fn parse_str(source: &str, text: &str) -> Result<MemoryContainer, ContainerError> {
        let format_err = |message: String| ContainerError::Format {
            path: source.to_string(),
            message,
        };

        let doc: JsonMdf = serde_json::from_str(text).map_err(|e| format_err(e.to_string()))?;

        let mut container = MemoryContainer::new(source);
        for (name, table) in doc.tables {
            let mut mem = MemoryTable::new(name.clone());
            for col in &table.columns {
                mem.add_column(col.name.clone(), col.kind);
            }
            for (idx, row) in table.rows.into_iter().enumerate() {
                if row.len() != table.columns.len() {
                    return Err(format_err(format!(
                        "table {} row {} has {} cells, expected {}",
                        name,
                        idx,
                        row.len(),
                        table.columns.len()
                    )));
                }
                let cells = row
                    .into_iter()
                    .map(|v| {
                        json_to_cell(v)
                            .map_err(|m| format_err(format!("table {} row {}: {}", name, idx, m)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                mem.push_row(cells);
            }
            container.insert_table(mem);
        }
        Ok(container)
    }

    /// Serialize any container to the JSON layout this reader accepts.
    pub fn to_json(container: &dyn MdfContainer) -> Result<String, ContainerError> {
        let mut tables = BTreeMap::new();
        for name in container.table_names() {
            let column_names = container.column_names(&name).unwrap_or_default();
            let columns = column_names
                .iter()
                .map(|c| JsonColumn {
                    name: c.clone(),
                    kind: container.column_kind(&name, c).unwrap_or(DataKind::Text),
                })
                .collect();
            let mut rows = Vec::with_capacity(container.row_count(&name));
            for row in 0..container.row_count(&name) {
                let cells = column_names
                    .iter()
                    .map(|c| container.value(&name, c, row).map(cell_to_json))
                    .collect::<Result<Vec<_>, _>>()?;
                rows.push(cells);
            }
            tables.insert(name, JsonTable { columns, rows });
        }
        serde_json::to_string_pretty(&JsonMdf { tables }).map_err(|e| ContainerError::Format {
            path: container.source().to_string(),
            message: e.to_string(),
        })
    }
}

impl ContainerReader for JsonContainerReader {
    fn open(&self, path: &Path) -> Result<Box<dyn MdfContainer>, ContainerError> {
        let label = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ContainerError::Io {
            path: label.clone(),
            source,
        })?;
        let container = Self::parse_str(&label, &text)?;
        log::debug!(
            "Opened JSON MDF {} with {} tables",
            label,
            container.tables().len()
        );
        Ok(Box::new(container))
    }
}

fn json_to_cell(value: Value) -> Result<CellValue, String> {
    match value {
        Value::Null => Ok(CellValue::Null),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(CellValue::Integer(i))
            } else {
                n.as_f64()
                    .map(CellValue::Float)
                    .ok_or_else(|| format!("number {} out of range", n))
            }
        }
        Value::String(s) => Ok(CellValue::Text(s)),
        other => Err(format!("unsupported cell value {}", other)),
    }
}

fn cell_to_json(cell: CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Integer(i) => Value::from(i),
        CellValue::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Text(s) => Value::String(s),
    }
}

//! In-memory container, used by the JSON reader and by tests.

use super::container::{CellValue, ContainerError, DataKind, MdfContainer};

/// One table held in memory. Rows are stored column-aligned with `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTable {
    pub name: String,
    columns: Vec<(String, DataKind)>,
    rows: Vec<Vec<CellValue>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Add a column. Existing rows get a null cell.
    pub fn column(mut self, name: impl Into<String>, kind: DataKind) -> Self {
        self.add_column(name, kind);
        self
    }

    /// Append a row. Short rows are padded with nulls, long rows truncated.
    pub fn row(mut self, cells: Vec<CellValue>) -> Self {
        self.push_row(cells);
        self
    }

    pub fn add_column(&mut self, name: impl Into<String>, kind: DataKind) {
        self.columns.push((name.into(), kind));
        for row in &mut self.rows {
            row.push(CellValue::Null);
        }
    }

    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(cells);
    }

    pub fn remove_row(&mut self, index: usize) -> Option<Vec<CellValue>> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn remove_column(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.columns.remove(idx);
                for row in &mut self.rows {
                    row.remove(idx);
                }
                true
            }
            None => false,
        }
    }

    /// Change the declared kind of a column without touching its cells.
    pub fn retype_column(&mut self, name: &str, kind: DataKind) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.columns[idx].1 = kind;
                true
            }
            None => false,
        }
    }

    /// Overwrite one cell. Returns false when the row or column is unknown.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<CellValue>) -> bool {
        let Some(idx) = self.position(column) else {
            return false;
        };
        match self.rows.get_mut(row) {
            Some(cells) => {
                cells[idx] = value.into();
                true
            }
            None => false,
        }
    }

    /// Overwrite a column in every row.
    pub fn set_all(&mut self, column: &str, value: impl Into<CellValue>) {
        let value = value.into();
        if let Some(idx) = self.position(column) {
            for row in &mut self.rows {
                row[idx] = value.clone();
            }
        }
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.position(column)?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    pub fn columns(&self) -> &[(String, DataKind)] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|(c, _)| c == column)
    }
}

/// A container whose tables live in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContainer {
    source: String,
    tables: Vec<MemoryTable>,
}

impl MemoryContainer {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tables: Vec::new(),
        }
    }

    /// Add or replace a table.
    pub fn with_table(mut self, table: MemoryTable) -> Self {
        self.insert_table(table);
        self
    }

    pub fn insert_table(&mut self, table: MemoryTable) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn remove_table(&mut self, name: &str) -> Option<MemoryTable> {
        let idx = self.tables.iter().position(|t| t.name == name)?;
        Some(self.tables.remove(idx))
    }

    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut MemoryTable> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[MemoryTable] {
        &self.tables
    }
}

impl MdfContainer for MemoryContainer {
    fn source(&self) -> &str {
        &self.source
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn has_table(&self, table: &str) -> bool {
        self.table(table).is_some()
    }

    fn column_names(&self, table: &str) -> Option<Vec<String>> {
        self.table(table)
            .map(|t| t.columns.iter().map(|(name, _)| name.clone()).collect())
    }

    fn column_kind(&self, table: &str, column: &str) -> Option<DataKind> {
        self.table(table)?
            .columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, kind)| *kind)
    }

    fn row_count(&self, table: &str) -> usize {
        self.table(table).map_or(0, MemoryTable::len)
    }

    fn value(&self, table: &str, column: &str, row: usize) -> Result<CellValue, ContainerError> {
        let t = self
            .table(table)
            .ok_or_else(|| ContainerError::MissingTable(table.to_string()))?;
        let idx = t
            .position(column)
            .ok_or_else(|| ContainerError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?;
        t.rows
            .get(row)
            .map(|cells| cells[idx].clone())
            .ok_or(ContainerError::RowOutOfRange {
                table: table.to_string(),
                row,
                count: t.rows.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_files() -> MemoryTable {
        MemoryTable::new("CatFiles")
            .column("CatFilePK", DataKind::Integer)
            .column("CatFileName", DataKind::Text)
            .row(vec![1.into(), "a.cat".into()])
            .row(vec![2.into(), "b.cat".into()])
    }

    #[test]
    fn test_lookup_and_iteration() {
        let container = MemoryContainer::new("mem").with_table(cat_files());
        let dyn_container: &dyn MdfContainer = &container;

        assert!(dyn_container.has_table("CatFiles"));
        assert!(!dyn_container.has_table("ObjectCat"));
        assert_eq!(dyn_container.row_count("CatFiles"), 2);
        assert_eq!(dyn_container.row_count("ObjectCat"), 0);
        assert_eq!(
            dyn_container.column_kind("CatFiles", "CatFileName"),
            Some(DataKind::Text)
        );

        let names: Vec<String> = dyn_container
            .rows("CatFiles")
            .map(|r| r.get("CatFileName").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.cat", "b.cat"]);
    }

    #[test]
    fn test_value_errors() {
        let container = MemoryContainer::new("mem").with_table(cat_files());
        assert!(matches!(
            container.value("Nope", "x", 0),
            Err(ContainerError::MissingTable(_))
        ));
        assert!(matches!(
            container.value("CatFiles", "x", 0),
            Err(ContainerError::MissingColumn { .. })
        ));
        assert!(matches!(
            container.value("CatFiles", "CatFilePK", 5),
            Err(ContainerError::RowOutOfRange { count: 2, .. })
        ));
    }

    #[test]
    fn test_mutation_helpers() {
        let mut table = cat_files();
        assert!(table.set(1, "CatFileName", "c.cat"));
        assert!(!table.set(9, "CatFileName", "c.cat"));
        assert_eq!(table.get(1, "CatFileName"), Some(&CellValue::from("c.cat")));

        table.add_column("Extra", DataKind::Float);
        assert_eq!(table.get(0, "Extra"), Some(&CellValue::Null));
        assert!(table.remove_column("Extra"));
        assert_eq!(table.columns().len(), 2);

        table.set_all("CatFilePK", 7);
        assert_eq!(table.get(0, "CatFilePK"), Some(&CellValue::Integer(7)));
        assert!(table.remove_row(0).is_some());
        assert_eq!(table.len(), 1);
    }
}

//! Structural validation: are the expected tables and columns present with
//! compatible data-kinds?

use log::info;

use crate::mdf::container::MdfContainer;
use crate::mdf::schema::{self, TABLES};

/// Outcome of the structural check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralReport {
    /// Blocking problems.
    pub defects: Vec<String>,
    /// Columns or tables the schema does not know about. Never blocking.
    pub surprises: Vec<String>,
}

impl StructuralReport {
    pub fn is_valid(&self) -> bool {
        self.defects.is_empty()
    }
}

/// Check `container` against the schema descriptor.
///
/// Missing required tables are reported on their own: column checks are
/// skipped when any required table is absent. Otherwise every present known
/// table has its columns checked and all defects are collected.
pub fn validate_structure(container: &dyn MdfContainer) -> StructuralReport {
    let mut report = StructuralReport::default();

    for table in schema::required_tables() {
        if !container.has_table(table.name) {
            report
                .defects
                .push(format!("missing required table {}", table.name));
        }
    }
    if !report.defects.is_empty() {
        return report;
    }

    for name in container.table_names() {
        if schema::table(&name).is_none() {
            let msg = format!("unexpected table {}", name);
            info!("{}: {}", container.source(), msg);
            report.surprises.push(msg);
        }
    }

    for table in TABLES.iter().filter(|t| !t.is_opaque()) {
        if !container.has_table(table.name) {
            continue;
        }

        for col in table.columns {
            match container.column_kind(table.name, col.name) {
                None if col.required => report.defects.push(format!(
                    "{}: missing required column {}",
                    table.name, col.name
                )),
                None => {}
                Some(actual) if !col.kind.accepts(actual) => report.defects.push(format!(
                    "{}.{}: expected {} column, found {}",
                    table.name, col.name, col.kind, actual
                )),
                Some(_) => {}
            }
        }

        for col in container.column_names(table.name).unwrap_or_default() {
            if table.column(&col).is_none() {
                let msg = format!("{}: unexpected column {}", table.name, col);
                info!("{}: {}", container.source(), msg);
                report.surprises.push(msg);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdf::container::DataKind;
    use crate::mdf::sample::SampleMdf;
    use crate::mdf::schema::{BLU_SLITS, CAT_FILES, DESI_SLITS, MASK_BLU, OBJECT_CAT};
    use crate::mdf::MemoryTable;

    #[test]
    fn test_sample_is_structurally_valid() {
        let c = SampleMdf::new().build();
        let report = validate_structure(&c);
        assert!(report.is_valid(), "{:?}", report.defects);
        assert!(report.surprises.is_empty());
    }

    #[test]
    fn test_missing_tables_short_circuit_column_checks() {
        let mut c = SampleMdf::new().build();
        c.remove_table(CAT_FILES);
        c.remove_table(BLU_SLITS);
        c.table_mut(MASK_BLU).unwrap().remove_column("guiname");

        let report = validate_structure(&c);
        assert_eq!(
            report.defects,
            vec![
                "missing required table BluSlits".to_string(),
                "missing required table CatFiles".to_string(),
            ]
        );
    }

    #[test]
    fn test_column_defects_are_all_collected() {
        let mut c = SampleMdf::new().build();
        c.table_mut(MASK_BLU).unwrap().remove_column("guiname");
        c.table_mut(DESI_SLITS)
            .unwrap()
            .retype_column("SlitLen", DataKind::Text);
        c.table_mut(OBJECT_CAT).unwrap().remove_column("PM_RA");

        let report = validate_structure(&c);
        assert_eq!(report.defects.len(), 2, "{:?}", report.defects);
        assert!(report
            .defects
            .contains(&"MaskBlu: missing required column guiname".to_string()));
        assert!(report
            .defects
            .contains(&"DesiSlits.SlitLen: expected float column, found text".to_string()));
    }

    #[test]
    fn test_compatible_kinds_accepted() {
        let mut c = SampleMdf::new().build();
        c.table_mut(BLU_SLITS)
            .unwrap()
            .retype_column("slitX1", DataKind::Integer);
        c.table_mut(DESI_SLITS)
            .unwrap()
            .retype_column("SlitTyp", DataKind::Text);
        assert!(validate_structure(&c).is_valid());
    }

    #[test]
    fn test_extra_columns_and_tables_are_surprises() {
        let mut c = SampleMdf::new().build();
        c.table_mut(MASK_BLU)
            .unwrap()
            .add_column("Comment", DataKind::Text);
        c.insert_table(MemoryTable::new("RDBmap").column("whatever", DataKind::Integer));
        c.insert_table(MemoryTable::new("Scratch"));

        let report = validate_structure(&c);
        assert!(report.is_valid());
        assert_eq!(
            report.surprises,
            vec![
                "unexpected table Scratch".to_string(),
                "MaskBlu: unexpected column Comment".to_string(),
            ]
        );
    }
}

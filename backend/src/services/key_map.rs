//! File-local key to datastore key translation for one ingestion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::{BlueprintId, DesignId, DesignSlitId, ObjectId};
use crate::db::models::StoreTable;

/// Keys assigned by the datastore during one ingestion, indexed by the table
/// they were inserted into and the key the file used for the row.
///
/// Mapping rows and satellite records have no file-local key of their own;
/// they are recorded under their zero-based row index in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    entries: BTreeMap<StoreTable, BTreeMap<i64, i64>>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `assigned` for `local`. Returns the key previously recorded.
    pub fn record(&mut self, table: StoreTable, local: i64, assigned: i64) -> Option<i64> {
        self.entries.entry(table).or_default().insert(local, assigned)
    }

    pub fn get(&self, table: StoreTable, local: i64) -> Option<i64> {
        self.entries.get(&table)?.get(&local).copied()
    }

    pub fn contains(&self, table: StoreTable, local: i64) -> bool {
        self.get(table, local).is_some()
    }

    /// Number of keys recorded for `table`.
    pub fn len_for(&self, table: StoreTable) -> usize {
        self.entries.get(&table).map_or(0, BTreeMap::len)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(file-local, assigned)` pairs of `table`, ordered by file-local key.
    pub fn entries(&self, table: StoreTable) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.entries
            .get(&table)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (*k, *v)))
    }

    pub fn design(&self, local: i64) -> Option<DesignId> {
        self.get(StoreTable::MaskDesign, local).map(DesignId)
    }

    pub fn blueprint(&self, local: i64) -> Option<BlueprintId> {
        self.get(StoreTable::MaskBlueprint, local).map(BlueprintId)
    }

    pub fn design_slit(&self, local: i64) -> Option<DesignSlitId> {
        self.get(StoreTable::DesignSlit, local).map(DesignSlitId)
    }

    pub fn object(&self, local: i64) -> Option<ObjectId> {
        self.get(StoreTable::TargetObject, local).map(ObjectId)
    }

    /// The single design created by the ingestion.
    pub fn design_id(&self) -> Option<DesignId> {
        self.entries(StoreTable::MaskDesign)
            .next()
            .map(|(_, v)| DesignId(v))
    }

    /// Every blueprint created by the ingestion.
    pub fn blueprint_ids(&self) -> Vec<BlueprintId> {
        self.entries(StoreTable::MaskBlueprint)
            .map(|(_, v)| BlueprintId(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut map = KeyMap::new();
        assert!(map.is_empty());
        assert_eq!(map.record(StoreTable::MaskDesign, 42, 1), None);
        map.record(StoreTable::MaskBlueprint, 7, 3);
        map.record(StoreTable::DesignSlit, 1, 10);
        map.record(StoreTable::DesignSlit, 2, 11);

        assert_eq!(map.design(42), Some(DesignId(1)));
        assert_eq!(map.design_slit(2), Some(DesignSlitId(11)));
        assert_eq!(map.object(2), None);
        assert_eq!(map.len_for(StoreTable::DesignSlit), 2);
        assert_eq!(map.len(), 4);
        assert_eq!(map.design_id(), Some(DesignId(1)));
        assert_eq!(map.blueprint_ids(), vec![BlueprintId(3)]);
    }

    #[test]
    fn test_tables_are_separate_namespaces() {
        let mut map = KeyMap::new();
        map.record(StoreTable::DesignSlit, 5, 100);
        map.record(StoreTable::TargetObject, 5, 200);
        assert_eq!(map.get(StoreTable::DesignSlit, 5), Some(100));
        assert_eq!(map.get(StoreTable::TargetObject, 5), Some(200));
        assert_eq!(map.record(StoreTable::DesignSlit, 5, 101), Some(100));
    }
}

//! Public identifier types shared by the ingestion pipeline and the datastore.
//!
//! Every entity table in the mask database has a datastore-assigned surrogate
//! key. These newtypes keep keys of different tables from being mixed up when
//! they flow through the key map and the insert records.

use crate::define_key_type;

define_key_type!(DesignId, "mask_designs");
define_key_type!(BlueprintId, "mask_blueprints");
define_key_type!(DesignSlitId, "design_slits");
define_key_type!(BlueprintSlitId, "blueprint_slits");
define_key_type!(ObjectId, "target_objects");
define_key_type!(SlitObjectId, "slit_object_map");
define_key_type!(ObserverId, "observers");

/// Correlation id attached to every log line of one ingestion call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IngestionId(pub uuid::Uuid);

impl IngestionId {
    pub fn new() -> Self {
        IngestionId(uuid::Uuid::new_v4())
    }
}

impl Default for IngestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IngestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Records exchanged with the mask repository.
//!
//! `New*` structs are what the ingestion pipeline inserts: file-local keys have
//! already been replaced by datastore keys. `*Record` structs are read back by
//! downstream tooling (mill-file generation, bad-slit marking).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{BlueprintId, BlueprintSlitId, DesignId, DesignSlitId, ObjectId, ObserverId};
use crate::models::{MillStatus, SlitType};

/// Datastore tables written by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreTable {
    MaskDesign,
    MaskBlueprint,
    DesignSlit,
    BlueprintSlit,
    TargetObject,
    ExtendedObject,
    NearbyObject,
    SlitObjectMapping,
}

impl StoreTable {
    pub const ALL: [StoreTable; 8] = [
        StoreTable::MaskDesign,
        StoreTable::MaskBlueprint,
        StoreTable::DesignSlit,
        StoreTable::BlueprintSlit,
        StoreTable::TargetObject,
        StoreTable::ExtendedObject,
        StoreTable::NearbyObject,
        StoreTable::SlitObjectMapping,
    ];

    /// SQL table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            StoreTable::MaskDesign => "mask_designs",
            StoreTable::MaskBlueprint => "mask_blueprints",
            StoreTable::DesignSlit => "design_slits",
            StoreTable::BlueprintSlit => "blueprint_slits",
            StoreTable::TargetObject => "target_objects",
            StoreTable::ExtendedObject => "extended_objects",
            StoreTable::NearbyObject => "nearby_objects",
            StoreTable::SlitObjectMapping => "slit_object_map",
        }
    }
}

impl fmt::Display for StoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaskDesign {
    pub name: String,
    pub author: ObserverId,
    pub creator: Option<String>,
    pub design_date: String,
    pub declared_slits: i32,
    pub declared_objects: i32,
    pub project_name: Option<String>,
    pub instrument: String,
    pub mask_type: Option<String>,
    pub ra_pnt: f64,
    pub dec_pnt: f64,
    pub radepnt: Option<String>,
    pub equinox: f64,
    pub pa_pnt: f64,
    pub date_pnt: NaiveDate,
    pub lst_pnt: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaskBlueprint {
    pub design_id: DesignId,
    pub name: String,
    /// Display name after the uniqueness probe.
    pub gui_name: String,
    pub observer: ObserverId,
    pub creator: Option<String>,
    pub blueprint_date: Option<String>,
    pub lst_use: Option<f64>,
    pub date_use: NaiveDate,
    pub telescope: String,
    pub refr_alg: Option<String>,
    pub atm_temp_c: Option<f64>,
    pub atm_pressure: Option<f64>,
    pub atm_humidity: Option<f64>,
    pub atm_lapse_rate: Option<f64>,
    pub ref_wavelength: Option<f64>,
    pub dist_method: Option<String>,
    pub status: MillStatus,
    pub millseq: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDesignSlit {
    pub design_id: DesignId,
    pub slit_ra: f64,
    pub slit_dec: f64,
    pub slit_type: SlitType,
    pub slit_length: f64,
    pub slit_length_pa: f64,
    pub slit_width: f64,
    pub slit_width_pa: f64,
    pub slit_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlueprintSlit {
    pub blueprint_id: BlueprintId,
    pub design_slit_id: DesignSlitId,
    pub corners: [(f64, f64); 4],
    pub bad: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTargetObject {
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub radesys: Option<String>,
    pub equinox: f64,
    pub mjd_obs: Option<f64>,
    pub magnitude: Option<f64>,
    pub pass_band: Option<String>,
    pub radial_velocity: Option<f64>,
    pub class: String,
    /// Name of the catalog file the object was drawn from.
    pub catalog_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExtendedObject {
    pub object_id: ObjectId,
    pub major_axis: Option<f64>,
    pub major_axis_pa: Option<f64>,
    pub minor_axis: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNearbyObject {
    pub object_id: ObjectId,
    pub pm_ra: Option<f64>,
    pub pm_dec: Option<f64>,
    pub parallax: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSlitObjectMapping {
    pub design_id: DesignId,
    pub object_id: ObjectId,
    pub design_slit_id: DesignSlitId,
    pub top_dist: f64,
    pub bot_dist: f64,
}

/// Stored blueprint, as downstream mill tooling sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintRecord {
    pub id: BlueprintId,
    pub design_id: DesignId,
    pub name: String,
    pub gui_name: String,
    pub observer: ObserverId,
    pub telescope: String,
    pub date_use: NaiveDate,
    pub status: MillStatus,
    pub millseq: Option<String>,
}

/// Stored blueprint slit with its mill geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSlitRecord {
    pub id: BlueprintSlitId,
    pub blueprint_id: BlueprintId,
    pub design_slit_id: DesignSlitId,
    pub corners: [(f64, f64); 4],
    pub bad: bool,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub designs: u64,
    pub blueprints: u64,
    pub design_slits: u64,
    pub blueprint_slits: u64,
    pub objects: u64,
    pub extended_objects: u64,
    pub nearby_objects: u64,
    pub slit_object_maps: u64,
}

impl TableCounts {
    pub fn get(&self, table: StoreTable) -> u64 {
        match table {
            StoreTable::MaskDesign => self.designs,
            StoreTable::MaskBlueprint => self.blueprints,
            StoreTable::DesignSlit => self.design_slits,
            StoreTable::BlueprintSlit => self.blueprint_slits,
            StoreTable::TargetObject => self.objects,
            StoreTable::ExtendedObject => self.extended_objects,
            StoreTable::NearbyObject => self.nearby_objects,
            StoreTable::SlitObjectMapping => self.slit_object_maps,
        }
    }

    pub fn total(&self) -> u64 {
        StoreTable::ALL.iter().map(|t| self.get(*t)).sum()
    }
}

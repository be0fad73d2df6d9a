//! Typed records for the tables of a Mask Description File.
//!
//! Every row of a file table is parsed once into one of these structs by
//! [`crate::mdf::loader`]. Field names follow the datastore's naming rather
//! than the FITS column spelling; the column each field comes from is noted
//! where the mapping is not obvious.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An optional numeric field where the producer writes `0` to mean "not given".
///
/// The raw value is kept so it can be reported or stored, but downstream
/// decisions look at [`Supplied::is_present`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Supplied {
    pub value: f64,
    present: bool,
}

impl Supplied {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            present: value != 0.0 && value.is_finite(),
        }
    }

    pub fn absent() -> Self {
        Self::new(0.0)
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// The value when present, `None` otherwise.
    pub fn get(&self) -> Option<f64> {
        self.present.then_some(self.value)
    }
}

impl Default for Supplied {
    fn default() -> Self {
        Self::absent()
    }
}

impl From<Option<f64>> for Supplied {
    fn from(v: Option<f64>) -> Self {
        v.map(Supplied::new).unwrap_or_default()
    }
}

/// Single-letter slit type code (`SlitTyp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlitType {
    /// `P`
    Program,
    /// `A`
    Alignment,
    /// `C`
    CircularHole,
    /// `L`
    LineSegment,
    /// `G`
    Ghost,
}

impl SlitType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "P" => Some(Self::Program),
            "A" => Some(Self::Alignment),
            "C" => Some(Self::CircularHole),
            "L" => Some(Self::LineSegment),
            "G" => Some(Self::Ghost),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Program => "P",
            Self::Alignment => "A",
            Self::CircularHole => "C",
            Self::LineSegment => "L",
            Self::Ghost => "G",
        }
    }
}

impl fmt::Display for SlitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Object-class tag (`ObjClass`). Only the guide-star distinction matters to
/// ingestion; the raw tag is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectClass(pub String);

impl ObjectClass {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Guide stars steer the telescope and are never placed in a slit.
    pub fn is_guide_star(&self) -> bool {
        self.0
            .trim()
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("guide"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Milling status of a blueprint. Ingestion always writes `Unmilled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum MillStatus {
    Unmilled = 0,
    Floppy = 1,
    ReadyMilled = 2,
    Archived = 3,
}

impl MillStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Unmilled),
            1 => Some(Self::Floppy),
            2 => Some(Self::ReadyMilled),
            3 => Some(Self::Archived),
            _ => None,
        }
    }

    /// Archived blueprints no longer hold on to their display name.
    pub fn is_live(self) -> bool {
        self != Self::Archived
    }
}

/// `MaskDesign` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRow {
    pub des_id: i64,
    pub des_name: String,
    /// Author mailbox, e.g. `Jane Doe <jane@example.org>`.
    pub des_author: String,
    pub des_creator: Option<String>,
    pub des_date: String,
    pub declared_slits: i64,
    pub declared_objects: i64,
    pub project_name: Option<String>,
    pub instrument: String,
    pub mask_type: Option<String>,
    pub ra_pnt: f64,
    pub dec_pnt: f64,
    pub radepnt: Option<String>,
    pub equinox_pnt: f64,
    pub pa_pnt: f64,
    /// Pointing date (`DATE_PNT`), free text.
    pub date_pnt: String,
    pub lst_pnt: Option<f64>,
}

/// `MaskBlu` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintRow {
    pub blu_id: i64,
    pub des_id: i64,
    pub blu_name: String,
    /// Display name as submitted (`guiname`).
    pub gui_name: String,
    /// Observer mailbox.
    pub blu_observer: String,
    pub blu_creator: Option<String>,
    pub blu_date: Option<String>,
    pub lst_use: Option<f64>,
    /// Intended use date (`Date_Use`), free text.
    pub date_use: String,
    pub telescope: String,
    pub refr_alg: Option<String>,
    pub atm_temp_c: Option<f64>,
    pub atm_pressure: Option<f64>,
    pub atm_humidity: Option<f64>,
    pub atm_lapse_rate: Option<f64>,
    pub ref_wavelength: Option<f64>,
    pub dist_method: Option<String>,
}

/// `DesiSlits` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSlitRow {
    pub dslit_id: i64,
    pub des_id: i64,
    pub slit_ra: f64,
    pub slit_dec: f64,
    pub slit_type: SlitType,
    pub slit_length: f64,
    pub slit_length_pa: f64,
    pub slit_width: f64,
    pub slit_width_pa: f64,
    pub slit_name: Option<String>,
}

/// `BluSlits` row. Corners are in mill-space, in file order 1..4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSlitRow {
    pub bslit_id: i64,
    pub blu_id: i64,
    pub dslit_id: i64,
    pub corners: [(f64, f64); 4],
}

/// `ObjectCat` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRow {
    pub object_id: i64,
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub radesys: Option<String>,
    pub equinox: f64,
    pub mjd_obs: Supplied,
    pub magnitude: Supplied,
    pub pass_band: Option<String>,
    pub radial_velocity: Supplied,
    pub major_axis: Supplied,
    pub major_axis_pa: Supplied,
    pub minor_axis: Supplied,
    pub pm_ra: Supplied,
    pub pm_dec: Supplied,
    pub parallax: Supplied,
    pub class: ObjectClass,
    pub cat_file_pk: i64,
}

impl ObjectRow {
    /// Shape satellite is stored when a position angle or minor axis is given.
    pub fn has_extended_shape(&self) -> bool {
        self.major_axis_pa.is_present() || self.minor_axis.is_present()
    }

    /// Proper-motion satellite is stored when any motion or parallax is given.
    pub fn has_proper_motion(&self) -> bool {
        self.pm_ra.is_present() || self.pm_dec.is_present() || self.parallax.is_present()
    }
}

/// `CatFiles` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFileRow {
    pub cat_file_pk: i64,
    pub file_name: String,
}

/// `SlitObjMap` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlitObjectRow {
    pub des_id: i64,
    pub object_id: i64,
    pub dslit_id: i64,
    pub top_dist: f64,
    pub bot_dist: f64,
}

/// All typed rows of one file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskFile {
    pub source: String,
    pub designs: Vec<DesignRow>,
    pub blueprints: Vec<BlueprintRow>,
    pub design_slits: Vec<DesignSlitRow>,
    pub blueprint_slits: Vec<BlueprintSlitRow>,
    pub objects: Vec<ObjectRow>,
    pub catalog_files: Vec<CatalogFileRow>,
    pub slit_objects: Vec<SlitObjectRow>,
}

impl MaskFile {
    /// The design this file describes. Extra rows are ignored.
    pub fn design(&self) -> Option<&DesignRow> {
        self.designs.first()
    }

    /// The blueprint this file describes. Extra rows are ignored.
    pub fn blueprint(&self) -> Option<&BlueprintRow> {
        self.blueprints.first()
    }
}

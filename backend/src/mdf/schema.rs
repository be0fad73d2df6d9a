//! Static description of the tables and columns an MDF is expected to carry.

use super::container::DataKind;
use super::container::DataKind::{CharArray, Float, Integer, Text};

/// Expected column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: DataKind,
    pub required: bool,
}

/// Expected table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub required: bool,
    /// Empty for tables whose content ingestion never reads.
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Tables with no column list are carried through without inspection.
    pub fn is_opaque(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &'static ColumnSpec> {
        self.columns.iter().filter(|c| c.required)
    }
}

pub const MASK_DESIGN: &str = "MaskDesign";
pub const MASK_BLU: &str = "MaskBlu";
pub const DESI_SLITS: &str = "DesiSlits";
pub const BLU_SLITS: &str = "BluSlits";
pub const OBJECT_CAT: &str = "ObjectCat";
pub const CAT_FILES: &str = "CatFiles";
pub const SLIT_OBJ_MAP: &str = "SlitObjMap";
pub const RDB_MAP: &str = "RDBmap";

const fn req(name: &'static str, kind: DataKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: DataKind) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required: false,
    }
}

const MASK_DESIGN_COLUMNS: &[ColumnSpec] = &[
    req("DesId", Integer),
    req("DesName", Text),
    req("DesAuth", Text),
    opt("DesCreat", Text),
    req("DesDate", Text),
    req("DesNslit", Integer),
    req("DesNobj", Integer),
    opt("ProjName", Text),
    req("INSTRUME", Text),
    opt("MaskType", Text),
    req("RA_PNT", Float),
    req("DEC_PNT", Float),
    opt("RADEPNT", Text),
    req("EQUINPNT", Float),
    req("PA_PNT", Float),
    req("DATE_PNT", Text),
    opt("LST_PNT", Float),
];

const MASK_BLU_COLUMNS: &[ColumnSpec] = &[
    req("BluId", Integer),
    req("DesId", Integer),
    req("BluName", Text),
    req("guiname", Text),
    req("BluObsvr", Text),
    opt("BluCreat", Text),
    opt("BluDate", Text),
    opt("LST_Use", Float),
    req("Date_Use", Text),
    req("TELESCOP", Text),
    opt("RefrAlg", Text),
    opt("AtmTempC", Float),
    opt("AtmPres", Float),
    opt("AtmHumid", Float),
    opt("AtmTTLap", Float),
    opt("RefWave", Float),
    opt("DistMeth", Text),
];

const DESI_SLITS_COLUMNS: &[ColumnSpec] = &[
    req("dSlitId", Integer),
    req("DesId", Integer),
    req("SlitRA", Float),
    req("SlitDec", Float),
    req("SlitTyp", CharArray),
    req("SlitLen", Float),
    req("SlitLPA", Float),
    req("SlitWid", Float),
    req("SlitWPA", Float),
    opt("SlitName", Text),
];

const BLU_SLITS_COLUMNS: &[ColumnSpec] = &[
    req("bSlitId", Integer),
    req("BluId", Integer),
    req("dSlitId", Integer),
    req("slitX1", Float),
    req("slitY1", Float),
    req("slitX2", Float),
    req("slitY2", Float),
    req("slitX3", Float),
    req("slitY3", Float),
    req("slitX4", Float),
    req("slitY4", Float),
];

const OBJECT_CAT_COLUMNS: &[ColumnSpec] = &[
    req("ObjectId", Integer),
    req("OBJECT", Text),
    req("RA_OBJ", Float),
    req("DEC_OBJ", Float),
    opt("RADESYS", Text),
    req("EQUINOX", Float),
    opt("MJD-OBS", Float),
    opt("mag", Float),
    opt("pBand", Text),
    opt("RadVel", Float),
    opt("MajAxis", Float),
    opt("MajAxPA", Float),
    opt("MinAxis", Float),
    opt("PM_RA", Float),
    opt("PM_Dec", Float),
    opt("Parallax", Float),
    req("ObjClass", Text),
    req("CatFilePK", Integer),
];

const CAT_FILES_COLUMNS: &[ColumnSpec] = &[req("CatFilePK", Integer), req("CatFileName", Text)];

const SLIT_OBJ_MAP_COLUMNS: &[ColumnSpec] = &[
    req("DesId", Integer),
    req("ObjectId", Integer),
    req("dSlitId", Integer),
    req("TopDist", Float),
    req("BotDist", Float),
];

/// Every table ingestion knows about, in insertion-relevant order.
pub static TABLES: &[TableSpec] = &[
    TableSpec {
        name: MASK_DESIGN,
        required: true,
        columns: MASK_DESIGN_COLUMNS,
    },
    TableSpec {
        name: MASK_BLU,
        required: true,
        columns: MASK_BLU_COLUMNS,
    },
    TableSpec {
        name: DESI_SLITS,
        required: true,
        columns: DESI_SLITS_COLUMNS,
    },
    TableSpec {
        name: BLU_SLITS,
        required: true,
        columns: BLU_SLITS_COLUMNS,
    },
    TableSpec {
        name: OBJECT_CAT,
        required: true,
        columns: OBJECT_CAT_COLUMNS,
    },
    TableSpec {
        name: CAT_FILES,
        required: true,
        columns: CAT_FILES_COLUMNS,
    },
    TableSpec {
        name: SLIT_OBJ_MAP,
        required: true,
        columns: SLIT_OBJ_MAP_COLUMNS,
    },
    TableSpec {
        name: RDB_MAP,
        required: false,
        columns: &[],
    },
];

pub fn table(name: &str) -> Option<&'static TableSpec> {
    TABLES.iter().find(|t| t.name == name)
}

pub fn required_tables() -> impl Iterator<Item = &'static TableSpec> {
    TABLES.iter().filter(|t| t.required)
}

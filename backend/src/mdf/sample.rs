//! Builder for small, internally consistent MDFs.
//!
//! Used by tests, the validation bench and the CLI smoke tests. The default
//! file has design 42, blueprint 7, four program slits each holding one
//! object, one unmapped guide star and one catalog file. The first object
//! carries shape and proper-motion data so both satellite records get
//! exercised.

use super::container::CellValue;
use super::memory::{MemoryContainer, MemoryTable};
use super::schema::{
    self, BLU_SLITS, CAT_FILES, DESI_SLITS, MASK_BLU, MASK_DESIGN, OBJECT_CAT, SLIT_OBJ_MAP,
};

pub const SAMPLE_DES_ID: i64 = 42;
pub const SAMPLE_BLU_ID: i64 = 7;
pub const SAMPLE_AUTHOR: &str = "Ada Author <ada@example.org>";
pub const SAMPLE_OBSERVER: &str = "Otto Observer <otto@example.org>";
pub const GUIDE_STAR_ID: i64 = 9001;

/// Object id used for the object placed in slit `n` (1-based).
pub fn object_id_for_slit(n: i64) -> i64 {
    1000 + n
}

/// Blueprint-slit id generated for design slit `n` (1-based).
pub fn bslit_id_for_slit(n: i64) -> i64 {
    100 + n
}

#[derive(Debug, Clone)]
pub struct SampleMdf {
    source: String,
    des_id: i64,
    blu_id: i64,
    slits: usize,
    declared_slits: Option<i64>,
    instrument: String,
    telescope: String,
    author: String,
    observer: String,
    gui_name: String,
    date_use: String,
    date_pnt: String,
    guide_star: bool,
}

impl Default for SampleMdf {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMdf {
    pub fn new() -> Self {
        Self {
            source: "sample.mdf".to_string(),
            des_id: SAMPLE_DES_ID,
            blu_id: SAMPLE_BLU_ID,
            slits: 4,
            declared_slits: None,
            instrument: "DEIMOS".to_string(),
            telescope: "Keck II".to_string(),
            author: SAMPLE_AUTHOR.to_string(),
            observer: SAMPLE_OBSERVER.to_string(),
            gui_name: "NGC 1234".to_string(),
            date_use: "2099-01-01".to_string(),
            date_pnt: "2024-05-01".to_string(),
            guide_star: true,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn slits(mut self, n: usize) -> Self {
        self.slits = n;
        self
    }

    /// Override `DesNslit` independently of the number of slit rows.
    pub fn declared_slits(mut self, n: i64) -> Self {
        self.declared_slits = Some(n);
        self
    }

    pub fn instrument(mut self, v: impl Into<String>) -> Self {
        self.instrument = v.into();
        self
    }

    pub fn telescope(mut self, v: impl Into<String>) -> Self {
        self.telescope = v.into();
        self
    }

    pub fn author(mut self, v: impl Into<String>) -> Self {
        self.author = v.into();
        self
    }

    pub fn observer(mut self, v: impl Into<String>) -> Self {
        self.observer = v.into();
        self
    }

    pub fn gui_name(mut self, v: impl Into<String>) -> Self {
        self.gui_name = v.into();
        self
    }

    pub fn date_use(mut self, v: impl Into<String>) -> Self {
        self.date_use = v.into();
        self
    }

    pub fn date_pnt(mut self, v: impl Into<String>) -> Self {
        self.date_pnt = v.into();
        self
    }

    pub fn without_guide_star(mut self) -> Self {
        self.guide_star = false;
        self
    }

    pub fn build(&self) -> MemoryContainer {
        let n = self.slits as i64;
        let objects = n + i64::from(self.guide_star);

        let design = schema_table(MASK_DESIGN).row(vec![
            self.des_id.into(),
            "sample design".into(),
            self.author.as_str().into(),
            "dsimulator".into(),
            "2024-04-01".into(),
            self.declared_slits.unwrap_or(n).into(),
            objects.into(),
            "sample project".into(),
            self.instrument.as_str().into(),
            "normal".into(),
            150.25.into(),
            2.5.into(),
            "10:01:00 +02:30:00".into(),
            2000.0.into(),
            0.0.into(),
            self.date_pnt.as_str().into(),
            CellValue::Null,
        ]);

        let blueprint = schema_table(MASK_BLU).row(vec![
            self.blu_id.into(),
            self.des_id.into(),
            "sample blueprint".into(),
            self.gui_name.as_str().into(),
            self.observer.as_str().into(),
            "dsimulator".into(),
            "2024-04-02".into(),
            3.5.into(),
            self.date_use.as_str().into(),
            self.telescope.as_str().into(),
            "SLALIB".into(),
            2.0.into(),
            615.0.into(),
            0.4.into(),
            0.0065.into(),
            6500.0.into(),
            "INDEF".into(),
        ]);

        let mut design_slits = schema_table(DESI_SLITS);
        let mut blueprint_slits = schema_table(BLU_SLITS);
        let mut object_cat = schema_table(OBJECT_CAT);
        let mut slit_map = schema_table(SLIT_OBJ_MAP);

        for i in 1..=n {
            let offset = i as f64 * 0.001;
            design_slits.push_row(vec![
                i.into(),
                self.des_id.into(),
                (150.25 + offset).into(),
                (2.5 + offset).into(),
                "P".into(),
                8.0.into(),
                0.0.into(),
                1.0.into(),
                0.0.into(),
                format!("s{}", i).into(),
            ]);

            let x = i as f64 * 10.0;
            blueprint_slits.push_row(vec![
                bslit_id_for_slit(i).into(),
                self.blu_id.into(),
                i.into(),
                x.into(),
                0.0.into(),
                (x + 1.0).into(),
                0.0.into(),
                (x + 1.0).into(),
                8.0.into(),
                x.into(),
                8.0.into(),
            ]);

            // only the first object carries shape and proper motion
            let (maj, pa, min, pm_ra, plx) = if i == 1 {
                (1.2, 30.0, 0.4, 0.01, 0.002)
            } else {
                (0.0, 0.0, 0.0, 0.0, 0.0)
            };
            object_cat.push_row(vec![
                object_id_for_slit(i).into(),
                format!("obj-{}", i).into(),
                (150.25 + offset).into(),
                (2.5 + offset).into(),
                "FK5".into(),
                2000.0.into(),
                0.0.into(),
                (21.0 + offset).into(),
                "R".into(),
                0.0.into(),
                maj.into(),
                pa.into(),
                min.into(),
                pm_ra.into(),
                0.0.into(),
                plx.into(),
                "Program_Target".into(),
                1.into(),
            ]);

            slit_map.push_row(vec![
                self.des_id.into(),
                object_id_for_slit(i).into(),
                i.into(),
                4.0.into(),
                4.0.into(),
            ]);
        }

        if self.guide_star {
            object_cat.push_row(vec![
                GUIDE_STAR_ID.into(),
                "guide-1".into(),
                150.3.into(),
                2.55.into(),
                "FK5".into(),
                2000.0.into(),
                0.0.into(),
                14.0.into(),
                "R".into(),
                0.0.into(),
                0.0.into(),
                0.0.into(),
                0.0.into(),
                0.0.into(),
                0.0.into(),
                0.0.into(),
                "Guide_Star".into(),
                1.into(),
            ]);
        }

        let catalogs = schema_table(CAT_FILES).row(vec![1.into(), "targets.cat".into()]);

        MemoryContainer::new(self.source.clone())
            .with_table(design)
            .with_table(blueprint)
            .with_table(design_slits)
            .with_table(blueprint_slits)
            .with_table(object_cat)
            .with_table(catalogs)
            .with_table(slit_map)
    }
}

/// Empty table carrying every known column of `name`.
fn schema_table(name: &str) -> MemoryTable {
    let mut table = MemoryTable::new(name);
    if let Some(descriptor) = schema::table(name) {
        for col in descriptor.columns {
            table.add_column(col.name, col.kind);
        }
    }
    table
}

//! Typed loading of a structurally valid container into a [`MaskFile`].
//!
//! Runs after the structural check, so required tables and columns exist with
//! compatible kinds. What remains are per-cell problems: null or blank required
//! cells, text where a number is expected, fractional integers and
//! unknown slit type codes. All of them are collected; loading never stops at
//! the first bad cell.

use super::container::{CellValue, MdfContainer, RowView};
use super::schema::{BLU_SLITS, CAT_FILES, DESI_SLITS, MASK_BLU, MASK_DESIGN, OBJECT_CAT, SLIT_OBJ_MAP};
use crate::models::{
    BlueprintRow, BlueprintSlitRow, CatalogFileRow, DesignRow, DesignSlitRow, MaskFile,
    ObjectClass, ObjectRow, SlitObjectRow, SlitType, Supplied,
};

/// Parse every known table. Returns all cell-level problems on failure.
pub fn load_mask_file(container: &dyn MdfContainer) -> Result<MaskFile, Vec<String>> {
    let mut errors = Vec::new();
    let mut file = MaskFile {
        source: container.source().to_string(),
        ..Default::default()
    };

    for row in container.rows(MASK_DESIGN) {
        let mut c = Cells::new(row, &mut errors);
        file.designs.push(DesignRow {
            des_id: c.int("DesId"),
            des_name: c.text("DesName"),
            des_author: c.checked_text("DesAuth"),
            des_creator: c.opt_text("DesCreat"),
            des_date: c.text("DesDate"),
            declared_slits: c.int("DesNslit"),
            declared_objects: c.int("DesNobj"),
            project_name: c.opt_text("ProjName"),
            instrument: c.checked_text("INSTRUME"),
            mask_type: c.opt_text("MaskType"),
            ra_pnt: c.float("RA_PNT"),
            dec_pnt: c.float("DEC_PNT"),
            radepnt: c.opt_text("RADEPNT"),
            equinox_pnt: c.float("EQUINPNT"),
            pa_pnt: c.float("PA_PNT"),
            date_pnt: c.checked_text("DATE_PNT"),
            lst_pnt: c.opt_float("LST_PNT"),
        });
    }

    for row in container.rows(MASK_BLU) {
        let mut c = Cells::new(row, &mut errors);
        file.blueprints.push(BlueprintRow {
            blu_id: c.int("BluId"),
            des_id: c.int("DesId"),
            blu_name: c.text("BluName"),
            gui_name: c.checked_text("guiname"),
            blu_observer: c.checked_text("BluObsvr"),
            blu_creator: c.opt_text("BluCreat"),
            blu_date: c.opt_text("BluDate"),
            lst_use: c.opt_float("LST_Use"),
            date_use: c.checked_text("Date_Use"),
            telescope: c.checked_text("TELESCOP"),
            refr_alg: c.opt_text("RefrAlg"),
            atm_temp_c: c.opt_float("AtmTempC"),
            atm_pressure: c.opt_float("AtmPres"),
            atm_humidity: c.opt_float("AtmHumid"),
            atm_lapse_rate: c.opt_float("AtmTTLap"),
            ref_wavelength: c.opt_float("RefWave"),
            dist_method: c.opt_text("DistMeth"),
        });
    }

    for row in container.rows(DESI_SLITS) {
        let mut c = Cells::new(row, &mut errors);
        let dslit_id = c.int("dSlitId");
        let des_id = c.int("DesId");
        let slit_ra = c.float("SlitRA");
        let slit_dec = c.float("SlitDec");
        let slit_type = c.slit_type("SlitTyp");
        let slit_length = c.float("SlitLen");
        let slit_length_pa = c.float("SlitLPA");
        let slit_width = c.float("SlitWid");
        let slit_width_pa = c.float("SlitWPA");
        let slit_name = c.opt_text("SlitName");
        if let Some(slit_type) = slit_type {
            file.design_slits.push(DesignSlitRow {
                dslit_id,
                des_id,
                slit_ra,
                slit_dec,
                slit_type,
                slit_length,
                slit_length_pa,
                slit_width,
                slit_width_pa,
                slit_name,
            });
        }
    }

    for row in container.rows(BLU_SLITS) {
        let mut c = Cells::new(row, &mut errors);
        file.blueprint_slits.push(BlueprintSlitRow {
            bslit_id: c.int("bSlitId"),
            blu_id: c.int("BluId"),
            dslit_id: c.int("dSlitId"),
            corners: [
                (c.float("slitX1"), c.float("slitY1")),
                (c.float("slitX2"), c.float("slitY2")),
                (c.float("slitX3"), c.float("slitY3")),
                (c.float("slitX4"), c.float("slitY4")),
            ],
        });
    }

    for row in container.rows(OBJECT_CAT) {
        let mut c = Cells::new(row, &mut errors);
        file.objects.push(ObjectRow {
            object_id: c.int("ObjectId"),
            name: c.text("OBJECT"),
            ra: c.float("RA_OBJ"),
            dec: c.float("DEC_OBJ"),
            radesys: c.opt_text("RADESYS"),
            equinox: c.float("EQUINOX"),
            mjd_obs: c.supplied("MJD-OBS"),
            magnitude: c.supplied("mag"),
            pass_band: c.opt_text("pBand"),
            radial_velocity: c.supplied("RadVel"),
            major_axis: c.supplied("MajAxis"),
            major_axis_pa: c.supplied("MajAxPA"),
            minor_axis: c.supplied("MinAxis"),
            pm_ra: c.supplied("PM_RA"),
            pm_dec: c.supplied("PM_Dec"),
            parallax: c.supplied("Parallax"),
            class: ObjectClass::new(c.text("ObjClass")),
            cat_file_pk: c.int("CatFilePK"),
        });
    }

    for row in container.rows(CAT_FILES) {
        let mut c = Cells::new(row, &mut errors);
        file.catalog_files.push(CatalogFileRow {
            cat_file_pk: c.int("CatFilePK"),
            file_name: c.text("CatFileName"),
        });
    }

    for row in container.rows(SLIT_OBJ_MAP) {
        let mut c = Cells::new(row, &mut errors);
        file.slit_objects.push(SlitObjectRow {
            des_id: c.int("DesId"),
            object_id: c.int("ObjectId"),
            dslit_id: c.int("dSlitId"),
            top_dist: c.float("TopDist"),
            bot_dist: c.float("BotDist"),
        });
    }

    if errors.is_empty() {
        Ok(file)
    } else {
        Err(errors)
    }
}

/// Cell accessor for one row that records problems instead of failing.
struct Cells<'r, 'a, 'c> {
    row: RowView<'a, 'c>,
    errors: &'r mut Vec<String>,
}

impl<'r, 'a, 'c> Cells<'r, 'a, 'c> {
    fn new(row: RowView<'a, 'c>, errors: &'r mut Vec<String>) -> Self {
        Self { row, errors }
    }

    fn report(&mut self, column: &str, problem: impl std::fmt::Display) {
        self.errors.push(format!(
            "{} row {}: column {}: {}",
            self.row.table(),
            self.row.index() + 1,
            column,
            problem
        ));
    }

    /// Optional columns may be missing from the container altogether.
    fn cell(&mut self, column: &str) -> CellValue {
        if !self.row.has_column(column) {
            return CellValue::Null;
        }
        match self.row.get(column) {
            Ok(v) => v,
            Err(e) => {
                self.report(column, e);
                CellValue::Null
            }
        }
    }

    fn int(&mut self, column: &str) -> i64 {
        self.opt_int(column).unwrap_or_else(|| {
            self.report(column, "required value missing");
            0
        })
    }

    fn opt_int(&mut self, column: &str) -> Option<i64> {
        let cell = self.cell(column);
        if cell.is_null() {
            return None;
        }
        match cell.as_i64() {
            Some(v) => Some(v),
            None => {
                self.report(column, format!("expected integer, found {}", cell.describe()));
                // already reported; keep the caller from reporting "missing" too
                Some(0)
            }
        }
    }

    fn float(&mut self, column: &str) -> f64 {
        self.opt_float(column).unwrap_or_else(|| {
            self.report(column, "required value missing");
            0.0
        })
    }

    fn opt_float(&mut self, column: &str) -> Option<f64> {
        let cell = self.cell(column);
        if cell.is_null() {
            return None;
        }
        match cell.as_f64() {
            Some(v) => Some(v),
            None => {
                self.report(column, format!("expected float, found {}", cell.describe()));
                Some(0.0)
            }
        }
    }

    fn supplied(&mut self, column: &str) -> Supplied {
        Supplied::from(self.opt_float(column))
    }

    /// Required text. Null and blank cells are both missing; FITS has no text null.
    fn text(&mut self, column: &str) -> String {
        match self.cell(column) {
            CellValue::Text(s) if !s.trim().is_empty() => s,
            CellValue::Null | CellValue::Text(_) => {
                self.report(column, "required value missing");
                String::new()
            }
            other => {
                self.report(column, format!("expected text, found {}", other.describe()));
                String::new()
            }
        }
    }

    /// Text the content validator judges itself (tags, identities, dates,
    /// display name). Comes back untrimmed; null reads as empty.
    fn checked_text(&mut self, column: &str) -> String {
        self.opt_text(column).unwrap_or_default()
    }

    fn opt_text(&mut self, column: &str) -> Option<String> {
        match self.cell(column) {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s),
            other => {
                self.report(column, format!("expected text, found {}", other.describe()));
                None
            }
        }
    }

    fn slit_type(&mut self, column: &str) -> Option<SlitType> {
        let cell = self.cell(column);
        let code = match cell {
            CellValue::Text(code) => code,
            CellValue::Null => {
                self.report(column, "required value missing");
                return None;
            }
            other => {
                self.report(column, format!("expected text, found {}", other.describe()));
                return None;
            }
        };
        let parsed = SlitType::from_code(&code);
        if parsed.is_none() {
            self.report(column, format!("unknown slit type code '{}'", code));
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdf::sample::SampleMdf;

    #[test]
    fn test_load_sample() {
        let container = SampleMdf::new().slits(3).build();
        let file = load_mask_file(&container).unwrap();

        assert_eq!(file.designs.len(), 1);
        assert_eq!(file.blueprints.len(), 1);
        assert_eq!(file.design_slits.len(), 3);
        assert_eq!(file.blueprint_slits.len(), 3);
        assert_eq!(file.design().unwrap().des_id, 42);
        assert_eq!(file.blueprint().unwrap().blu_id, 7);
        assert_eq!(file.design_slits[0].slit_type, SlitType::Program);
        assert!(file.objects.iter().any(|o| o.class.is_guide_star()));
    }

    #[test]
    fn test_integral_float_accepted_for_integer_column() {
        let mut container = SampleMdf::new().build();
        container
            .table_mut(DESI_SLITS)
            .unwrap()
            .set(0, "dSlitId", 1.0);
        let file = load_mask_file(&container).unwrap();
        assert_eq!(file.design_slits[0].dslit_id, 1);
    }

    #[test]
    fn test_cell_problems_are_collected() {
        let mut container = SampleMdf::new().slits(2).build();
        let slits = container.table_mut(DESI_SLITS).unwrap();
        slits.set(0, "SlitLen", "long");
        slits.set(1, "SlitTyp", "Q");
        slits.set(1, "dSlitId", 2.5);
        container
            .table_mut(MASK_DESIGN)
            .unwrap()
            .set(0, "RA_PNT", CellValue::Null);

        let errors = load_mask_file(&container).unwrap_err();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.contains(&"MaskDesign row 1: column RA_PNT: required value missing".to_string()));
        assert!(errors.contains(&"DesiSlits row 1: column SlitLen: expected float, found text 'long'".to_string()));
        assert!(errors.contains(&"DesiSlits row 2: column SlitTyp: unknown slit type code 'Q'".to_string()));
        assert!(errors.contains(&"DesiSlits row 2: column dSlitId: expected integer, found float 2.5".to_string()));
    }

    #[test]
    fn test_zero_optional_numbers_are_absent() {
        let mut container = SampleMdf::new().build();
        let objects = container.table_mut(OBJECT_CAT).unwrap();
        objects.set(0, "mag", 0.0);
        objects.remove_column("Parallax");
        let file = load_mask_file(&container).unwrap();
        assert!(!file.objects[0].magnitude.is_present());
        assert!(!file.objects[0].parallax.is_present());
    }

    #[test]
    fn test_null_or_blank_required_text_is_missing() {
        let mut container = SampleMdf::new().slits(2).build();
        container
            .table_mut(OBJECT_CAT)
            .unwrap()
            .set(0, "OBJECT", CellValue::Null);
        container
            .table_mut(CAT_FILES)
            .unwrap()
            .set(0, "CatFileName", "   ");
        container
            .table_mut(MASK_DESIGN)
            .unwrap()
            .set(0, "DesName", CellValue::Null);
        container
            .table_mut(MASK_BLU)
            .unwrap()
            .set(0, "BluName", "");
        container
            .table_mut(DESI_SLITS)
            .unwrap()
            .set(1, "SlitTyp", CellValue::Null);

        let errors = load_mask_file(&container).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "MaskDesign row 1: column DesName: required value missing".to_string(),
                "MaskBlu row 1: column BluName: required value missing".to_string(),
                "DesiSlits row 2: column SlitTyp: required value missing".to_string(),
                "ObjectCat row 1: column OBJECT: required value missing".to_string(),
                "CatFiles row 1: column CatFileName: required value missing".to_string(),
            ]
        );
    }

    #[test]
    fn test_blank_display_name_is_left_to_validation() {
        let container = SampleMdf::new().gui_name("").build();
        let file = load_mask_file(&container).unwrap();
        assert_eq!(file.blueprint().unwrap().gui_name, "");
    }
}

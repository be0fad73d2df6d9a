//! Content validation of a typed mask file.
//!
//! Every check runs regardless of the others and appends to one report, so a
//! single pass shows the submitter everything that is wrong with the file.
//! Referential checks report the first row carrying each distinct bad value
//! and scan every row; one corrupted key copied across many rows yields one
//! message per bad value.

use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

use super::identity::{self, IdentityDirectory, Resolution};
use super::report::ErrorReport;
use crate::models::{parse_free_date, BlueprintRow, DesignRow, MaskFile};

/// Site-specific acceptance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub telescopes: Vec<String>,
    pub instruments: Vec<String>,
    /// Earliest acceptable pointing date.
    pub epoch_floor: NaiveDate,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            telescopes: vec!["Keck I".to_string(), "Keck II".to_string()],
            instruments: vec!["DEIMOS".to_string(), "LRIS".to_string()],
            epoch_floor: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl ValidationPolicy {
    fn telescope_allowed(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.telescopes.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    fn instrument_allowed(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.instruments.iter().any(|i| i.eq_ignore_ascii_case(tag))
    }
}

/// Result of content validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentReport {
    pub report: ErrorReport,
    /// Resolution of the design author, when a design row exists.
    pub author: Option<Resolution>,
    /// Resolution of the blueprint observer, when a blueprint row exists.
    pub observer: Option<Resolution>,
    /// Parsed `Date_Use`, when it parsed.
    pub date_use: Option<NaiveDate>,
    /// Parsed `DATE_PNT`, when it parsed.
    pub date_pnt: Option<NaiveDate>,
}

impl ContentReport {
    /// No errors and both identities resolved.
    pub fn passed(&self) -> bool {
        self.report.is_empty()
            && matches!(self.author, Some(Resolution::Resolved(_)))
            && matches!(self.observer, Some(Resolution::Resolved(_)))
    }
}

/// Tracks which values a check has already reported.
struct Distinct<T>(HashSet<T>);

impl<T: Eq + Hash> Distinct<T> {
    fn new() -> Self {
        Self(HashSet::new())
    }

    /// True the first time `value` is seen.
    fn first(&mut self, value: T) -> bool {
        self.0.insert(value)
    }
}

/// Validates mask files against a policy, an identity directory and a clock.
pub struct ContentValidator<'a> {
    policy: &'a ValidationPolicy,
    directory: &'a dyn IdentityDirectory,
    today: NaiveDate,
}

impl<'a> ContentValidator<'a> {
    /// `today` is the validation clock; use-dates are compared against it.
    pub fn new(
        policy: &'a ValidationPolicy,
        directory: &'a dyn IdentityDirectory,
        today: NaiveDate,
    ) -> Self {
        Self {
            policy,
            directory,
            today,
        }
    }

    pub fn validate(&self, file: &MaskFile) -> ContentReport {
        let mut out = ContentReport {
            report: ErrorReport::new(),
            author: None,
            observer: None,
            date_use: None,
            date_pnt: None,
        };

        let design = file.design();
        let blueprint = file.blueprint();

        match file.designs.len() {
            0 => out.report.add_error("MaskDesign: table has no rows"),
            1 => {}
            n => out.report.add_warning(format!(
                "MaskDesign: {} rows present; only the first is used",
                n
            )),
        }
        match file.blueprints.len() {
            0 => out.report.add_error("MaskBlu: table has no rows"),
            1 => {}
            n => out.report.add_warning(format!(
                "MaskBlu: {} rows present; only the first is used",
                n
            )),
        }

        if let Some(design) = design {
            self.check_design(design, file, &mut out);
        }
        if let Some(blueprint) = blueprint {
            self.check_blueprint(blueprint, &mut out);
        }
        if let (Some(design), Some(blueprint)) = (design, blueprint) {
            if blueprint.des_id != design.des_id {
                out.report.add_error(format!(
                    "MaskBlu.DesId: blueprint references design {} but the file describes design {}",
                    blueprint.des_id, design.des_id
                ));
            }
        }

        check_duplicate_keys(file, &mut out.report);
        if let Some(design) = design {
            check_design_slits(design, file, &mut out.report);
            check_slit_object_map(design, file, &mut out.report);
        }
        if let Some(blueprint) = blueprint {
            check_blueprint_slits(blueprint, file, &mut out.report);
        }
        check_objects(file, &mut out.report);

        debug!(
            "Content validation of {}: {} errors, {} warnings",
            file.source,
            out.report.errors.len(),
            out.report.warnings.len()
        );
        out
    }

    fn check_design(&self, design: &DesignRow, file: &MaskFile, out: &mut ContentReport) {
        let report = &mut out.report;

        if !self.policy.instrument_allowed(&design.instrument) {
            report.add_error(format!(
                "MaskDesign.INSTRUME: unrecognized instrument '{}'",
                design.instrument
            ));
        }

        let author = identity::resolve(self.directory, &design.des_author);
        if let Resolution::NotFound(reason) = &author {
            report.add_error(format!(
                "MaskDesign.DesAuth: unregistered user '{}': {}",
                design.des_author, reason
            ));
        }
        out.author = Some(author);

        let actual = file.design_slits.len() as i64;
        if design.declared_slits != actual {
            report.add_error(format!(
                "MaskDesign.DesNslit: slit count mismatch: declared {} but DesiSlits has {} rows",
                design.declared_slits, actual
            ));
        }

        match parse_free_date(&design.date_pnt) {
            Ok(date) => {
                if date < self.policy.epoch_floor {
                    report.add_error(format!(
                        "MaskDesign.DATE_PNT: date {} is before epoch floor {}",
                        date, self.policy.epoch_floor
                    ));
                }
                out.date_pnt = Some(date);
            }
            Err(e) => report.add_error(format!("MaskDesign.DATE_PNT: {}", e)),
        }
    }

    fn check_blueprint(&self, blueprint: &BlueprintRow, out: &mut ContentReport) {
        let report = &mut out.report;

        if !self.policy.telescope_allowed(&blueprint.telescope) {
            report.add_error(format!(
                "MaskBlu.TELESCOP: unrecognized telescope '{}'",
                blueprint.telescope
            ));
        }

        let observer = identity::resolve(self.directory, &blueprint.blu_observer);
        if let Resolution::NotFound(reason) = &observer {
            report.add_error(format!(
                "MaskBlu.BluObsvr: unregistered user '{}': {}",
                blueprint.blu_observer, reason
            ));
        }
        out.observer = Some(observer);

        if blueprint.gui_name.trim().is_empty() {
            report.add_error("MaskBlu.guiname: missing display name");
        }

        match parse_free_date(&blueprint.date_use) {
            Ok(date) => {
                let yesterday = self.today.checked_sub_days(Days::new(1)).unwrap_or(self.today);
                if date < yesterday {
                    report.add_error(format!(
                        "MaskBlu.Date_Use: date in the past: {} is before {}",
                        date, yesterday
                    ));
                }
                out.date_use = Some(date);
            }
            Err(e) => report.add_error(format!("MaskBlu.Date_Use: {}", e)),
        }
    }
}

fn check_duplicate_keys(file: &MaskFile, report: &mut ErrorReport) {
    fn scan(
        table: &str,
        column: &str,
        keys: impl Iterator<Item = i64>,
        report: &mut ErrorReport,
    ) {
        let mut seen = HashSet::new();
        let mut reported = Distinct::new();
        for (idx, key) in keys.enumerate() {
            if !seen.insert(key) && reported.first(key) {
                report.add_error(format!(
                    "{} row {}: duplicate {} {}",
                    table,
                    idx + 1,
                    column,
                    key
                ));
            }
        }
    }

    scan(
        "DesiSlits",
        "dSlitId",
        file.design_slits.iter().map(|s| s.dslit_id),
        report,
    );
    scan(
        "BluSlits",
        "bSlitId",
        file.blueprint_slits.iter().map(|s| s.bslit_id),
        report,
    );
    scan(
        "ObjectCat",
        "ObjectId",
        file.objects.iter().map(|o| o.object_id),
        report,
    );
    scan(
        "CatFiles",
        "CatFilePK",
        file.catalog_files.iter().map(|c| c.cat_file_pk),
        report,
    );
}

fn check_design_slits(design: &DesignRow, file: &MaskFile, report: &mut ErrorReport) {
    let mut bad_design = Distinct::new();
    for (idx, slit) in file.design_slits.iter().enumerate() {
        if slit.des_id != design.des_id && bad_design.first(slit.des_id) {
            report.add_error(format!(
                "DesiSlits row {}: orphan slit: DesId {} does not match design {}",
                idx + 1,
                slit.des_id,
                design.des_id
            ));
        }
    }
}

fn check_blueprint_slits(blueprint: &BlueprintRow, file: &MaskFile, report: &mut ErrorReport) {
    let slit_ids: HashSet<i64> = file.design_slits.iter().map(|s| s.dslit_id).collect();
    let mut bad_blueprint = Distinct::new();
    let mut bad_slit = Distinct::new();

    for (idx, slit) in file.blueprint_slits.iter().enumerate() {
        if slit.blu_id != blueprint.blu_id && bad_blueprint.first(slit.blu_id) {
            report.add_error(format!(
                "BluSlits row {}: orphan blueprint slit: BluId {} does not match blueprint {}",
                idx + 1,
                slit.blu_id,
                blueprint.blu_id
            ));
        }
        if !slit_ids.contains(&slit.dslit_id) && bad_slit.first(slit.dslit_id) {
            report.add_error(format!(
                "BluSlits row {}: orphan blueprint slit: dSlitId {} not among DesiSlits",
                idx + 1,
                slit.dslit_id
            ));
        }
    }
}

fn check_slit_object_map(design: &DesignRow, file: &MaskFile, report: &mut ErrorReport) {
    let slit_ids: HashSet<i64> = file.design_slits.iter().map(|s| s.dslit_id).collect();
    let object_ids: HashSet<i64> = file.objects.iter().map(|o| o.object_id).collect();
    let mut bad_design = Distinct::new();
    let mut bad_object = Distinct::new();
    let mut bad_slit = Distinct::new();

    for (idx, map) in file.slit_objects.iter().enumerate() {
        let row = idx + 1;
        if map.des_id != design.des_id && bad_design.first(map.des_id) {
            report.add_error(format!(
                "SlitObjMap row {}: orphan mapping: DesId {} does not match design {}",
                row, map.des_id, design.des_id
            ));
        }
        if !object_ids.contains(&map.object_id) && bad_object.first(map.object_id) {
            report.add_error(format!(
                "SlitObjMap row {}: orphan mapping: ObjectId {} not among ObjectCat",
                row, map.object_id
            ));
        }
        if !slit_ids.contains(&map.dslit_id) && bad_slit.first(map.dslit_id) {
            report.add_error(format!(
                "SlitObjMap row {}: orphan mapping: dSlitId {} not among DesiSlits",
                row, map.dslit_id
            ));
        }
    }
}

fn check_objects(file: &MaskFile, report: &mut ErrorReport) {
    let catalogs: HashSet<i64> = file.catalog_files.iter().map(|c| c.cat_file_pk).collect();
    let mapped: HashSet<i64> = file.slit_objects.iter().map(|m| m.object_id).collect();
    let mut bad_catalog = Distinct::new();
    let mut unmapped = Distinct::new();

    for (idx, object) in file.objects.iter().enumerate() {
        let row = idx + 1;
        if !catalogs.contains(&object.cat_file_pk) && bad_catalog.first(object.cat_file_pk) {
            report.add_error(format!(
                "ObjectCat row {}: orphan object: CatFilePK {} not among CatFiles",
                row, object.cat_file_pk
            ));
        }
        if !object.class.is_guide_star()
            && !mapped.contains(&object.object_id)
            && unmapped.first(object.object_id)
        {
            report.add_error(format!(
                "ObjectCat row {}: orphan object: ObjectId {} ('{}') is not mapped to any slit",
                row, object.object_id, object.name
            ));
        }
    }
}

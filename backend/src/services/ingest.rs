//! Ingestion of one MDF into the mask database.
//!
//! An ingestion runs in stages, each feeding one shared [`ErrorReport`]:
//!
//! 1. structural validation of the container
//! 2. loading the tables into typed rows
//! 3. content validation, including identity resolution
//! 4. ordered inserts inside one datastore transaction
//! 5. the commit protocol
//!
//! Nothing is inserted unless stages 1-3 produced no errors, and nothing is
//! committed unless stage 4 produced none. The outcome's `success` flag is
//! true exactly when the report holds no errors.

use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::display_name::{choose_display_name, collapse, probe_prefix};
use super::identity::IdentityDirectory;
use super::key_map::KeyMap;
use super::report::ErrorReport;
use super::structure::validate_structure;
use super::validation::{ContentValidator, ValidationPolicy};
use crate::api::{IngestionId, ObserverId};
use crate::db::models::{
    NewBlueprintSlit, NewDesignSlit, NewExtendedObject, NewMaskBlueprint, NewMaskDesign,
    NewNearbyObject, NewSlitObjectMapping, NewTargetObject, StoreTable,
};
use crate::db::repository::{
    FullRepository, IngestTransaction, MaskRepository, RepositoryError, TransactionStatus,
};
use crate::mdf::{load_mask_file, ContainerReader, JsonContainerReader, MdfContainer};
use crate::models::{MaskFile, MillStatus};

/// Extra insert attempts after a display-name conflict.
pub const DEFAULT_DISPLAY_NAME_RETRIES: u32 = 2;

/// Tunables of the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSettings {
    pub policy: ValidationPolicy,
    /// How many times the insert phase is repeated when another ingestion
    /// took the chosen display name first.
    pub display_name_retries: u32,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            display_name_retries: DEFAULT_DISPLAY_NAME_RETRIES,
        }
    }
}

/// How the ingestion transaction ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOutcome {
    /// Every inserted row is persisted.
    Committed,
    /// The transaction never issued a statement; nothing to commit.
    NoChanges,
    /// All changes were discarded.
    RolledBack(String),
    /// The connection was lost; the datastore discards the transaction.
    ConnectionLost(String),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub ingestion_id: IngestionId,
    /// True iff `errors` is empty.
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Datastore keys of the stored rows; only present on success.
    pub key_map: Option<KeyMap>,
    /// `None` when the ingestion stopped before opening a transaction.
    pub commit: Option<CommitOutcome>,
}

impl IngestOutcome {
    fn new(
        ingestion_id: IngestionId,
        report: ErrorReport,
        key_map: Option<KeyMap>,
        commit: Option<CommitOutcome>,
    ) -> Self {
        let success = report.is_empty();
        Self {
            ingestion_id,
            success,
            errors: report.errors,
            warnings: report.warnings,
            key_map: if success { key_map } else { None },
            commit,
        }
    }

    /// Outcome of a validation-only run: nothing was stored.
    pub fn from_validation(report: ErrorReport) -> Self {
        Self::new(IngestionId::new(), report, None, None)
    }

    fn failed(ingestion_id: IngestionId, message: impl Into<String>) -> Self {
        let mut report = ErrorReport::new();
        report.add_error(message);
        Self::new(ingestion_id, report, None, None)
    }
}

/// A file that passed validation, with everything the inserts need.
struct Prepared {
    file: MaskFile,
    author: ObserverId,
    observer: ObserverId,
    date_use: NaiveDate,
    date_pnt: NaiveDate,
}

/// Result of one insert phase, before it is folded into the outcome.
struct PassResult {
    report: ErrorReport,
    keys: KeyMap,
    commit: Option<CommitOutcome>,
    /// The display name was taken and nothing else went wrong.
    retryable_conflict: bool,
}

/// Runs ingestions against one repository and identity directory.
///
/// # Thread Safety
/// An `Ingestor` holds no per-ingestion state and can be shared between
/// threads; every call allocates its own [`KeyMap`] and transaction.
pub struct Ingestor {
    repository: Arc<dyn MaskRepository>,
    directory: Arc<dyn IdentityDirectory>,
    reader: Arc<dyn ContainerReader>,
    settings: IngestSettings,
}

impl Ingestor {
    /// Ingestor over a backend that stores masks and resolves identities,
    /// reading JSON-exported MDFs.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        let directory = repository.clone().into_identity_directory();
        Self::with_parts(
            repository.into_mask_repository(),
            directory,
            Arc::new(JsonContainerReader::new()),
        )
    }

    pub fn with_parts(
        repository: Arc<dyn MaskRepository>,
        directory: Arc<dyn IdentityDirectory>,
        reader: Arc<dyn ContainerReader>,
    ) -> Self {
        Self {
            repository,
            directory,
            reader,
            settings: IngestSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: IngestSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Ingest the MDF at `path`, validating use-dates against today's date.
    pub fn ingest_path(&self, path: &Path) -> IngestOutcome {
        self.ingest_path_on(path, Local::now().date_naive())
    }

    /// Ingest the MDF at `path` with an explicit validation date.
    ///
    /// The container is released before this returns, whatever the outcome.
    pub fn ingest_path_on(&self, path: &Path, today: NaiveDate) -> IngestOutcome {
        let ingestion_id = IngestionId::new();
        info!("[{}] Opening {}", ingestion_id, path.display());

        let container = match self.reader.open(path) {
            Ok(container) => container,
            Err(e) => {
                warn!("[{}] Cannot open container: {}", ingestion_id, e);
                return IngestOutcome::failed(ingestion_id, e.to_string());
            }
        };
        let outcome = self.run(ingestion_id, container.as_ref(), today);
        drop(container);
        outcome
    }

    /// Ingest an already opened container.
    pub fn ingest_container(&self, container: &dyn MdfContainer) -> IngestOutcome {
        self.ingest_container_on(container, Local::now().date_naive())
    }

    pub fn ingest_container_on(
        &self,
        container: &dyn MdfContainer,
        today: NaiveDate,
    ) -> IngestOutcome {
        self.run(IngestionId::new(), container, today)
    }

    /// Run every validation stage without touching the datastore.
    ///
    /// Identity lookups still query the directory. Repeated calls on the same
    /// container give identical reports.
    pub fn validate_container(&self, container: &dyn MdfContainer, today: NaiveDate) -> ErrorReport {
        let mut report = ErrorReport::new();
        self.prepare(container, today, &mut report);
        report
    }

    /// Run [`Ingestor::ingest_path`] on the blocking thread pool.
    pub async fn ingest_path_async(self: Arc<Self>, path: PathBuf) -> IngestOutcome {
        tokio::task::spawn_blocking(move || self.ingest_path(&path))
            .await
            .unwrap_or_else(|e| {
                error!("Ingestion task failed: {}", e);
                IngestOutcome::failed(IngestionId::new(), format!("ingestion task failed: {}", e))
            })
    }

    fn run(
        &self,
        ingestion_id: IngestionId,
        container: &dyn MdfContainer,
        today: NaiveDate,
    ) -> IngestOutcome {
        info!("[{}] Ingesting {}", ingestion_id, container.source());
        let mut report = ErrorReport::new();

        let Some(prepared) = self.prepare(container, today, &mut report) else {
            info!(
                "[{}] Rejected {} with {} errors",
                ingestion_id,
                container.source(),
                report.error_count()
            );
            return IngestOutcome::new(ingestion_id, report, None, None);
        };

        let (keys, commit) = self.store(ingestion_id, &prepared, &mut report);
        let outcome = IngestOutcome::new(ingestion_id, report, Some(keys), commit);
        if outcome.success {
            info!(
                "[{}] Stored {}: design {:?}, blueprints {:?}",
                ingestion_id,
                prepared.file.source,
                outcome.key_map.as_ref().and_then(KeyMap::design_id),
                outcome
                    .key_map
                    .as_ref()
                    .map(KeyMap::blueprint_ids)
                    .unwrap_or_default()
            );
        } else {
            info!(
                "[{}] Failed to store {}: {} errors",
                ingestion_id,
                prepared.file.source,
                outcome.errors.len()
            );
        }
        outcome
    }

    /// Validation stages. Returns the typed file only when nothing failed.
    fn prepare(
        &self,
        container: &dyn MdfContainer,
        today: NaiveDate,
        report: &mut ErrorReport,
    ) -> Option<Prepared> {
        let structure = validate_structure(container);
        for surprise in &structure.surprises {
            report.add_warning(surprise.clone());
        }
        if !structure.is_valid() {
            report.extend_errors(structure.defects);
            return None;
        }

        let file = match load_mask_file(container) {
            Ok(file) => file,
            Err(errors) => {
                report.extend_errors(errors);
                return None;
            }
        };

        let content = ContentValidator::new(&self.settings.policy, self.directory.as_ref(), today)
            .validate(&file);
        let passed = content.passed();
        let author = content.author.as_ref().and_then(|r| r.observer());
        let observer = content.observer.as_ref().and_then(|r| r.observer());
        let (date_use, date_pnt) = (content.date_use, content.date_pnt);
        report.merge(content.report);

        match (passed, author, observer, date_use, date_pnt) {
            (true, Some(author), Some(observer), Some(date_use), Some(date_pnt)) => Some(Prepared {
                file,
                author,
                observer,
                date_use,
                date_pnt,
            }),
            _ => {
                if report.is_empty() {
                    report.add_error("validation incomplete: identities or dates unresolved");
                }
                None
            }
        }
    }

    /// Insert phase plus commit, repeated on display-name conflicts.
    fn store(
        &self,
        ingestion_id: IngestionId,
        prepared: &Prepared,
        report: &mut ErrorReport,
    ) -> (KeyMap, Option<CommitOutcome>) {
        let retries = self.settings.display_name_retries;
        let mut attempt = 0;
        loop {
            let pass = self.insert_pass(ingestion_id, prepared);
            if pass.retryable_conflict && attempt < retries {
                attempt += 1;
                warn!(
                    "[{}] Display name taken concurrently, retrying insert ({}/{})",
                    ingestion_id, attempt, retries
                );
                continue;
            }
            report.merge(pass.report);
            return (pass.keys, pass.commit);
        }
    }

    fn insert_pass(&self, ingestion_id: IngestionId, prepared: &Prepared) -> PassResult {
        let mut tx = match self.repository.begin() {
            Ok(tx) => tx,
            Err(e) => {
                error!("[{}] Cannot open transaction: {}", ingestion_id, e);
                let mut report = ErrorReport::new();
                report.add_error(format!("database error: cannot open transaction: {}", e));
                return PassResult {
                    report,
                    keys: KeyMap::new(),
                    commit: None,
                    retryable_conflict: false,
                };
            }
        };

        let mut pass = InsertPass {
            ingestion_id,
            tx: tx.as_mut(),
            keys: KeyMap::new(),
            report: ErrorReport::new(),
            failures: 0,
            conflict: false,
        };
        pass.run(prepared);
        let InsertPass {
            keys,
            mut report,
            failures,
            conflict,
            ..
        } = pass;

        let (commit, commit_conflict) = finish(ingestion_id, tx, &mut report);
        PassResult {
            report,
            keys,
            commit: Some(commit),
            retryable_conflict: (conflict && failures == 0) || commit_conflict,
        }
    }
}

/// Apply the commit protocol to an ended insert phase.
///
/// Returns the outcome and whether the commit was refused over a display-name
/// conflict.
fn finish(
    ingestion_id: IngestionId,
    mut tx: Box<dyn IngestTransaction + '_>,
    report: &mut ErrorReport,
) -> (CommitOutcome, bool) {
    if !report.is_empty() {
        let reason = format!("{} insert errors", report.error_count());
        if let Err(e) = tx.rollback() {
            warn!("[{}] Rollback failed: {}", ingestion_id, e);
        }
        info!("[{}] Rolled back: {}", ingestion_id, reason);
        return (CommitOutcome::RolledBack(reason), false);
    }

    match tx.status() {
        TransactionStatus::Unknown => {
            drop(tx);
            let message = "database error: connection lost before commit; nothing was stored";
            error!("[{}] {}", ingestion_id, message);
            report.add_error(message);
            (CommitOutcome::ConnectionLost(message.to_string()), false)
        }
        TransactionStatus::InError => {
            if let Err(e) = tx.rollback() {
                warn!("[{}] Rollback failed: {}", ingestion_id, e);
            }
            let message = "database error: transaction failed; all changes rolled back";
            error!("[{}] {}", ingestion_id, message);
            report.add_error(message);
            (CommitOutcome::RolledBack(message.to_string()), false)
        }
        TransactionStatus::Idle => {
            if let Err(e) = tx.rollback() {
                warn!("[{}] Rollback failed: {}", ingestion_id, e);
            }
            warn!("[{}] Transaction idle at commit time", ingestion_id);
            report.add_error("no changes: no rows were inserted");
            (CommitOutcome::NoChanges, false)
        }
        TransactionStatus::Active => match tx.commit() {
            Ok(()) => {
                debug!("[{}] Committed", ingestion_id);
                (CommitOutcome::Committed, false)
            }
            Err(e @ RepositoryError::ConnectionError { .. }) => {
                error!("[{}] Commit failed: {}", ingestion_id, e);
                let message = format!("database error: commit failed: {}", e);
                report.add_error(message.clone());
                (CommitOutcome::ConnectionLost(message), false)
            }
            Err(e) => {
                error!("[{}] Commit failed: {}", ingestion_id, e);
                let conflict = e.is_conflict();
                let message = format!("database error: commit failed: {}", e);
                report.add_error(message.clone());
                (CommitOutcome::RolledBack(message), conflict)
            }
        },
    }
}

/// State of one pass of ordered inserts.
struct InsertPass<'t> {
    ingestion_id: IngestionId,
    tx: &'t mut dyn IngestTransaction,
    keys: KeyMap,
    report: ErrorReport,
    /// Rejected rows, not counting a display-name conflict.
    failures: usize,
    conflict: bool,
}

impl InsertPass<'_> {
    fn run(&mut self, prepared: &Prepared) {
        let file = &prepared.file;
        self.insert_design(prepared);
        self.insert_blueprint(prepared);
        self.insert_design_slits(file);
        self.insert_blueprint_slits(file);
        self.insert_objects(file);
        self.insert_slit_objects(file);
        debug!(
            "[{}] Insert pass done: {} keys, {} errors",
            self.ingestion_id,
            self.keys.len(),
            self.report.error_count()
        );
    }

    fn reject(&mut self, message: String) {
        error!("[{}] {}", self.ingestion_id, message);
        self.report.add_error(message);
        self.failures += 1;
    }

    fn report_skipped(&mut self, table: &str, skipped: usize, parent: &str) {
        if skipped > 0 {
            self.report.add_error(format!(
                "{}: {} rows skipped: referenced {} row was not stored",
                table, skipped, parent
            ));
        }
    }

    fn insert_design(&mut self, prepared: &Prepared) {
        let Some(design) = prepared.file.design() else {
            return;
        };
        let row = NewMaskDesign {
            name: design.des_name.clone(),
            author: prepared.author,
            creator: design.des_creator.clone(),
            design_date: design.des_date.clone(),
            declared_slits: saturating_i32(design.declared_slits),
            declared_objects: saturating_i32(design.declared_objects),
            project_name: design.project_name.clone(),
            instrument: design.instrument.trim().to_string(),
            mask_type: design.mask_type.clone(),
            ra_pnt: design.ra_pnt,
            dec_pnt: design.dec_pnt,
            radepnt: design.radepnt.clone(),
            equinox: design.equinox_pnt,
            pa_pnt: design.pa_pnt,
            date_pnt: prepared.date_pnt,
            lst_pnt: design.lst_pnt,
        };
        match self.tx.insert_design(&row) {
            Ok(id) => {
                self.keys
                    .record(StoreTable::MaskDesign, design.des_id, id.value());
            }
            Err(e) => self.reject(format!("MaskDesign row 1: insert failed: {}", e)),
        }
    }

    fn insert_blueprint(&mut self, prepared: &Prepared) {
        let Some(blueprint) = prepared.file.blueprint() else {
            return;
        };
        let Some(design_id) = self.keys.design(blueprint.des_id) else {
            self.report_skipped("MaskBlu", 1, "MaskDesign");
            return;
        };

        let prefix = probe_prefix(&collapse(&blueprint.gui_name));
        let taken: HashSet<String> = match self.tx.live_display_names(&prefix) {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                self.reject(format!("MaskBlu.guiname: display name lookup failed: {}", e));
                return;
            }
        };
        let gui_name = match choose_display_name(&blueprint.gui_name, &taken) {
            Ok(name) => name,
            Err(e) => {
                self.reject(format!("MaskBlu.guiname: {}", e));
                return;
            }
        };
        debug!(
            "[{}] Display name '{}' -> '{}' ({} live names share prefix '{}')",
            self.ingestion_id,
            blueprint.gui_name,
            gui_name,
            taken.len(),
            prefix
        );

        let row = NewMaskBlueprint {
            design_id,
            name: blueprint.blu_name.clone(),
            gui_name,
            observer: prepared.observer,
            creator: blueprint.blu_creator.clone(),
            blueprint_date: blueprint.blu_date.clone(),
            lst_use: blueprint.lst_use,
            date_use: prepared.date_use,
            telescope: blueprint.telescope.trim().to_string(),
            refr_alg: blueprint.refr_alg.clone(),
            atm_temp_c: blueprint.atm_temp_c,
            atm_pressure: blueprint.atm_pressure,
            atm_humidity: blueprint.atm_humidity,
            atm_lapse_rate: blueprint.atm_lapse_rate,
            ref_wavelength: blueprint.ref_wavelength,
            dist_method: blueprint.dist_method.clone(),
            status: MillStatus::Unmilled,
            millseq: None,
        };
        match self.tx.insert_blueprint(&row) {
            Ok(id) => {
                self.keys
                    .record(StoreTable::MaskBlueprint, blueprint.blu_id, id.value());
            }
            Err(e) if e.is_conflict() => {
                let message = format!(
                    "MaskBlu.guiname: display name '{}' was taken by another ingestion",
                    row.gui_name
                );
                warn!("[{}] {}: {}", self.ingestion_id, message, e);
                self.report.add_error(message);
                self.conflict = true;
            }
            Err(e) => self.reject(format!("MaskBlu row 1: insert failed: {}", e)),
        }
    }

    fn insert_design_slits(&mut self, file: &MaskFile) {
        let mut skipped = 0;
        for (idx, slit) in file.design_slits.iter().enumerate() {
            let Some(design_id) = self.keys.design(slit.des_id) else {
                skipped += 1;
                continue;
            };
            let row = NewDesignSlit {
                design_id,
                slit_ra: slit.slit_ra,
                slit_dec: slit.slit_dec,
                slit_type: slit.slit_type,
                slit_length: slit.slit_length,
                slit_length_pa: slit.slit_length_pa,
                slit_width: slit.slit_width,
                slit_width_pa: slit.slit_width_pa,
                slit_name: slit.slit_name.clone(),
            };
            match self.tx.insert_design_slit(&row) {
                Ok(id) => {
                    self.keys
                        .record(StoreTable::DesignSlit, slit.dslit_id, id.value());
                }
                Err(e) => self.reject(format!("DesiSlits row {}: insert failed: {}", idx + 1, e)),
            }
        }
        self.report_skipped("DesiSlits", skipped, "MaskDesign");
    }

    fn insert_blueprint_slits(&mut self, file: &MaskFile) {
        let mut skipped_blueprint = 0;
        let mut skipped_slit = 0;
        for (idx, slit) in file.blueprint_slits.iter().enumerate() {
            let Some(blueprint_id) = self.keys.blueprint(slit.blu_id) else {
                skipped_blueprint += 1;
                continue;
            };
            let Some(design_slit_id) = self.keys.design_slit(slit.dslit_id) else {
                skipped_slit += 1;
                continue;
            };
            let row = NewBlueprintSlit {
                blueprint_id,
                design_slit_id,
                corners: slit.corners,
                bad: false,
            };
            match self.tx.insert_blueprint_slit(&row) {
                Ok(id) => {
                    self.keys
                        .record(StoreTable::BlueprintSlit, slit.bslit_id, id.value());
                }
                Err(e) => self.reject(format!("BluSlits row {}: insert failed: {}", idx + 1, e)),
            }
        }
        self.report_skipped("BluSlits", skipped_blueprint, "MaskBlu");
        self.report_skipped("BluSlits", skipped_slit, "DesiSlits");
    }

    fn insert_objects(&mut self, file: &MaskFile) {
        let catalogs: HashMap<i64, &str> = file
            .catalog_files
            .iter()
            .map(|c| (c.cat_file_pk, c.file_name.as_str()))
            .collect();

        for (idx, object) in file.objects.iter().enumerate() {
            let row_no = idx + 1;
            let row = NewTargetObject {
                name: object.name.clone(),
                ra: object.ra,
                dec: object.dec,
                radesys: object.radesys.clone(),
                equinox: object.equinox,
                mjd_obs: object.mjd_obs.get(),
                magnitude: object.magnitude.get(),
                pass_band: object.pass_band.clone(),
                radial_velocity: object.radial_velocity.get(),
                class: object.class.as_str().to_string(),
                catalog_file: catalogs
                    .get(&object.cat_file_pk)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
            };
            let object_id = match self.tx.insert_object(&row) {
                Ok(id) => id,
                Err(e) => {
                    self.reject(format!("ObjectCat row {}: insert failed: {}", row_no, e));
                    continue;
                }
            };
            self.keys
                .record(StoreTable::TargetObject, object.object_id, object_id.value());

            if object.has_extended_shape() {
                let shape = NewExtendedObject {
                    object_id,
                    major_axis: object.major_axis.get(),
                    major_axis_pa: object.major_axis_pa.get(),
                    minor_axis: object.minor_axis.get(),
                };
                match self.tx.insert_extended_object(&shape) {
                    Ok(()) => {
                        self.keys
                            .record(StoreTable::ExtendedObject, idx as i64, object_id.value());
                    }
                    Err(e) => self.reject(format!(
                        "ObjectCat row {}: extended shape insert failed: {}",
                        row_no, e
                    )),
                }
            }

            if object.has_proper_motion() {
                let motion = NewNearbyObject {
                    object_id,
                    pm_ra: object.pm_ra.get(),
                    pm_dec: object.pm_dec.get(),
                    parallax: object.parallax.get(),
                };
                match self.tx.insert_nearby_object(&motion) {
                    Ok(()) => {
                        self.keys
                            .record(StoreTable::NearbyObject, idx as i64, object_id.value());
                    }
                    Err(e) => self.reject(format!(
                        "ObjectCat row {}: proper motion insert failed: {}",
                        row_no, e
                    )),
                }
            }
        }
    }

    fn insert_slit_objects(&mut self, file: &MaskFile) {
        let mut skipped_design = 0;
        let mut skipped_object = 0;
        let mut skipped_slit = 0;
        for (idx, map) in file.slit_objects.iter().enumerate() {
            let Some(design_id) = self.keys.design(map.des_id) else {
                skipped_design += 1;
                continue;
            };
            let Some(object_id) = self.keys.object(map.object_id) else {
                skipped_object += 1;
                continue;
            };
            let Some(design_slit_id) = self.keys.design_slit(map.dslit_id) else {
                skipped_slit += 1;
                continue;
            };
            let row = NewSlitObjectMapping {
                design_id,
                object_id,
                design_slit_id,
                top_dist: map.top_dist,
                bot_dist: map.bot_dist,
            };
            match self.tx.insert_slit_object(&row) {
                Ok(id) => {
                    self.keys
                        .record(StoreTable::SlitObjectMapping, idx as i64, id.value());
                }
                Err(e) => self.reject(format!("SlitObjMap row {}: insert failed: {}", idx + 1, e)),
            }
        }
        self.report_skipped("SlitObjMap", skipped_design, "MaskDesign");
        self.report_skipped("SlitObjMap", skipped_object, "ObjectCat");
        self.report_skipped("SlitObjMap", skipped_slit, "DesiSlits");
    }
}

fn saturating_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::mdf::sample::{SampleMdf, SAMPLE_AUTHOR, SAMPLE_OBSERVER};
    use crate::mdf::MemoryContainer;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn setup() -> (Arc<LocalRepository>, Ingestor) {
        let repo = Arc::new(LocalRepository::new());
        repo.add_observer("ada@example.org", "Ada Author");
        repo.add_observer("otto@example.org", "Otto Observer");
        let ingestor = Ingestor::new(repo.clone());
        (repo, ingestor)
    }

    #[test]
    fn test_sample_is_stored() {
        let (repo, ingestor) = setup();
        let outcome = ingestor.ingest_container_on(&SampleMdf::new().build(), today());
        assert!(outcome.success, "{:?}", outcome.errors);
        assert_eq!(outcome.commit, Some(CommitOutcome::Committed));

        let keys = outcome.key_map.unwrap();
        assert!(keys.design_id().is_some());
        assert_eq!(keys.blueprint_ids().len(), 1);
        assert_eq!(keys.len_for(StoreTable::DesignSlit), 4);

        let counts = repo.table_counts().unwrap();
        assert_eq!(counts.designs, 1);
        assert_eq!(counts.blueprint_slits, 4);
        assert_eq!(counts.extended_objects, 1);
        assert_eq!(counts.nearby_objects, 1);
    }

    #[test]
    fn test_validation_failure_opens_no_transaction() {
        let (repo, ingestor) = setup();
        let outcome = ingestor
            .ingest_container_on(&SampleMdf::new().instrument("IRCAL").build(), today());
        assert!(!outcome.success);
        assert_eq!(outcome.commit, None);
        assert!(outcome.key_map.is_none());
        assert_eq!(repo.table_counts().unwrap().total(), 0);
    }

    #[test]
    fn test_unregistered_observer_is_rejected() {
        let repo = Arc::new(LocalRepository::new());
        repo.add_observer("ada@example.org", "Ada Author");
        let ingestor = Ingestor::new(repo.clone());
        let outcome = ingestor.ingest_container_on(&SampleMdf::new().build(), today());
        assert!(!outcome.success);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains(SAMPLE_OBSERVER));
        assert!(!outcome.errors[0].contains(SAMPLE_AUTHOR));
    }

    #[test]
    fn test_structural_failure_stops_before_loading() {
        let (_repo, ingestor) = setup();
        let mut container = SampleMdf::new().build();
        container.remove_table("ObjectCat");
        let outcome = ingestor.ingest_container_on(&container, today());
        assert_eq!(outcome.errors, vec!["missing required table ObjectCat"]);
    }

    #[test]
    fn test_empty_container() {
        let (_repo, ingestor) = setup();
        let outcome = ingestor.ingest_container_on(&MemoryContainer::new("empty"), today());
        assert!(!outcome.success);
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn test_validate_container_is_repeatable() {
        let (_repo, ingestor) = setup();
        let container = SampleMdf::new().declared_slits(5).build();
        let first = ingestor.validate_container(&container, today());
        let second = ingestor.validate_container(&container, today());
        assert_eq!(first, second);
        assert_eq!(first.error_count(), 1);
    }

    #[test]
    fn test_display_name_is_probed() {
        let (repo, ingestor) = setup();
        repo.seed_display_name("NGC1234");
        let outcome = ingestor.ingest_container_on(&SampleMdf::new().build(), today());
        assert!(outcome.success, "{:?}", outcome.errors);
        let id = outcome.key_map.unwrap().blueprint_ids()[0];
        let blueprint = repo.get_blueprint(id).unwrap().unwrap();
        assert_eq!(blueprint.gui_name, "NGC1234A");
        assert_eq!(blueprint.status, MillStatus::Unmilled);
    }

    #[test]
    fn test_saturating_i32() {
        assert_eq!(saturating_i32(4), 4);
        assert_eq!(saturating_i32(i64::MAX), i32::MAX);
        assert_eq!(saturating_i32(i64::MIN), i32::MIN);
    }
}

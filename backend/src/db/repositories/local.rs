//! In-memory repository for tests and local development.
//!
//! Committed rows live behind one `RwLock`. A transaction stages its rows
//! privately and publishes them in one step on commit, so readers never see a
//! half-ingested mask. Keys come from per-table counters and are never reused,
//! even when a transaction rolls back.

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::api::{
    BlueprintId, BlueprintSlitId, DesignId, DesignSlitId, ObjectId, ObserverId, SlitObjectId,
};
use crate::db::models::{
    BlueprintRecord, BlueprintSlitRecord, NewBlueprintSlit, NewDesignSlit, NewExtendedObject,
    NewMaskBlueprint, NewMaskDesign, NewNearbyObject, NewSlitObjectMapping, NewTargetObject,
    StoreTable, TableCounts,
};
use crate::db::repository::{
    ErrorContext, IdentityDirectory, IngestTransaction, MaskRepository, RepositoryError,
    RepositoryResult, TransactionStatus,
};
use crate::models::MillStatus;

#[derive(Debug, Clone)]
struct Observer {
    id: ObserverId,
    address: String,
    name: String,
}

/// Rows of every ingestion table.
#[derive(Debug, Default)]
struct Tables {
    designs: BTreeMap<DesignId, NewMaskDesign>,
    blueprints: BTreeMap<BlueprintId, NewMaskBlueprint>,
    design_slits: BTreeMap<DesignSlitId, NewDesignSlit>,
    blueprint_slits: BTreeMap<BlueprintSlitId, NewBlueprintSlit>,
    objects: BTreeMap<ObjectId, NewTargetObject>,
    extended_objects: Vec<NewExtendedObject>,
    nearby_objects: Vec<NewNearbyObject>,
    slit_objects: BTreeMap<SlitObjectId, NewSlitObjectMapping>,
}

impl Tables {
    fn is_empty(&self) -> bool {
        self.designs.is_empty()
            && self.blueprints.is_empty()
            && self.design_slits.is_empty()
            && self.blueprint_slits.is_empty()
            && self.objects.is_empty()
            && self.extended_objects.is_empty()
            && self.nearby_objects.is_empty()
            && self.slit_objects.is_empty()
    }

    fn live_names(&self) -> impl Iterator<Item = &str> {
        self.blueprints
            .values()
            .filter(|b| b.status.is_live())
            .map(|b| b.gui_name.as_str())
    }

    fn absorb(&mut self, staged: Tables) {
        self.designs.extend(staged.designs);
        self.blueprints.extend(staged.blueprints);
        self.design_slits.extend(staged.design_slits);
        self.blueprint_slits.extend(staged.blueprint_slits);
        self.objects.extend(staged.objects);
        self.extended_objects.extend(staged.extended_objects);
        self.nearby_objects.extend(staged.nearby_objects);
        self.slit_objects.extend(staged.slit_objects);
    }
}

#[derive(Debug, Default)]
struct LocalData {
    tables: Tables,
    observers: Vec<Observer>,
    next_ids: HashMap<StoreTable, i64>,
    next_observer: i64,
}

impl LocalData {
    fn allocate(&mut self, table: StoreTable) -> i64 {
        let next = self.next_ids.entry(table).or_insert(0);
        *next += 1;
        *next
    }
}

/// Failure modes a test can switch on.
#[derive(Debug)]
struct Faults {
    healthy: bool,
    failing_tables: HashSet<StoreTable>,
    status: Option<TransactionStatus>,
    lose_connection_on_commit: bool,
    race_display_name: Option<String>,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            healthy: true,
            failing_tables: HashSet::new(),
            status: None,
            lose_connection_on_commit: false,
            race_display_name: None,
        }
    }
}

/// In-memory implementation of [`MaskRepository`] and [`IdentityDirectory`].
///
/// Enforces the same constraints as the Postgres schema: foreign keys must
/// point at existing rows, and display names are unique among live
/// blueprints, checked at insert and again at commit.
#[derive(Debug, Default)]
pub struct LocalRepository {
    data: RwLock<LocalData>,
    faults: Mutex<Faults>,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer that mailboxes can resolve to.
    pub fn add_observer(&self, address: &str, name: &str) -> ObserverId {
        let mut data = self.data.write();
        data.next_observer += 1;
        let id = ObserverId(data.next_observer);
        data.observers.push(Observer {
            id,
            address: address.trim().to_string(),
            name: name.to_string(),
        });
        debug!("Registered observer {} <{}> as {}", name, address, id);
        id
    }

    /// Name of a registered observer.
    pub fn observer_name(&self, id: ObserverId) -> Option<String> {
        self.data
            .read()
            .observers
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.name.clone())
    }

    /// Commit a placeholder design and a live blueprint holding `gui_name`.
    pub fn seed_display_name(&self, gui_name: &str) -> BlueprintId {
        let mut data = self.data.write();
        Self::commit_placeholder(&mut data, gui_name)
    }

    /// Move a committed blueprint through the mill lifecycle.
    pub fn set_blueprint_status(&self, id: BlueprintId, status: MillStatus) -> RepositoryResult<()> {
        let mut data = self.data.write();
        let blueprint = data.tables.blueprints.get_mut(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("blueprint {} not found", id),
                ErrorContext::new("set_blueprint_status")
                    .with_entity(BlueprintId::TABLE)
                    .with_entity_id(id),
            )
        })?;
        blueprint.status = status;
        Ok(())
    }

    pub fn design(&self, id: DesignId) -> Option<NewMaskDesign> {
        self.data.read().tables.designs.get(&id).cloned()
    }

    pub fn design_slit(&self, id: DesignSlitId) -> Option<NewDesignSlit> {
        self.data.read().tables.design_slits.get(&id).cloned()
    }

    pub fn object(&self, id: ObjectId) -> Option<NewTargetObject> {
        self.data.read().tables.objects.get(&id).cloned()
    }

    pub fn slit_object(&self, id: SlitObjectId) -> Option<NewSlitObjectMapping> {
        self.data.read().tables.slit_objects.get(&id).cloned()
    }

    pub fn extended_object(&self, id: ObjectId) -> Option<NewExtendedObject> {
        self.data
            .read()
            .tables
            .extended_objects
            .iter()
            .find(|e| e.object_id == id)
            .cloned()
    }

    pub fn nearby_object(&self, id: ObjectId) -> Option<NewNearbyObject> {
        self.data
            .read()
            .tables
            .nearby_objects
            .iter()
            .find(|n| n.object_id == id)
            .cloned()
    }

    // ==================== Fault injection ====================

    /// Report the datastore unreachable: health checks fail and no
    /// transaction can be opened.
    pub fn set_healthy(&self, healthy: bool) {
        self.faults.lock().healthy = healthy;
    }

    /// Reject every insert into `table`.
    pub fn fail_inserts_into(&self, table: StoreTable) {
        self.faults.lock().failing_tables.insert(table);
    }

    /// Make open transactions report `status` before commit.
    pub fn simulate_status(&self, status: Option<TransactionStatus>) {
        self.faults.lock().status = status;
    }

    /// Drop the connection when the next commit is attempted.
    pub fn lose_connection_on_commit(&self, lose: bool) {
        self.faults.lock().lose_connection_on_commit = lose;
    }

    /// Let a competing ingestion commit a blueprint named `gui_name` right
    /// after the next display-name probe.
    pub fn race_display_name(&self, gui_name: &str) {
        self.faults.lock().race_display_name = Some(gui_name.to_string());
    }

    /// Clear every injected fault.
    pub fn clear_faults(&self) {
        *self.faults.lock() = Faults::default();
    }

    fn commit_placeholder(data: &mut LocalData, gui_name: &str) -> BlueprintId {
        let design_id = DesignId(data.allocate(StoreTable::MaskDesign));
        data.tables.designs.insert(
            design_id,
            NewMaskDesign {
                name: format!("placeholder for {}", gui_name),
                author: ObserverId(0),
                creator: None,
                design_date: String::new(),
                declared_slits: 0,
                declared_objects: 0,
                project_name: None,
                instrument: String::new(),
                mask_type: None,
                ra_pnt: 0.0,
                dec_pnt: 0.0,
                radepnt: None,
                equinox: 2000.0,
                pa_pnt: 0.0,
                date_pnt: chrono::NaiveDate::MIN,
                lst_pnt: None,
            },
        );
        let blueprint_id = BlueprintId(data.allocate(StoreTable::MaskBlueprint));
        data.tables.blueprints.insert(
            blueprint_id,
            NewMaskBlueprint {
                design_id,
                name: format!("placeholder for {}", gui_name),
                gui_name: gui_name.to_string(),
                observer: ObserverId(0),
                creator: None,
                blueprint_date: None,
                lst_use: None,
                date_use: chrono::NaiveDate::MIN,
                telescope: String::new(),
                refr_alg: None,
                atm_temp_c: None,
                atm_pressure: None,
                atm_humidity: None,
                atm_lapse_rate: None,
                ref_wavelength: None,
                dist_method: None,
                status: MillStatus::Unmilled,
                millseq: None,
            },
        );
        blueprint_id
    }
}

impl MaskRepository for LocalRepository {
    fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.faults.lock().healthy)
    }

    fn begin(&self) -> RepositoryResult<Box<dyn IngestTransaction + '_>> {
        if !self.faults.lock().healthy {
            return Err(RepositoryError::connection_with_context(
                "local repository marked unhealthy",
                ErrorContext::new("begin"),
            ));
        }
        Ok(Box::new(LocalTransaction {
            repo: self,
            staged: Tables::default(),
            finished: false,
        }))
    }

    fn get_blueprint(&self, id: BlueprintId) -> RepositoryResult<Option<BlueprintRecord>> {
        let data = self.data.read();
        Ok(data.tables.blueprints.get(&id).map(|b| BlueprintRecord {
            id,
            design_id: b.design_id,
            name: b.name.clone(),
            gui_name: b.gui_name.clone(),
            observer: b.observer,
            telescope: b.telescope.clone(),
            date_use: b.date_use,
            status: b.status,
            millseq: b.millseq.clone(),
        }))
    }

    fn blueprint_slits(&self, id: BlueprintId) -> RepositoryResult<Vec<BlueprintSlitRecord>> {
        let data = self.data.read();
        Ok(data
            .tables
            .blueprint_slits
            .iter()
            .filter(|(_, s)| s.blueprint_id == id)
            .map(|(slit_id, s)| BlueprintSlitRecord {
                id: *slit_id,
                blueprint_id: s.blueprint_id,
                design_slit_id: s.design_slit_id,
                corners: s.corners,
                bad: s.bad,
            })
            .collect())
    }

    fn table_counts(&self) -> RepositoryResult<TableCounts> {
        let data = self.data.read();
        let t = &data.tables;
        Ok(TableCounts {
            designs: t.designs.len() as u64,
            blueprints: t.blueprints.len() as u64,
            design_slits: t.design_slits.len() as u64,
            blueprint_slits: t.blueprint_slits.len() as u64,
            objects: t.objects.len() as u64,
            extended_objects: t.extended_objects.len() as u64,
            nearby_objects: t.nearby_objects.len() as u64,
            slit_object_maps: t.slit_objects.len() as u64,
        })
    }
}

impl IdentityDirectory for LocalRepository {
    fn find_by_address(&self, address: &str) -> RepositoryResult<Vec<ObserverId>> {
        let address = address.trim();
        Ok(self
            .data
            .read()
            .observers
            .iter()
            .filter(|o| o.address.eq_ignore_ascii_case(address))
            .map(|o| o.id)
            .collect())
    }
}

/// Staged rows of one ingestion.
struct LocalTransaction<'a> {
    repo: &'a LocalRepository,
    staged: Tables,
    finished: bool,
}

impl LocalTransaction<'_> {
    fn check_fault(&self, table: StoreTable) -> RepositoryResult<()> {
        if self.repo.faults.lock().failing_tables.contains(&table) {
            return Err(RepositoryError::query_with_context(
                "injected insert failure",
                ErrorContext::new("insert").with_entity(table.table_name()),
            ));
        }
        Ok(())
    }

    fn missing_parent(table: StoreTable, parent: StoreTable, id: impl ToString) -> RepositoryError {
        RepositoryError::validation_with_context(
            format!("foreign key violation: {} {} does not exist", parent, id.to_string()),
            ErrorContext::new("insert")
                .with_entity(table.table_name())
                .with_details(format!("references {}", parent)),
        )
    }

    fn has_design(&self, data: &LocalData, id: DesignId) -> bool {
        self.staged.designs.contains_key(&id) || data.tables.designs.contains_key(&id)
    }

    fn has_design_slit(&self, data: &LocalData, id: DesignSlitId) -> bool {
        self.staged.design_slits.contains_key(&id) || data.tables.design_slits.contains_key(&id)
    }

    fn has_object(&self, data: &LocalData, id: ObjectId) -> bool {
        self.staged.objects.contains_key(&id) || data.tables.objects.contains_key(&id)
    }

    fn name_conflict(gui_name: &str) -> RepositoryError {
        RepositoryError::conflict_with_context(
            format!("display name '{}' already used by a live blueprint", gui_name),
            ErrorContext::new("insert").with_entity("mask_blueprints"),
        )
    }
}

impl IngestTransaction for LocalTransaction<'_> {
    fn live_display_names(&mut self, prefix: &str) -> RepositoryResult<Vec<String>> {
        let names: Vec<String> = {
            let data = self.repo.data.read();
            data.tables
                .live_names()
                .chain(self.staged.live_names())
                .filter(|n| n.starts_with(prefix))
                .map(str::to_string)
                .collect()
        };

        let race = self.repo.faults.lock().race_display_name.take();
        if let Some(name) = race {
            let mut data = self.repo.data.write();
            let id = LocalRepository::commit_placeholder(&mut data, &name);
            debug!("Competing ingestion committed blueprint {} as '{}'", id, name);
        }
        Ok(names)
    }

    fn insert_design(&mut self, row: &NewMaskDesign) -> RepositoryResult<DesignId> {
        self.check_fault(StoreTable::MaskDesign)?;
        let id = DesignId(self.repo.data.write().allocate(StoreTable::MaskDesign));
        self.staged.designs.insert(id, row.clone());
        Ok(id)
    }

    fn insert_blueprint(&mut self, row: &NewMaskBlueprint) -> RepositoryResult<BlueprintId> {
        self.check_fault(StoreTable::MaskBlueprint)?;
        let mut data = self.repo.data.write();
        if !self.has_design(&data, row.design_id) {
            return Err(Self::missing_parent(
                StoreTable::MaskBlueprint,
                StoreTable::MaskDesign,
                row.design_id,
            ));
        }
        if row.status.is_live() {
            let taken = data
                .tables
                .live_names()
                .chain(self.staged.live_names())
                .any(|n| n == row.gui_name);
            if taken {
                return Err(Self::name_conflict(&row.gui_name));
            }
        }
        let id = BlueprintId(data.allocate(StoreTable::MaskBlueprint));
        self.staged.blueprints.insert(id, row.clone());
        Ok(id)
    }

    fn insert_design_slit(&mut self, row: &NewDesignSlit) -> RepositoryResult<DesignSlitId> {
        self.check_fault(StoreTable::DesignSlit)?;
        let mut data = self.repo.data.write();
        if !self.has_design(&data, row.design_id) {
            return Err(Self::missing_parent(
                StoreTable::DesignSlit,
                StoreTable::MaskDesign,
                row.design_id,
            ));
        }
        let id = DesignSlitId(data.allocate(StoreTable::DesignSlit));
        self.staged.design_slits.insert(id, row.clone());
        Ok(id)
    }

    fn insert_blueprint_slit(
        &mut self,
        row: &NewBlueprintSlit,
    ) -> RepositoryResult<BlueprintSlitId> {
        self.check_fault(StoreTable::BlueprintSlit)?;
        let mut data = self.repo.data.write();
        let blueprint_known = self.staged.blueprints.contains_key(&row.blueprint_id)
            || data.tables.blueprints.contains_key(&row.blueprint_id);
        if !blueprint_known {
            return Err(Self::missing_parent(
                StoreTable::BlueprintSlit,
                StoreTable::MaskBlueprint,
                row.blueprint_id,
            ));
        }
        if !self.has_design_slit(&data, row.design_slit_id) {
            return Err(Self::missing_parent(
                StoreTable::BlueprintSlit,
                StoreTable::DesignSlit,
                row.design_slit_id,
            ));
        }
        let id = BlueprintSlitId(data.allocate(StoreTable::BlueprintSlit));
        self.staged.blueprint_slits.insert(id, row.clone());
        Ok(id)
    }

    fn insert_object(&mut self, row: &NewTargetObject) -> RepositoryResult<ObjectId> {
        self.check_fault(StoreTable::TargetObject)?;
        let id = ObjectId(self.repo.data.write().allocate(StoreTable::TargetObject));
        self.staged.objects.insert(id, row.clone());
        Ok(id)
    }

    fn insert_extended_object(&mut self, row: &NewExtendedObject) -> RepositoryResult<()> {
        self.check_fault(StoreTable::ExtendedObject)?;
        let data = self.repo.data.read();
        if !self.has_object(&data, row.object_id) {
            return Err(Self::missing_parent(
                StoreTable::ExtendedObject,
                StoreTable::TargetObject,
                row.object_id,
            ));
        }
        drop(data);
        self.staged.extended_objects.push(row.clone());
        Ok(())
    }

    fn insert_nearby_object(&mut self, row: &NewNearbyObject) -> RepositoryResult<()> {
        self.check_fault(StoreTable::NearbyObject)?;
        let data = self.repo.data.read();
        if !self.has_object(&data, row.object_id) {
            return Err(Self::missing_parent(
                StoreTable::NearbyObject,
                StoreTable::TargetObject,
                row.object_id,
            ));
        }
        drop(data);
        self.staged.nearby_objects.push(row.clone());
        Ok(())
    }

    fn insert_slit_object(
        &mut self,
        row: &NewSlitObjectMapping,
    ) -> RepositoryResult<SlitObjectId> {
        self.check_fault(StoreTable::SlitObjectMapping)?;
        let mut data = self.repo.data.write();
        let parents = [
            (self.has_design(&data, row.design_id), StoreTable::MaskDesign, row.design_id.value()),
            (self.has_object(&data, row.object_id), StoreTable::TargetObject, row.object_id.value()),
            (
                self.has_design_slit(&data, row.design_slit_id),
                StoreTable::DesignSlit,
                row.design_slit_id.value(),
            ),
        ];
        if let Some((_, parent, key)) = parents.iter().find(|(known, _, _)| !known) {
            return Err(Self::missing_parent(StoreTable::SlitObjectMapping, *parent, key));
        }
        let id = SlitObjectId(data.allocate(StoreTable::SlitObjectMapping));
        self.staged.slit_objects.insert(id, row.clone());
        Ok(id)
    }

    fn status(&mut self) -> TransactionStatus {
        if let Some(status) = self.repo.faults.lock().status {
            return status;
        }
        if self.staged.is_empty() {
            TransactionStatus::Idle
        } else {
            TransactionStatus::Active
        }
    }

    fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        self.finished = true;
        if std::mem::take(&mut self.repo.faults.lock().lose_connection_on_commit) {
            warn!("Local repository dropped the connection during commit");
            return Err(RepositoryError::connection_with_context(
                "connection lost during commit",
                ErrorContext::new("commit"),
            ));
        }

        let staged = std::mem::take(&mut self.staged);
        let mut data = self.repo.data.write();

        let committed: HashSet<&str> = data.tables.live_names().collect();
        if let Some(clash) = staged
            .live_names()
            .find(|name| committed.contains(name))
        {
            return Err(RepositoryError::conflict_with_context(
                format!("display name '{}' was committed by another transaction", clash),
                ErrorContext::new("commit").with_entity("mask_blueprints"),
            ));
        }

        let counts = (
            staged.designs.len(),
            staged.blueprints.len(),
            staged.design_slits.len(),
            staged.objects.len(),
        );
        data.tables.absorb(staged);
        info!(
            "Committed {} designs, {} blueprints, {} slits, {} objects",
            counts.0, counts.1, counts.2, counts.3
        );
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        self.finished = true;
        debug!("Rolled back local transaction");
        Ok(())
    }
}

impl Drop for LocalTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            debug!("Local transaction dropped without commit; staged rows discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn design() -> NewMaskDesign {
        NewMaskDesign {
            name: "d".into(),
            author: ObserverId(1),
            creator: None,
            design_date: "2024-01-01".into(),
            declared_slits: 0,
            declared_objects: 0,
            project_name: None,
            instrument: "DEIMOS".into(),
            mask_type: None,
            ra_pnt: 1.0,
            dec_pnt: 2.0,
            radepnt: None,
            equinox: 2000.0,
            pa_pnt: 0.0,
            date_pnt: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            lst_pnt: None,
        }
    }

    fn blueprint(design_id: DesignId, gui_name: &str) -> NewMaskBlueprint {
        NewMaskBlueprint {
            design_id,
            name: "b".into(),
            gui_name: gui_name.into(),
            observer: ObserverId(1),
            creator: None,
            blueprint_date: None,
            lst_use: None,
            date_use: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            telescope: "Keck II".into(),
            refr_alg: None,
            atm_temp_c: None,
            atm_pressure: None,
            atm_humidity: None,
            atm_lapse_rate: None,
            ref_wavelength: None,
            dist_method: None,
            status: MillStatus::Unmilled,
            millseq: None,
        }
    }

    #[test]
    fn test_commit_publishes_staged_rows() {
        let repo = LocalRepository::new();
        let mut tx = repo.begin().unwrap();
        assert_eq!(tx.status(), TransactionStatus::Idle);
        let d = tx.insert_design(&design()).unwrap();
        let b = tx.insert_blueprint(&blueprint(d, "MASK1")).unwrap();
        assert_eq!(tx.status(), TransactionStatus::Active);
        assert_eq!(repo.table_counts().unwrap().total(), 0);
        tx.commit().unwrap();

        assert_eq!(repo.table_counts().unwrap().designs, 1);
        assert_eq!(repo.get_blueprint(b).unwrap().unwrap().gui_name, "MASK1");
    }

    #[test]
    fn test_rollback_and_drop_discard_rows_but_not_keys() {
        let repo = LocalRepository::new();
        let mut tx = repo.begin().unwrap();
        let first = tx.insert_design(&design()).unwrap();
        tx.rollback().unwrap();
        {
            let mut tx = repo.begin().unwrap();
            tx.insert_design(&design()).unwrap();
        }
        assert_eq!(repo.table_counts().unwrap().total(), 0);

        let mut tx = repo.begin().unwrap();
        let third = tx.insert_design(&design()).unwrap();
        assert!(third > first);
        assert_eq!(third, DesignId(3));
    }

    #[test]
    fn test_foreign_keys_are_checked() {
        let repo = LocalRepository::new();
        let mut tx = repo.begin().unwrap();
        let err = tx.insert_blueprint(&blueprint(DesignId(99), "X")).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert!(err.to_string().contains("mask_designs 99"));
    }

    #[test]
    fn test_display_name_conflicts() {
        let repo = LocalRepository::new();
        repo.seed_display_name("TAKEN");
        let mut tx = repo.begin().unwrap();
        let d = tx.insert_design(&design()).unwrap();
        let err = tx.insert_blueprint(&blueprint(d, "TAKEN")).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(tx.live_display_names("TA").unwrap(), vec!["TAKEN"]);
    }

    #[test]
    fn test_archived_blueprint_frees_its_name() {
        let repo = LocalRepository::new();
        let old = repo.seed_display_name("REUSE");
        repo.set_blueprint_status(old, MillStatus::Archived).unwrap();
        let mut tx = repo.begin().unwrap();
        assert!(tx.live_display_names("RE").unwrap().is_empty());
        let d = tx.insert_design(&design()).unwrap();
        tx.insert_blueprint(&blueprint(d, "REUSE")).unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_commit_rechecks_display_names() {
        let repo = LocalRepository::new();
        let mut tx = repo.begin().unwrap();
        let d = tx.insert_design(&design()).unwrap();
        tx.insert_blueprint(&blueprint(d, "RACE")).unwrap();
        repo.seed_display_name("RACE");
        let err = tx.commit().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.table_counts().unwrap().designs, 1);
    }

    #[test]
    fn test_identity_lookup_is_case_insensitive() {
        let repo = LocalRepository::new();
        let id = repo.add_observer("Ada@Example.org", "Ada");
        repo.add_observer("bob@example.org", "Bob");
        assert_eq!(repo.find_by_address("ada@EXAMPLE.org").unwrap(), vec![id]);
        assert!(repo.find_by_address("eve@example.org").unwrap().is_empty());
        assert_eq!(repo.observer_name(id).as_deref(), Some("Ada"));
    }

    #[test]
    fn test_faults() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().unwrap());
        assert!(repo.begin().is_err());
        repo.clear_faults();

        repo.fail_inserts_into(StoreTable::MaskDesign);
        let mut tx = repo.begin().unwrap();
        assert!(tx.insert_design(&design()).is_err());
        repo.clear_faults();
        let d = tx.insert_design(&design()).unwrap();
        tx.insert_blueprint(&blueprint(d, "LOST")).unwrap();

        repo.simulate_status(Some(TransactionStatus::InError));
        assert_eq!(tx.status(), TransactionStatus::InError);
        repo.simulate_status(None);

        repo.lose_connection_on_commit(true);
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert_eq!(repo.table_counts().unwrap().total(), 0);
    }
}

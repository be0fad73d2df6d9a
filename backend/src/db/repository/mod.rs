//! Repository traits for the mask database.
//!
//! Ingestion talks to the datastore through two seams:
//! - [`MaskRepository`]: connection-level operations (health, opening an
//!   ingestion transaction, read-back helpers for downstream tools)
//! - [`IngestTransaction`]: one open transaction, with an insert per table
//!
//! Identity lookups go through [`IdentityDirectory`], which the same backends
//! implement against their `observers` table.
//!
//! All calls are blocking. Async callers go through
//! [`crate::services::ingest::Ingestor::ingest_path_async`], which moves the
//! whole ingestion onto a blocking worker.

pub mod error;

use std::sync::Arc;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::api::{
    BlueprintId, BlueprintSlitId, DesignId, DesignSlitId, ObjectId, ObserverId, SlitObjectId,
};
use crate::db::models::{
    BlueprintRecord, BlueprintSlitRecord, NewBlueprintSlit, NewDesignSlit, NewExtendedObject,
    NewMaskBlueprint, NewMaskDesign, NewNearbyObject, NewSlitObjectMapping, NewTargetObject,
    TableCounts,
};

/// State of an open transaction, inspected before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Open, but no statement has been issued.
    Idle,
    /// Statements issued and the transaction can be committed.
    Active,
    /// A statement failed and the transaction must be rolled back.
    InError,
    /// The connection is gone; the state cannot be determined.
    Unknown,
}

/// Connection-level repository operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one repository is shared by every
/// ingestion in the process.
pub trait MaskRepository: Send + Sync {
    /// Check if the datastore is reachable.
    fn health_check(&self) -> RepositoryResult<bool>;

    /// Open a transaction for one ingestion.
    ///
    /// Dropping the returned transaction without committing rolls it back.
    fn begin(&self) -> RepositoryResult<Box<dyn IngestTransaction + '_>>;

    /// Fetch one blueprint.
    ///
    /// # Returns
    /// * `Ok(None)` - No blueprint with this key exists
    fn get_blueprint(&self, id: BlueprintId) -> RepositoryResult<Option<BlueprintRecord>>;

    /// Fetch the slits of a blueprint, ordered by key.
    fn blueprint_slits(&self, id: BlueprintId) -> RepositoryResult<Vec<BlueprintSlitRecord>>;

    /// Committed row counts for every ingestion table.
    fn table_counts(&self) -> RepositoryResult<TableCounts>;
}

/// One open ingestion transaction.
///
/// Insert methods return the datastore-assigned key of the new row. A failing
/// insert leaves the transaction usable so the remaining rows can still be
/// tried and reported.
pub trait IngestTransaction {
    /// Display names of live (non-archived) blueprints starting with `prefix`.
    fn live_display_names(&mut self, prefix: &str) -> RepositoryResult<Vec<String>>;

    fn insert_design(&mut self, row: &NewMaskDesign) -> RepositoryResult<DesignId>;

    /// # Errors
    /// * `RepositoryError::Conflict` - The display name is taken by a live blueprint
    fn insert_blueprint(&mut self, row: &NewMaskBlueprint) -> RepositoryResult<BlueprintId>;

    fn insert_design_slit(&mut self, row: &NewDesignSlit) -> RepositoryResult<DesignSlitId>;

    fn insert_blueprint_slit(&mut self, row: &NewBlueprintSlit)
        -> RepositoryResult<BlueprintSlitId>;

    fn insert_object(&mut self, row: &NewTargetObject) -> RepositoryResult<ObjectId>;

    fn insert_extended_object(&mut self, row: &NewExtendedObject) -> RepositoryResult<()>;

    fn insert_nearby_object(&mut self, row: &NewNearbyObject) -> RepositoryResult<()>;

    fn insert_slit_object(&mut self, row: &NewSlitObjectMapping)
        -> RepositoryResult<SlitObjectId>;

    /// Current state of the transaction.
    fn status(&mut self) -> TransactionStatus;

    /// Commit every row inserted through this transaction.
    fn commit(self: Box<Self>) -> RepositoryResult<()>;

    /// Discard every row inserted through this transaction.
    fn rollback(self: Box<Self>) -> RepositoryResult<()>;
}

/// Directory of registered observers.
pub trait IdentityDirectory: Send + Sync {
    /// Observers registered under `address`, compared case-insensitively.
    fn find_by_address(&self, address: &str) -> RepositoryResult<Vec<ObserverId>>;
}

/// A backend that can both store masks and resolve identities.
pub trait FullRepository: MaskRepository + IdentityDirectory {
    fn into_mask_repository(self: Arc<Self>) -> Arc<dyn MaskRepository>;

    fn into_identity_directory(self: Arc<Self>) -> Arc<dyn IdentityDirectory>;
}

impl<T> FullRepository for T
where
    T: MaskRepository + IdentityDirectory + 'static,
{
    fn into_mask_repository(self: Arc<Self>) -> Arc<dyn MaskRepository> {
        self
    }

    fn into_identity_directory(self: Arc<Self>) -> Arc<dyn IdentityDirectory> {
        self
    }
}

//! Tests for db::repository::error and how repositories report failures.

use maskdb_rust::api::{DesignId, ObserverId};
use maskdb_rust::db::models::{NewDesignSlit, StoreTable};
use maskdb_rust::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use maskdb_rust::db::{IngestTransaction, LocalRepository, MaskRepository};
use maskdb_rust::models::{MillStatus, SlitType};

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("insert_blueprint")
        .with_entity("mask_blueprints")
        .with_entity_id(42)
        .with_details("gui_name=NGC1234")
        .retryable();

    assert_eq!(ctx.operation, Some("insert_blueprint".to_string()));
    assert_eq!(ctx.entity, Some("mask_blueprints".to_string()));
    assert_eq!(ctx.entity_id, Some("42".to_string()));
    assert_eq!(ctx.details, Some("gui_name=NGC1234".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_default_is_empty() {
    let ctx = ErrorContext::default();
    assert!(ctx.operation.is_none());
    assert!(!ctx.retryable);
    assert_eq!(ctx.to_string(), "[]");
}

#[test]
fn test_conflict_is_not_retryable_by_backoff() {
    let err = RepositoryError::conflict("display name taken");
    assert!(err.is_conflict());
    assert!(!err.is_retryable());
    assert!(err.to_string().starts_with("Conflict: display name taken"));
}

#[test]
fn test_retryable_follows_context() {
    let plain = RepositoryError::query("deadlock");
    assert!(!plain.is_retryable());

    let retryable =
        RepositoryError::query_with_context("deadlock", ErrorContext::new("commit").retryable());
    assert!(retryable.is_retryable());
}

#[test]
fn test_validation_error_is_final() {
    let err = RepositoryError::validation("foreign key violation");
    assert!(!err.is_retryable());
    assert!(!err.is_conflict());
    assert_eq!(err.message(), "foreign key violation");
}

#[test]
fn test_configuration_constructor_and_string_conversion() {
    let err = RepositoryError::ConfigurationError("missing url".to_string());
    assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

    let err: RepositoryError = "boom".into();
    assert!(matches!(err, RepositoryError::InternalError { .. }));
}

#[test]
fn test_with_operation_overrides_context() {
    let err = RepositoryError::not_found("blueprint 9")
        .with_operation("get_blueprint")
        .with_entity("mask_blueprints");
    assert_eq!(err.context().operation.as_deref(), Some("get_blueprint"));
    assert_eq!(err.context().entity.as_deref(), Some("mask_blueprints"));
}

fn slit_for(design_id: DesignId) -> NewDesignSlit {
    NewDesignSlit {
        design_id,
        slit_ra: 150.0,
        slit_dec: 2.0,
        slit_type: SlitType::Program,
        slit_length: 8.0,
        slit_length_pa: 0.0,
        slit_width: 1.0,
        slit_width_pa: 0.0,
        slit_name: None,
    }
}

#[test]
fn test_local_foreign_key_violation() {
    let repo = LocalRepository::new();
    let mut tx = repo.begin().unwrap();
    let err = tx.insert_design_slit(&slit_for(DesignId(404))).unwrap_err();
    assert!(matches!(err, RepositoryError::ValidationError { .. }));
    assert!(err.message().contains("foreign key violation"));
}

#[test]
fn test_local_injected_failure_names_table() {
    let repo = LocalRepository::new();
    repo.fail_inserts_into(StoreTable::DesignSlit);
    let mut tx = repo.begin().unwrap();
    let err = tx.insert_design_slit(&slit_for(DesignId(1))).unwrap_err();
    assert_eq!(err.context().entity.as_deref(), Some("design_slits"));
}

#[test]
fn test_local_unknown_blueprint_status_change() {
    let repo = LocalRepository::new();
    let result: RepositoryResult<()> =
        repo.set_blueprint_status(maskdb_rust::api::BlueprintId(5), MillStatus::Archived);
    let err = result.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(err.context().entity_id.as_deref(), Some("5"));
}

#[test]
fn test_local_unhealthy_begin_is_connection_error() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    let err = repo.begin().err().unwrap();
    assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    assert_eq!(repo.observer_name(ObserverId(1)), None);
}

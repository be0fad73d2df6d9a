//! Tests for db::factory module - repository creation and configuration.

mod support;

use std::str::FromStr;
use std::sync::Arc;
use std::io::Write;

use maskdb_rust::db::factory::{RepositoryFactory, RepositoryType};
use maskdb_rust::db::repo_config::CONFIG_ENV_VAR;
use maskdb_rust::db::{IdentityDirectory, MaskRepository, RepositoryConfig};

#[test]
fn test_repository_type_from_str_postgres() {
    let rt = RepositoryType::from_str("postgres").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);

    let rt = RepositoryType::from_str("POSTGRES").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);

    let rt = RepositoryType::from_str("pg").unwrap();
    assert_eq!(rt, RepositoryType::Postgres);
}

#[test]
fn test_repository_type_from_str_local() {
    let rt = RepositoryType::from_str("local").unwrap();
    assert_eq!(rt, RepositoryType::Local);

    let rt = RepositoryType::from_str("LOCAL").unwrap();
    assert_eq!(rt, RepositoryType::Local);
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("invalid");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            let rt = RepositoryType::from_env();
            assert_eq!(rt, RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || {
            let rt = RepositoryType::from_env();
            assert_eq!(rt, RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_with_pg_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", Some("postgres://localhost/test")),
        ],
        || {
            let rt = RepositoryType::from_env();
            assert_eq!(rt, RepositoryType::Postgres);
        },
    );
}

#[test]
fn test_repository_type_from_env_explicit() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("local"))], || {
        let rt = RepositoryType::from_env();
        assert_eq!(rt, RepositoryType::Local);
    });
}

#[test]
fn test_repository_type_from_env_explicit_postgres() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("postgres"))], || {
        let rt = RepositoryType::from_env();
        assert_eq!(rt, RepositoryType::Postgres);
    });
}

#[test]
fn test_repository_type_from_env_invalid_defaults_to_local() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("invalid")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            let rt = RepositoryType::from_env();
            assert_eq!(rt, RepositoryType::Local);
        },
    );
}

#[test]
fn test_create_local_repository() {
    let repo = RepositoryFactory::create_local();
    // Just verify the repository was created successfully
    let ptr = Arc::as_ptr(&repo) as *const ();
    assert!(!ptr.is_null());
}

#[tokio::test]
async fn test_create_local_via_factory() {
    let result = RepositoryFactory::create(RepositoryType::Local, None).await;
    assert!(result.is_ok());
}

#[cfg(feature = "postgres-repo")]
#[tokio::test]
async fn test_create_postgres_without_config_fails() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(result.is_err());
    assert!(result
        .err()
        .unwrap()
        .to_string()
        .contains("requires PostgresConfig"));
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_create_postgres_without_feature_fails() {
    let result = RepositoryFactory::create(RepositoryType::Postgres, None).await;
    assert!(result.is_err());
    let err = result.err().unwrap();
    assert!(err.to_string().contains("feature not enabled"));
}

#[test]
fn test_repository_type_partial_eq() {
    assert_eq!(RepositoryType::Local, RepositoryType::Local);
    assert_ne!(RepositoryType::Local, RepositoryType::Postgres);
}

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

const LOCAL_CONFIG: &str = r#"
[repository]
type = "local"

[ingest]
display_name_retries = 4

[[local.observers]]
email = "otto@example.org"
name = "Otto Observer"
"#;

#[test]
fn test_config_from_env_var_location() {
    let file = write_config(LOCAL_CONFIG);
    let path = file.path().to_string_lossy().into_owned();

    support::with_scoped_env(&[(CONFIG_ENV_VAR, Some(path.as_str()))], || {
        let config = RepositoryConfig::from_default_location().unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert_eq!(config.ingest_settings().display_name_retries, 4);
    });
}

#[test]
fn test_config_env_var_pointing_nowhere_fails() {
    support::with_scoped_env(
        &[(CONFIG_ENV_VAR, Some("/nonexistent/maskdb/ingest.toml"))],
        || {
            let err = RepositoryConfig::from_default_location().unwrap_err();
            assert!(err.to_string().contains("Failed to read config file"));
        },
    );
}

#[tokio::test]
async fn test_from_config_file_seeds_local_observers() {
    let file = write_config(LOCAL_CONFIG);
    let repo = RepositoryFactory::from_config_file(file.path()).await.unwrap();
    assert!(repo.health_check().unwrap());

    let directory = repo.into_identity_directory();
    assert_eq!(directory.find_by_address("otto@example.org").unwrap().len(), 1);
    assert!(directory.find_by_address("ada@example.org").unwrap().is_empty());
}

#[tokio::test]
async fn test_loaded_config_builds_empty_local_store() {
    let file = write_config(LOCAL_CONFIG);
    let config = RepositoryConfig::from_file(file.path()).unwrap();
    let repo = RepositoryFactory::from_repository_config(&config)
        .await
        .unwrap();
    assert_eq!(repo.table_counts().unwrap().total(), 0);
}

#[cfg(not(feature = "postgres-repo"))]
#[tokio::test]
async fn test_postgres_config_without_feature_fails() {
    let file = write_config("[repository]\ntype = \"postgres\"\n");
    let err = RepositoryFactory::from_config_file(file.path())
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("feature not enabled"));
}

#[tokio::test]
async fn test_from_config_file_rejects_unknown_type() {
    let file = write_config("[repository]\ntype = \"sqlite\"\n");
    let err = RepositoryFactory::from_config_file(file.path())
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("Invalid repository type"));
}

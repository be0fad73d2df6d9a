//! Backend selection and construction.
//!
//! A backend is chosen from `ingest.toml` (see [`RepositoryConfig`]) or, when
//! no file is present, from `REPOSITORY_TYPE` / `DATABASE_URL`. Local backends
//! built from a configuration file come pre-seeded with its observers.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::{ObserverEntry, RepositoryConfig};
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;

/// Which datastore backs the mask tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel implementation
    Postgres,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// `REPOSITORY_TYPE` if set, else Postgres when a database URL is present.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

/// Builds the repository an [`Ingestor`](crate::services::Ingestor) writes through.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of the given type.
    ///
    /// # Arguments
    /// * `repo_type` - Backend to create
    /// * `postgres_config` - Connection settings, required for Postgres
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => Self::connect(postgres_config).await,
        }
    }

    #[cfg(feature = "postgres-repo")]
    async fn connect(
        config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = config.ok_or_else(|| {
            RepositoryError::ConfigurationError(
                "Postgres repository requires PostgresConfig".to_string(),
            )
        })?;
        let pg = Self::create_postgres(config).await?;
        Ok(pg as Arc<dyn FullRepository>)
    }

    #[cfg(not(feature = "postgres-repo"))]
    async fn connect(
        _config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        Err(RepositoryError::ConfigurationError(
            "Postgres repository feature not enabled".to_string(),
        ))
    }

    /// Open the Postgres pool and run pending migrations.
    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        // Pool setup and migrations block; keep them off the async workers.
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| {
                RepositoryError::internal_with_context(
                    format!("Postgres initialisation task failed: {}", e),
                    crate::db::repository::ErrorContext::new("create_postgres"),
                )
            })??;
        Ok(Arc::new(repo))
    }

    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// In-memory repository whose identity directory knows `observers`.
    pub fn create_local_with_observers(observers: &[ObserverEntry]) -> Arc<dyn FullRepository> {
        let repo = LocalRepository::new();
        for observer in observers {
            repo.add_observer(&observer.email, &observer.name);
        }
        log::debug!("Local repository seeded with {} observers", observers.len());
        Arc::new(repo)
    }

    /// Repository chosen by [`RepositoryType::from_env`].
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryType::from_env() {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                let config =
                    Some(PostgresConfig::from_env().map_err(RepositoryError::ConfigurationError)?);
                #[cfg(not(feature = "postgres-repo"))]
                let config = None;
                Self::connect(config.as_ref()).await
            }
        }
    }

    /// Load `config_path` and build the repository it describes.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Build the repository described by an already loaded configuration.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConfigurationError)` - unknown type, or Postgres
    ///   without a `database_url` or without the `postgres-repo` feature
    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type().map_err(|e| {
            RepositoryError::ConfigurationError(format!("Invalid repository type: {}", e))
        })?;

        match repo_type {
            RepositoryType::Local => Ok(Self::create_local_with_observers(&config.local.observers)),
            RepositoryType::Postgres => {
                let pg_config = config.to_postgres_config()?;
                Self::connect(pg_config.as_ref()).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{IdentityDirectory, MaskRepository};

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(
            RepositoryType::from_str("local").unwrap(),
            RepositoryType::Local
        );
        assert_eq!(
            RepositoryType::from_str("postgres").unwrap(),
            RepositoryType::Postgres
        );
        assert_eq!(
            RepositoryType::from_str("Pg").unwrap(),
            RepositoryType::Postgres
        );
        assert!(RepositoryType::from_str("invalid").is_err());
    }

    #[test]
    fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().unwrap());
    }

    #[tokio::test]
    async fn test_create_local_by_type() {
        let repo = RepositoryFactory::create(RepositoryType::Local, None)
            .await
            .unwrap();
        assert_eq!(repo.table_counts().unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_local_config_registers_observers() {
        let config = RepositoryConfig::from_toml_str(
            r#"
[repository]
type = "local"

[[local.observers]]
email = "ada@example.org"
name = "Ada Author"
"#,
        )
        .unwrap();

        let repo = RepositoryFactory::from_repository_config(&config)
            .await
            .unwrap();
        let directory = repo.into_identity_directory();
        let found = directory.find_by_address("ADA@example.org ").unwrap();
        assert_eq!(found.len(), 1);
    }
}

//! Database module for mask storage.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  mdf-ingest binary / library callers                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Ingestor (services::ingest)                            │
//! │  - Structural and content validation                    │
//! │  - Display name selection and key translation           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository) - Abstract Interface    │
//! └───────────┬─────────────────────────────┬───────────────┘
//!             │                             │
//!     ┌───────▼──────────┐         ┌────────▼─────────┐
//!     │ Postgres (Diesel)│         │ Local (in-memory)│
//!     └──────────────────┘         └──────────────────┘
//! ```
//!
//! The module includes:
//! - `repository`: Trait definitions and the error type
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `repositories::local`: In-memory implementation for unit testing and local development
//! - `factory`: Factory for creating repository instances
//! - `repo_config`: `ingest.toml` loading
//!
//! # Example
//! ```ignore
//! use maskdb_rust::db::{PostgresConfig, RepositoryFactory, RepositoryType};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PostgresConfig::from_env()?;
//!     let repo = RepositoryFactory::create(RepositoryType::Postgres, Some(&config)).await?;
//!     println!("{}", repo.table_counts()?.total());
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use models::{StoreTable, TableCounts};
pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    ErrorContext, FullRepository, IdentityDirectory, IngestTransaction, MaskRepository,
    RepositoryError, RepositoryResult, TransactionStatus,
};

//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! An ingestion transaction owns one pooled connection for its whole
//! lifetime. Each insert runs inside a savepoint, so a rejected row is rolled
//! back on its own and the remaining rows can still be tried.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::{
    BlueprintId, BlueprintSlitId, DesignId, DesignSlitId, ObjectId, ObserverId, SlitObjectId,
};
use crate::db::models::{
    BlueprintRecord, BlueprintSlitRecord, NewBlueprintSlit, NewDesignSlit, NewExtendedObject,
    NewMaskBlueprint, NewMaskDesign, NewNearbyObject, NewSlitObjectMapping, NewTargetObject,
    TableCounts,
};
use crate::db::repository::{
    ErrorContext, IdentityDirectory, IngestTransaction, MaskRepository, RepositoryError,
    RepositoryResult, TransactionStatus,
};
use crate::models::MillStatus;

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;
type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    fn backoff(&self, attempt: u32) {
        if attempt > 0 {
            self.retried_operations.fetch_add(1, Ordering::Relaxed);
            let factor = 1u64 << (attempt - 1).min(16);
            std::thread::sleep(Duration::from_millis(self.config.retry_delay_ms * factor));
        }
    }

    /// Check a connection out of the pool, retrying with exponential backoff.
    fn checkout(&self) -> RepositoryResult<PgPooled> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;
        loop {
            self.backoff(attempt);
            match self.pool.get() {
                Ok(conn) => return Ok(conn),
                Err(e) if attempt < max_retries => {
                    warn!("Connection checkout failed (attempt {}): {}", attempt + 1, e);
                    attempt += 1;
                }
                Err(e) => {
                    self.failed_queries.fetch_add(1, Ordering::Relaxed);
                    return Err(RepositoryError::connection_with_context(
                        e.to_string(),
                        ErrorContext::new("get_connection")
                            .with_details(format!("attempt={}", attempt + 1)),
                    ));
                }
            }
        }
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    fn with_conn<T, F>(&self, mut f: F) -> RepositoryResult<T>
    where
        F: FnMut(&mut PgConnection) -> RepositoryResult<T>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;
        loop {
            let mut conn = self.checkout()?;
            self.total_queries.fetch_add(1, Ordering::Relaxed);
            match f(&mut conn) {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    debug!("Retrying after transient error: {}", e);
                    attempt += 1;
                    self.backoff(attempt);
                }
                Err(e) => {
                    self.failed_queries.fetch_add(1, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }
    }

    /// Register an observer (administrative path; ingestion only reads).
    pub fn add_observer(&self, email: &str, name: &str) -> RepositoryResult<ObserverId> {
        self.with_conn(|conn| {
            diesel::insert_into(observers::table)
                .values((observers::email.eq(email.trim()), observers::name.eq(name)))
                .returning(observers::observer_id)
                .get_result::<i64>(conn)
                .map(ObserverId)
                .map_err(RepositoryError::from)
        })
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        let elapsed = || Some(start.elapsed().as_millis() as u64);
        match self.health_check() {
            Ok(true) => (true, elapsed(), None),
            Ok(false) => (false, elapsed(), Some("Health check returned false".to_string())),
            Err(e) => (false, elapsed(), Some(e.to_string())),
        }
    }
}

/// Escape `LIKE` metacharacters so `prefix` matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn count(table: &str, result: QueryResult<i64>) -> RepositoryResult<u64> {
    result
        .map(|n| n.max(0) as u64)
        .map_err(|e| RepositoryError::from(e).with_operation("table_counts").with_entity(table))
}

impl MaskRepository for PostgresRepository {
    fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
    }

    fn begin(&self) -> RepositoryResult<Box<dyn IngestTransaction + '_>> {
        let mut conn = self.checkout()?;
        AnsiTransactionManager::begin_transaction(&mut *conn).map_err(|e| {
            RepositoryError::from(e).with_operation("begin_transaction")
        })?;
        Ok(Box::new(PgTransaction {
            conn,
            open: true,
            issued: false,
        }))
    }

    fn get_blueprint(&self, id: BlueprintId) -> RepositoryResult<Option<BlueprintRecord>> {
        let row = self.with_conn(|conn| {
            mask_blueprints::table
                .find(id.value())
                .select(BlueprintRow::as_select())
                .first::<BlueprintRow>(conn)
                .optional()
                .map_err(RepositoryError::from)
        })?;
        row.map(BlueprintRecord::try_from).transpose()
    }

    fn blueprint_slits(&self, id: BlueprintId) -> RepositoryResult<Vec<BlueprintSlitRecord>> {
        let rows = self.with_conn(|conn| {
            blueprint_slits::table
                .filter(blueprint_slits::blueprint_id.eq(id.value()))
                .order(blueprint_slits::blueprint_slit_id)
                .select(BlueprintSlitRow::as_select())
                .load::<BlueprintSlitRow>(conn)
                .map_err(RepositoryError::from)
        })?;
        Ok(rows.into_iter().map(BlueprintSlitRecord::from).collect())
    }

    fn table_counts(&self) -> RepositoryResult<TableCounts> {
        self.with_conn(|conn| {
            Ok(TableCounts {
                designs: count("mask_designs", mask_designs::table.count().get_result(conn))?,
                blueprints: count(
                    "mask_blueprints",
                    mask_blueprints::table.count().get_result(conn),
                )?,
                design_slits: count("design_slits", design_slits::table.count().get_result(conn))?,
                blueprint_slits: count(
                    "blueprint_slits",
                    blueprint_slits::table.count().get_result(conn),
                )?,
                objects: count("target_objects", target_objects::table.count().get_result(conn))?,
                extended_objects: count(
                    "extended_objects",
                    extended_objects::table.count().get_result(conn),
                )?,
                nearby_objects: count(
                    "nearby_objects",
                    nearby_objects::table.count().get_result(conn),
                )?,
                slit_object_maps: count(
                    "slit_object_map",
                    slit_object_map::table.count().get_result(conn),
                )?,
            })
        })
    }
}

impl IdentityDirectory for PostgresRepository {
    fn find_by_address(&self, address: &str) -> RepositoryResult<Vec<ObserverId>> {
        let address = address.trim().to_lowercase();
        self.with_conn(|conn| {
            observers::table
                .filter(lower(observers::email).eq(&address))
                .select(observers::observer_id)
                .load::<i64>(conn)
                .map(|ids| ids.into_iter().map(ObserverId).collect())
                .map_err(RepositoryError::from)
        })
    }
}

/// One open ingestion transaction on a dedicated pooled connection.
struct PgTransaction {
    conn: PgPooled,
    open: bool,
    issued: bool,
}

impl PgTransaction {
    /// Run `f` inside a savepoint of the open transaction.
    fn savepoint<T, F>(&mut self, table: &str, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T>,
    {
        self.issued = true;
        let conn: &mut PgConnection = &mut self.conn;
        conn.transaction::<T, diesel::result::Error, _>(f)
            .map_err(|e| RepositoryError::from(e).with_operation("insert").with_entity(table))
    }
}

impl IngestTransaction for PgTransaction {
    fn live_display_names(&mut self, prefix: &str) -> RepositoryResult<Vec<String>> {
        self.issued = true;
        mask_blueprints::table
            .filter(mask_blueprints::gui_name.like(like_prefix(prefix)))
            .filter(mask_blueprints::status.ne(MillStatus::Archived.as_i16()))
            .select(mask_blueprints::gui_name)
            .load::<String>(&mut *self.conn)
            .map_err(|e| {
                RepositoryError::from(e)
                    .with_operation("live_display_names")
                    .with_entity("mask_blueprints")
            })
    }

    fn insert_design(&mut self, row: &NewMaskDesign) -> RepositoryResult<DesignId> {
        let values = NewDesignRow::from(row);
        self.savepoint("mask_designs", |conn| {
            diesel::insert_into(mask_designs::table)
                .values(&values)
                .returning(mask_designs::design_id)
                .get_result::<i64>(conn)
        })
        .map(DesignId)
    }

    fn insert_blueprint(&mut self, row: &NewMaskBlueprint) -> RepositoryResult<BlueprintId> {
        let values = NewBlueprintRow::from(row);
        self.savepoint("mask_blueprints", |conn| {
            diesel::insert_into(mask_blueprints::table)
                .values(&values)
                .returning(mask_blueprints::blueprint_id)
                .get_result::<i64>(conn)
        })
        .map(BlueprintId)
    }

    fn insert_design_slit(&mut self, row: &NewDesignSlit) -> RepositoryResult<DesignSlitId> {
        let values = NewDesignSlitRow::from(row);
        self.savepoint("design_slits", |conn| {
            diesel::insert_into(design_slits::table)
                .values(&values)
                .returning(design_slits::design_slit_id)
                .get_result::<i64>(conn)
        })
        .map(DesignSlitId)
    }

    fn insert_blueprint_slit(
        &mut self,
        row: &NewBlueprintSlit,
    ) -> RepositoryResult<BlueprintSlitId> {
        let values = NewBlueprintSlitRow::from(row);
        self.savepoint("blueprint_slits", |conn| {
            diesel::insert_into(blueprint_slits::table)
                .values(&values)
                .returning(blueprint_slits::blueprint_slit_id)
                .get_result::<i64>(conn)
        })
        .map(BlueprintSlitId)
    }

    fn insert_object(&mut self, row: &NewTargetObject) -> RepositoryResult<ObjectId> {
        let values = NewTargetObjectRow::from(row);
        self.savepoint("target_objects", |conn| {
            diesel::insert_into(target_objects::table)
                .values(&values)
                .returning(target_objects::object_id)
                .get_result::<i64>(conn)
        })
        .map(ObjectId)
    }

    fn insert_extended_object(&mut self, row: &NewExtendedObject) -> RepositoryResult<()> {
        let values = NewExtendedObjectRow::from(row);
        self.savepoint("extended_objects", |conn| {
            diesel::insert_into(extended_objects::table)
                .values(&values)
                .execute(conn)
        })
        .map(|_| ())
    }

    fn insert_nearby_object(&mut self, row: &NewNearbyObject) -> RepositoryResult<()> {
        let values = NewNearbyObjectRow::from(row);
        self.savepoint("nearby_objects", |conn| {
            diesel::insert_into(nearby_objects::table)
                .values(&values)
                .execute(conn)
        })
        .map(|_| ())
    }

    fn insert_slit_object(
        &mut self,
        row: &NewSlitObjectMapping,
    ) -> RepositoryResult<SlitObjectId> {
        let values = NewSlitObjectRow::from(row);
        self.savepoint("slit_object_map", |conn| {
            diesel::insert_into(slit_object_map::table)
                .values(&values)
                .returning(slit_object_map::slit_object_id)
                .get_result::<i64>(conn)
        })
        .map(SlitObjectId)
    }

    fn status(&mut self) -> TransactionStatus {
        let depth = AnsiTransactionManager::transaction_manager_status_mut(&mut *self.conn)
            .transaction_depth();
        match depth {
            Err(_) => return TransactionStatus::InError,
            Ok(None) => return TransactionStatus::Unknown,
            Ok(Some(_)) => {}
        }
        if sql_query("SELECT 1").execute(&mut *self.conn).is_err() {
            return TransactionStatus::Unknown;
        }
        if self.issued {
            TransactionStatus::Active
        } else {
            TransactionStatus::Idle
        }
    }

    fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        self.open = false;
        AnsiTransactionManager::commit_transaction(&mut *self.conn).map_err(|e| {
            RepositoryError::from(e).with_operation("commit_transaction")
        })
    }

    fn rollback(mut self: Box<Self>) -> RepositoryResult<()> {
        self.open = false;
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).map_err(|e| {
            RepositoryError::from(e).with_operation("rollback_transaction")
        })
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = AnsiTransactionManager::rollback_transaction(&mut *self.conn) {
                warn!("Rollback of abandoned transaction failed: {}", e);
            }
        }
    }
}

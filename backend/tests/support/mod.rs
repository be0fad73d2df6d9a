//! Shared helpers for integration tests.

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
#[allow(dead_code)]
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Ingestion fixtures ====================

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use maskdb_rust::db::LocalRepository;
use maskdb_rust::mdf::{JsonContainerReader, MemoryContainer};
use maskdb_rust::services::Ingestor;

/// Fixed validation date for ingestion tests.
#[allow(dead_code)]
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

/// Local repository with the sample file's author and observer registered.
#[allow(dead_code)]
pub fn sample_repository() -> Arc<LocalRepository> {
    let repo = Arc::new(LocalRepository::new());
    repo.add_observer("ada@example.org", "Ada Author");
    repo.add_observer("otto@example.org", "Otto Observer");
    repo
}

#[allow(dead_code)]
pub fn sample_ingestor() -> (Arc<LocalRepository>, Ingestor) {
    let repo = sample_repository();
    let ingestor = Ingestor::new(repo.clone());
    (repo, ingestor)
}

/// Write `container` as a JSON-exported MDF to a temporary file.
#[allow(dead_code)]
pub fn write_mdf(container: &MemoryContainer) -> tempfile::NamedTempFile {
    let json = JsonContainerReader::to_json(container).expect("container serializes");
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("temp file");
    file.write_all(json.as_bytes()).expect("write MDF");
    file
}

//! # MaskDB Rust Backend
//!
//! Ingestion and validation of slitmask Mask Description Files (MDFs).
//!
//! An MDF is a tabular container describing one slitmask design and one
//! blueprint for milling it. This crate checks the container's structure,
//! validates its content against the observatory's rules, resolves observer
//! identities, picks a display name for the mill, and stores every row in a
//! single all-or-nothing transaction.
//!
//! ## Architecture
//!
//! - [`mdf`]: container abstraction, table layout and typed loading
//! - [`models`]: typed mask rows and date parsing
//! - [`services`]: structural check, content validation, identity resolution
//!   and the ingestion orchestrator
//! - [`db`]: repository traits, the Postgres and in-memory backends, and
//!   configuration
//! - [`api`]: identifier newtypes shared across layers
//!
//! ## Example
//!
//! ```ignore
//! use maskdb_rust::db::RepositoryFactory;
//! use maskdb_rust::services::Ingestor;
//!
//! let repo = RepositoryFactory::create_local();
//! let outcome = Ingestor::new(repo).ingest_path("mask.json".as_ref());
//! for error in &outcome.errors {
//!     eprintln!("{error}");
//! }
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod db;
pub mod mdf;
pub mod models;
pub mod services;

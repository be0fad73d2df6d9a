//! Service layer for ingestion and validation.
//!
//! These modules sit between the MDF container and the repositories: the
//! structural check, content validation, identity resolution, display name
//! selection and the ingestion orchestrator that ties them together.

pub mod display_name;
pub mod identity;
pub mod ingest;
pub mod key_map;
pub mod report;
pub mod structure;
pub mod validation;

pub use ingest::{CommitOutcome, IngestOutcome, IngestSettings, Ingestor};
pub use key_map::KeyMap;
pub use report::ErrorReport;
pub use structure::{validate_structure, StructuralReport};
pub use validation::{ContentValidator, ValidationPolicy};

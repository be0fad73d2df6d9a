//! Ordered error/warning report shared by every ingestion stage.

use serde::{Deserialize, Serialize};

/// Messages collected during one ingestion, in the order they were found.
///
/// Errors fail the ingestion; warnings are informational and never do.
///
/// # Examples
///
/// ```
/// use maskdb_rust::services::report::ErrorReport;
///
/// let mut report = ErrorReport::new();
/// report.add_warning("MaskDesign has 2 rows; only the first is used");
/// assert!(report.is_empty());
///
/// report.add_error("MaskBlu.TELESCOP: unrecognized telescope 'Palomar'");
/// assert!(!report.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn extend_errors<I>(&mut self, errors: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.errors.extend(errors.into_iter().map(Into::into));
    }

    /// Append another report's messages after this one's.
    pub fn merge(&mut self, other: ErrorReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// True when no errors were recorded. Warnings do not count.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

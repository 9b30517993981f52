//! Domain error types.
//!
//! Application plumbing uses `anyhow`; the dashboard pipeline itself reports
//! the few failures it knows about through [`DashboardError`].

use thiserror::Error;

/// Failures raised by the loading and rendering pipeline.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A dataset source could not be opened, fetched or located.
    #[error("dataset source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A dataset source was readable but its contents do not match the
    /// movie table schema.
    #[error("schema mismatch in {source_name}: {detail}")]
    SchemaMismatch { source_name: String, detail: String },

    /// The charting backend failed to draw.
    #[error("chart rendering failed: {0}")]
    Render(String),
}

impl DashboardError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(source_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            source_name: source_name.into(),
            detail: detail.into(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_source() {
        let err = DashboardError::unavailable("movies.csv", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "dataset source unavailable: movies.csv: No such file or directory"
        );

        let err = DashboardError::schema("movies.csv", "missing columns: Rating");
        assert!(err.to_string().contains("missing columns: Rating"));
    }
}

//! Error types for dashboard analytics

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while building or exporting the dashboard
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Insufficient data for analysis
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),

    /// Calculation error
    #[error("Calculation error: {0}")]
    CalculationError(String),

    /// Export failed
    #[error("Export failed: {0}")]
    ExportFailed(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::UnsupportedFormat(msg) => AppError::Configuration(msg),
            AnalyticsError::ExportFailed(msg) => AppError::Persist(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

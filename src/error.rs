use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input file, columns or values
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// Empty or label-invalid training data
    #[error("Training error: {0}")]
    Training(String),

    /// Feature/schema mismatch between fit and predict
    #[error("Inference error: {0}")]
    Inference(String),

    /// Output could not be written
    #[error("Persist error: {0}")]
    Persist(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::DataLoad(_) => "DATA_LOAD_ERROR",
            AppError::Training(_) => "TRAINING_ERROR",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::Persist(_) => "PERSIST_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

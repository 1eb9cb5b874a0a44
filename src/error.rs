use thiserror::Error;

use crate::profiling::BenchmarkCategory;

/// Main error type for the profiling collector
#[derive(Error, Debug, Clone)]
pub enum ProfilingError {
    /// IO errors while persisting a profile
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The handle outlived the dump that released its event
    #[error("Event released: {category} benchmark was already dumped")]
    EventReleased {
        category: &'static str,
    },

    /// The global profiler was configured after first use
    #[error("Global profiler already initialized")]
    AlreadyInitialized,
}

impl ProfilingError {
    /// Create a configuration error with context
    pub fn configuration_error(context: &str, message: &str) -> Self {
        ProfilingError::ConfigurationError(format!("{}: {}", context, message))
    }

    pub fn released(category: BenchmarkCategory) -> Self {
        ProfilingError::EventReleased {
            category: category.label(),
        }
    }
}

impl From<std::io::Error> for ProfilingError {
    fn from(err: std::io::Error) -> Self {
        ProfilingError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ProfilingError {
    fn from(err: serde_json::Error) -> Self {
        ProfilingError::SerializationError(err.to_string())
    }
}

/// Result type for profiling operations
pub type ProfilingResult<T> = Result<T, ProfilingError>;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PersistFailed,
    SerializationFailed,
    ConfigInvalid,
    StaleHandle,
    InitOrder,
}

impl ProfilingError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ProfilingError::IoError(_) => ErrorCode::PersistFailed,
            ProfilingError::SerializationError(_) => ErrorCode::SerializationFailed,
            ProfilingError::ConfigurationError(_) => ErrorCode::ConfigInvalid,
            ProfilingError::EventReleased { .. } => ErrorCode::StaleHandle,
            ProfilingError::AlreadyInitialized => ErrorCode::InitOrder,
        }
    }

    /// A recoverable error leaves the collector usable; the caller may retry
    /// with a different output directory or configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::PersistFailed | ErrorCode::ConfigInvalid
        )
    }
}

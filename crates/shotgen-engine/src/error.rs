//! Engine error types.

use shotgen_backend::BackendError;
use shotgen_models::{ErrorInfo, ErrorKind};
use thiserror::Error;

use crate::parser::ParseError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<EngineError> },
}

impl EngineError {
    pub fn invalid_batch(msg: impl Into<String>) -> Self {
        Self::InvalidBatch(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidBatch(_) => ErrorKind::InvalidBatch,
            EngineError::Configuration(_) => ErrorKind::ConfigurationError,
            EngineError::Backend(e) => e.kind(),
            EngineError::Parse(_) => ErrorKind::ParseError,
            EngineError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
        }
    }

    /// True for parse failures, whether detected locally or by the adapter.
    pub fn is_parse_failure(&self) -> bool {
        self.kind() == ErrorKind::ParseError
    }

    /// Server-provided delay hint carried by a rate-limit error.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            EngineError::Backend(e) => e.retry_after_ms(),
            _ => None,
        }
    }

    /// Serializable form attached to a failed segment result.
    pub fn to_error_info(&self) -> ErrorInfo {
        let mut info = ErrorInfo::new(self.kind(), self.to_string());
        if let EngineError::RetriesExhausted { last, .. } = self {
            info.last_kind = Some(last.kind());
        }
        info
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(e: validator::ValidationErrors) -> Self {
        EngineError::InvalidBatch(e.to_string())
    }
}

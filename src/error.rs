//! Error taxonomy shared by every stage of the pipeline.
//!
//! Validation errors are raised when a value is constructed, so no partially
//! built filtration or rank function ever escapes. Numeric degeneracies inside
//! the statistics (zero means, empty norms) are not errors: they become `NaN`
//! cells and are skipped by the norms.

use thiserror::Error;

/// Errors produced while building filtrations or comparing rank functions
#[derive(Debug, Error)]
pub enum TdaError {
    /// Malformed or too-small input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not enough landmarks/points to form the requested complex
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Rank functions on different grids were combined
    #[error("incompatible grids: {left} vs {right}")]
    IncompatibleGrid { left: String, right: String },

    /// Mean/variance requested over too few samples
    #[error("insufficient samples: need at least {required}, got {found}")]
    InsufficientSamples { required: usize, found: usize },

    /// The persistence reduction tool failed or produced garbage
    #[error("external tool failed (status {status:?}): {stderr}")]
    ExternalTool { status: Option<i32>, stderr: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TdaError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TdaError::InvalidInput(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        TdaError::DegenerateInput(msg.into())
    }

    pub(crate) fn tool(status: Option<i32>, stderr: impl Into<String>) -> Self {
        TdaError::ExternalTool {
            status,
            stderr: stderr.into(),
        }
    }
}

impl From<bincode::Error> for TdaError {
    fn from(e: bincode::Error) -> Self {
        TdaError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for TdaError {
    fn from(e: serde_json::Error) -> Self {
        TdaError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for TdaError {
    fn from(e: toml::de::Error) -> Self {
        TdaError::Config(e.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, TdaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message() {
        let err = TdaError::tool(Some(2), "segfault in reducer");
        let msg = err.to_string();
        assert!(msg.contains("Some(2)"));
        assert!(msg.contains("segfault in reducer"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TdaError = io.into();
        assert!(matches!(err, TdaError::Io(_)));
    }
}

//! Error types for the credit scoring service.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the scoring core.
///
/// Startup errors (`ArtifactNotFound`, `ArtifactCorrupt`, `InvalidConfig`,
/// `ArchitectureMismatch`) are fatal: the process must not begin serving.
/// Request errors (`MalformedInput`, `InferenceFailure`) are translated into
/// HTTP responses at the boundary and never terminate the process.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// An artifact file is missing at the configured path.
    #[error("artifact not found at {path}")]
    ArtifactNotFound { path: PathBuf },

    /// An artifact file exists but could not be read or decoded.
    #[error("artifact at {path} could not be decoded: {reason}")]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// The model configuration cannot describe a valid network.
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    /// Persisted weights do not match the configured topology.
    #[error("architecture mismatch: {0}")]
    ArchitectureMismatch(String),

    /// An input record the core cannot encode into features.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Unexpected numeric failure during the forward pass or decode.
    #[error("inference failure: {0}")]
    InferenceFailure(String),
}

impl ScoringError {
    /// Whether this error is recoverable per-request (as opposed to a fatal
    /// startup error).
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ScoringError::MalformedInput(_) | ScoringError::InferenceFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let fatal = ScoringError::ArtifactNotFound {
            path: PathBuf::from("models/weights.json"),
        };
        assert!(!fatal.is_request_error());

        let recoverable = ScoringError::MalformedInput("Age is not finite".to_string());
        assert!(recoverable.is_request_error());
    }

    #[test]
    fn test_error_display_includes_path() {
        let err = ScoringError::ArtifactNotFound {
            path: PathBuf::from("models/transformer.json"),
        };
        assert!(err.to_string().contains("models/transformer.json"));
    }
}

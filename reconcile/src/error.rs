//! Reconciliation error types
//!
//! Failures here mean the adapter in front of the build tool handed over a
//! value this crate does not understand. They are never recovered from
//! locally: the reload cycle reports them so the adapter can be fixed.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors raised while turning build-tool output into source references
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Origin descriptor matches none of the known shapes
    #[error("Unrecognized artifact origin shape: {shape}")]
    UnrecognizedOrigin { shape: String },

    /// Relative virtual file whose segments do not start with a `${...}` base marker
    #[error("Virtual file segments {segments:?} do not start with a base marker")]
    MissingBaseMarker { segments: Vec<String> },

    /// Absolute virtual file id that does not form a valid file URI
    #[error("Invalid virtual file id '{id}': {message}")]
    InvalidFileUri { id: String, message: String },

    /// File URI that has no local path representation
    #[error("File URI has no local path: {uri}")]
    NotAFilePath { uri: String },
}

impl ReconcileError {
    /// Create an unrecognized origin error
    pub fn unrecognized(shape: impl Into<String>) -> Self {
        Self::UnrecognizedOrigin {
            shape: shape.into(),
        }
    }
}

//! Error types for diff computation and patch application.

use crate::path::JsonPath;
use thiserror::Error;

/// Errors raised while computing a delta.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("State could not be encoded for diffing: {0}")]
    Encode(String),

    /// The computed delta does not reproduce a state when applied to its
    /// own base, e.g. because the state does not survive encoding.
    #[error("Delta does not replay onto its base: {0}")]
    Unreplayable(PatchError),
}

/// Errors raised while applying a delta to a base state.
///
/// Every variant means the delta does not fit the supplied base: either the
/// stored data is corrupt or the base is not the one the delta was computed
/// against.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Path not found in base: {0}")]
    PathNotFound(JsonPath),

    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch { path: JsonPath, expected: String },

    #[error("Invalid index at {path}: {index} (length: {length})")]
    IndexOutOfBounds {
        path: JsonPath,
        index: usize,
        length: usize,
    },

    #[error("Key already present at {0}")]
    KeyExists(JsonPath),

    #[error("Patched value could not be decoded: {0}")]
    Decode(String),
}

impl PatchError {
    pub(crate) fn type_mismatch(path: &JsonPath, expected: &str) -> Self {
        PatchError::TypeMismatch {
            path: path.clone(),
            expected: expected.to_string(),
        }
    }
}

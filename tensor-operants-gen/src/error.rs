// This module defines the error types of the tensor operants generator using the thiserror
// crate. GenError covers every way a generation run can fail: an eligible entry violating the
// first-input contract, a malformed or unknown argument list, duplicate operations or generated
// method names, unreadable or unparsable spec files, and stale artifacts found in check mode.
// Each variant carries the operation name or path involved so the failing entry can be found
// in the spec sources. GenResult<T> is the convenience alias used across the crate.

//! Error types for the tensor operants generator.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for a generation run.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("invalid operation `{op}`: {reason}")]
    Validation { op: String, reason: String },

    #[error("malformed argument list for `{op}`: {reason}")]
    MalformedArgs { op: String, reason: String },

    #[error("unknown operand type `{ty}` in `{op}`")]
    UnknownType { op: String, ty: String },

    #[error("operation `{0}` is declared more than once")]
    DuplicateOperation(String),

    #[error("generated method `{method}` of {artifact} is produced by both `{first}` and `{second}`")]
    DuplicateMethod {
        artifact: &'static str,
        method: String,
        first: String,
        second: String,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} artifact(s) out of date: {}", .0.len(), .0.join(", "))]
    Stale(Vec<String>),
}

impl GenError {
    pub(crate) fn validation(op: &str, reason: impl Into<String>) -> Self {
        GenError::Validation {
            op: op.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for generator operations.
pub type GenResult<T> = Result<T, GenError>;

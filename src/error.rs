// This module defines the runtime error types of the tensor operants crate using the thiserror
// crate. Error covers the dispatch failures of the operants manager (a backend slot read before
// it was assigned, an execution mode that names no slot, a slot assigned twice) and the checks
// of the reference kernels (mismatched shapes, out of range axes, unsupported data types, data
// buffers that do not fill their shape). Each variant carries the slot, mode, operation or
// shapes involved. Result<T> is the convenience alias used by every generated method.

//! Error types for the tensor operants runtime.

use thiserror::Error;

use crate::mode::Mode;
use crate::tensor::DataType;

/// Main error type for tensor operations and dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("backend for {slot} mode is not initialized")]
    UninitializedBackend { slot: Mode },

    #[error("mode `{mode}` is not implemented")]
    UnimplementedMode { mode: String },

    #[error("backend for {slot} mode is already set")]
    SlotAlreadySet { slot: Mode },

    #[error("{op}: shapes {lhs:?} and {rhs:?} do not match")]
    ShapeMismatch {
        op: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    #[error("axis {axis} is out of range for rank {rank}")]
    InvalidAxis { axis: i64, rank: usize },

    #[error("{op} does not support {dtype:?} tensors")]
    UnsupportedDType { op: &'static str, dtype: DataType },

    #[error("shape {shape:?} needs {expected} values, got {actual}")]
    DataLength {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for tensor operations.
pub type Result<T> = std::result::Result<T, Error>;

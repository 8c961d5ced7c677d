//! Tensor value types.
//!
//! A [`Tensor`] is a dense, row-major buffer of `f64` values tagged with a
//! [`DataType`]. Values are normalized to the tag on construction: booleans
//! are stored as `0.0`/`1.0`, integers are truncated, `Float32` values are
//! rounded through `f32`.
//!
//! Operations on tensors (`add`, `sum`, `relu_`, ...) are generated and live
//! in [`crate::tensor_api`].

use crate::error::{Error, Result};

/// Element type of a tensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Unspecified; operations taking a `DataType` read it as "same as input".
    #[default]
    Undefined,
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DataType {
    /// Spelling used in operation specs, e.g. `DataType::UNDEFINED`.
    pub const UNDEFINED: DataType = DataType::Undefined;

    pub fn is_integral(self) -> bool {
        matches!(self, DataType::Bool | DataType::Int32 | DataType::Int64)
    }

    /// Round `value` to what this type can hold.
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            DataType::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            DataType::Int32 => (value as i32) as f64,
            DataType::Int64 => (value as i64) as f64,
            DataType::Float32 => (value as f32) as f64,
            DataType::Float64 | DataType::Undefined => value,
        }
    }
}

/// A single number passed to an operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Scalar::Int(i) => i as f64,
            Scalar::Float(f) => f,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// A list of axes or sizes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntArray(pub Vec<i64>);

impl IntArray {
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for IntArray {
    fn from(values: Vec<i64>) -> Self {
        IntArray(values)
    }
}

impl From<&[i64]> for IntArray {
    fn from(values: &[i64]) -> Self {
        IntArray(values.to_vec())
    }
}

/// Dense row-major tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
    dtype: DataType,
}

impl Tensor {
    /// `Float32` tensor from a shape and its row-major values.
    pub fn new(shape: impl Into<Vec<usize>>, data: impl Into<Vec<f64>>) -> Result<Self> {
        Self::with_dtype(shape, data, DataType::Float32)
    }

    pub fn with_dtype(
        shape: impl Into<Vec<usize>>,
        data: impl Into<Vec<f64>>,
        dtype: DataType,
    ) -> Result<Self> {
        let shape = shape.into();
        let mut data = data.into();
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(Error::DataLength {
                shape,
                expected,
                actual: data.len(),
            });
        }
        let dtype = match dtype {
            DataType::Undefined => DataType::Float32,
            other => other,
        };
        for value in &mut data {
            *value = dtype.normalize(*value);
        }
        Ok(Self { shape, data, dtype })
    }

    /// Tensor of `shape` with every element set to `value`.
    pub fn full(shape: impl Into<Vec<usize>>, value: Scalar, dtype: DataType) -> Self {
        let shape = shape.into();
        let dtype = match dtype {
            DataType::Undefined => DataType::Float32,
            other => other,
        };
        let numel = shape.iter().product();
        Self {
            shape,
            data: vec![dtype.normalize(value.to_f64()); numel],
            dtype,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.clone()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Build a result directly; `data` must already fill `shape` and match `dtype`.
    pub(crate) fn from_parts(shape: Vec<usize>, data: Vec<f64>, dtype: DataType) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data, dtype }
    }
}

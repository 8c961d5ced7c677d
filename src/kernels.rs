//! Reference CPU kernels.
//!
//! One function per generated operation, taking the operation's parameters in
//! declared order. Binary kernels require operands of equal shape and return a
//! tensor of the left operand's data type, except the comparisons which
//! return `Bool` tensors.

use crate::error::{Error, Result};
use crate::tensor::{DataType, IntArray, Scalar, Tensor};

fn binary(op: &'static str, x: &Tensor, y: &Tensor, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
    binary_into(op, x, y, x.dtype(), f)
}

fn binary_into(
    op: &'static str,
    x: &Tensor,
    y: &Tensor,
    dtype: DataType,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Tensor> {
    if x.shape() != y.shape() {
        return Err(Error::ShapeMismatch {
            op,
            lhs: x.shape().to_vec(),
            rhs: y.shape().to_vec(),
        });
    }
    let data = x
        .values()
        .iter()
        .zip(y.values())
        .map(|(&a, &b)| dtype.normalize(f(a, b)))
        .collect();
    Ok(Tensor::from_parts(x.shape().to_vec(), data, dtype))
}

fn unary(x: &Tensor, dtype: DataType, f: impl Fn(f64) -> f64) -> Tensor {
    let data = x.values().iter().map(|&v| dtype.normalize(f(v))).collect();
    Tensor::from_parts(x.shape().to_vec(), data, dtype)
}

fn compare(op: &'static str, x: &Tensor, y: &Tensor, f: impl Fn(f64, f64) -> bool) -> Result<Tensor> {
    binary_into(op, x, y, DataType::Bool, |a, b| if f(a, b) { 1.0 } else { 0.0 })
}

fn require_integral(op: &'static str, t: &Tensor) -> Result<()> {
    if t.dtype().is_integral() {
        Ok(())
    } else {
        Err(Error::UnsupportedDType {
            op,
            dtype: t.dtype(),
        })
    }
}

fn bitwise(op: &'static str, x: &Tensor, y: &Tensor, f: fn(i64, i64) -> i64) -> Result<Tensor> {
    require_integral(op, x)?;
    require_integral(op, y)?;
    binary(op, x, y, |a, b| f(a as i64, b as i64) as f64)
}

/// Tensor shaped and typed like `x`, filled with `value`.
pub fn full_like(x: &Tensor, value: Scalar) -> Result<Tensor> {
    Ok(Tensor::full(x.shape().to_vec(), value, x.dtype()))
}

pub fn add(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    binary("add", x, y, |a, b| a + b)
}

pub fn subtract(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    binary("subtract", x, y, |a, b| a - b)
}

pub fn multiply(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    binary("multiply", x, y, |a, b| a * b)
}

/// Integer tensors truncate toward zero.
pub fn divide(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    binary("divide", x, y, |a, b| a / b)
}

pub fn elementwise_pow(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    binary("elementwise_pow", x, y, f64::powf)
}

/// `x * scale + bias`, or `(x + bias) * scale` when `bias_after_scale` is false.
pub fn scale(x: &Tensor, scale: Scalar, bias: f32, bias_after_scale: bool) -> Result<Tensor> {
    let (s, b) = (scale.to_f64(), f64::from(bias));
    Ok(if bias_after_scale {
        unary(x, x.dtype(), |v| v * s + b)
    } else {
        unary(x, x.dtype(), |v| (v + b) * s)
    })
}

pub fn abs(x: &Tensor) -> Result<Tensor> {
    Ok(unary(x, x.dtype(), f64::abs))
}

/// Integral inputs produce `Float32`.
pub fn exp(x: &Tensor) -> Result<Tensor> {
    let dtype = if x.dtype().is_integral() {
        DataType::Float32
    } else {
        x.dtype()
    };
    Ok(unary(x, dtype, f64::exp))
}

fn resolve_axis(axis: i64, rank: usize) -> Result<usize> {
    let resolved = if axis < 0 { axis + rank as i64 } else { axis };
    if (0..rank as i64).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(Error::InvalidAxis { axis, rank })
    }
}

/// Sum over `axis`, or over every axis when it is empty.
///
/// An `Undefined` dtype keeps the input type, except `Bool` which sums to `Int64`.
pub fn sum(x: &Tensor, axis: &IntArray, dtype: DataType, keepdim: bool) -> Result<Tensor> {
    let rank = x.shape().len();
    let mut reduced = vec![axis.is_empty(); rank];
    for &a in axis.as_slice() {
        reduced[resolve_axis(a, rank)?] = true;
    }
    let dtype = match (dtype, x.dtype()) {
        (DataType::Undefined, DataType::Bool) => DataType::Int64,
        (DataType::Undefined, input) => input,
        (requested, _) => requested,
    };

    let mut out_shape = Vec::with_capacity(rank);
    let mut out_strides = vec![0usize; rank];
    let mut stride = 1;
    for dim in (0..rank).rev() {
        if !reduced[dim] {
            out_strides[dim] = stride;
            stride *= x.shape()[dim];
        }
    }
    for dim in 0..rank {
        if !reduced[dim] {
            out_shape.push(x.shape()[dim]);
        } else if keepdim {
            out_shape.push(1);
        }
    }

    let mut acc = vec![0.0; stride];
    let mut index = vec![0usize; rank];
    for &value in x.values() {
        let target: usize = index.iter().zip(&out_strides).map(|(i, s)| i * s).sum();
        acc[target] += value;
        for dim in (0..rank).rev() {
            index[dim] += 1;
            if index[dim] < x.shape()[dim] {
                break;
            }
            index[dim] = 0;
        }
    }
    let data = acc.into_iter().map(|v| dtype.normalize(v)).collect();
    Ok(Tensor::from_parts(out_shape, data, dtype))
}

/// Insert size-one axes, one at a time in the given order.
///
/// A negative axis counts from the end of the grown shape: `-1` appends.
pub fn unsqueeze(x: &Tensor, axis: &IntArray) -> Result<Tensor> {
    let mut shape = x.shape().to_vec();
    for &a in axis.as_slice() {
        let rank = shape.len();
        let resolved = if a < 0 { a + rank as i64 + 1 } else { a };
        if !(0..=rank as i64).contains(&resolved) {
            return Err(Error::InvalidAxis { axis: a, rank });
        }
        shape.insert(resolved as usize, 1);
    }
    Ok(Tensor::from_parts(shape, x.to_vec(), x.dtype()))
}

pub fn relu_(x: &mut Tensor) -> Result<&mut Tensor> {
    for value in x.values_mut() {
        *value = value.max(0.0);
    }
    Ok(x)
}

pub fn less_than(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("less_than", x, y, |a, b| a < b)
}

pub fn less_equal(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("less_equal", x, y, |a, b| a <= b)
}

pub fn equal(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("equal", x, y, |a, b| a == b)
}

pub fn not_equal(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("not_equal", x, y, |a, b| a != b)
}

pub fn greater_than(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("greater_than", x, y, |a, b| a > b)
}

pub fn greater_equal(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    compare("greater_equal", x, y, |a, b| a >= b)
}

pub fn bitwise_and(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    bitwise("bitwise_and", x, y, |a, b| a & b)
}

pub fn bitwise_or(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    bitwise("bitwise_or", x, y, |a, b| a | b)
}

pub fn bitwise_xor(x: &Tensor, y: &Tensor) -> Result<Tensor> {
    bitwise("bitwise_xor", x, y, |a, b| a ^ b)
}

/// Logical not on `Bool` tensors, two's complement not on integers.
pub fn bitwise_not(x: &Tensor) -> Result<Tensor> {
    require_integral("bitwise_not", x)?;
    Ok(if x.dtype() == DataType::Bool {
        unary(x, DataType::Bool, |v| if v == 0.0 { 1.0 } else { 0.0 })
    } else {
        unary(x, x.dtype(), |v| !(v as i64) as f64)
    })
}

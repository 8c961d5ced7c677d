//! Tensor operants - mode-routed tensor operations.
//!
//! Tensor methods and operators are generated at build time from
//! `ops/ops.yaml` (filtered by `ops/tensor_operants.yaml`). Every call goes
//! through an [`OperantsManager`], which forwards it to the backend installed
//! for the current [`Mode`].
//!
//! # Primary Usage
//!
//! ```ignore
//! use tensor_operants::{phi, Mode, OperantsManager, Scalar, Tensor};
//!
//! let manager = OperantsManager::global();
//! phi::register(manager)?;
//! manager.set_mode(Mode::Phi);
//!
//! let x = Tensor::new(vec![2], vec![1.0, -2.0])?;
//! let y = (&x * Scalar::from(3.0))?;
//! let total = y.abs()?.sum(&Default::default(), Default::default(), false)?;
//! ```
//!
//! # Architecture
//!
//! - [`operants`] - the generated backend trait
//! - [`manager`] - slots, mode and routing
//! - [`phi`] - the reference backend
//! - [`kernels`] - CPU kernels behind the reference backend
//! - [`tensor`] / [`tensor_api`] - value types and their generated methods

pub mod error;
pub mod kernels;
pub mod manager;
pub mod mode;
pub mod operants;
pub mod phi;
pub mod tensor;
pub mod tensor_api;

pub use error::{Error, Result};
pub use manager::{ManagerScope, OperantsManager};
pub use mode::{Mode, ModeFlag, MODE_ENV};
pub use operants::{OpSignature, TensorOperants};
pub use phi::PhiTensorOperants;
pub use tensor::{DataType, IntArray, Scalar, Tensor};

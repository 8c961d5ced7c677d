//! Methods and operators on [`Tensor`](crate::tensor::Tensor).
//!
//! Every method forwards to [`OperantsManager::current`](crate::manager::OperantsManager::current),
//! so the backend serving a call follows the current mode. Operators return
//! `Result<Tensor>`:
//!
//! ```ignore
//! let z = (&(&x + &y)? * Scalar::from(2.0))?;
//! let mask = x.less_than(&y)?;
//! ```

include!(concat!(env!("OUT_DIR"), "/tensor_api.rs"));

//! Tensor operants source generator.
//!
//! `tensor-operants-gen` turns declarative operation specs (YAML lists of
//! `op`/`args` pairs) into the Rust sources of a tensor operator-overload
//! layer. One spec entry yields, in six mutually consistent files:
//!
//! - an abstract method on the `TensorOperants` trait,
//! - a concrete method on the `PhiTensorOperants` backend calling the kernels,
//! - a forwarding method (and operators where they fit) on `Tensor`,
//! - a routing method on `OperantsManager`, plus signature tables.
//!
//! ```ignore
//! use tensor_operants_gen::{generate_from_files, GenConfig};
//!
//! let artifacts = generate_from_files(&["ops/ops.yaml"], Some("ops/tensor_operants.yaml".as_ref()), GenConfig::default())?;
//! artifacts.publish(out_dir)?;
//! ```
//!
//! # Architecture
//!
//! - [`spec`] - spec entries, YAML loading and the allow-list
//! - [`signature`] - per-entry signature derivation
//! - [`emit`] - the six artifact emitters
//! - [`generator`] - validation, emission and publishing

pub mod emit;
pub mod error;
pub mod generator;
pub mod signature;
pub mod spec;

pub use emit::{Artifact, Emitter, GenConfig, GENERATED_MARKER};
pub use error::{GenError, GenResult};
pub use generator::{generate_from_files, Artifacts, Generator};
pub use signature::DerivedSignature;
pub use spec::{AllowList, DeclaredOp, OperandKind, SpecEntry, TypedParam};

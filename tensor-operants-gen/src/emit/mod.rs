//! Artifact emitters.
//!
//! Each emitter turns a [`DerivedSignature`] into one text fragment of one
//! generated source file. All six share the same contract:
//!
//! ```text
//! prologue            fixed marker line + opening scaffold
//! emit(sig) ...       one fragment per eligible entry, in declaration order
//! epilogue            fixed closing scaffold
//! ```
//!
//! Emitters are pure: the same signatures always produce the same bytes.

mod backend;
mod facade;
mod interface;
mod manager;

pub use backend::{BackendDeclarationEmitter, BackendDefinitionEmitter};
pub use facade::FacadeEmitter;
pub use interface::InterfaceEmitter;
pub use manager::{ManagerDeclarationEmitter, ManagerDispatchEmitter};

use std::fmt;

use crate::signature::{rust_ident, DerivedSignature};

/// First line of every generated file.
pub const GENERATED_MARKER: &str = "// Generated by tensor-operants-gen. Do not edit.\n";

/// Shared imports of the artifacts that spell out parameter types.
pub(crate) const TYPE_IMPORTS: &str = "\
#[allow(unused_imports)]
use crate::tensor::{DataType, IntArray, Scalar, Tensor};
use crate::error::Result;
";

/// The six generated source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    Interface,
    Facade,
    BackendDeclaration,
    BackendDefinition,
    ManagerDeclaration,
    ManagerDispatch,
}

impl Artifact {
    pub const ALL: [Artifact; 6] = [
        Artifact::Interface,
        Artifact::Facade,
        Artifact::BackendDeclaration,
        Artifact::BackendDefinition,
        Artifact::ManagerDeclaration,
        Artifact::ManagerDispatch,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Interface => "operants_base.rs",
            Artifact::Facade => "tensor_api.rs",
            Artifact::BackendDeclaration => "tensor_operants_decl.rs",
            Artifact::BackendDefinition => "tensor_operants_impl.rs",
            Artifact::ManagerDeclaration => "operants_manager_decl.rs",
            Artifact::ManagerDispatch => "operants_manager_impl.rs",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Generation options that change emitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenConfig {
    /// Module path of the numeric kernels called by backend bodies.
    pub kernels_path: String,
    /// Whether the kernel set offers `scale`, used for scalar multiplication.
    pub scale_kernel: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            kernels_path: "crate::kernels".to_string(),
            scale_kernel: true,
        }
    }
}

/// One generated source file's writer.
pub trait Emitter {
    fn artifact(&self) -> Artifact;

    fn prologue(&self, out: &mut String);

    fn emit(&self, sig: &DerivedSignature, out: &mut String);

    fn epilogue(&self, out: &mut String);

    /// Method names this emitter defines for `sig`, for collision checks.
    fn methods(&self, sig: &DerivedSignature) -> Vec<String>;

    /// Methods written by hand on the type this artifact extends.
    fn reserved_methods(&self) -> &'static [&'static str] {
        &[]
    }
}

/// The six emitters in artifact order.
pub fn all_emitters(config: &GenConfig) -> Vec<Box<dyn Emitter>> {
    vec![
        Box::new(InterfaceEmitter),
        Box::new(FacadeEmitter),
        Box::new(BackendDeclarationEmitter),
        Box::new(BackendDefinitionEmitter::new(config.clone())),
        Box::new(ManagerDeclarationEmitter),
        Box::new(ManagerDispatchEmitter),
    ]
}

/// Methods on the interface and the backend: internal names.
pub(crate) fn backend_methods(sig: &DerivedSignature) -> Vec<String> {
    std::iter::once(sig.function_name.clone())
        .chain(sig.overloads.iter().map(|o| o.method.clone()))
        .collect()
}

/// A method routed by the manager: public name, backend target, signature.
///
/// `name` and `target` are unescaped operation names.
pub(crate) struct Route {
    pub name: String,
    pub target: String,
    pub head: String,
    pub call_args: String,
}

/// Every manager method derived from `sig`: the declared operation, the
/// public alias when there is one, then the scalar overloads.
pub(crate) fn manager_routes(sig: &DerivedSignature) -> Vec<Route> {
    let mut routes = vec![Route {
        name: sig.function_name.clone(),
        target: sig.function_name.clone(),
        head: sig.head(&sig.ident()),
        call_args: sig.call_args(),
    }];
    if let Some(alias) = &sig.alias_name {
        routes.push(Route {
            name: alias.clone(),
            target: sig.function_name.clone(),
            head: sig.head(&rust_ident(alias)),
            call_args: sig.call_args(),
        });
    }
    routes.extend(sig.overloads.iter().map(|overload| Route {
        name: overload.public_name.clone(),
        target: overload.method.clone(),
        head: overload.head(&overload.public_name),
        call_args: overload.call_args(),
    }));
    routes
}

/// Rust string literal for a signature table entry.
pub(crate) fn literal(text: &str) -> String {
    format!("{text:?}")
}

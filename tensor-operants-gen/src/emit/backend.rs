//! The phi backend: its method table and its kernel-calling implementation.

use super::{backend_methods, literal, Artifact, Emitter, GenConfig, GENERATED_MARKER, TYPE_IMPORTS};
use crate::signature::{rust_ident, DerivedSignature, OperandOrder, ScalarOverload};

/// Writes `tensor_operants_decl.rs`: `PhiTensorOperants` and its `SIGNATURES`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackendDeclarationEmitter;

impl Emitter for BackendDeclarationEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::BackendDeclaration
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(
            "use crate::operants::OpSignature;\n\
             \n\
             /// Backend running every operation on the reference kernels.\n\
             #[derive(Debug, Default, Clone, Copy)]\n\
             pub struct PhiTensorOperants;\n\
             \n\
             impl PhiTensorOperants {\n\
             \x20   /// Every method of the backend with its signature.\n\
             \x20   pub const SIGNATURES: &'static [OpSignature] = &[\n",
        );
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        let name = &sig.function_name;
        out.push_str(&format!(
            "        OpSignature::new({}, {}, {}),\n",
            literal(name),
            literal(name),
            literal(&sig.head(&sig.ident())),
        ));
        for overload in &sig.overloads {
            out.push_str(&format!(
                "        OpSignature::new({}, {}, {}),\n",
                literal(&overload.method),
                literal(&overload.method),
                literal(&overload.head(&rust_ident(&overload.method))),
            ));
        }
    }

    fn epilogue(&self, out: &mut String) {
        out.push_str("    ];\n}\n");
    }

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        backend_methods(sig)
    }
}

/// Writes `tensor_operants_impl.rs`: `impl TensorOperants for PhiTensorOperants`.
#[derive(Debug, Clone)]
pub struct BackendDefinitionEmitter {
    config: GenConfig,
}

impl BackendDefinitionEmitter {
    pub fn new(config: GenConfig) -> Self {
        Self { config }
    }

    fn overload_body(&self, sig: &DerivedSignature, overload: &ScalarOverload) -> String {
        let k = &self.config.kernels_path;
        let op = sig.ident();
        let (lhs, rhs) = (&overload.lhs, &overload.rhs);
        let scaled = self.config.scale_kernel && sig.function_name == "multiply";
        match (overload.order, scaled) {
            (OperandOrder::TensorScalar, true) => format!("{k}::scale({lhs}, {rhs}, 0.0, true)"),
            (OperandOrder::ScalarTensor, true) => format!("{k}::scale({rhs}, {lhs}, 0.0, true)"),
            (OperandOrder::TensorScalar, false) => {
                format!("{k}::{op}({lhs}, &{k}::full_like({lhs}, {rhs})?)")
            }
            (OperandOrder::ScalarTensor, false) => {
                format!("{k}::{op}(&{k}::full_like({rhs}, {lhs})?, {rhs})")
            }
        }
    }
}

impl Emitter for BackendDefinitionEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::BackendDefinition
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(TYPE_IMPORTS);
        out.push_str(
            "use crate::operants::TensorOperants;\n\
             use crate::phi::PhiTensorOperants;\n\
             \n\
             impl TensorOperants for PhiTensorOperants {\n",
        );
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        out.push_str(&format!(
            "    {} {{\n        {}::{}({})\n    }}\n\n",
            sig.head(&sig.ident()),
            self.config.kernels_path,
            sig.ident(),
            sig.call_args(),
        ));
        for overload in &sig.overloads {
            out.push_str(&format!(
                "    {} {{\n        {}\n    }}\n\n",
                overload.head(&rust_ident(&overload.method)),
                self.overload_body(sig, overload),
            ));
        }
    }

    fn epilogue(&self, out: &mut String) {
        out.push_str("}\n");
    }

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        backend_methods(sig)
    }
}

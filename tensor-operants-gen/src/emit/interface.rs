//! Abstract operations trait every backend implements.

use super::{backend_methods, Artifact, Emitter, GENERATED_MARKER, TYPE_IMPORTS};
use crate::signature::{rust_ident, DerivedSignature};

/// Writes `operants_base.rs`: the `TensorOperants` trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterfaceEmitter;

impl Emitter for InterfaceEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::Interface
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(TYPE_IMPORTS);
        out.push_str(
            "\n/// Operations a backend provides to the operants manager.\n\
             ///\n\
             /// Arguments keep their declared order, receiver first.\n\
             pub trait TensorOperants: Send + Sync {\n",
        );
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        out.push_str(&format!("    /// `{}`\n", sig.spec_call()));
        if let Some(doc) = sig.defaults_doc() {
            out.push_str(&format!("    ///\n    /// {doc}\n"));
        }
        out.push_str(&format!("    {};\n", sig.head(&sig.ident())));
        for overload in &sig.overloads {
            out.push_str(&format!(
                "\n    {};\n",
                overload.head(&rust_ident(&overload.method))
            ));
        }
        out.push('\n');
    }

    fn epilogue(&self, out: &mut String) {
        out.push_str("}\n");
    }

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        backend_methods(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecEntry;

    fn render(name: &str, args: &str) -> String {
        let sig = DerivedSignature::derive(&SpecEntry::from_args(name, args).unwrap()).unwrap();
        let mut out = String::new();
        InterfaceEmitter.emit(&sig, &mut out);
        out
    }

    #[test]
    fn declares_operation_and_overloads() {
        let out = render("add", "(Tensor x, Tensor y)");
        assert!(out.contains("    fn add(&self, x: &Tensor, y: &Tensor) -> Result<Tensor>;\n"));
        assert!(out.contains("    fn add_scalar(&self, x: &Tensor, y: Scalar) -> Result<Tensor>;\n"));
        assert!(out.contains("    fn scalar_add(&self, x: Scalar, y: &Tensor) -> Result<Tensor>;\n"));
    }

    #[test]
    fn alias_keeps_internal_name() {
        let out = render("elementwise_pow", "(Tensor x, Tensor y)");
        assert!(out.contains("fn elementwise_pow(&self"));
        assert!(out.contains("fn elementwise_pow_scalar(&self"));
        assert!(!out.contains("fn pow("));
    }

    #[test]
    fn defaults_are_documented() {
        let out = render("sum", "(Tensor x, IntArray axis={}, bool keepdim=false)");
        assert!(out.contains("/// Defaults: `axis = {}`, `keepdim = false`."));
        assert!(out.contains("fn sum(&self, x: &Tensor, axis: &IntArray, keepdim: bool)"));
    }

    #[test]
    fn scaffold_opens_and_closes_trait() {
        let mut out = String::new();
        InterfaceEmitter.prologue(&mut out);
        InterfaceEmitter.epilogue(&mut out);
        assert!(out.starts_with(GENERATED_MARKER));
        assert!(out.contains("pub trait TensorOperants: Send + Sync {\n"));
        assert!(out.ends_with("}\n"));
    }
}

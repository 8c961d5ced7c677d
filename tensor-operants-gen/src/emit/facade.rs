//! User-facing methods and operators on `Tensor`.
//!
//! Every method forwards, receiver first, to the manager returned by
//! `OperantsManager::current()`. Operator bindings are only produced for
//! operations whose declared shape fits the operator:
//!
//! | operation                         | operators                                  |
//! |-----------------------------------|--------------------------------------------|
//! | add, subtract, multiply, divide   | `Add` `Sub` `Mul` `Div`, tensor and scalar |
//! | bitwise_and, bitwise_or, ...xor   | `BitAnd` `BitOr` `BitXor`                  |
//! | bitwise_not                       | `Not`                                      |
//! | scale                             | `Neg`                                      |

use super::{Artifact, Emitter, GENERATED_MARKER, TYPE_IMPORTS};
use crate::signature::{rust_ident, DerivedSignature, OperandOrder};
use crate::spec::OperandKind;

const ARITHMETIC_OPERATORS: [(&str, &str, &str); 4] = [
    ("add", "Add", "add"),
    ("subtract", "Sub", "sub"),
    ("multiply", "Mul", "mul"),
    ("divide", "Div", "div"),
];

const BITWISE_OPERATORS: [(&str, &str, &str); 3] = [
    ("bitwise_and", "BitAnd", "bitand"),
    ("bitwise_or", "BitOr", "bitor"),
    ("bitwise_xor", "BitXor", "bitxor"),
];

/// Inherent methods of `Tensor` outside the generated facade.
const TENSOR_METHODS: [&str; 10] = [
    "new",
    "with_dtype",
    "full",
    "shape",
    "numel",
    "dtype",
    "values",
    "to_vec",
    "values_mut",
    "from_parts",
];

/// Writes `tensor_api.rs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeEmitter;

impl FacadeEmitter {
    fn public_name(sig: &DerivedSignature) -> String {
        rust_ident(sig.alias_name.as_deref().unwrap_or(&sig.function_name))
    }

    fn emit_methods(sig: &DerivedSignature, out: &mut String) {
        let name = Self::public_name(sig);
        out.push_str("impl Tensor {\n");
        out.push_str(&format!("    /// `{}`\n", sig.spec_call()));
        if let Some(doc) = sig.defaults_doc() {
            out.push_str(&format!("    ///\n    /// {doc}\n"));
        }
        out.push_str(&format!(
            "    pub fn {name}({}) -> {} {{\n        OperantsManager::current().{name}({})\n    }}\n",
            sig.facade_params(),
            sig.facade_return_type(),
            sig.facade_call_args(),
        ));
        for overload in &sig.overloads {
            let method = rust_ident(&overload.public_name);
            let params = match overload.order {
                OperandOrder::TensorScalar => format!("&self, {}: Scalar", overload.rhs),
                OperandOrder::ScalarTensor => overload.params(),
            };
            let args = match overload.order {
                OperandOrder::TensorScalar => format!("self, {}", overload.rhs),
                OperandOrder::ScalarTensor => overload.call_args(),
            };
            out.push_str(&format!(
                "\n    pub fn {method}({params}) -> Result<Tensor> {{\n        OperantsManager::current().{method}({args})\n    }}\n"
            ));
        }
        out.push_str("}\n");
    }

    fn emit_operators(sig: &DerivedSignature, out: &mut String) {
        let op = sig.function_name.as_str();
        if let Some((_, tr, method)) = ARITHMETIC_OPERATORS.iter().find(|(name, ..)| *name == op) {
            binary_operator(out, tr, method, "&Tensor", "&Tensor", &format!("Tensor::{op}(self, rhs)"));
            for overload in &sig.overloads {
                let call = format!("Tensor::{}(self, rhs)", overload.public_name);
                match overload.order {
                    OperandOrder::TensorScalar => {
                        binary_operator(out, tr, method, "&Tensor", "Scalar", &call)
                    }
                    OperandOrder::ScalarTensor => {
                        binary_operator(out, tr, method, "Scalar", "&Tensor", &call)
                    }
                }
            }
            return;
        }
        if let Some((_, tr, method)) = BITWISE_OPERATORS.iter().find(|(name, ..)| *name == op) {
            if sig.has_shape(&[OperandKind::Tensor, OperandKind::Tensor], &[]) {
                binary_operator(out, tr, method, "&Tensor", "&Tensor", &format!("Tensor::{op}(self, rhs)"));
            }
            return;
        }
        if op == "bitwise_not" && sig.has_shape(&[OperandKind::Tensor], &[]) {
            unary_operator(out, "Not", "not", "Tensor::bitwise_not(self)");
        }
        if op == "scale"
            && sig.has_shape(
                &[OperandKind::Tensor],
                &[OperandKind::Scalar, OperandKind::Float32, OperandKind::Bool],
            )
        {
            unary_operator(
                out,
                "Neg",
                "neg",
                "Tensor::scale(self, Scalar::Float(-1.0), 0.0, true)",
            );
        }
    }
}

fn binary_operator(out: &mut String, tr: &str, method: &str, lhs: &str, rhs: &str, call: &str) {
    let (generics, rhs) = match rhs.strip_prefix('&') {
        Some(ty) => ("<'a>", format!("&'a {ty}")),
        None => ("", rhs.to_string()),
    };
    out.push_str(&format!(
        "\nimpl{generics} std::ops::{tr}<{rhs}> for {lhs} {{\n    type Output = Result<Tensor>;\n\n    fn {method}(self, rhs: {rhs}) -> Result<Tensor> {{\n        {call}\n    }}\n}}\n"
    ));
}

fn unary_operator(out: &mut String, tr: &str, method: &str, call: &str) {
    out.push_str(&format!(
        "\nimpl std::ops::{tr} for &Tensor {{\n    type Output = Result<Tensor>;\n\n    fn {method}(self) -> Result<Tensor> {{\n        {call}\n    }}\n}}\n"
    ));
}

impl Emitter for FacadeEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::Facade
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(TYPE_IMPORTS);
        out.push_str("use crate::manager::OperantsManager;\n");
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        out.push('\n');
        Self::emit_methods(sig, out);
        Self::emit_operators(sig, out);
    }

    fn epilogue(&self, _out: &mut String) {}

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        std::iter::once(sig.alias_name.clone().unwrap_or_else(|| sig.function_name.clone()))
            .chain(sig.overloads.iter().map(|o| o.public_name.clone()))
            .collect()
    }

    fn reserved_methods(&self) -> &'static [&'static str] {
        &TENSOR_METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecEntry;

    fn render(name: &str, args: &str) -> String {
        let sig = DerivedSignature::derive(&SpecEntry::from_args(name, args).unwrap()).unwrap();
        let mut out = String::new();
        FacadeEmitter.emit(&sig, &mut out);
        out
    }

    #[test]
    fn forwards_receiver_first() {
        let out = render(
            "scale",
            "(Tensor x, Scalar scale=1.0, float bias=0.0, bool bias_after_scale=true)",
        );
        assert!(out.contains(
            "pub fn scale(&self, scale: Scalar, bias: f32, bias_after_scale: bool) -> Result<Tensor> {\n        OperantsManager::current().scale(self, scale, bias, bias_after_scale)\n"
        ));
        assert!(out.contains("impl std::ops::Neg for &Tensor"));
        assert!(out.contains("Tensor::scale(self, Scalar::Float(-1.0), 0.0, true)"));
    }

    #[test]
    fn arithmetic_binds_all_operand_orders() {
        let out = render("subtract", "(Tensor x, Tensor y)");
        assert!(out.contains("impl<'a> std::ops::Sub<&'a Tensor> for &Tensor"));
        assert!(out.contains("impl std::ops::Sub<Scalar> for &Tensor"));
        assert!(out.contains("impl<'a> std::ops::Sub<&'a Tensor> for Scalar"));
        assert!(out.contains("Tensor::scalar_subtract(self, rhs)"));
        assert!(out.contains(
            "pub fn scalar_subtract(x: Scalar, y: &Tensor) -> Result<Tensor> {\n        OperantsManager::current().scalar_subtract(x, y)"
        ));
        assert!(out.contains("pub fn subtract_scalar(&self, y: Scalar)"));
    }

    #[test]
    fn alias_uses_public_name() {
        let out = render("elementwise_pow", "(Tensor x, Tensor y)");
        assert!(out.contains("pub fn pow(&self, y: &Tensor)"));
        assert!(out.contains("OperantsManager::current().pow(self, y)"));
        assert!(out.contains("pub fn pow_scalar(&self, y: Scalar)"));
        assert!(!out.contains("pub fn elementwise_pow"));
    }

    #[test]
    fn inplace_borrows_mutably() {
        let out = render("relu_", "(Tensor x)");
        assert!(out.contains("pub fn relu_(&mut self) -> Result<&mut Tensor>"));
    }

    #[test]
    fn comparisons_have_no_operators() {
        let out = render("less_than", "(Tensor x, Tensor y)");
        assert!(out.contains("pub fn less_than(&self, y: &Tensor)"));
        assert!(!out.contains("impl std::ops"));
    }

    #[test]
    fn operators_require_matching_shape() {
        assert!(!render("bitwise_and", "(Tensor x, Tensor y, bool fast=false)").contains("BitAnd"));
        assert!(render("bitwise_and", "(Tensor x, Tensor y)").contains("impl<'a> std::ops::BitAnd<&'a Tensor> for &Tensor"));
        assert!(!render("scale", "(Tensor x, Scalar scale=1.0)").contains("Neg"));
        assert!(render("bitwise_not", "(Tensor x)").contains("impl std::ops::Not for &Tensor"));
    }
}

// This module derives, from one validated SpecEntry, every function shape the emitters need.
// The first input becomes the receiver and must be a plain tensor; the remaining inputs and
// the attributes are derived twice, once keeping default literals (declarations) and once
// stripping them (definitions). The backend call argument list keeps the declared order,
// receiver first, because the kernel layer beneath the backend depends on it. Inplace entries
// get reference-qualified receiver and return types. The four arithmetic operations gain a
// tensor-scalar and a scalar-tensor overload, and operations with a public alias gain the
// alias name plus a tensor-scalar overload under the alias.

//! Signature derivation shared by all emitters.

use crate::error::{GenError, GenResult};
use crate::spec::{OperandKind, SpecEntry, TypedParam};

/// Operations that get both scalar operand orders.
pub const ARITHMETIC_OPS: [&str; 4] = ["add", "subtract", "multiply", "divide"];

/// Internal primitives exposed to manager and facade callers under another name.
pub const ALIASES: [(&str, &str); 1] = [("elementwise_pow", "pow")];

const RESERVED: [&str; 4] = ["self", "Self", "super", "crate"];

const KEYWORDS: [&str; 47] = [
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "try", "typeof", "unsized", "virtual", "yield",
];

/// Render `name` as a Rust identifier, escaping keywords.
pub fn rust_ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Public name of `op`, if it is an aliased primitive.
pub fn alias_of(op: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(internal, _)| *internal == op)
        .map(|(_, public)| *public)
}

/// Order of the operands in a scalar overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandOrder {
    TensorScalar,
    ScalarTensor,
}

/// A derived overload taking one scalar and one tensor operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarOverload {
    pub order: OperandOrder,
    /// Method name on the interface and the backend.
    pub method: String,
    /// Method name on the manager and the facade.
    pub public_name: String,
    pub lhs: String,
    pub rhs: String,
}

impl ScalarOverload {
    fn new(order: OperandOrder, method: String, public_name: String, lhs: &str, rhs: &str) -> Self {
        Self {
            order,
            method,
            public_name,
            lhs: rust_ident(lhs),
            rhs: rust_ident(rhs),
        }
    }

    pub fn params(&self) -> String {
        match self.order {
            OperandOrder::TensorScalar => format!("{}: &Tensor, {}: Scalar", self.lhs, self.rhs),
            OperandOrder::ScalarTensor => format!("{}: Scalar, {}: &Tensor", self.lhs, self.rhs),
        }
    }

    pub fn call_args(&self) -> String {
        format!("{}, {}", self.lhs, self.rhs)
    }

    /// `fn <name>(&self, ..) -> Result<Tensor>` with the given method name.
    pub fn head(&self, name: &str) -> String {
        format!("fn {name}(&self, {}) -> Result<Tensor>", self.params())
    }
}

/// Every function shape derived from one spec entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSignature {
    pub function_name: String,
    pub is_inplace: bool,
    pub receiver: TypedParam,
    /// Parameters after the receiver, defaults kept.
    pub declare_params: Vec<TypedParam>,
    /// Parameters after the receiver, defaults stripped.
    pub define_params: Vec<TypedParam>,
    /// Argument names in declared order, receiver first.
    pub backend_call_args: Vec<String>,
    pub alias_name: Option<String>,
    pub overloads: Vec<ScalarOverload>,
    /// Kinds of the declared inputs, receiver included.
    pub input_kinds: Vec<OperandKind>,
    /// Kinds of the declared attributes.
    pub attr_kinds: Vec<OperandKind>,
}

impl DerivedSignature {
    /// Validate `entry` and derive its signatures.
    pub fn derive(entry: &SpecEntry) -> GenResult<Self> {
        let op = entry.name.as_str();
        if RESERVED.contains(&op) {
            return Err(GenError::validation(op, "operation name is reserved"));
        }
        let receiver = match entry.inputs.first() {
            None => return Err(GenError::validation(op, "operation has no tensor inputs")),
            Some(first) if first.kind != OperandKind::Tensor => {
                return Err(GenError::validation(
                    op,
                    format!("the first argument must be Tensor, but received {}", first.kind),
                ))
            }
            Some(first) => first.clone(),
        };
        if let Some(param) = entry
            .inputs
            .iter()
            .chain(&entry.attrs)
            .find(|param| RESERVED.contains(&param.name.as_str()))
        {
            return Err(GenError::validation(
                op,
                format!("parameter name `{}` is reserved", param.name),
            ));
        }

        let declare_params: Vec<TypedParam> = entry.inputs[1..]
            .iter()
            .chain(&entry.attrs)
            .cloned()
            .collect();
        let define_params = declare_params.iter().map(TypedParam::without_default).collect();
        let backend_call_args = entry
            .inputs
            .iter()
            .chain(&entry.attrs)
            .map(|param| rust_ident(&param.name))
            .collect();

        let alias_name = alias_of(op).map(str::to_string);
        let mut overloads = Vec::new();
        if ARITHMETIC_OPS.contains(&op) || alias_name.is_some() {
            let (lhs, rhs) = binary_operands(entry)?;
            let public = alias_name.as_deref().unwrap_or(op);
            overloads.push(ScalarOverload::new(
                OperandOrder::TensorScalar,
                format!("{op}_scalar"),
                format!("{public}_scalar"),
                lhs,
                rhs,
            ));
            if ARITHMETIC_OPS.contains(&op) {
                overloads.push(ScalarOverload::new(
                    OperandOrder::ScalarTensor,
                    format!("scalar_{op}"),
                    format!("scalar_{op}"),
                    lhs,
                    rhs,
                ));
            }
        }

        Ok(Self {
            function_name: op.to_string(),
            is_inplace: entry.is_inplace(),
            receiver,
            declare_params,
            define_params,
            backend_call_args,
            alias_name,
            overloads,
            input_kinds: entry.inputs.iter().map(|param| param.kind).collect(),
            attr_kinds: entry.attrs.iter().map(|param| param.kind).collect(),
        })
    }

    /// Method identifier of the declared operation.
    pub fn ident(&self) -> String {
        rust_ident(&self.function_name)
    }

    /// Lifetime parameters of the method, if any.
    pub fn generics(&self) -> &'static str {
        if self.is_inplace {
            "<'a>"
        } else {
            ""
        }
    }

    pub fn receiver_type(&self) -> &'static str {
        if self.is_inplace {
            "&'a mut Tensor"
        } else {
            "&Tensor"
        }
    }

    pub fn return_type(&self) -> &'static str {
        if self.is_inplace {
            "Result<&'a mut Tensor>"
        } else {
            "Result<Tensor>"
        }
    }

    /// Every parameter, receiver first, as used by interface, backend and manager.
    pub fn params(&self) -> String {
        let mut rendered = vec![format!(
            "{}: {}",
            rust_ident(&self.receiver.name),
            self.receiver_type()
        )];
        rendered.extend(self.define_params.iter().map(render_param));
        rendered.join(", ")
    }

    /// `fn <name><'a>(&self, ..) -> Result<..>` with the given method name.
    pub fn head(&self, name: &str) -> String {
        format!(
            "fn {name}{}(&self, {}) -> {}",
            self.generics(),
            self.params(),
            self.return_type()
        )
    }

    pub fn call_args(&self) -> String {
        self.backend_call_args.join(", ")
    }

    /// Facade receiver, matching the inplace qualification.
    pub fn facade_receiver(&self) -> &'static str {
        if self.is_inplace {
            "&mut self"
        } else {
            "&self"
        }
    }

    pub fn facade_return_type(&self) -> &'static str {
        if self.is_inplace {
            "Result<&mut Tensor>"
        } else {
            "Result<Tensor>"
        }
    }

    /// Facade parameter list: receiver replaced by `self`.
    pub fn facade_params(&self) -> String {
        let mut rendered = vec![self.facade_receiver().to_string()];
        rendered.extend(self.define_params.iter().map(render_param));
        rendered.join(", ")
    }

    /// Manager call arguments from the facade: `self` first.
    pub fn facade_call_args(&self) -> String {
        let mut args = vec!["self".to_string()];
        args.extend(self.backend_call_args.iter().skip(1).cloned());
        args.join(", ")
    }

    /// Documentation line listing default literals, from the declaration pass.
    pub fn defaults_doc(&self) -> Option<String> {
        let defaults: Vec<String> = self
            .declare_params
            .iter()
            .filter_map(|param| {
                param
                    .default
                    .as_ref()
                    .map(|literal| format!("`{} = {}`", param.name, literal))
            })
            .collect();
        if defaults.is_empty() {
            None
        } else {
            Some(format!("Defaults: {}.", defaults.join(", ")))
        }
    }

    /// Declared call as written in the operation file, e.g. `add(x, y)`.
    pub fn spec_call(&self) -> String {
        let names: Vec<&str> = std::iter::once(self.receiver.name.as_str())
            .chain(self.declare_params.iter().map(|param| param.name.as_str()))
            .collect();
        format!("{}({})", self.function_name, names.join(", "))
    }

    /// Whether the declared operation takes exactly these inputs and attributes.
    pub fn has_shape(&self, inputs: &[OperandKind], attrs: &[OperandKind]) -> bool {
        self.input_kinds == inputs && self.attr_kinds == attrs
    }
}

fn render_param(param: &TypedParam) -> String {
    format!("{}: {}", rust_ident(&param.name), param.kind.rust_type())
}

fn binary_operands(entry: &SpecEntry) -> GenResult<(&str, &str)> {
    match (entry.inputs.as_slice(), entry.attrs.is_empty()) {
        ([x, y], true) if x.kind == OperandKind::Tensor && y.kind == OperandKind::Tensor => {
            Ok((x.name.as_str(), y.name.as_str()))
        }
        _ => Err(GenError::validation(
            &entry.name,
            "scalar overloads require exactly two Tensor inputs and no attributes",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, args: &str) -> SpecEntry {
        SpecEntry::from_args(name, args).unwrap()
    }

    #[test]
    fn receiver_is_excluded_from_declared_params() {
        let sig = DerivedSignature::derive(&entry(
            "scale",
            "(Tensor x, Scalar scale=1.0, float bias=0.0, bool bias_after_scale=true)",
        ))
        .unwrap();

        assert_eq!(sig.receiver.name, "x");
        assert_eq!(sig.declare_params.len(), 3);
        assert_eq!(sig.declare_params[1].default.as_deref(), Some("0.0"));
        assert!(sig.define_params.iter().all(|p| p.default.is_none()));
        assert_eq!(sig.backend_call_args, ["x", "scale", "bias", "bias_after_scale"]);
        assert_eq!(
            sig.head("scale"),
            "fn scale(&self, x: &Tensor, scale: Scalar, bias: f32, bias_after_scale: bool) -> Result<Tensor>"
        );
        assert_eq!(
            sig.defaults_doc().as_deref(),
            Some("Defaults: `scale = 1.0`, `bias = 0.0`, `bias_after_scale = true`.")
        );
    }

    #[test]
    fn call_args_keep_declared_order() {
        let sig = DerivedSignature::derive(&entry(
            "lerp",
            "(Tensor x, Tensor y, Tensor? weight, int64_t axis=-1)",
        ))
        .unwrap();
        assert_eq!(sig.call_args(), "x, y, weight, axis");
        assert_eq!(sig.facade_call_args(), "self, y, weight, axis");
        assert_eq!(
            sig.facade_params(),
            "&self, y: &Tensor, weight: Option<&Tensor>, axis: i64"
        );
    }

    #[test]
    fn inplace_qualifies_receiver_and_return() {
        let sig = DerivedSignature::derive(&entry("relu_", "(Tensor x)")).unwrap();
        assert!(sig.is_inplace);
        assert_eq!(
            sig.head("relu_"),
            "fn relu_<'a>(&self, x: &'a mut Tensor) -> Result<&'a mut Tensor>"
        );
        assert_eq!(sig.facade_params(), "&mut self");
        assert_eq!(sig.facade_return_type(), "Result<&mut Tensor>");
    }

    #[test]
    fn non_inplace_is_never_qualified() {
        let sig = DerivedSignature::derive(&entry("relu", "(Tensor x)")).unwrap();
        assert!(!sig.head("relu").contains("mut"));
        assert_eq!(sig.generics(), "");
    }

    #[test]
    fn first_input_must_be_plain_tensor() {
        for args in ["(Tensor? x, Tensor y)", "(Tensor[] x)", "(Tensor& x)", "(Scalar s)", "()"] {
            let err = DerivedSignature::derive(&entry("bad_op", args)).unwrap_err();
            match err {
                GenError::Validation { op, .. } => assert_eq!(op, "bad_op"),
                other => panic!("unexpected error for {args}: {other}"),
            }
        }
    }

    #[test]
    fn arithmetic_gets_both_scalar_orders() {
        let sig = DerivedSignature::derive(&entry("subtract", "(Tensor x, Tensor y)")).unwrap();
        let names: Vec<_> = sig.overloads.iter().map(|o| o.public_name.as_str()).collect();
        assert_eq!(names, ["subtract_scalar", "scalar_subtract"]);
        assert_eq!(
            sig.overloads[1].head("scalar_subtract"),
            "fn scalar_subtract(&self, x: Scalar, y: &Tensor) -> Result<Tensor>"
        );
        assert_eq!(sig.alias_name, None);
    }

    #[test]
    fn arithmetic_requires_binary_tensor_shape() {
        let err = DerivedSignature::derive(&entry("add", "(Tensor x, Scalar y)")).unwrap_err();
        assert!(matches!(err, GenError::Validation { .. }));
    }

    #[test]
    fn alias_keeps_internal_method_name() {
        let sig = DerivedSignature::derive(&entry("elementwise_pow", "(Tensor x, Tensor y)")).unwrap();
        assert_eq!(sig.alias_name.as_deref(), Some("pow"));
        assert_eq!(sig.overloads.len(), 1);
        assert_eq!(sig.overloads[0].method, "elementwise_pow_scalar");
        assert_eq!(sig.overloads[0].public_name, "pow_scalar");
    }

    #[test]
    fn keywords_are_escaped() {
        let sig = DerivedSignature::derive(&entry("where", "(Tensor x, Tensor type)")).unwrap();
        assert_eq!(sig.ident(), "r#where");
        assert_eq!(sig.call_args(), "x, r#type");
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert!(DerivedSignature::derive(&entry("crate", "(Tensor x)")).is_err());
        assert!(DerivedSignature::derive(&entry("op", "(Tensor x, bool self)")).is_err());
    }
}

//! Routing surface of `OperantsManager`.

use super::{literal, manager_routes, Artifact, Emitter, GENERATED_MARKER, TYPE_IMPORTS};
use crate::signature::{rust_ident, DerivedSignature};

fn route_names(sig: &DerivedSignature) -> Vec<String> {
    manager_routes(sig).into_iter().map(|route| route.name).collect()
}

/// Writes `operants_manager_decl.rs`: the manager's `SIGNATURES` table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagerDeclarationEmitter;

impl Emitter for ManagerDeclarationEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::ManagerDeclaration
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(
            "use crate::manager::OperantsManager;\n\
             use crate::operants::OpSignature;\n\
             \n\
             impl OperantsManager {\n\
             \x20   /// Every routed method with the backend method it reaches.\n\
             \x20   pub const SIGNATURES: &'static [OpSignature] = &[\n",
        );
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        for route in manager_routes(sig) {
            out.push_str(&format!(
                "        OpSignature::new({}, {}, {}),\n",
                literal(&route.name),
                literal(&route.target),
                literal(&route.head),
            ));
        }
    }

    fn epilogue(&self, out: &mut String) {
        out.push_str("    ];\n}\n");
    }

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        route_names(sig)
    }
}

/// Inherent methods of `OperantsManager` outside the generated routing surface.
const MANAGER_METHODS: [&str; 12] = [
    "new",
    "from_env",
    "global",
    "current",
    "enter",
    "set_operants",
    "operants",
    "set_mode",
    "set_mode_str",
    "mode",
    "slot",
    "route",
];

/// Writes `operants_manager_impl.rs`: one routing method per table row.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagerDispatchEmitter;

impl Emitter for ManagerDispatchEmitter {
    fn artifact(&self) -> Artifact {
        Artifact::ManagerDispatch
    }

    fn prologue(&self, out: &mut String) {
        out.push_str(GENERATED_MARKER);
        out.push_str(TYPE_IMPORTS);
        out.push_str(
            "#[allow(unused_imports)]\n\
             use crate::operants::TensorOperants;\n\
             use crate::manager::OperantsManager;\n\
             \n\
             impl OperantsManager {\n",
        );
    }

    fn emit(&self, sig: &DerivedSignature, out: &mut String) {
        for route in manager_routes(sig) {
            out.push_str(&format!(
                "    pub {} {{\n        self.route({})?.{}({})\n    }}\n\n",
                route.head,
                literal(&route.name),
                rust_ident(&route.target),
                route.call_args,
            ));
        }
    }

    fn epilogue(&self, out: &mut String) {
        out.push_str("}\n");
    }

    fn methods(&self, sig: &DerivedSignature) -> Vec<String> {
        route_names(sig)
    }

    fn reserved_methods(&self) -> &'static [&'static str] {
        &MANAGER_METHODS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecEntry;

    fn derive(name: &str, args: &str) -> DerivedSignature {
        DerivedSignature::derive(&SpecEntry::from_args(name, args).unwrap()).unwrap()
    }

    #[test]
    fn declaration_carries_symmetry_overloads() {
        let mut out = String::new();
        ManagerDeclarationEmitter.emit(&derive("add", "(Tensor x, Tensor y)"), &mut out);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("OpSignature::new(\"add\", \"add\","));
        assert!(rows[1].contains("\"add_scalar\", \"add_scalar\", \"fn add_scalar(&self, x: &Tensor, y: Scalar) -> Result<Tensor>\""));
        assert!(rows[2].contains("\"scalar_add\", \"scalar_add\", \"fn scalar_add(&self, x: Scalar, y: &Tensor) -> Result<Tensor>\""));
    }

    #[test]
    fn alias_routes_to_internal_target() {
        let sig = derive("elementwise_pow", "(Tensor x, Tensor y)");
        let mut out = String::new();
        ManagerDispatchEmitter.emit(&sig, &mut out);
        assert!(out.contains(
            "    pub fn pow(&self, x: &Tensor, y: &Tensor) -> Result<Tensor> {\n        self.route(\"pow\")?.elementwise_pow(x, y)\n    }\n"
        ));
        assert!(out.contains("self.route(\"pow_scalar\")?.elementwise_pow_scalar(x, y)"));
        assert!(out.contains("self.route(\"elementwise_pow\")?.elementwise_pow(x, y)"));
        assert_eq!(
            ManagerDispatchEmitter.methods(&sig),
            ["elementwise_pow", "pow", "pow_scalar"]
        );
    }

    #[test]
    fn dispatch_keeps_inplace_lifetimes() {
        let mut out = String::new();
        ManagerDispatchEmitter.emit(&derive("relu_", "(Tensor x)"), &mut out);
        assert!(out.contains(
            "pub fn relu_<'a>(&self, x: &'a mut Tensor) -> Result<&'a mut Tensor> {\n        self.route(\"relu_\")?.relu_(x)\n"
        ));
    }

    #[test]
    fn keyword_names_are_escaped_in_code_only() {
        let mut out = String::new();
        ManagerDispatchEmitter.emit(&derive("where", "(Tensor condition, Tensor x, Tensor y)"), &mut out);
        assert!(out.contains("pub fn r#where(&self, condition: &Tensor, x: &Tensor, y: &Tensor)"));
        assert!(out.contains("self.route(\"where\")?.r#where(condition, x, y)"));
    }
}

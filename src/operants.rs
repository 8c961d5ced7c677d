//! The backend interface.
//!
//! [`TensorOperants`] is generated from the operation specs: one method per
//! operation, plus `<op>_scalar` / `scalar_<op>` for the arithmetic ones.
//! Methods take their arguments in declared order, receiver first.

include!(concat!(env!("OUT_DIR"), "/operants_base.rs"));

/// One row of a signature table: a callable name, the backend method it
/// reaches, and the method's Rust signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSignature {
    pub name: &'static str,
    pub target: &'static str,
    pub signature: &'static str,
}

impl OpSignature {
    pub const fn new(name: &'static str, target: &'static str, signature: &'static str) -> Self {
        Self {
            name,
            target,
            signature,
        }
    }

    /// Find `name` in a table.
    pub fn lookup(table: &'static [OpSignature], name: &str) -> Option<&'static OpSignature> {
        table.iter().find(|row| row.name == name)
    }
}

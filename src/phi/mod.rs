//! The phi backend, running every operation on [`crate::kernels`].

mod declaration {
    include!(concat!(env!("OUT_DIR"), "/tensor_operants_decl.rs"));
}

mod definition {
    include!(concat!(env!("OUT_DIR"), "/tensor_operants_impl.rs"));
}

pub use declaration::PhiTensorOperants;

use crate::error::Result;
use crate::manager::OperantsManager;
use crate::mode::Mode;

/// Install [`PhiTensorOperants`] in the phi slot of `manager`.
pub fn register(manager: &OperantsManager) -> Result<()> {
    manager.set_operants(Mode::Phi, Box::new(PhiTensorOperants))
}

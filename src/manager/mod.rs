// This module implements the operants manager, the router between the generated Tensor facade
// and the backends. A manager holds three write-once backend slots (eager, static, phi) and a
// mode flag. Every generated routing method reads the mode once, selects the matching slot and
// forwards its arguments unchanged; an unset slot fails with UninitializedBackend and a mode
// value naming no slot fails with UnimplementedMode whatever the slots hold. There is no
// fallback between modes. The facade resolves its manager through current(): a manager
// entered on this thread with enter(), else the process-wide global() manager whose mode is
// read from TENSOR_OPERANTS_MODE on first use. The routing methods and the SIGNATURES table
// are generated into the child modules below.

//! Mode-based dispatch of tensor operations.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::mode::{Mode, ModeFlag};
use crate::operants::TensorOperants;

mod declaration {
    include!(concat!(env!("OUT_DIR"), "/operants_manager_decl.rs"));
}

mod dispatch {
    include!(concat!(env!("OUT_DIR"), "/operants_manager_impl.rs"));
}

static GLOBAL: OnceLock<OperantsManager> = OnceLock::new();

thread_local! {
    static SCOPED: Cell<Option<&'static OperantsManager>> = const { Cell::new(None) };
}

/// Routes every tensor operation to the backend of the current mode.
pub struct OperantsManager {
    eager_operants: OnceLock<Box<dyn TensorOperants>>,
    static_operants: OnceLock<Box<dyn TensorOperants>>,
    phi_operants: OnceLock<Box<dyn TensorOperants>>,
    mode: ModeFlag,
}

impl OperantsManager {
    /// A manager with empty slots and no mode set.
    pub const fn new() -> Self {
        Self {
            eager_operants: OnceLock::new(),
            static_operants: OnceLock::new(),
            phi_operants: OnceLock::new(),
            mode: ModeFlag::new(),
        }
    }

    /// A manager with empty slots and its mode read from `TENSOR_OPERANTS_MODE`.
    pub fn from_env() -> Self {
        Self {
            mode: ModeFlag::from_env(),
            ..Self::new()
        }
    }

    /// The process-wide manager, created from the environment on first use.
    pub fn global() -> &'static OperantsManager {
        GLOBAL.get_or_init(|| {
            log::debug!("creating global OperantsManager");
            Self::from_env()
        })
    }

    /// The manager entered on this thread, else [`global`](Self::global).
    pub fn current() -> &'static OperantsManager {
        SCOPED.with(Cell::get).unwrap_or_else(Self::global)
    }

    /// Make this manager [`current`](Self::current) on this thread until the
    /// returned guard is dropped.
    ///
    /// `current` hands out `&'static` references, so only a manager that lives
    /// for the whole process can be entered. [`new`](Self::new) is `const`, so a
    /// `static` works:
    ///
    /// ```
    /// use tensor_operants::{phi, Mode, OperantsManager};
    ///
    /// static MANAGER: OperantsManager = OperantsManager::new();
    ///
    /// phi::register(&MANAGER).unwrap();
    /// MANAGER.set_mode(Mode::Phi);
    /// let _scope = MANAGER.enter();
    /// assert!(std::ptr::eq(OperantsManager::current(), &MANAGER));
    /// ```
    ///
    /// A manager built at run time is made `'static` with [`Box::leak`].
    pub fn enter(&'static self) -> ManagerScope {
        let previous = SCOPED.with(|scoped| scoped.replace(Some(self)));
        ManagerScope {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Fill the slot of `mode`. Each slot can be set once.
    pub fn set_operants(&self, mode: Mode, operants: Box<dyn TensorOperants>) -> Result<()> {
        self.slot(mode)
            .set(operants)
            .map_err(|_| Error::SlotAlreadySet { slot: mode })?;
        log::debug!("OperantsManager {mode} operants installed");
        Ok(())
    }

    pub fn operants(&self, mode: Mode) -> Option<&dyn TensorOperants> {
        self.slot(mode).get().map(|operants| &**operants)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.set_mode(mode);
    }

    /// Set the mode from its name. Unknown names are accepted here and make
    /// every later call fail with [`Error::UnimplementedMode`].
    pub fn set_mode_str(&self, mode: &str) {
        self.mode.set(mode);
    }

    pub fn mode(&self) -> Result<Mode> {
        self.mode.get()
    }

    fn slot(&self, mode: Mode) -> &OnceLock<Box<dyn TensorOperants>> {
        match mode {
            Mode::Eager => &self.eager_operants,
            Mode::Static => &self.static_operants,
            Mode::Phi => &self.phi_operants,
        }
    }

    fn route(&self, api: &str) -> Result<&dyn TensorOperants> {
        let mode = self.mode.get()?;
        match self.slot(mode).get() {
            Some(operants) => {
                log::trace!("OperantsManager reusing {mode} mode API {api}");
                Ok(&**operants)
            }
            None => Err(Error::UninitializedBackend { slot: mode }),
        }
    }
}

impl Default for OperantsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperantsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperantsManager")
            .field("eager", &self.eager_operants.get().is_some())
            .field("static", &self.static_operants.get().is_some())
            .field("phi", &self.phi_operants.get().is_some())
            .field("mode", &self.mode.get())
            .finish()
    }
}

/// Guard returned by [`OperantsManager::enter`]; restores the previous
/// manager on drop.
#[must_use = "the manager is only current while the guard is alive"]
pub struct ManagerScope {
    previous: Option<&'static OperantsManager>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ManagerScope {
    fn drop(&mut self) {
        SCOPED.with(|scoped| scoped.set(self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phi::{self, PhiTensorOperants};
    use crate::tensor::{Scalar, Tensor};

    fn leaked() -> &'static OperantsManager {
        Box::leak(Box::new(OperantsManager::new()))
    }

    #[test]
    fn slots_are_write_once() {
        let manager = OperantsManager::new();
        phi::register(&manager).unwrap();
        let err = manager
            .set_operants(Mode::Phi, Box::new(PhiTensorOperants))
            .unwrap_err();
        assert_eq!(err, Error::SlotAlreadySet { slot: Mode::Phi });
        assert!(manager.operants(Mode::Eager).is_none());
    }

    #[test]
    fn routes_to_selected_slot() {
        let manager = OperantsManager::new();
        phi::register(&manager).unwrap();
        manager.set_mode(Mode::Phi);
        let x = Tensor::new(vec![2], vec![1.0, 2.0]).unwrap();
        let y = manager.add_scalar(&x, Scalar::Int(3)).unwrap();
        assert_eq!(y.values(), &[4.0, 5.0]);

        manager.set_mode(Mode::Eager);
        assert_eq!(
            manager.add(&x, &x).unwrap_err(),
            Error::UninitializedBackend { slot: Mode::Eager }
        );
    }

    #[test]
    fn scope_restores_previous_manager() {
        static OUTER: OperantsManager = OperantsManager::new();
        let inner = leaked();
        let _outer_scope = OUTER.enter();
        {
            let _inner_scope = inner.enter();
            assert!(std::ptr::eq(OperantsManager::current(), inner));
        }
        assert!(std::ptr::eq(OperantsManager::current(), &OUTER));
    }

    #[test]
    fn debug_lists_slots() {
        let manager = OperantsManager::new();
        manager.set_mode(Mode::Static);
        let text = format!("{manager:?}");
        assert!(text.contains("phi: false"));
        assert!(text.contains("Ok(Static)"));
    }
}

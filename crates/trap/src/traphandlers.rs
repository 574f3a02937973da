//! Cooperative trap handling for ahead-of-time compiled wasm.
//!
//! A call into compiled code is wrapped in [`catch_traps`], which records the
//! current call-stack depth and installs itself as the thread's unwind target.
//! Compiled code reports a fault in one of two ways:
//!
//! * by returning `Err(Trap)` up through its callers, which is the preferred
//!   path and costs nothing when no trap happens, or
//! * by calling [`raise_trap`] from a point which cannot conveniently return,
//!   which unwinds straight back to the protected region.
//!
//! Either way the region observes the trap as an `Err` and the call-stack
//! depth is put back to the value it had when the region was entered.
//!
//! There is a single unwind target slot per thread. Entering a region while
//! another is still running overwrites the slot, and it is not put back when
//! the inner region exits. Generated code is expected to enter a region once
//! per host-to-wasm call; see [`TrapContext`] for the exact rules.

use crate::{Trap, TrapCode, stack};
use std::any::Any;
use std::cell::Cell;
use std::num::NonZeroU64;
use std::panic::{self, AssertUnwindSafe};

/// Identity of a protected region, unique per thread for the thread's
/// lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnwindTarget(NonZeroU64);

/// Per-thread trap state.
///
/// Reached through [`TrapContext::with`]; no thread can see another thread's
/// context.
#[derive(Debug)]
pub struct TrapContext {
    unwind_target: Cell<Option<UnwindTarget>>,
    saved_call_stack_depth: Cell<u32>,
    // Number of `catch_traps` frames currently on this thread's stack. Only
    // used to reject `raise_trap` when nothing would catch it.
    active_regions: Cell<u32>,
    next_target: Cell<u64>,
    initialized: Cell<bool>,
}

thread_local! {
    static CONTEXT: TrapContext = const { TrapContext::new() };
}

impl TrapContext {
    const fn new() -> TrapContext {
        TrapContext {
            unwind_target: Cell::new(None),
            saved_call_stack_depth: Cell::new(0),
            active_regions: Cell::new(0),
            next_target: Cell::new(1),
            initialized: Cell::new(false),
        }
    }

    /// Runs `f` with the calling thread's context.
    pub fn with<R>(f: impl FnOnce(&TrapContext) -> R) -> R {
        CONTEXT.with(f)
    }

    /// The most recently installed unwind target, if any region was entered
    /// on this thread since it was last reset.
    pub fn unwind_target(&self) -> Option<UnwindTarget> {
        self.unwind_target.get()
    }

    /// Depth recorded when [`TrapContext::unwind_target`] was installed.
    pub fn saved_call_stack_depth(&self) -> u32 {
        self.saved_call_stack_depth.get()
    }

    /// Whether a [`catch_traps`] frame is currently on this thread's stack.
    pub fn in_protected_region(&self) -> bool {
        self.active_regions.get() > 0
    }

    /// Whether [`crate::init_thread`] has run on this thread.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub(crate) fn set_initialized(&self, initialized: bool) {
        self.initialized.set(initialized);
    }

    /// Forgets the unwind target and the saved depth.
    pub(crate) fn reset(&self) {
        debug_assert!(!self.in_protected_region());
        self.unwind_target.set(None);
        self.saved_call_stack_depth.set(0);
    }

    fn enter(&self) -> UnwindTarget {
        let id = self.next_target.get();
        self.next_target.set(id.wrapping_add(1).max(1));
        let target = UnwindTarget(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN));

        #[cfg(feature = "stack-depth-count")]
        self.saved_call_stack_depth.set(stack::call_stack_depth());
        self.unwind_target.set(Some(target));
        self.active_regions.set(self.active_regions.get() + 1);
        target
    }

    fn leave(&self) {
        self.active_regions
            .set(self.active_regions.get().saturating_sub(1));
    }

    fn restore_call_stack_depth(&self) {
        #[cfg(feature = "stack-depth-count")]
        stack::set_call_stack_depth(self.saved_call_stack_depth.get());
    }
}

/// Payload carried by the unwind started in [`raise_trap`].
struct TrapUnwind {
    trap: Trap,
    target: UnwindTarget,
}

/// Releases a region's claim on the context however the region exits.
struct Region {
    target: UnwindTarget,
}

impl Drop for Region {
    fn drop(&mut self) {
        TrapContext::with(|cx| cx.leave());
    }
}

impl Region {
    #[cold]
    fn trapped(self, trap: Trap, raised_to: Option<UnwindTarget>) -> Trap {
        TrapContext::with(|cx| cx.restore_call_stack_depth());
        match raised_to {
            Some(target) if target != self.target => log::warn!(
                "trap `{trap}` raised for {target:?} was caught by {:?}",
                self.target
            ),
            _ => {}
        }
        log::debug!(
            "protected region {:?} caught trap `{trap}`, call stack depth restored to {}",
            self.target,
            stack::call_stack_depth()
        );
        trap
    }
}

/// Runs `f` as a protected region.
///
/// Returns `Ok` with the closure's value if it completes normally, or
/// `Err(trap)` if it returned a trap or a trap was raised with
/// [`raise_trap`] anywhere below it. On the trapping path the thread's
/// call-stack depth is set back to the snapshot taken by the most recently
/// entered region.
///
/// Panics that are not traps pass through unchanged, after the call-stack
/// depth has been set back to the same snapshot a trap would restore.
pub fn catch_traps<R>(f: impl FnOnce() -> Result<R, Trap>) -> Result<R, Trap> {
    let region = Region {
        target: TrapContext::with(|cx| cx.enter()),
    };
    log::trace!(
        "entering protected region {:?} at call stack depth {}",
        region.target,
        stack::call_stack_depth()
    );

    match run(f) {
        Ok(Ok(value)) => {
            log::trace!("leaving protected region {:?}", region.target);
            Ok(value)
        }
        Ok(Err(trap)) => Err(region.trapped(trap, None)),
        Err(payload) => match payload.downcast::<TrapUnwind>() {
            Ok(unwind) => Err(region.trapped(unwind.trap, Some(unwind.target))),
            Err(payload) => {
                // `CallGuard`s below skipped their decrements while unwinding.
                TrapContext::with(|cx| cx.restore_call_stack_depth());
                drop(region);
                panic::resume_unwind(payload)
            }
        },
    }
}

/// Like [`catch_traps`] but reports the outcome as a raw [`TrapCode`]:
/// [`TrapCode::NONE`] if `f` completed, the trap's code otherwise.
pub fn try_call(f: impl FnOnce()) -> TrapCode {
    catch_traps(|| {
        f();
        Ok(())
    })
    .into()
}

#[cfg(panic = "unwind")]
fn run<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    panic::catch_unwind(AssertUnwindSafe(f))
}

#[cfg(not(panic = "unwind"))]
fn run<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    Ok(f())
}

/// Raises `trap`, transferring control back to the protected region most
/// recently entered on this thread.
///
/// The call-stack depth is restored to that region's snapshot before the
/// transfer. Rust frames between here and the region are unwound and their
/// destructors run.
///
/// # Panics
///
/// Panics if no [`catch_traps`] frame is live on this thread. That is an
/// integration error in the caller, not a trap.
///
/// With `panic = "abort"` there is no way to transfer control and the
/// process is aborted instead; return `Err(trap)` in such builds.
#[cold]
pub fn raise_trap(trap: Trap) -> ! {
    let target = TrapContext::with(|cx| {
        if !cx.in_protected_region() {
            return None;
        }
        cx.restore_call_stack_depth();
        cx.unwind_target()
    });
    let Some(target) = target else {
        panic!("trap `{trap}` raised with no protected region on this thread");
    };
    log::trace!("raising trap `{}` to {target:?}", trap.mnemonic());

    #[cfg(panic = "unwind")]
    {
        panic::resume_unwind(Box::new(TrapUnwind { trap, target }))
    }
    #[cfg(not(panic = "unwind"))]
    {
        log::error!("trap `{trap}` raised in a `panic = \"abort\"` build, aborting");
        std::process::abort()
    }
}

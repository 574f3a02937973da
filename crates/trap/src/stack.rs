//! The live call-stack-depth counter.
//!
//! Generated code bumps this counter in every function prologue and lowers it
//! again in the epilogue. The prologue compares the new depth against a
//! per-thread limit and reports [`Trap::StackOverflow`] long before native
//! recursion would exhaust the real stack. The trap protocol in
//! [`crate::traphandlers`] snapshots the counter when a protected region is
//! entered and puts it back when a trap lands there.
//!
//! With the `stack-depth-count` feature disabled every function here is a
//! no-op and the counter always reads as zero.

use crate::Trap;
#[cfg(feature = "stack-depth-count")]
use std::cell::Cell;

/// Limit used by threads that never called [`crate::init_thread`].
pub const DEFAULT_MAX_CALL_STACK_DEPTH: u32 = 500;

#[cfg(feature = "stack-depth-count")]
thread_local! {
    static CALL_STACK_DEPTH: Cell<u32> = const { Cell::new(0) };
    static MAX_CALL_STACK_DEPTH: Cell<u32> = const { Cell::new(DEFAULT_MAX_CALL_STACK_DEPTH) };
}

/// Current value of this thread's call-stack-depth counter.
#[inline]
pub fn call_stack_depth() -> u32 {
    #[cfg(feature = "stack-depth-count")]
    return CALL_STACK_DEPTH.with(|d| d.get());
    #[cfg(not(feature = "stack-depth-count"))]
    return 0;
}

/// Overwrites this thread's call-stack-depth counter.
#[inline]
pub fn set_call_stack_depth(depth: u32) {
    #[cfg(feature = "stack-depth-count")]
    CALL_STACK_DEPTH.with(|d| d.set(depth));
    #[cfg(not(feature = "stack-depth-count"))]
    let _ = depth;
}

/// The prologue limit in effect on this thread.
pub fn max_call_stack_depth() -> u32 {
    #[cfg(feature = "stack-depth-count")]
    return MAX_CALL_STACK_DEPTH.with(|d| d.get());
    #[cfg(not(feature = "stack-depth-count"))]
    return u32::MAX;
}

pub(crate) fn set_max_call_stack_depth(max: u32) {
    #[cfg(feature = "stack-depth-count")]
    MAX_CALL_STACK_DEPTH.with(|d| d.set(max));
    #[cfg(not(feature = "stack-depth-count"))]
    let _ = max;
}

/// Function prologue.
///
/// Increments the counter and returns a guard which decrements it again when
/// dropped. If the increment would take the counter past
/// [`max_call_stack_depth`] the counter is left untouched and
/// [`Trap::StackOverflow`] is returned instead.
#[inline]
pub fn enter_function() -> Result<CallGuard, Trap> {
    #[cfg(feature = "stack-depth-count")]
    {
        let depth = call_stack_depth();
        match depth.checked_add(1) {
            Some(next) if next <= max_call_stack_depth() => set_call_stack_depth(next),
            _ => return Err(Trap::StackOverflow),
        }
    }
    Ok(CallGuard { _priv: () })
}

/// Function epilogue for code which tracks depth without a [`CallGuard`].
#[inline]
pub fn leave_function() {
    set_call_stack_depth(call_stack_depth().saturating_sub(1));
}

/// Keeps one level of the call-stack-depth counter claimed for as long as it
/// is alive. Created by [`enter_function`].
#[must_use = "dropping the guard immediately leaves the function again"]
#[derive(Debug)]
pub struct CallGuard {
    _priv: (),
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        // While unwinding, the protected region being unwound to restores the
        // depth to its snapshot, trap or not.
        if std::thread::panicking() {
            return;
        }
        leave_function();
    }
}

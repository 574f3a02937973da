//! Runtime support for WebAssembly compiled ahead of time to native code.
//!
//! Code generators targeting this runtime emit calls into two pieces:
//!
//! * trap propagation, re-exported at the crate root from
//!   `wasm-aot-rt-trap`: [`catch_traps`] / [`try_call`] around every
//!   host-to-wasm call, [`raise_trap`] or `Err(Trap)` at every fault site,
//!   and [`enter_function`] in function prologues;
//! * instrumented arithmetic in [`math`], used in diagnostic builds in place
//!   of plain `i32` add/sub/mul.
//!
//! # Feature Flags
//!
//! * `stack-depth-count` (default): track the call-stack depth, restore it
//!   when a trap is caught, and report [`Trap::StackOverflow`] past the
//!   configured limit.
//! * `mem-log`: mirror every instrumented arithmetic result into the shared
//!   memory log at [`math::mem_log`].
//! * `disable-logging`: compile out all `log` statements.
//!
//! # Example
//!
//! ```ignore
//! use wasm_aot_rt::{catch_traps, enter_function, raise_trap, Trap};
//!
//! fn compiled_div(a: i32, b: i32) -> Result<i32, Trap> {
//!     let _frame = enter_function()?;
//!     if b == 0 {
//!         return Err(Trap::IntegerDivisionByZero);
//!     }
//!     Ok(a.wrapping_div(b))
//! }
//!
//! assert_eq!(catch_traps(|| compiled_div(1, 0)), Err(Trap::IntegerDivisionByZero));
//! assert_eq!(catch_traps(|| -> Result<(), Trap> { raise_trap(Trap::UnreachableCodeReached) }),
//!            Err(Trap::UnreachableCodeReached));
//! ```

#![deny(missing_docs)]

pub use wasm_aot_rt_trap::*;

/// Instrumented `i32` arithmetic.
pub mod math {
    pub use wasm_aot_rt_math::*;
}

/// Runs `f` with a freshly configured trap context on this thread, and tears
/// the context down again afterwards.
///
/// This is the usual way for an embedder's worker thread to host compiled
/// wasm: every call into compiled code made inside `f` still needs its own
/// [`catch_traps`] region.
pub fn with_thread_context<R>(config: &Config, f: impl FnOnce() -> R) -> Result<R, ContextError> {
    init_thread(config)?;
    log::debug!("trap context ready on {:?}", std::thread::current().id());

    struct Teardown;

    impl Drop for Teardown {
        fn drop(&mut self) {
            if let Err(e) = free_thread() {
                log::warn!("failed to free trap context: {e}");
            }
        }
    }

    let _teardown = Teardown;
    Ok(f())
}

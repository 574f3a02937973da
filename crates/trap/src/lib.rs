//! Trap propagation for WebAssembly compiled ahead of time to native code.
//!
//! Compiled functions signal a trap either by returning `Err(Trap)` or by
//! calling [`raise_trap`]; both land in the nearest [`catch_traps`] region
//! on the same thread, which restores the call-stack-depth counter from
//! [`stack`] to the value it saw on entry.

#![deny(missing_docs)]

mod config;
pub mod stack;
mod trap;
mod traphandlers;

pub use crate::config::{Config, ContextError, free_thread, init_thread, is_thread_initialized};
pub use crate::stack::{CallGuard, enter_function, leave_function};
pub use crate::trap::{Trap, TrapCode, UnknownTrapCode};
pub use crate::traphandlers::{TrapContext, UnwindTarget, catch_traps, raise_trap, try_call};

//! Per-thread configuration of the trap runtime.

use crate::TrapContext;
use crate::stack::{self, DEFAULT_MAX_CALL_STACK_DEPTH};

/// Settings applied to a thread by [`init_thread`].
#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) max_call_stack_depth: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_call_stack_depth: DEFAULT_MAX_CALL_STACK_DEPTH,
        }
    }
}

impl Config {
    /// Creates a configuration with default settings.
    pub fn new() -> Config {
        Config::default()
    }

    /// Configures how deep compiled wasm may recurse before a function
    /// prologue reports [`crate::Trap::StackOverflow`].
    ///
    /// This counts wasm frames, not bytes. The default is
    /// [`DEFAULT_MAX_CALL_STACK_DEPTH`]. Has no effect without the
    /// `stack-depth-count` feature.
    pub fn max_call_stack_depth(&mut self, depth: u32) -> &mut Self {
        self.max_call_stack_depth = depth;
        self
    }
}

/// Errors from setting up or tearing down a thread's trap context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The thread is currently inside a protected region.
    #[error("cannot reconfigure the trap context while a protected region is active")]
    RegionActive,
}

/// Prepares the calling thread for running compiled wasm.
///
/// Threads that never call this behave as if it had been called with
/// [`Config::default`]. Calling it again replaces the previous settings and
/// resets the call-stack-depth counter to zero.
pub fn init_thread(config: &Config) -> Result<(), ContextError> {
    TrapContext::with(|cx| {
        if cx.in_protected_region() {
            return Err(ContextError::RegionActive);
        }
        cx.reset();
        stack::set_max_call_stack_depth(config.max_call_stack_depth);
        stack::set_call_stack_depth(0);
        cx.set_initialized(true);
        log::trace!(
            "initialized trap context, max call stack depth {}",
            config.max_call_stack_depth
        );
        Ok(())
    })
}

/// Returns the calling thread to its never-initialized state.
pub fn free_thread() -> Result<(), ContextError> {
    TrapContext::with(|cx| {
        if cx.in_protected_region() {
            return Err(ContextError::RegionActive);
        }
        cx.reset();
        stack::set_max_call_stack_depth(DEFAULT_MAX_CALL_STACK_DEPTH);
        stack::set_call_stack_depth(0);
        cx.set_initialized(false);
        Ok(())
    })
}

/// Whether [`init_thread`] has been called on this thread since the last
/// [`free_thread`].
pub fn is_thread_initialized() -> bool {
    TrapContext::with(|cx| cx.is_initialized())
}

use crate::compiled_recurse;
use wasm_aot_rt::stack::{call_stack_depth, max_call_stack_depth, set_call_stack_depth};
use wasm_aot_rt::*;

fn infinite(n: u64) -> Result<u64, Trap> {
    let _frame = enter_function()?;
    infinite(n + 1)
}

#[test]
fn unbounded_recursion_is_exhaustion() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    init_thread(Config::new().max_call_stack_depth(200))?;
    assert_eq!(max_call_stack_depth(), 200);

    let r = catch_traps(|| infinite(0));
    assert_eq!(r, Err(Trap::StackOverflow));
    assert_eq!(r.unwrap_err().to_string(), "call stack exhausted");
    assert_eq!(call_stack_depth(), 0);

    // Recursing to exactly the limit is fine.
    assert_eq!(
        catch_traps(|| compiled_recurse(199, Trap::IntegerOverflow, false)),
        Err(Trap::IntegerOverflow)
    );
    Ok(())
}

#[test]
fn exhaustion_is_relative_to_region_entry() -> anyhow::Result<()> {
    init_thread(Config::new().max_call_stack_depth(100))?;
    set_call_stack_depth(90);
    let r = catch_traps(|| compiled_recurse(20, Trap::UnreachableCodeReached, true));
    assert_eq!(r, Err(Trap::StackOverflow));
    assert_eq!(call_stack_depth(), 90);
    Ok(())
}

#[test]
fn default_limit() {
    assert!(!is_thread_initialized());
    assert_eq!(max_call_stack_depth(), stack::DEFAULT_MAX_CALL_STACK_DEPTH);
    let r = catch_traps(|| infinite(0));
    assert_eq!(r, Err(Trap::StackOverflow));
}

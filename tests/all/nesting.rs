//! A protected region entered inside another one takes over the thread's
//! single unwind target for good: it is not handed back to the outer region
//! when the inner one exits.

use wasm_aot_rt::stack::{call_stack_depth, set_call_stack_depth};
use wasm_aot_rt::*;

#[test]
fn trap_inside_inner_region_lands_there() {
    let _ = env_logger::try_init();
    set_call_stack_depth(1);
    let outer = catch_traps(|| {
        set_call_stack_depth(3);
        let inner: Result<(), Trap> = catch_traps(|| {
            set_call_stack_depth(7);
            raise_trap(Trap::BadConversionToInteger)
        });
        assert_eq!(inner, Err(Trap::BadConversionToInteger));
        assert_eq!(call_stack_depth(), 3);
        Ok("outer finished")
    });
    assert_eq!(outer, Ok("outer finished"));
    assert_eq!(call_stack_depth(), 3);
}

#[test]
fn inner_region_overwrites_outer_snapshot() {
    let _ = env_logger::try_init();
    set_call_stack_depth(1);
    let mut outer_target = None;
    let mut inner_target = None;
    let outer: Result<(), Trap> = catch_traps(|| {
        outer_target = TrapContext::with(|cx| cx.unwind_target());
        set_call_stack_depth(3);

        let inner = catch_traps(|| {
            inner_target = TrapContext::with(|cx| cx.unwind_target());
            Ok(())
        });
        assert_eq!(inner, Ok(()));

        // The inner region has exited but its target and snapshot remain.
        TrapContext::with(|cx| {
            assert_eq!(cx.unwind_target(), inner_target);
            assert_eq!(cx.saved_call_stack_depth(), 3);
        });

        set_call_stack_depth(10);
        raise_trap(Trap::MemoryOutOfBounds)
    });

    assert_eq!(outer, Err(Trap::MemoryOutOfBounds));
    assert_ne!(outer_target, inner_target);
    // Restored to the inner region's snapshot, not the outer one's.
    assert_eq!(call_stack_depth(), 3);
    assert_eq!(TrapContext::with(|cx| cx.unwind_target()), inner_target);
}

#[test]
fn returned_trap_after_nested_region_uses_latest_snapshot() {
    set_call_stack_depth(0);
    let outer: Result<(), Trap> = catch_traps(|| {
        set_call_stack_depth(2);
        catch_traps(|| Ok(()))?;
        set_call_stack_depth(8);
        Err(Trap::NullReference)
    });
    assert_eq!(outer, Err(Trap::NullReference));
    assert_eq!(call_stack_depth(), 2);
}

#[test]
fn inner_trap_forwarded_with_question_mark() {
    set_call_stack_depth(4);
    let outer: Result<(), Trap> = catch_traps(|| {
        set_call_stack_depth(5);
        catch_traps(|| -> Result<(), Trap> { raise_trap(Trap::BadSignature) })?;
        unreachable!()
    });
    assert_eq!(outer, Err(Trap::BadSignature));
    assert_eq!(call_stack_depth(), 5);
}

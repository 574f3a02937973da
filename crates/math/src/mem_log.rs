//! The process-wide memory log written by the instrumented operations.
//!
//! The log is a fixed array of [`LEN`] `i32` slots shared by every thread.
//! It exists for trace inspection only and is deliberately unsynchronized:
//! every access is a `Relaxed` atomic load or store, so concurrent writers
//! never block each other and a slot written by two threads at once simply
//! ends up holding one of the two values. Nothing here may be used to order
//! other memory operations.

use std::sync::atomic::{AtomicI32, Ordering::Relaxed};

/// Number of slots in the log.
pub const LEN: usize = 65536;

static MEM_LOG: [AtomicI32; LEN] = [const { AtomicI32::new(0) }; LEN];

/// Stores `value` in slot `addr`. Addresses past the end are ignored.
#[inline]
pub fn record(addr: u32, value: i32) {
    if let Some(slot) = MEM_LOG.get(addr as usize) {
        slot.store(value, Relaxed);
    }
}

/// Reads slot `addr`, or `None` if it is past the end.
pub fn read(addr: u32) -> Option<i32> {
    MEM_LOG.get(addr as usize).map(|slot| slot.load(Relaxed))
}

/// Copies the whole log.
pub fn snapshot() -> Vec<i32> {
    MEM_LOG.iter().map(|slot| slot.load(Relaxed)).collect()
}

/// Zeroes every slot.
pub fn clear() {
    for slot in MEM_LOG.iter() {
        slot.store(0, Relaxed);
    }
}

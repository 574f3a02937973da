//! Instrumented `i32` arithmetic for diagnostic builds.
//!
//! A code generator emits these in place of plain `i32.add`, `i32.sub` and
//! `i32.mul` when it wants every computed value to be observable. Each
//! function takes an extra `addr` naming a slot of the [`mem_log`]; with the
//! `mem-log` feature enabled the result is stored there, otherwise the
//! address is ignored and the functions are plain wrapping arithmetic.
//!
//! None of these trap: wasm integer arithmetic wraps on overflow.

#![deny(missing_docs)]

#[cfg(feature = "mem-log")]
pub mod mem_log;

/// `i32.add` with two's-complement wraparound.
#[inline]
pub fn i32_add(a: i32, b: i32, addr: u32) -> i32 {
    logged(a.wrapping_add(b), addr)
}

/// `i32.sub` with two's-complement wraparound.
#[inline]
pub fn i32_sub(a: i32, b: i32, addr: u32) -> i32 {
    logged(a.wrapping_sub(b), addr)
}

/// `i32.mul` with two's-complement wraparound.
#[inline]
pub fn i32_mul(a: i32, b: i32, addr: u32) -> i32 {
    logged(a.wrapping_mul(b), addr)
}

#[inline(always)]
fn logged(result: i32, addr: u32) -> i32 {
    #[cfg(feature = "mem-log")]
    mem_log::record(addr, result);
    #[cfg(not(feature = "mem-log"))]
    let _ = addr;
    result
}

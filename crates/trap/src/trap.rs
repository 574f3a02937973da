//! Trap codes describing the reason for a trap.

use core::fmt;
use core::str::FromStr;

/// A trap raised by compiled wasm code.
///
/// Every variant has a stable, non-zero numeric code (see [`Trap::code`])
/// which is what crosses the boundary into generated code. The value `0` is
/// reserved for "no trap" and is represented by [`TrapCode::NONE`] rather
/// than by a variant here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[repr(u32)]
pub enum Trap {
    /// A load or store touched memory outside the bounds of a linear memory
    /// or a table.
    #[error("out of bounds memory access")]
    MemoryOutOfBounds = 1,

    /// An integer arithmetic operation caused an overflow, for example
    /// `i32.div_s` of `i32::MIN` by `-1`.
    #[error("integer overflow")]
    IntegerOverflow = 2,

    /// An integer division by zero.
    #[error("integer divide by zero")]
    IntegerDivisionByZero = 3,

    /// Failed float-to-int conversion.
    #[error("invalid conversion to integer")]
    BadConversionToInteger = 4,

    /// Code that was supposed to have been unreachable was reached.
    #[error("wasm `unreachable` instruction executed")]
    UnreachableCodeReached = 5,

    /// Signature mismatch or null entry on `call_indirect`.
    #[error("indirect call type mismatch")]
    BadSignature = 6,

    /// A wasm exception escaped every handler.
    #[error("uncaught wasm exception")]
    UncaughtException = 7,

    /// An atomic operation was presented with a not-naturally-aligned
    /// address.
    #[error("misaligned memory access")]
    HeapMisaligned = 8,

    /// The call-stack-depth counter went past its configured limit.
    #[error("call stack exhausted")]
    StackOverflow = 9,

    /// A null reference was encountered which was required to be non-null.
    #[error("null reference")]
    NullReference = 10,
}

impl Trap {
    /// All traps, in code order.
    pub const ALL: [Trap; 10] = [
        Trap::MemoryOutOfBounds,
        Trap::IntegerOverflow,
        Trap::IntegerDivisionByZero,
        Trap::BadConversionToInteger,
        Trap::UnreachableCodeReached,
        Trap::BadSignature,
        Trap::UncaughtException,
        Trap::HeapMisaligned,
        Trap::StackOverflow,
        Trap::NullReference,
    ];

    /// The numeric code of this trap. Never zero.
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Short identifier used in trace output and accepted by `FromStr`.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Trap::MemoryOutOfBounds => "heap_oob",
            Trap::IntegerOverflow => "int_ovf",
            Trap::IntegerDivisionByZero => "int_divz",
            Trap::BadConversionToInteger => "bad_toint",
            Trap::UnreachableCodeReached => "unreachable",
            Trap::BadSignature => "bad_sig",
            Trap::UncaughtException => "uncaught_exn",
            Trap::HeapMisaligned => "heap_misaligned",
            Trap::StackOverflow => "stk_ovf",
            Trap::NullReference => "null_reference",
        }
    }
}

/// Error returned when a raw code does not name a [`Trap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown trap code {0}")]
pub struct UnknownTrapCode(pub u32);

impl TryFrom<u32> for Trap {
    type Error = UnknownTrapCode;

    fn try_from(code: u32) -> Result<Trap, UnknownTrapCode> {
        // `ALL` is in code order starting from 1.
        code.checked_sub(1)
            .and_then(|i| Trap::ALL.get(i as usize).copied())
            .ok_or(UnknownTrapCode(code))
    }
}

impl FromStr for Trap {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trap::ALL
            .iter()
            .copied()
            .find(|t| t.mnemonic() == s)
            .ok_or(())
    }
}

/// Raw trap code as seen by generated code: `0` for a normal return,
/// otherwise the code of a [`Trap`].
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TrapCode(u32);

impl TrapCode {
    /// The distinguished "no trap" value.
    pub const NONE: TrapCode = TrapCode(0);

    /// Wraps a raw code without validating it.
    #[inline]
    pub const fn from_raw(raw: u32) -> TrapCode {
        TrapCode(raw)
    }

    /// The raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is [`TrapCode::NONE`].
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Decodes the trap, if this is a known non-zero code.
    pub fn trap(self) -> Option<Trap> {
        Trap::try_from(self.0).ok()
    }
}

impl From<Trap> for TrapCode {
    fn from(trap: Trap) -> TrapCode {
        TrapCode(trap.code())
    }
}

impl From<Result<(), Trap>> for TrapCode {
    fn from(result: Result<(), Trap>) -> TrapCode {
        match result {
            Ok(()) => TrapCode::NONE,
            Err(trap) => trap.into(),
        }
    }
}

impl fmt::Debug for TrapCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.trap() {
            _ if self.is_none() => f.write_str("TrapCode::NONE"),
            Some(trap) => write!(f, "TrapCode({} = {})", self.0, trap.mnemonic()),
            None => write!(f, "TrapCode({})", self.0),
        }
    }
}

//! # Configuration
//!
//! Compile-time constants governing the tick source, the state machine and
//! the event log. All limits are fixed at compile time; nothing is allocated.
//! Every container type takes its capacity as a const generic that defaults to
//! the constant here, so an application can override a single instance without
//! touching this file.

/// Maximum number of tick callbacks a tick source accepts.
/// Keep it small: every callback runs in interrupt context on every tick,
/// and the whole fan-out must finish well within one tick period.
pub const MAX_CALLBACKS: usize = 10;

/// Maximum number of child states per state machine.
pub const MAX_CHILD_STATES: usize = 5;

/// Capacity of the event log's warning buffer.
pub const MAX_WARNINGS: usize = 20;

/// Capacity of the event log's error buffer.
pub const MAX_ERRORS: usize = 10;

/// Deadline sentinel meaning "no deadline". An elapsed count can never
/// exceed it, so a state with this deadline never reports an overrun.
pub const UNBOUNDED: u32 = u32::MAX;

/// Code reported in place of the buffered codes when a log buffer overflowed.
pub const OVERFLOW_CODE: u8 = 255;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
/// The tick reload table is derived from this value.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Priority of the tick exception. Lowest on a part with 4 priority bits,
/// so the tick never delays application interrupts.
pub const TICK_PRIORITY: u8 = 0xF0;

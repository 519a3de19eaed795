//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions. Everything that is shared
//! between the tick interrupt and the main loop and does not fit a single
//! atomic word lives in a [`Shared`] cell and is only touched through
//! [`critical_section`].
//!
//! On Cortex-M the implementation comes from `cortex-m`'s
//! `critical-section-single-core` feature (interrupts masked). On hosted
//! targets it comes from `critical-section`'s `std` feature (a global
//! reentrant lock), which is what the tests run against.

use core::cell::{Cell, RefCell};

pub use critical_section::CriticalSection;

/// A value behind a critical-section mutex with checked interior mutability.
pub type Shared<T> = critical_section::Mutex<RefCell<T>>;

/// A `Copy` value behind a critical-section mutex.
pub type SharedCell<T> = critical_section::Mutex<Cell<T>>;

/// Execute a closure within a critical section.
///
/// Interrupts are disabled on entry and restored on exit, so the enclosed
/// operation is atomic with respect to the tick interrupt. Nesting is allowed;
/// the tick path nests one section inside another when it hands over to the
/// bound state machine.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     self.callbacks.borrow_ref_mut(cs).push(cb)
/// });
/// ```
///
/// # Performance
/// Keep critical sections as short as possible to minimize interrupt latency.
/// User code (callbacks, update and transition functions) is never run
/// inside one.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// Create a [`Shared`] cell. Usable in `static` initializers.
#[inline]
pub const fn shared<T>(value: T) -> Shared<T> {
    critical_section::Mutex::new(RefCell::new(value))
}

/// Create a [`SharedCell`]. Usable in `static` initializers.
#[inline]
pub const fn shared_cell<T>(value: T) -> SharedCell<T> {
    critical_section::Mutex::new(Cell::new(value))
}

//! # Cortex-M4 Port Layer
//!
//! Drives the tick source from the SysTick timer.
//!
//! ## SysTick
//!
//! SysTick is a 24-bit down-counter that reloads itself on underflow and
//! raises the `SysTick` exception. It can be clocked from the processor
//! clock or from the external reference (processor clock / 8 on STM32), which
//! maps directly onto [`ClockSource`]. Because the counter auto-reloads,
//! [`TickHardware::reload`] is a no-op here.
//!
//! ## Interrupt Priorities
//!
//! The tick exception runs at the lowest priority (`TICK_PRIORITY`) so it
//! never delays application interrupts. It is still preemptive with respect
//! to the main loop, which is all the state machine handshake relies on.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::timer::{ClockSource, ReloadParams, TickHardware};

// ---------------------------------------------------------------------------
// SysTick driver
// ---------------------------------------------------------------------------

/// [`TickHardware`] over the SysTick peripheral.
///
/// Zero-sized so it can be built in a `static` initializer; every method
/// reaches the peripheral through `Peripherals::steal()`. The tick source
/// only calls these methods inside a critical section, which serializes all
/// SysTick register access.
pub struct SysTickTimer {
    _private: (),
}

impl SysTickTimer {
    /// # Safety
    /// The caller must not use `SYST` anywhere else; this driver assumes it
    /// is the peripheral's only owner.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    fn syst(&mut self) -> SYST {
        // Safety: `new` made this driver the sole user of SYST, and `&mut self`
        // means no other access through it is in flight.
        unsafe { cortex_m::Peripherals::steal().SYST }
    }
}

impl TickHardware for SysTickTimer {
    fn configure(&mut self, params: ReloadParams) {
        let mut syst = self.syst();
        let running = syst.is_counter_enabled();
        syst.disable_counter();
        syst.set_clock_source(match params.clock {
            ClockSource::Core => SystClkSource::Core,
            ClockSource::CoreDiv8 => SystClkSource::External,
        });
        syst.set_reload(params.reload);
        syst.clear_current();
        if running {
            syst.enable_counter();
        }
    }

    fn disable(&mut self) {
        let mut syst = self.syst();
        syst.disable_interrupt();
        syst.disable_counter();
    }

    fn start(&mut self) {
        let mut syst = self.syst();
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();
    }

    fn stop(&mut self) {
        let mut syst = self.syst();
        syst.disable_counter();
        syst.disable_interrupt();
    }
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set the SysTick exception priority.
///
/// System Handler Priority Register 3 (SHPR3, `0xE000_ED20`), bits [31:24].
pub fn set_tick_priority(priority: u8) {
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    // Safety: SHPR3 is an always-mapped System Control Block register; the
    // read-modify-write only touches the SysTick byte.
    unsafe {
        let val = core::ptr::read_volatile(SHPR3);
        let val = (val & 0x00FF_FFFF) | ((priority as u32) << 24);
        core::ptr::write_volatile(SHPR3, val);
    }
}

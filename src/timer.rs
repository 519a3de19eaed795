//! # Tick Source
//!
//! The periodic time base. A [`TickSource`] wraps a hardware timer behind the
//! [`TickHardware`] contract (configure a period, start, stop) and fans every
//! tick out to:
//!
//! 1. the registered callbacks, in registration order, then
//! 2. the bound [`TickHandler`] (normally a
//!    [`StateMachine`](crate::scheduler::StateMachine)), then
//! 3. the hardware reload.
//!
//! The whole sequence runs in interrupt context and must complete well within
//! one tick period: callbacks must be short and non-blocking.
//!
//! ## Supported periods
//!
//! Reload parameters for a SysTick-style 24-bit down-counter at
//! `SYSTEM_CLOCK_HZ` = 16 MHz:
//!
//! | Period  | Clock  | Reload |
//! |---------|--------|--------|
//! | 50 µs   | core   | 799    |
//! | 100 µs  | core   | 1 599  |
//! | 200 µs  | core   | 3 199  |
//! | 500 µs  | core   | 7 999  |
//! | 1 ms    | core   | 15 999 |
//! | 2 ms    | core/8 | 3 999  |
//! | 4 ms    | core/8 | 7 999  |
//!
//! Any other period leaves the source disabled.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::{MAX_CALLBACKS, SYSTEM_CLOCK_HZ};
use crate::error::Error;
use crate::logger::{Reporter, WarningCode};
use crate::registry::Registry;
use crate::sync::{self, Shared, SharedCell};

pub const TICK_50US: u32 = 50;
pub const TICK_100US: u32 = 100;
pub const TICK_200US: u32 = 200;
pub const TICK_500US: u32 = 500;
pub const TICK_1000US: u32 = 1000;
pub const TICK_2000US: u32 = 2000;
pub const TICK_4000US: u32 = 4000;
pub const TICK_1MS: u32 = TICK_1000US;
pub const TICK_2MS: u32 = TICK_2000US;
pub const TICK_4MS: u32 = TICK_4000US;

// ---------------------------------------------------------------------------
// Period table
// ---------------------------------------------------------------------------

/// One of the supported tick periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickPeriod {
    Us50,
    Us100,
    Us200,
    Us500,
    Ms1,
    Ms2,
    Ms4,
}

/// Counter clock feeding the tick timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Processor clock.
    Core,
    /// Processor clock divided by 8.
    CoreDiv8,
}

/// Largest value a 24-bit SysTick-style reload register holds.
pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// Hardware reload parameters for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReloadParams {
    pub clock: ClockSource,
    /// Value loaded into the down-counter (counts per tick − 1).
    pub reload: u32,
}

impl TickPeriod {
    pub const ALL: [TickPeriod; 7] = [
        TickPeriod::Us50,
        TickPeriod::Us100,
        TickPeriod::Us200,
        TickPeriod::Us500,
        TickPeriod::Ms1,
        TickPeriod::Ms2,
        TickPeriod::Ms4,
    ];

    /// Look up a period by its length in microseconds.
    pub const fn from_micros(us: u32) -> Option<Self> {
        match us {
            TICK_50US => Some(TickPeriod::Us50),
            TICK_100US => Some(TickPeriod::Us100),
            TICK_200US => Some(TickPeriod::Us200),
            TICK_500US => Some(TickPeriod::Us500),
            TICK_1000US => Some(TickPeriod::Ms1),
            TICK_2000US => Some(TickPeriod::Ms2),
            TICK_4000US => Some(TickPeriod::Ms4),
            _ => None,
        }
    }

    pub const fn as_micros(self) -> u32 {
        match self {
            TickPeriod::Us50 => TICK_50US,
            TickPeriod::Us100 => TICK_100US,
            TickPeriod::Us200 => TICK_200US,
            TickPeriod::Us500 => TICK_500US,
            TickPeriod::Ms1 => TICK_1000US,
            TickPeriod::Ms2 => TICK_2000US,
            TickPeriod::Ms4 => TICK_4000US,
        }
    }

    /// Counter clock for this period. The two longest periods run from the
    /// divided clock to keep the count short.
    pub const fn clock(self) -> ClockSource {
        match self {
            TickPeriod::Ms2 | TickPeriod::Ms4 => ClockSource::CoreDiv8,
            _ => ClockSource::Core,
        }
    }

    /// Reload parameters for a counter fed from a `clock_hz` processor clock.
    ///
    /// Counts are computed in 64 bits and divided last, so clocks that are
    /// not a whole number of MHz still get an exact reload. `None` if the
    /// period rounds to zero counts or does not fit [`MAX_RELOAD`].
    pub const fn reload_for(self, clock_hz: u32) -> Option<ReloadParams> {
        let clock = self.clock();
        let divisor: u64 = match clock {
            ClockSource::Core => 1_000_000,
            ClockSource::CoreDiv8 => 8_000_000,
        };
        let counts = clock_hz as u64 * self.as_micros() as u64 / divisor;
        if counts == 0 || counts - 1 > MAX_RELOAD as u64 {
            return None;
        }
        Some(ReloadParams {
            clock,
            reload: (counts - 1) as u32,
        })
    }

    /// Reload parameters at `SYSTEM_CLOCK_HZ`.
    pub const fn reload(self) -> Option<ReloadParams> {
        self.reload_for(SYSTEM_CLOCK_HZ)
    }
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// The hardware timer contract. Implementations own every register access;
/// nothing above this trait knows which timer is used.
pub trait TickHardware: Send {
    /// Program the period. A running timer keeps running at the new period
    /// and a stopped one stays stopped.
    fn configure(&mut self, params: ReloadParams);
    /// Turn the timer off because no valid period is configured.
    fn disable(&mut self);
    /// Enable the counter and its interrupt.
    fn start(&mut self);
    /// Disable the counter and its interrupt.
    fn stop(&mut self);
    /// Re-arm the counter at the end of a tick. Auto-reloading timers
    /// leave this empty.
    fn reload(&mut self) {}
}

/// Per-tick bookkeeping driven by a tick source.
pub trait TickHandler: Sync {
    fn on_tick(&self);
}

/// A zero-argument tick callback.
pub type Callback<'a> = &'a (dyn Fn() + Sync);

// ---------------------------------------------------------------------------
// TickSource
// ---------------------------------------------------------------------------

/// Periodic time base with a bounded callback fan-out and one bound handler.
///
/// All methods take `&self`, so a tick source can live in a `static` that
/// both the interrupt handler and the main loop reach.
pub struct TickSource<'a, H: TickHardware, const N: usize = MAX_CALLBACKS> {
    hardware: Shared<H>,
    reporter: &'a dyn Reporter,
    callbacks: Shared<Registry<Callback<'a>, N>>,
    handler: SharedCell<Option<&'a dyn TickHandler>>,
    period_us: SharedCell<u32>,
    params: SharedCell<Option<ReloadParams>>,
    enabled: AtomicBool,
}

impl<'a, H: TickHardware, const N: usize> TickSource<'a, H, N> {
    /// Create an unconfigured, stopped tick source.
    pub const fn new(hardware: H, reporter: &'a dyn Reporter) -> Self {
        Self {
            hardware: sync::shared(hardware),
            reporter,
            callbacks: sync::shared(Registry::new()),
            handler: sync::shared_cell(None),
            period_us: sync::shared_cell(0),
            params: sync::shared_cell(None),
            enabled: AtomicBool::new(false),
        }
    }

    /// Set the tick period in microseconds.
    ///
    /// A running source keeps running at the new period; a stopped one
    /// stays stopped.
    ///
    /// An unsupported value (outside the table, or with no valid reload at
    /// `SYSTEM_CLOCK_HZ`) disables the source, records the period as 0 and
    /// reports [`WarningCode::UnsupportedTickPeriod`].
    pub fn configure(&self, period_us: u32) -> Result<TickPeriod, Error> {
        let supported = TickPeriod::from_micros(period_us)
            .and_then(|period| period.reload().map(|params| (period, params)));
        let Some((period, params)) = supported else {
            sync::critical_section(|cs| {
                self.enabled.store(false, Ordering::Release);
                self.period_us.borrow(cs).set(0);
                self.params.borrow(cs).set(None);
                self.hardware.borrow_ref_mut(cs).disable();
            });
            warn!("tick period {} us unsupported", period_us);
            self.reporter.warn(WarningCode::UnsupportedTickPeriod);
            return Err(Error::UnsupportedPeriod(period_us));
        };

        sync::critical_section(|cs| {
            self.period_us.borrow(cs).set(period.as_micros());
            self.params.borrow(cs).set(Some(params));
            self.hardware.borrow_ref_mut(cs).configure(params);
        });
        debug!("tick period {} us, reload {}", period_us, params.reload);
        Ok(period)
    }

    /// Append a callback to the per-tick fan-out.
    ///
    /// Past capacity the callback is discarded and
    /// [`WarningCode::CallbackRegistryFull`] is reported; the returned error
    /// may be ignored by callers that only watch the log.
    pub fn register_callback(&self, callback: Callback<'a>) -> Result<(), Error> {
        let stored =
            sync::critical_section(|cs| self.callbacks.borrow_ref_mut(cs).push(callback).is_ok());
        if stored {
            return Ok(());
        }
        warn!("callback registry full ({})", N);
        self.reporter.warn(WarningCode::CallbackRegistryFull);
        Err(Error::CallbackRegistryFull)
    }

    /// Enable the periodic interrupt. Interrupts stay masked while the timer
    /// is being switched on, so a half-configured timer cannot fire.
    pub fn start(&self) -> Result<(), Error> {
        sync::critical_section(|cs| {
            if self.params.borrow(cs).get().is_none() {
                return Err(Error::NotConfigured);
            }
            self.hardware.borrow_ref_mut(cs).start();
            self.enabled.store(true, Ordering::Release);
            Ok(())
        })
    }

    /// Disable the periodic interrupt. A state update already running in
    /// the main loop is not affected.
    pub fn stop(&self) {
        sync::critical_section(|cs| {
            self.hardware.borrow_ref_mut(cs).stop();
            self.enabled.store(false, Ordering::Release);
        });
    }

    /// Install `handler` as the single bound tick handler.
    ///
    /// # Returns
    /// The previously bound handler, if any.
    pub fn bind(&self, handler: &'a dyn TickHandler) -> Option<&'a dyn TickHandler> {
        sync::critical_section(|cs| self.handler.borrow(cs).replace(Some(handler)))
    }

    /// Tick entry point. Call from the timer interrupt (or, in tests, by hand).
    ///
    /// Does nothing while the source is stopped.
    pub fn on_tick(&self) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }

        // Copy out so callbacks run outside the registry borrow
        let (callbacks, handler) = sync::critical_section(|cs| {
            (
                self.callbacks.borrow_ref(cs).clone(),
                self.handler.borrow(cs).get(),
            )
        });

        for callback in callbacks.iter() {
            callback();
        }
        if let Some(handler) = handler {
            handler.on_tick();
        }

        sync::critical_section(|cs| self.hardware.borrow_ref_mut(cs).reload());
    }

    /// Configured period in microseconds, 0 if unconfigured or unsupported.
    pub fn period_micros(&self) -> u32 {
        sync::critical_section(|cs| self.period_us.borrow(cs).get())
    }

    pub fn reload_params(&self) -> Option<ReloadParams> {
        sync::critical_section(|cs| self.params.borrow(cs).get())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn callback_count(&self) -> usize {
        sync::critical_section(|cs| self.callbacks.borrow_ref(cs).len())
    }

    pub fn is_bound(&self) -> bool {
        sync::critical_section(|cs| self.handler.borrow(cs).get().is_some())
    }

    /// Run `f` against the hardware driver inside a critical section.
    pub fn with_hardware<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        sync::critical_section(|cs| f(&mut *self.hardware.borrow_ref_mut(cs)))
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

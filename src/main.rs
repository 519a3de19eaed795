//! # tickstate Example Firmware
//!
//! Two states alternating on a 1 ms tick, evaluated every 5 ticks:
//!
//! | State   | Work                        | Soft | Hard |
//! |---------|-----------------------------|------|------|
//! | `IDLE`  | nothing                     | —    | —    |
//! | `BLINK` | short busy burst, counts it | 2    | 4    |
//!
//! On a Cortex-M4 board the tick comes from SysTick. With the `defmt`
//! feature the event log is drained over RTT every few hundred steps;
//! without it the codes stay buffered in `LOG`.
//! On any hosted target the same machine runs against the manual timer,
//! ticked from a periodic thread, and the log is printed at the end.

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_main)]

use core::ptr;
use core::sync::atomic::{AtomicU32, Ordering};

use tickstate::timer::TICK_1MS;
use tickstate::{Error, EventLog, State, StateMachine, TickHardware, TickSource};

// ---------------------------------------------------------------------------
// Application states
// ---------------------------------------------------------------------------

static LOG: EventLog = EventLog::new();

/// Completed `BLINK` updates.
static BLINKS: AtomicU32 = AtomicU32::new(0);

fn idle() {}

fn blink() {
    for _ in 0..2_000 {
        core::hint::spin_loop();
    }
    let blinks = BLINKS.load(Ordering::Relaxed);
    BLINKS.store(blinks.wrapping_add(1), Ordering::Relaxed);
}

fn next(current: &'static State<'static>) -> &'static State<'static> {
    if ptr::eq(current, &IDLE) {
        &BLINK
    } else {
        &IDLE
    }
}

static IDLE: State<'static> = State::new(&idle);
static BLINK: State<'static> = State::new(&blink).with_deadlines(4, 2);
static MACHINE: StateMachine<'static> = StateMachine::new(&next, 5, &LOG);

fn setup<H: TickHardware>(ticks: &'static TickSource<'static, H>) -> Result<(), Error> {
    ticks.configure(TICK_1MS)?;
    MACHINE.add_state(&IDLE)?;
    MACHINE.add_state(&BLINK)?;
    MACHINE.set_start_state(&IDLE);
    MACHINE.register_to_timer(ticks);
    Ok(())
}

// ---------------------------------------------------------------------------
// Cortex-M4 entry point
// ---------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod firmware {
    use cortex_m_rt::{entry, exception};
    use panic_halt as _;

    use tickstate::arch::cortex_m4::{self, SysTickTimer};
    use tickstate::config::TICK_PRIORITY;
    use tickstate::TickSource;

    use super::{setup, LOG, MACHINE};

    #[cfg(feature = "defmt")]
    use defmt_rtt as _;

    /// Steps between two log drains.
    #[cfg(feature = "defmt")]
    const DRAIN_EVERY: u32 = 500;

    // Safety: nothing else in this firmware touches SYST.
    static TICKS: TickSource<'static, SysTickTimer> =
        TickSource::new(unsafe { SysTickTimer::new() }, &LOG);

    #[exception]
    fn SysTick() {
        TICKS.on_tick();
    }

    /// Firmware entry point. Configures the tick, wires the machine and runs
    /// the main loop. Does not return.
    ///
    /// With the `defmt` feature the log is drained over RTT every
    /// `DRAIN_EVERY` steps. Without it nothing can read the log, so codes
    /// stay buffered (a debugger can still inspect `LOG`) and later ones
    /// only set the overflow flag.
    #[entry]
    fn main() -> ! {
        setup(&TICKS).expect("Failed to set up state machine");
        cortex_m4::set_tick_priority(TICK_PRIORITY);
        TICKS.start().expect("Failed to start tick source");

        #[cfg(feature = "defmt")]
        let mut steps: u32 = 0;
        loop {
            #[cfg(not(feature = "defmt"))]
            MACHINE.step();

            #[cfg(feature = "defmt")]
            {
                if MACHINE.step().is_some() {
                    steps = steps.wrapping_add(1);
                }
                if steps >= DRAIN_EVERY {
                    steps = 0;
                    drain_log();
                }
            }
        }
    }

    #[cfg(feature = "defmt")]
    fn drain_log() {
        let mut report: heapless::String<256> = heapless::String::new();
        if LOG.drain(&mut report).is_err() {
            defmt::warn!("event log report truncated");
        }
        defmt::info!("{=str}", report.as_str());
    }
}

// ---------------------------------------------------------------------------
// Hosted simulation
// ---------------------------------------------------------------------------

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn main() {
    use std::thread;
    use std::time::Duration;

    use tickstate::arch::manual::ManualTimer;

    /// Simulated run length in ticks.
    const TICKS_TO_RUN: u32 = 500;

    static TICKS: TickSource<'static, ManualTimer> = TickSource::new(ManualTimer::new(), &LOG);

    setup(&TICKS).expect("Failed to set up state machine");
    TICKS.start().expect("Failed to start tick source");

    // The periodic thread plays the timer interrupt
    let ticker = thread::spawn(|| {
        let period = Duration::from_micros(u64::from(TICKS.period_micros()));
        for _ in 0..TICKS_TO_RUN {
            thread::sleep(period);
            TICKS.on_tick();
        }
        TICKS.stop();
    });

    while !ticker.is_finished() {
        MACHINE.step();
        thread::yield_now();
    }
    ticker.join().expect("Ticker thread panicked");

    let mut report = String::new();
    LOG.drain(&mut report).expect("Writing to a String cannot fail");
    print!("{report}");
    println!("blinks: {}", BLINKS.load(Ordering::Relaxed));
}

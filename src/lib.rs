//! # tickstate — Tick-driven State Machine Scheduler
//!
//! A deterministic cooperative scheduler for bare-metal microcontrollers. A
//! periodic hardware timer advances the time base; on every tick a bounded
//! list of callbacks runs and one bound state machine does its bookkeeping.
//! The state machine runs application work units ("states") from the main
//! loop and watches their soft and hard deadlines from the tick interrupt.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │           Application (states, transition fn)           │
//! ├───────────────────────────┬────────────────────────────┤
//! │  StateMachine             │  EventLog                  │
//! │  scheduler.rs             │  logger.rs                 │
//! │  ─ tick()   (interrupt)   │  ─ warn() / error()        │
//! │  ─ step()   (main loop)   │  ─ drain()                 │
//! ├───────────────────────────┤                            │
//! │  State (state.rs)         │                            │
//! │  deadlines · elapsed      │                            │
//! ├───────────────────────────┴────────────────────────────┤
//! │  TickSource (timer.rs)                                  │
//! │  configure · start · stop · callbacks · bound handler   │
//! ├────────────────────────────────────────────────────────┤
//! │  TickHardware port (arch/)                              │
//! │  SysTick (Cortex-M4) · ManualTimer (host, tests)        │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! static LOG: EventLog = EventLog::new();
//! static TICKS: TickSource<'static, SysTickTimer> =
//!     TickSource::new(unsafe { SysTickTimer::new() }, &LOG);
//!
//! static IDLE: State<'static> = State::new(&idle);
//! static WORK: State<'static> = State::new(&work).with_deadlines(20, 10);
//! static MACHINE: StateMachine<'static> = StateMachine::new(&next, 5, &LOG);
//!
//! TICKS.configure(TICK_1MS)?;
//! MACHINE.add_state(&IDLE)?;
//! MACHINE.add_state(&WORK)?;
//! MACHINE.set_start_state(&IDLE);
//! MACHINE.register_to_timer(&TICKS);
//! TICKS.start()?;
//!
//! loop {
//!     MACHINE.step();
//! }
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: every container is a fixed-capacity `heapless` vector
//! - **Static-friendly**: every public type has a `const fn` constructor
//! - **Two contexts**: the tick interrupt and the main loop share state
//!   through single-writer atomics and critical-section cells only
//! - **Advisory deadlines**: overruns are reported, never preempted

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod arch;
pub mod config;
pub mod error;
pub mod logger;
pub mod registry;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod timer;

pub use error::Error;
pub use logger::{ErrorCode, EventLog, NullReporter, Reporter, WarningCode};
pub use scheduler::{MachinePhase, StateMachine, Transition};
pub use state::{DeadlineStatus, State};
pub use timer::{TickHandler, TickHardware, TickPeriod, TickSource};

//! # Scheduler
//!
//! The state machine: runs one [`State`] at a time from the main loop and
//! watches its deadlines from the tick interrupt.
//!
//! ## Two contexts
//!
//! ```text
//!  tick interrupt                         main loop
//!  ──────────────                         ─────────
//!  tick():                                step():
//!    tick_count += 1                        if !pending: return
//!    if tick_count < interval: return       current.in_progress = true
//!    tick_count = 0                         current.update()      ← unbounded
//!    if current.in_progress:                current.in_progress = false
//!      current.tick() → warn / error        current = transition(current)
//!    else:                                  pending = false
//!      pending = true
//! ```
//!
//! `tick()` is O(1) and never runs user work. `step()` owns the main loop for
//! as long as the update function runs.
//!
//! ## Single-writer discipline
//!
//! | Field                 | Writer                                   |
//! |-----------------------|------------------------------------------|
//! | `tick_count`          | tick interrupt                           |
//! | `pending` (set)       | tick interrupt                           |
//! | `pending` (clear)     | main loop                                |
//! | `State::in_progress`  | main loop                                |
//! | `State::elapsed`      | tick interrupt (and explicit resets)     |
//! | `current`             | main loop                                |
//!
//! `pending` is published with `Release` and read with `Acquire`, so the
//! main loop sees the state the interrupt observed when it raised the flag.
//!
//! ## Machine phases
//!
//! ```text
//!   ┌──────┐  interval boundary,   ┌──────────────┐  step()  ┌───────────┐
//!   │ Idle │ ────────────────────► │ AwaitingStep │ ───────► │ Executing │
//!   └──────┘  current not running  └──────────────┘          └───────────┘
//!      ▲                                                           │
//!      └──────────────── update returned, current = next ──────────┘
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::MAX_CHILD_STATES;
use crate::error::Error;
use crate::logger::{ErrorCode, Reporter, WarningCode};
use crate::registry::Registry;
use crate::state::{DeadlineStatus, State};
use crate::sync::{self, Shared, SharedCell};
use crate::timer::{TickHandler, TickHardware, TickSource};

/// Pure function choosing the next state from the current one.
pub type Transition<'a> = &'a (dyn Fn(&'a State<'a>) -> &'a State<'a> + Sync);

/// Where the machine is in its idle → awaiting → executing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachinePhase {
    /// No transition pending; waiting for the next interval boundary.
    Idle,
    /// The tick interrupt requested a step; the main loop has not run it yet.
    AwaitingStep,
    /// `step()` is running the current state's update function.
    Executing,
}

// ---------------------------------------------------------------------------
// StateMachine
// ---------------------------------------------------------------------------

/// Tick-driven state machine over at most `M` child states.
///
/// All methods take `&self`; store the machine in a `static` reachable from
/// both the tick interrupt (through [`TickSource`]) and the main loop.
pub struct StateMachine<'a, const M: usize = MAX_CHILD_STATES> {
    states: Shared<Registry<&'a State<'a>, M>>,
    current: SharedCell<Option<&'a State<'a>>>,
    transition: Transition<'a>,
    reporter: &'a dyn Reporter,
    interval: u32,
    tick_count: AtomicU32,
    pending: AtomicBool,
}

impl<'a, const M: usize> StateMachine<'a, M> {
    /// Create a machine that evaluates every `interval` ticks of its tick
    /// source. An interval of 0 or 1 evaluates on every tick.
    pub const fn new(transition: Transition<'a>, interval: u32, reporter: &'a dyn Reporter) -> Self {
        Self {
            states: sync::shared(Registry::new()),
            current: sync::shared_cell(None),
            transition,
            reporter,
            interval,
            tick_count: AtomicU32::new(0),
            pending: AtomicBool::new(false),
        }
    }

    /// Add a child state.
    ///
    /// Past capacity the state is discarded (it will never be reset by this
    /// machine) and [`WarningCode::ChildStateRegistryFull`] is reported.
    pub fn add_state(&self, state: &'a State<'a>) -> Result<(), Error> {
        let stored = sync::critical_section(|cs| self.states.borrow_ref_mut(cs).push(state).is_ok());
        if stored {
            return Ok(());
        }
        warn!("child-state registry full ({})", M);
        self.reporter.warn(WarningCode::ChildStateRegistryFull);
        Err(Error::ChildStateRegistryFull)
    }

    /// Set the current state. Not checked against the child states.
    pub fn set_start_state(&self, state: &'a State<'a>) {
        sync::critical_section(|cs| self.current.borrow(cs).set(Some(state)));
    }

    /// Make this machine the one driven by `source`.
    ///
    /// If another machine (or this one) was already bound, it is replaced
    /// and [`WarningCode::MachineRebound`] is reported.
    pub fn register_to_timer<'t, H, const N: usize>(&'t self, source: &TickSource<'t, H, N>)
    where
        'a: 't,
        H: TickHardware,
    {
        if source.bind(self).is_some() {
            warn!("tick source already bound, overwriting");
            self.reporter.warn(WarningCode::MachineRebound);
        }
        trace!("state machine bound, interval {}", self.interval);
    }

    /// Per-tick bookkeeping. Tick-context only.
    pub fn tick(&self) {
        let count = self.tick_count.load(Ordering::Relaxed).saturating_add(1);
        if count < self.interval {
            self.tick_count.store(count, Ordering::Relaxed);
            return;
        }
        self.tick_count.store(0, Ordering::Relaxed);

        let Some(current) = self.current_state() else {
            return;
        };

        if current.is_in_progress() {
            match current.tick() {
                DeadlineStatus::Ok => {}
                DeadlineStatus::SoftViolation => {
                    self.reporter.warn(WarningCode::SoftDeadlineExceeded);
                }
                DeadlineStatus::HardViolation => {
                    self.reporter.error(ErrorCode::HardDeadlineExceeded);
                }
            }
        } else {
            self.pending.store(true, Ordering::Release);
        }
    }

    /// Run the current state and move to the next one, if the tick
    /// interrupt asked for it. Main-loop only.
    ///
    /// Blocks for as long as the update function runs. The finished state's
    /// elapsed counter is left as is; reset it explicitly if needed.
    ///
    /// The pending flag is cleared last. A tick that reaches the interval
    /// boundary after the update finished but before this call returns sets
    /// the flag, which is then cleared here: that request is dropped and the
    /// next state waits one more interval.
    ///
    /// # Returns
    /// - `Some(next)` — a transition was taken; `next` is now current
    /// - `None` — nothing was pending
    pub fn step(&self) -> Option<&'a State<'a>> {
        if !self.pending.load(Ordering::Acquire) {
            return None;
        }

        let Some(current) = self.current_state() else {
            self.pending.store(false, Ordering::Release);
            return None;
        };

        current.begin();
        current.update();
        current.finish();

        let next = (self.transition)(current);
        sync::critical_section(|cs| self.current.borrow(cs).set(Some(next)));
        self.pending.store(false, Ordering::Release);

        debug!("transition taken, elapsed {}", current.elapsed());
        Some(next)
    }

    /// Zero the elapsed counter of every child state. The current state,
    /// tick count and pending flag are left alone.
    pub fn reset(&self) {
        sync::critical_section(|cs| {
            for state in self.states.borrow_ref(cs).iter() {
                state.reset();
            }
        });
    }

    pub fn phase(&self) -> MachinePhase {
        if !self.is_transition_pending() {
            return MachinePhase::Idle;
        }
        match self.current_state() {
            Some(current) if current.is_in_progress() => MachinePhase::Executing,
            _ => MachinePhase::AwaitingStep,
        }
    }

    pub fn current_state(&self) -> Option<&'a State<'a>> {
        sync::critical_section(|cs| self.current.borrow(cs).get())
    }

    /// Ticks counted since the last evaluation.
    pub fn tick_count(&self) -> u32 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn is_transition_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn state_count(&self) -> usize {
        sync::critical_section(|cs| self.states.borrow_ref(cs).len())
    }
}

impl<const M: usize> TickHandler for StateMachine<'_, M> {
    #[inline]
    fn on_tick(&self) {
        self.tick();
    }
}

impl<const M: usize> fmt::Debug for StateMachine<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.state_count())
            .field("interval", &self.interval)
            .field("tick_count", &self.tick_count())
            .field("pending", &self.is_transition_pending())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::EventLog;
    use core::ptr;
    use core::sync::atomic::AtomicUsize;

    fn noop() {}

    fn stay(state: &'static State<'static>) -> &'static State<'static> {
        state
    }

    #[test]
    fn test_tick_before_interval_is_noop() {
        static LOG: EventLog = EventLog::new();
        static IDLE: State<'static> = State::new(&noop);
        static SM: StateMachine<'static> = StateMachine::new(&stay, 3, &LOG);
        SM.set_start_state(&IDLE);

        SM.tick();
        SM.tick();
        assert_eq!(SM.tick_count(), 2);
        assert!(!SM.is_transition_pending());
        assert_eq!(SM.phase(), MachinePhase::Idle);

        SM.tick();
        assert_eq!(SM.tick_count(), 0);
        assert!(SM.is_transition_pending());
        assert_eq!(SM.phase(), MachinePhase::AwaitingStep);
    }

    #[test]
    fn test_tick_without_current_state_is_noop() {
        static LOG: EventLog = EventLog::new();
        static SM: StateMachine<'static> = StateMachine::new(&stay, 1, &LOG);

        SM.tick();
        assert!(!SM.is_transition_pending());
        assert_eq!(SM.tick_count(), 0);
        assert_eq!(LOG.warning_count() + LOG.error_count(), 0);
    }

    #[test]
    fn test_step_without_pending_changes_nothing() {
        static LOG: EventLog = EventLog::new();
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn work() {
            CALLS.fetch_add(1, Ordering::Relaxed);
        }
        fn never(_: &'static State<'static>) -> &'static State<'static> {
            unreachable!("transition must not run without a pending step")
        }
        static A: State<'static> = State::new(&work);
        static SM: StateMachine<'static> = StateMachine::new(&never, 1, &LOG);
        SM.set_start_state(&A);

        assert!(SM.step().is_none());
        assert_eq!(CALLS.load(Ordering::Relaxed), 0);
        assert!(ptr::eq(SM.current_state().unwrap(), &A));
        assert!(!A.is_in_progress());
    }

    #[test]
    fn test_step_runs_update_then_transition() {
        static LOG: EventLog = EventLog::new();
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn work() {
            CALLS.fetch_add(1, Ordering::Relaxed);
            assert!(A.is_in_progress(), "Update runs with the state marked in progress");
        }
        fn next(_: &'static State<'static>) -> &'static State<'static> {
            assert!(!A.is_in_progress(), "Transition runs after the update finished");
            &B
        }
        static A: State<'static> = State::new(&work);
        static B: State<'static> = State::new(&noop);
        static SM: StateMachine<'static> = StateMachine::new(&next, 1, &LOG);
        SM.set_start_state(&A);

        SM.tick();
        let taken = SM.step().expect("a step was pending");
        assert!(ptr::eq(taken, &B));
        assert!(ptr::eq(SM.current_state().unwrap(), &B));
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
        assert!(!SM.is_transition_pending());
        assert_eq!(SM.phase(), MachinePhase::Idle);
    }

    #[test]
    fn test_deadline_overruns_are_reported() {
        static LOG: EventLog = EventLog::new();
        static SLOW: State<'static> = State::new(&noop).with_deadlines(2, 1);
        static SM: StateMachine<'static> = StateMachine::new(&stay, 1, &LOG);
        SM.set_start_state(&SLOW);

        // Simulate the update still running in the main loop
        SLOW.begin();
        assert_eq!(SM.phase(), MachinePhase::Idle);
        for _ in 0..4 {
            SM.tick();
        }
        SLOW.finish();

        assert_eq!(SLOW.elapsed(), 4);
        assert!(!SM.is_transition_pending(), "Busy state never raises a step");
        assert_eq!(LOG.warnings().as_slice(), &[WarningCode::SoftDeadlineExceeded.code()]);
        assert_eq!(
            LOG.errors().as_slice(),
            &[
                ErrorCode::HardDeadlineExceeded.code(),
                ErrorCode::HardDeadlineExceeded.code()
            ]
        );
    }

    #[test]
    fn test_add_state_overflow_warns_once() {
        static LOG: EventLog = EventLog::new();
        static S1: State<'static> = State::new(&noop);
        static S2: State<'static> = State::new(&noop);
        static S3: State<'static> = State::new(&noop);
        static SM: StateMachine<'static, 2> = StateMachine::new(&stay, 1, &LOG);

        SM.add_state(&S1).unwrap();
        SM.add_state(&S2).unwrap();
        assert_eq!(SM.add_state(&S3), Err(Error::ChildStateRegistryFull));
        assert_eq!(SM.state_count(), 2);
        assert_eq!(LOG.warnings().as_slice(), &[WarningCode::ChildStateRegistryFull.code()]);
    }

    #[test]
    fn test_reset_zeroes_children_only() {
        static LOG: EventLog = EventLog::new();
        static A: State<'static> = State::new(&noop);
        static B: State<'static> = State::new(&noop);
        static SM: StateMachine<'static> = StateMachine::new(&stay, 3, &LOG);
        SM.add_state(&A).unwrap();
        SM.add_state(&B).unwrap();
        SM.set_start_state(&A);

        A.begin();
        A.tick();
        A.tick();
        A.finish();
        B.begin();
        B.tick();
        B.finish();
        for _ in 0..4 {
            SM.tick();
        }
        assert!(SM.is_transition_pending());
        assert_eq!(SM.tick_count(), 1);

        SM.reset();
        assert_eq!((A.elapsed(), B.elapsed()), (0, 0));
        assert!(ptr::eq(SM.current_state().unwrap(), &A));
        assert_eq!(SM.tick_count(), 1);
        assert!(SM.is_transition_pending(), "Reset must not drop a pending step");
    }

    #[test]
    fn test_boundary_tick_during_transition_is_dropped() {
        static LOG: EventLog = EventLog::new();
        static A: State<'static> = State::new(&noop);
        fn ticking_stay(state: &'static State<'static>) -> &'static State<'static> {
            // Update has finished, pending not yet cleared
            SM.tick();
            assert!(SM.is_transition_pending());
            state
        }
        static SM: StateMachine<'static> = StateMachine::new(&ticking_stay, 1, &LOG);
        SM.set_start_state(&A);

        SM.tick();
        assert!(SM.step().is_some());
        assert!(!SM.is_transition_pending());
        assert!(SM.step().is_none(), "The late request waits for the next boundary");
    }

    #[test]
    fn test_elapsed_survives_transition() {
        static LOG: EventLog = EventLog::new();
        static A: State<'static> = State::new(&noop);
        static SM: StateMachine<'static> = StateMachine::new(&stay, 1, &LOG);
        SM.set_start_state(&A);

        A.begin();
        A.tick();
        A.finish();
        SM.tick();
        SM.step().unwrap();
        assert_eq!(A.elapsed(), 1, "Transitions never reset elapsed");
    }
}

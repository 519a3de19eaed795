//! # State
//!
//! A state is one unit of application work: an update function plus its own
//! deadline tracking. States are created once (typically as `static`s) and
//! borrowed by the state machine for the rest of the program.
//!
//! ## Deadline model
//!
//! While a state is in progress, the machine ticks it once per evaluation
//! interval. Each tick increments `elapsed` and classifies it:
//!
//! ```text
//!   elapsed:  0 ..= soft   soft+1 ..= hard   hard+1 ..
//!             Ok           SoftViolation     HardViolation
//! ```
//!
//! Deadlines are advisory. An overrun is reported, never enforced: the
//! update function keeps running until it returns.
//!
//! ## Shared fields
//!
//! `in_progress` is written only by the main loop (the machine's `step()`),
//! `elapsed` only by the tick interrupt (`tick()`) and by explicit resets.
//! Both are single atomic words accessed with plain loads and stores, so no
//! read-modify-write support is needed from the core.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::UNBOUNDED;

/// Outcome of one deadline check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeadlineStatus {
    /// Elapsed time within the soft deadline.
    Ok,
    /// Soft deadline passed, hard deadline not yet.
    SoftViolation,
    /// Hard deadline passed.
    HardViolation,
}

/// A unit of work executed by the state machine.
pub struct State<'a> {
    update: &'a (dyn Fn() + Sync),
    soft_deadline: u32,
    hard_deadline: u32,
    in_progress: AtomicBool,
    elapsed: AtomicU32,
}

impl<'a> State<'a> {
    /// Create a state with no deadlines.
    pub const fn new(update: &'a (dyn Fn() + Sync)) -> Self {
        Self {
            update,
            soft_deadline: UNBOUNDED,
            hard_deadline: UNBOUNDED,
            in_progress: AtomicBool::new(false),
            elapsed: AtomicU32::new(0),
        }
    }

    /// Set only the hard deadline (ticks). The soft deadline stays unbounded.
    pub const fn with_hard_deadline(self, hard_ticks: u32) -> Self {
        Self {
            hard_deadline: hard_ticks,
            ..self
        }
    }

    /// Set both deadlines (ticks). `soft_ticks` is expected to be no larger
    /// than `hard_ticks`; if it is, the hard check wins and soft violations
    /// are never reported.
    pub const fn with_deadlines(self, hard_ticks: u32, soft_ticks: u32) -> Self {
        Self {
            hard_deadline: hard_ticks,
            soft_deadline: soft_ticks,
            ..self
        }
    }

    /// Advance the elapsed counter by one tick and classify it.
    ///
    /// Tick-context only. A state that is not in progress is left untouched
    /// and reports `Ok`.
    pub fn tick(&self) -> DeadlineStatus {
        if !self.is_in_progress() {
            return DeadlineStatus::Ok;
        }

        let elapsed = self.elapsed.load(Ordering::Relaxed).saturating_add(1);
        self.elapsed.store(elapsed, Ordering::Relaxed);
        self.classify(elapsed)
    }

    /// Classify an elapsed count against this state's deadlines.
    /// The hard deadline is checked first since it is the larger one.
    pub fn classify(&self, elapsed: u32) -> DeadlineStatus {
        if elapsed > self.hard_deadline {
            DeadlineStatus::HardViolation
        } else if elapsed > self.soft_deadline {
            DeadlineStatus::SoftViolation
        } else {
            DeadlineStatus::Ok
        }
    }

    /// Run the update function once, if the state is in progress.
    #[inline]
    pub fn update(&self) {
        if self.is_in_progress() {
            (self.update)();
        }
    }

    /// Zero the elapsed counter. Nothing else changes.
    #[inline]
    pub fn reset(&self) {
        self.elapsed.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    #[inline]
    pub fn soft_deadline(&self) -> u32 {
        self.soft_deadline
    }

    #[inline]
    pub fn hard_deadline(&self) -> u32 {
        self.hard_deadline
    }

    /// Main-loop only: mark the state as executing.
    #[inline]
    pub(crate) fn begin(&self) {
        self.in_progress.store(true, Ordering::Release);
    }

    /// Main-loop only: mark the state as finished.
    #[inline]
    pub(crate) fn finish(&self) {
        self.in_progress.store(false, Ordering::Release);
    }
}

impl fmt::Debug for State<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("soft_deadline", &self.soft_deadline)
            .field("hard_deadline", &self.hard_deadline)
            .field("in_progress", &self.is_in_progress())
            .field("elapsed", &self.elapsed())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

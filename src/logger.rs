//! # Event Log
//!
//! The core never formats or stores diagnostics itself: it hands numeric codes
//! to a [`Reporter`]. [`EventLog`] is the bounded reference implementation:
//! two fixed buffers of `u8` codes (warnings and errors) with an overflow flag
//! each, drained on demand as line-oriented text.
//!
//! ## Drain format
//!
//! ```text
//! error        ← overflow block, only if the buffer overflowed
//! 255
//! end
//! warn         ← "warn" or "error"
//! 5            ← most recent code first
//! 2
//! end
//! ```
//!
//! Codes are drained most-recent-first and every line ends with `\r\n`, which
//! is what existing serial consumers of this format expect. The overflow block
//! always uses the `error` header, for either buffer.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::config::{MAX_ERRORS, MAX_WARNINGS, OVERFLOW_CODE};
use crate::sync::{self, Shared};

const LINE_END: &str = "\r\n";

// ---------------------------------------------------------------------------
// Codes
// ---------------------------------------------------------------------------

/// Recoverable conditions. The numeric value is the wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WarningCode {
    /// `configure` was given a period outside the supported table.
    UnsupportedTickPeriod = 1,
    /// A callback was registered past the registry capacity.
    CallbackRegistryFull = 2,
    /// A state machine replaced the one already bound to the tick source.
    MachineRebound = 3,
    /// A child state was added past the machine's capacity.
    ChildStateRegistryFull = 4,
    /// The running state passed its soft deadline.
    SoftDeadlineExceeded = 5,
}

/// Broken guarantees. Reported only; execution continues unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// The running state passed its hard deadline.
    HardDeadlineExceeded = 1,
}

impl WarningCode {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl ErrorCode {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Reporter interface
// ---------------------------------------------------------------------------

/// Sink for warning and error codes.
///
/// Called from both the tick interrupt and the main loop, so implementations
/// must be non-blocking and bounded.
pub trait Reporter: Sync {
    fn warn(&self, code: WarningCode);
    fn error(&self, code: ErrorCode);
}

/// Reporter that discards every code.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn warn(&self, _code: WarningCode) {}
    fn error(&self, _code: ErrorCode) {}
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

struct Buffers<const W: usize, const E: usize> {
    warnings: Vec<u8, W>,
    errors: Vec<u8, E>,
    warnings_overflowed: bool,
    errors_overflowed: bool,
}

/// Bounded warning/error log. Safe to share between the tick interrupt and
/// the main loop; store it in a `static`.
pub struct EventLog<const W: usize = MAX_WARNINGS, const E: usize = MAX_ERRORS> {
    buffers: Shared<Buffers<W, E>>,
}

impl<const W: usize, const E: usize> EventLog<W, E> {
    pub const fn new() -> Self {
        Self {
            buffers: sync::shared(Buffers {
                warnings: Vec::new(),
                errors: Vec::new(),
                warnings_overflowed: false,
                errors_overflowed: false,
            }),
        }
    }

    /// Number of buffered warning codes.
    pub fn warning_count(&self) -> usize {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).warnings.len())
    }

    /// Number of buffered error codes.
    pub fn error_count(&self) -> usize {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).errors.len())
    }

    /// Whether a warning was dropped since the last warning drain.
    pub fn warnings_overflowed(&self) -> bool {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).warnings_overflowed)
    }

    /// Whether an error was dropped since the last error drain.
    pub fn errors_overflowed(&self) -> bool {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).errors_overflowed)
    }

    /// Copy of the buffered warning codes, oldest first. Does not drain.
    pub fn warnings(&self) -> Vec<u8, W> {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).warnings.clone())
    }

    /// Copy of the buffered error codes, oldest first. Does not drain.
    pub fn errors(&self) -> Vec<u8, E> {
        sync::critical_section(|cs| self.buffers.borrow_ref(cs).errors.clone())
    }

    /// Write and clear the warning buffer and its overflow flag.
    ///
    /// The buffer is taken inside a critical section and formatted outside
    /// it, so a slow sink never delays the tick interrupt. Codes reported
    /// while formatting land in the emptied buffer for the next drain.
    pub fn drain_warnings<O: Write>(&self, out: &mut O) -> fmt::Result {
        let (codes, overflowed) = sync::critical_section(|cs| {
            let mut buffers = self.buffers.borrow_ref_mut(cs);
            let overflowed = core::mem::replace(&mut buffers.warnings_overflowed, false);
            (core::mem::take(&mut buffers.warnings), overflowed)
        });
        write_report(out, "warn", &codes, overflowed)
    }

    /// Write and clear the error buffer and its overflow flag.
    pub fn drain_errors<O: Write>(&self, out: &mut O) -> fmt::Result {
        let (codes, overflowed) = sync::critical_section(|cs| {
            let mut buffers = self.buffers.borrow_ref_mut(cs);
            let overflowed = core::mem::replace(&mut buffers.errors_overflowed, false);
            (core::mem::take(&mut buffers.errors), overflowed)
        });
        write_report(out, "error", &codes, overflowed)
    }

    /// Drain warnings, then errors.
    pub fn drain<O: Write>(&self, out: &mut O) -> fmt::Result {
        self.drain_warnings(out)?;
        self.drain_errors(out)
    }
}

impl<const W: usize, const E: usize> Default for EventLog<W, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize, const E: usize> Reporter for EventLog<W, E> {
    fn warn(&self, code: WarningCode) {
        warn!("warning {}", code.code());
        sync::critical_section(|cs| {
            let mut buffers = self.buffers.borrow_ref_mut(cs);
            if buffers.warnings.push(code.code()).is_err() {
                buffers.warnings_overflowed = true;
            }
        });
    }

    fn error(&self, code: ErrorCode) {
        error!("error {}", code.code());
        sync::critical_section(|cs| {
            let mut buffers = self.buffers.borrow_ref_mut(cs);
            if buffers.errors.push(code.code()).is_err() {
                buffers.errors_overflowed = true;
            }
        });
    }
}

fn write_report<O: Write>(out: &mut O, header: &str, codes: &[u8], overflowed: bool) -> fmt::Result {
    if overflowed {
        write!(out, "error{LINE_END}{OVERFLOW_CODE}{LINE_END}end{LINE_END}")?;
    }
    if !codes.is_empty() {
        write!(out, "{header}{LINE_END}")?;
        for code in codes.iter().rev() {
            write!(out, "{code}{LINE_END}")?;
        }
        write!(out, "end{LINE_END}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    #[test]
    fn test_codes_match_wire_values() {
        assert_eq!(WarningCode::UnsupportedTickPeriod.code(), 1);
        assert_eq!(WarningCode::CallbackRegistryFull.code(), 2);
        assert_eq!(WarningCode::MachineRebound.code(), 3);
        assert_eq!(WarningCode::ChildStateRegistryFull.code(), 4);
        assert_eq!(WarningCode::SoftDeadlineExceeded.code(), 5);
        assert_eq!(ErrorCode::HardDeadlineExceeded.code(), 1);
    }

    #[test]
    fn test_drain_is_most_recent_first() {
        let log: EventLog = EventLog::new();
        log.warn(WarningCode::UnsupportedTickPeriod);
        log.warn(WarningCode::CallbackRegistryFull);
        log.warn(WarningCode::SoftDeadlineExceeded);

        let mut out = String::new();
        log.drain_warnings(&mut out).unwrap();
        assert_eq!(out, "warn\r\n5\r\n2\r\n1\r\nend\r\n");
        assert_eq!(log.warning_count(), 0, "Drain must clear the buffer");
    }

    #[test]
    fn test_empty_drain_writes_nothing() {
        let log: EventLog = EventLog::new();
        let mut out = String::new();
        log.drain(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_overflow_sets_flag_and_reports_sentinel() {
        let log: EventLog<2, 2> = EventLog::new();
        log.warn(WarningCode::MachineRebound);
        log.warn(WarningCode::MachineRebound);
        log.warn(WarningCode::ChildStateRegistryFull);

        assert_eq!(log.warning_count(), 2);
        assert!(log.warnings_overflowed());
        assert!(!log.errors_overflowed());

        let mut out = String::new();
        log.drain_warnings(&mut out).unwrap();
        assert_eq!(out, "error\r\n255\r\nend\r\nwarn\r\n3\r\n3\r\nend\r\n");
        assert!(!log.warnings_overflowed(), "Drain must clear its own overflow flag");
    }

    #[test]
    fn test_error_overflow_is_independent() {
        let log: EventLog<4, 1> = EventLog::new();
        log.error(ErrorCode::HardDeadlineExceeded);
        log.error(ErrorCode::HardDeadlineExceeded);
        log.warn(WarningCode::SoftDeadlineExceeded);

        assert!(log.errors_overflowed());
        assert!(!log.warnings_overflowed());

        let mut out = String::new();
        log.drain(&mut out).unwrap();
        assert_eq!(
            out,
            "warn\r\n5\r\nend\r\nerror\r\n255\r\nend\r\nerror\r\n1\r\nend\r\n"
        );
        assert!(!log.errors_overflowed());
        assert_eq!(log.error_count(), 0);
    }

    #[test]
    fn test_snapshot_does_not_drain() {
        let log: EventLog = EventLog::new();
        log.warn(WarningCode::CallbackRegistryFull);
        log.error(ErrorCode::HardDeadlineExceeded);
        assert_eq!(log.warnings().as_slice(), &[2]);
        assert_eq!(log.errors().as_slice(), &[1]);
        assert_eq!(log.warning_count(), 1);
    }

    #[test]
    fn test_null_reporter_accepts_everything() {
        let reporter = NullReporter;
        reporter.warn(WarningCode::MachineRebound);
        reporter.error(ErrorCode::HardDeadlineExceeded);
    }
}

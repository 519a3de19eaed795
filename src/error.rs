//! # Errors
//!
//! Refusals returned by configuration and registration calls. Every one of
//! them is also reported to the [`Reporter`](crate::logger::Reporter) as a
//! warning code, so callers that only poll the log lose nothing by ignoring
//! the returned value.

use core::fmt;

/// Why an operation was refused. None of these are fatal: the refused
/// operation is a no-op and the system keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The requested tick period (µs) is not in the supported table.
    UnsupportedPeriod(u32),
    /// `start()` was called before a supported period was configured.
    NotConfigured,
    /// The tick source's callback registry is at capacity.
    CallbackRegistryFull,
    /// The state machine's child-state set is at capacity.
    ChildStateRegistryFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedPeriod(us) => write!(f, "unsupported tick period: {} us", us),
            Error::NotConfigured => f.write_str("tick source has no valid period"),
            Error::CallbackRegistryFull => f.write_str("callback registry full"),
            Error::ChildStateRegistryFull => f.write_str("child-state registry full"),
        }
    }
}

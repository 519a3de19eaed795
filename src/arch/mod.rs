//! # Architecture Abstraction Layer
//!
//! Concrete [`TickHardware`](crate::timer::TickHardware) drivers. The
//! Cortex-M4 port is only built for bare-metal ARM; the manual timer is
//! always available and is what the tests and the hosted demo use.

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod cortex_m4;

pub mod manual;

//! # Manual Timer
//!
//! Software stand-in for the tick hardware. It programs nothing; it records
//! what the tick source asked for so tests can inspect it, and the ticks
//! themselves are delivered by calling
//! [`TickSource::on_tick`](crate::timer::TickSource::on_tick) by hand (or
//! from a periodic thread in the hosted demo).

use crate::timer::{ReloadParams, TickHardware};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ManualTimer {
    params: Option<ReloadParams>,
    running: bool,
    reconfigures: u32,
    starts: u32,
    stops: u32,
    reloads: u32,
}

impl ManualTimer {
    pub const fn new() -> Self {
        Self {
            params: None,
            running: false,
            reconfigures: 0,
            starts: 0,
            stops: 0,
            reloads: 0,
        }
    }

    /// Last programmed period, `None` after a disable.
    pub fn params(&self) -> Option<ReloadParams> {
        self.params
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of periods programmed, including the first.
    pub fn reconfigures(&self) -> u32 {
        self.reconfigures
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }

    pub fn stops(&self) -> u32 {
        self.stops
    }

    /// Number of end-of-tick reloads performed.
    pub fn reloads(&self) -> u32 {
        self.reloads
    }
}

impl TickHardware for ManualTimer {
    fn configure(&mut self, params: ReloadParams) {
        // Running state is left alone, as on SysTick
        self.params = Some(params);
        self.reconfigures = self.reconfigures.saturating_add(1);
    }

    fn disable(&mut self) {
        self.params = None;
        self.running = false;
    }

    fn start(&mut self) {
        self.running = true;
        self.starts = self.starts.saturating_add(1);
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops = self.stops.saturating_add(1);
    }

    fn reload(&mut self) {
        self.reloads = self.reloads.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TickPeriod;

    #[test]
    fn test_records_lifecycle() {
        let mut timer = ManualTimer::new();
        timer.configure(TickPeriod::Ms1.reload().unwrap());
        timer.start();
        timer.reload();
        timer.stop();

        assert_eq!(timer.params(), TickPeriod::Ms1.reload());
        assert!(!timer.is_running());
        assert_eq!((timer.starts(), timer.stops(), timer.reloads()), (1, 1, 1));

        timer.disable();
        assert_eq!(timer.params(), None);
    }

    #[test]
    fn test_reconfigure_keeps_running_state() {
        let mut timer = ManualTimer::new();
        timer.configure(TickPeriod::Ms1.reload().unwrap());
        timer.start();
        timer.configure(TickPeriod::Us200.reload().unwrap());

        assert!(timer.is_running());
        assert_eq!(timer.params(), TickPeriod::Us200.reload());
        assert_eq!((timer.reconfigures(), timer.starts()), (2, 1));
    }
}

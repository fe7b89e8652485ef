//! Timebase on the embassy time driver
//!
//! The board crate provides the embassy time driver. Waits stay busy-polls;
//! nothing here awaits.

use embassy_time::{block_for, Duration, Instant};
use embedded_hal::delay::DelayNs;
use nandprobe_hal::MonotonicTimer;

/// Microsecond clock and blocking delay
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTimer;

impl EmbassyTimer {
    pub fn new() -> Self {
        Self
    }
}

impl MonotonicTimer for EmbassyTimer {
    fn now_us(&mut self) -> u64 {
        Instant::now().as_micros()
    }
}

impl DelayNs for EmbassyTimer {
    fn delay_ns(&mut self, ns: u32) {
        block_for(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        block_for(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(ms as u64));
    }
}

//! Monotonic timebase abstractions
//!
//! Every hardware wait is a busy-poll bounded by a timeout measured against
//! this clock. Settle delays use `embedded_hal::delay::DelayNs` from the
//! implementing crate.

/// Free-running microsecond clock
pub trait MonotonicTimer {
    /// Microseconds since an arbitrary, fixed epoch
    fn now_us(&mut self) -> u64;

    /// Check whether `duration_us` has passed since `start`
    ///
    /// Uses wrapping arithmetic so a counter rollover does not end a wait
    /// early.
    fn elapsed_since(&mut self, start: u64, duration_us: u64) -> bool {
        self.now_us().wrapping_sub(start) >= duration_us
    }
}

impl<T: MonotonicTimer + ?Sized> MonotonicTimer for &mut T {
    fn now_us(&mut self) -> u64 {
        (**self).now_us()
    }

    fn elapsed_since(&mut self, start: u64, duration_us: u64) -> bool {
        (**self).elapsed_since(start, duration_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u64);

    impl MonotonicTimer for Fixed {
        fn now_us(&mut self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_elapsed_since() {
        let mut timer = Fixed(1_500);
        assert!(timer.elapsed_since(500, 1_000));
        assert!(!timer.elapsed_since(501, 1_000));
    }

    /// 32-bit counter that wraps on its own width
    struct Wrap32(u32);

    impl MonotonicTimer for Wrap32 {
        fn now_us(&mut self) -> u64 {
            self.0 as u64
        }

        fn elapsed_since(&mut self, start: u64, duration_us: u64) -> bool {
            (self.0.wrapping_sub(start as u32) as u64) >= duration_us
        }
    }

    fn timed_out<T: MonotonicTimer>(mut timer: T, start: u64, duration_us: u64) -> bool {
        timer.elapsed_since(start, duration_us)
    }

    #[test]
    fn test_mut_ref_keeps_custom_elapsed() {
        let mut timer = Wrap32(10);
        let start = (u32::MAX - 5) as u64;
        assert!(!timed_out(&mut timer, start, 100));
        assert!(timed_out(&mut timer, start, 16));
    }

    #[test]
    fn test_elapsed_across_rollover() {
        let mut timer = Fixed(10);
        assert!(!timer.elapsed_since(u64::MAX - 5, 100));
        assert!(timer.elapsed_since(u64::MAX - 5, 16));
    }
}

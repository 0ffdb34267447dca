//! Wraparound-safe soft timers counted in RTC ticks

use super::ticks::TickSource;

/// Largest usable timer period; bit 15 of a deadline tracks counter overflow.
pub const MAX_PERIOD: u16 = 0x7FFF;

/// A deadline in tick-counter space, tolerant of one counter wraparound.
///
/// The stored deadline splits into a 15-bit magnitude and a 1-bit epoch
/// (bit 15). The epoch tells which side of a counter wrap the deadline sits
/// on, so the comparison in [`SoftTimer::is_active`] stays correct across
/// exactly one wrap between arming and checking. A timer left unchecked for
/// longer than one full wraparound period of the tick counter gives an
/// incorrect answer; callers must run the scheduler at least once per
/// wraparound period for every live timed task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftTimer {
    expire_count: u16,
}

impl SoftTimer {
    /// Create a timer due `period` ticks from now.
    ///
    /// Periods above [`MAX_PERIOD`] are truncated to 15 bits, not rejected.
    pub fn new(ticks: &impl TickSource, period: u16) -> Self {
        let mut timer = Self { expire_count: 0 };
        timer.start(ticks, period);
        timer
    }

    /// Arm the timer: sample the counter and set the deadline `period`
    /// ticks out. Wrapping addition is intentional, the epoch bit absorbs
    /// the overflow.
    pub fn start(&mut self, ticks: &impl TickSource, period: u16) {
        self.expire_count = ticks.ticks().wrapping_add(period & MAX_PERIOD);
    }

    /// Push the deadline out by `period` without resampling the counter.
    ///
    /// Re-arming a repeating task this way keeps its long-run phase exact
    /// no matter how late the individual firings were.
    pub fn add_period(&mut self, period: u16) {
        self.expire_count = self.expire_count.wrapping_add(period & MAX_PERIOD);
    }

    /// `true` while the deadline is still in the future.
    pub fn is_active(&self, ticks: &impl TickSource) -> bool {
        let now = ticks.ticks();
        if (self.expire_count ^ now) & !MAX_PERIOD == 0 {
            // same epoch: pending while the count is below the deadline
            (now & MAX_PERIOD) < (self.expire_count & MAX_PERIOD)
        } else {
            // counter and deadline sit on opposite sides of a wrap
            (now & MAX_PERIOD) >= (self.expire_count & MAX_PERIOD)
        }
    }

    /// Raw deadline in tick-counter space (epoch bit included).
    pub fn deadline(&self) -> u16 {
        self.expire_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtos::testutil::ManualTicks;

    #[test]
    fn zero_period_expires_immediately() {
        let ticks = ManualTicks::new();
        ticks.set(1234);
        let timer = SoftTimer::new(&ticks, 0);
        assert!(!timer.is_active(&ticks));
    }

    #[test]
    fn nonzero_period_starts_active() {
        let ticks = ManualTicks::new();
        for start in [0u16, 1, 0x7FFE, 0x7FFF, 0x8000, 0xFFFF] {
            ticks.set(start);
            let timer = SoftTimer::new(&ticks, 1);
            assert!(timer.is_active(&ticks), "start={start:#06x}");
        }
    }

    #[test]
    fn expires_exactly_at_deadline() {
        let ticks = ManualTicks::new();
        ticks.set(100);
        let timer = SoftTimer::new(&ticks, 5);
        assert_eq!(timer.deadline(), 105);
        ticks.set(104);
        assert!(timer.is_active(&ticks));
        ticks.set(105);
        assert!(!timer.is_active(&ticks));
    }

    #[test]
    fn period_is_masked_to_15_bits() {
        let ticks = ManualTicks::new();
        for period in [0x8000u16, 0x8001, 0xFFFF, 0xC123] {
            ticks.set(42);
            let full = SoftTimer::new(&ticks, period);
            let masked = SoftTimer::new(&ticks, period & MAX_PERIOD);
            assert_eq!(full.deadline(), masked.deadline(), "period={period:#06x}");
        }
    }

    #[test]
    fn stays_expired_for_half_the_counter_range() {
        let ticks = ManualTicks::new();
        ticks.set(100);
        let timer = SoftTimer::new(&ticks, 7);
        // expired from the deadline until the magnitude wraps back around
        ticks.set(107);
        assert!(!timer.is_active(&ticks));
        ticks.set(107u16.wrapping_add(0x7FFF));
        assert!(!timer.is_active(&ticks));
        // one tick later the 15-bit comparison reads active again; this is
        // the documented wrap-tolerance boundary
        ticks.advance(1);
        assert!(timer.is_active(&ticks));
    }

    #[test]
    fn deadline_crossing_counter_wrap_is_still_pending() {
        let ticks = ManualTicks::new();
        // deadline lands in the next epoch
        ticks.set(0x7FFD);
        let timer = SoftTimer::new(&ticks, 5);
        assert_eq!(timer.deadline(), 0x8002);
        ticks.set(0x7FFF);
        assert!(timer.is_active(&ticks));
        ticks.set(0x8001);
        assert!(timer.is_active(&ticks));
        ticks.set(0x8002);
        assert!(!timer.is_active(&ticks));
    }

    #[test]
    fn deadline_crossing_full_16_bit_wrap_is_still_pending() {
        let ticks = ManualTicks::new();
        ticks.set(0xFFFE);
        let timer = SoftTimer::new(&ticks, 4);
        assert_eq!(timer.deadline(), 2);
        ticks.set(0xFFFF);
        assert!(timer.is_active(&ticks));
        ticks.set(0);
        assert!(timer.is_active(&ticks));
        ticks.set(2);
        assert!(!timer.is_active(&ticks));
    }

    #[test]
    fn add_period_rearms_relative_to_deadline() {
        let ticks = ManualTicks::new();
        ticks.set(100);
        let mut timer = SoftTimer::new(&ticks, 10);
        // check happens late, re-arm still lands on the original phase
        ticks.set(113);
        assert!(!timer.is_active(&ticks));
        timer.add_period(10);
        assert_eq!(timer.deadline(), 120);
        assert!(timer.is_active(&ticks));
    }
}

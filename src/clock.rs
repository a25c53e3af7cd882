//! # Tick Clock
//!
//! The sole time base for the kernel: a monotonically increasing counter
//! advanced once per external tick notification.
//!
//! The counter is an `AtomicU32` with a single-writer contract — only the
//! tick notification context advances it, while the scheduler loop and the
//! blocking delay read it. The counter is allowed to wrap; every duration
//! comparison in the crate goes through [`elapsed`], which stays correct
//! across a single wrap as long as the duration is below the full `u32`
//! range.

use core::sync::atomic::{AtomicU32, Ordering};

/// Monotonic tick counter.
pub struct TickClock {
    ticks: AtomicU32,
}

impl TickClock {
    /// Create a clock at tick zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance the counter by one tick. Single writer: call only from the
    /// tick notification context.
    #[inline]
    pub fn advance(&self) {
        // Relaxed is sufficient: one writer, and readers only compare tick
        // values, never other memory published by the writer. fetch_add
        // wraps on overflow.
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Current tick value.
    #[inline]
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Reset the counter to zero. Part of kernel (re)initialization.
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn set(&self, value: u32) {
        self.ticks.store(value, Ordering::Relaxed);
    }
}

/// Wraparound-safe elapsed-tick computation: how many ticks have passed
/// since `since` was observed.
#[inline]
pub const fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_reset() {
        let clock = TickClock::new();
        assert_eq!(clock.now(), 0);
        clock.advance();
        clock.advance();
        assert_eq!(clock.now(), 2);
        clock.reset();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_counter_wraps() {
        let clock = TickClock::new();
        clock.set(u32::MAX);
        clock.advance();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_elapsed_plain() {
        assert_eq!(elapsed(100, 40), 60);
        assert_eq!(elapsed(40, 40), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        // Reference taken just before the wrap, observed just after.
        assert_eq!(elapsed(3, u32::MAX - 2), 6);
        // Duration comparisons are invariant under a shared offset.
        let (now, since) = (10u32, u32::MAX - 5);
        let offset = 0x8000_0000u32;
        assert_eq!(
            elapsed(now, since),
            elapsed(now.wrapping_add(offset), since.wrapping_add(offset))
        );
    }
}

//! # TickOS Configuration
//!
//! Compile-time constants governing kernel capacity and the time base.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of task slots. Task ids must fall in `[0, MAX_TASKS)`;
/// the id also acts as the task's priority (lower id runs first).
pub const MAX_TASKS: usize = 10;

/// Number of records in the software delay-timer pool.
pub const DELAY_POOL_SIZE: usize = 10;

/// Number of records in the deferred-event pool.
pub const EVENT_POOL_SIZE: usize = 10;

/// Tick frequency in Hz. The tick notification is expected to arrive at
/// this rate; the conversion helpers below are derived from it.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
/// Used by the arch port to derive the SysTick reload value.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Convert a duration in milliseconds to ticks.
///
/// Integer arithmetic: exact only when `TICK_HZ` is a multiple of 1000.
#[inline]
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ms * (TICK_HZ / 1000)
}

/// Convert a tick count to milliseconds.
#[inline]
pub const fn ticks_to_ms(ticks: u32) -> u32 {
    ticks * (1000 / TICK_HZ)
}

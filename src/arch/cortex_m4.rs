//! # Cortex-M Port Layer
//!
//! Configures SysTick as the periodic tick source. The exception handler
//! itself stays with the application, which owns the kernel instance and
//! the critical-section discipline around it:
//!
//! ```ignore
//! #[exception]
//! fn SysTick() {
//!     cortex_m::interrupt::free(|_| {
//!         // `KERNEL` is the application's shared kernel instance.
//!         let _ = unsafe { KERNEL.tick() };
//!     });
//! }
//! ```
//!
//! No PendSV or context-switch machinery exists here: scheduling is
//! cooperative and every callback runs to completion on the main stack.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

/// SysTick reload value for a `TICK_HZ` tick rate off the core clock.
#[inline]
pub const fn systick_reload() -> u32 {
    SYSTEM_CLOCK_HZ / TICK_HZ - 1
}

/// Configure the SysTick timer to fire at `TICK_HZ` using the processor
/// clock. Each interrupt is one tick notification for the kernel.
pub fn configure_systick(syst: &mut SYST) {
    syst.set_reload(systick_reload());
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

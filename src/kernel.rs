//! # Kernel
//!
//! Top-level runtime object and public API. A [`Kernel`] owns the tick
//! clock, the task table, the delay pool, and the event pool; there is no
//! ambient global instance, so independent kernels can coexist (one per
//! firmware image in practice, many in tests).
//!
//! ## Lifecycle
//!
//! ```text
//! main()
//!   ├─► let mut kernel = Kernel::new()   ← const, usable in a static
//!   ├─► kernel.init()                    ← resets clock, table, pools
//!   ├─► kernel.add_task(..) (×N)
//!   └─► kernel.start()                   ← scheduler loop, never returns
//!
//! timer ISR (TICK_HZ)
//!   └─► kernel.tick()                    ← tick notification
//! ```
//!
//! Re-running `init()` simply resets everything; there is no shutdown
//! path.
//!
//! ## Interrupt Safety
//!
//! The tick counter is the only field designed for cross-context access
//! (single writer: the tick notification). `tick()` itself also drives the
//! delay-pool countdown through `&mut self`, so a kernel shared between
//! the main loop and an ISR must be guarded by the caller — on Cortex-M,
//! `cortex_m::interrupt::free` around main-context kernel calls. All task
//! and event mutators are defined to execute only from the cooperative
//! main context.

use crate::clock::{self, TickClock};
use crate::config::MAX_TASKS;
use crate::delay::DelayPool;
use crate::error::{KernelError, KernelResult};
use crate::event::{EventFn, EventPool};
use crate::scheduler::TaskTable;
use crate::task::{TaskFn, TaskSlot, UserData};

/// The runtime instance. See the [module docs](self) for the lifecycle.
pub struct Kernel {
    clock: TickClock,
    tasks: TaskTable,
    delays: DelayPool,
    events: EventPool,
    /// Id of the task whose callback is (or was last) running.
    current_task: u8,
    initialized: bool,
}

impl Kernel {
    /// Create an uninitialized kernel. The pool free lists are built by
    /// [`init`](Kernel::init); until then the tick notification reports
    /// `NotInitialized` and pool allocations report `Busy`.
    pub const fn new() -> Self {
        Self {
            clock: TickClock::new(),
            tasks: TaskTable::new(),
            delays: DelayPool::new(),
            events: EventPool::new(),
            current_task: 0,
            initialized: false,
        }
    }

    /// Initialize (or re-initialize) the kernel: clock to zero, task table
    /// cleared, both pools reset with rebuilt free lists.
    pub fn init(&mut self) {
        self.clock.reset();
        self.tasks.reset();
        self.delays.reset();
        self.events.reset();
        self.current_task = 0;
        self.initialized = true;
    }

    // -- time base -------------------------------------------------------

    /// Tick notification: advance the clock by one tick and drive the
    /// delay-pool countdown. Call at `TICK_HZ`, normally from the timer
    /// ISR.
    pub fn tick(&mut self) -> KernelResult {
        if !self.initialized {
            return Err(KernelError::NotInitialized);
        }
        self.clock.advance();
        self.delays.tick();
        Ok(())
    }

    /// Current tick value.
    #[inline]
    pub fn now(&self) -> u32 {
        self.clock.now()
    }

    /// Busy-wait until `ticks` have elapsed.
    ///
    /// Spins re-reading the clock and blocks the entire execution context
    /// for the duration — it defeats cooperative scheduling and must not
    /// be called from a task or event callback. There is no cancellation.
    pub fn delay_blocking(&self, ticks: u32) -> KernelResult {
        if ticks == 0 {
            return Err(KernelError::InvalidParam);
        }
        let start = self.clock.now();
        while clock::elapsed(self.clock.now(), start) < ticks {
            core::hint::spin_loop();
        }
        Ok(())
    }

    // -- scheduler loop --------------------------------------------------

    /// Run the scheduler forever. Each pass is one [`poll`](Kernel::poll).
    pub fn start(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// One scheduler pass: dispatch all ready events, then evaluate every
    /// task slot in ascending id order.
    ///
    /// The clock is re-read for every slot, so a tick that lands mid-pass
    /// is visible to the remaining slots. `last_run` takes the value
    /// observed at invocation time, not after the callback returns.
    ///
    /// Public so hosts and tests can drive passes explicitly; firmware
    /// normally calls [`start`](Kernel::start) instead.
    pub fn poll(&mut self) {
        self.dispatch_events();

        for id in 0..MAX_TASKS {
            let now = self.clock.now();
            if let Some((func, data)) = self.tasks.ready(id, now) {
                self.current_task = id as u8;
                func(self, data);
                self.tasks.mark_ran(id, now);
            }
        }
    }

    /// Drain one pending trigger from every ready event.
    ///
    /// The successor index is captured before the handler runs; a handler
    /// that deletes records mid-dispatch leaves zeroed links behind, which
    /// end the walk early rather than revisiting freed slots.
    fn dispatch_events(&mut self) {
        let mut cursor = self.events.active_head();
        while let Some(idx) = cursor {
            cursor = self.events.next_of(idx);
            if let Some((func, data)) = self.events.claim(idx) {
                func(self, data);
                self.events.consume(idx);
            }
        }
    }

    // -- task API --------------------------------------------------------

    /// Register a periodic task. `id` must be in `[0, MAX_TASKS)` and also
    /// acts as the task's priority; re-adding an id overwrites it in
    /// place. `period` is in ticks.
    pub fn add_task(&mut self, id: u8, func: TaskFn, data: UserData, period: u32) -> KernelResult {
        self.tasks.add(id, func, data, period)
    }

    /// Stop a task from being scheduled until resumed.
    pub fn suspend_task(&mut self, id: u8) -> KernelResult {
        self.tasks.suspend(id)
    }

    /// Make a suspended task schedulable again.
    pub fn resume_task(&mut self, id: u8) -> KernelResult {
        self.tasks.resume(id)
    }

    /// Remove a task and zero its slot.
    pub fn delete_task(&mut self, id: u8) -> KernelResult {
        self.tasks.delete(id)
    }

    /// Keep a task out of scheduling for `ticks`, counted from now. The
    /// wake check happens lazily inside the scheduler pass.
    pub fn sleep_task(&mut self, id: u8, ticks: u32) -> KernelResult {
        let now = self.clock.now();
        self.tasks.sleep(id, ticks, now)
    }

    /// Wake a sleeping task immediately.
    pub fn wakeup_task(&mut self, id: u8) -> KernelResult {
        self.tasks.wakeup(id)
    }

    // -- delay-timer API -------------------------------------------------

    /// Start or refresh the software delay timer for `id`.
    pub fn start_delay(&mut self, id: u8, ticks: u32) -> KernelResult {
        self.delays.start(id, ticks)
    }

    /// Whether the delay timer for `id` has expired. `false` when absent.
    pub fn delay_expired(&self, id: u8) -> bool {
        self.delays.expired(id)
    }

    /// Release the delay timer for `id`. The record is *not* reclaimed on
    /// expiry; forgetting this call leaks the record.
    pub fn cancel_delay(&mut self, id: u8) {
        self.delays.cancel(id)
    }

    // -- event API -------------------------------------------------------

    /// Register a new event or update an existing one in place.
    pub fn register_event(&mut self, id: u8, func: EventFn, data: UserData) -> KernelResult {
        self.events.register(id, func, data)
    }

    /// Queue one trigger for `id`; the handler runs on subsequent
    /// scheduler passes, one trigger per pass.
    pub fn trigger_event(&mut self, id: u8) -> KernelResult {
        self.events.trigger(id)
    }

    /// Stop an event's handler from being dispatched, keeping the record
    /// and its pending count.
    pub fn suspend_event(&mut self, id: u8) -> KernelResult {
        self.events.suspend(id)
    }

    /// Allow a suspended event to be dispatched again.
    pub fn resume_event(&mut self, id: u8) -> KernelResult {
        self.events.resume(id)
    }

    /// Delete an event, recycling its record. No-op when absent.
    pub fn delete_event(&mut self, id: u8) {
        self.events.delete(id)
    }

    // -- diagnostics -----------------------------------------------------

    /// Id of the task whose callback is (or was last) running.
    pub fn current_task_id(&self) -> u8 {
        self.current_task
    }

    /// Id of the event whose handler is (or was last) dispatched.
    pub fn current_event_id(&self) -> u8 {
        self.events.current_id()
    }

    /// Live-task counter.
    pub fn task_count(&self) -> u8 {
        self.tasks.count()
    }

    /// Number of allocated event records.
    pub fn event_count(&self) -> u8 {
        self.events.count()
    }

    /// Inspect a task slot. Out-of-range ids return `None`.
    pub fn task(&self, id: u8) -> Option<&TaskSlot> {
        self.tasks.slot(id)
    }

    #[cfg(test)]
    pub(crate) fn set_now(&self, ticks: u32) {
        self.clock.set(ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> Kernel {
        let mut k = Kernel::new();
        k.init();
        k
    }

    /// Deliver `n` tick notifications, running one scheduler pass after
    /// each.
    fn run_ticks(k: &mut Kernel, n: u32) {
        for _ in 0..n {
            k.tick().unwrap();
            k.poll();
        }
    }

    fn bump(_kernel: &mut Kernel, data: UserData) {
        if let Some(count) = unsafe { data.deref_mut::<u32>() } {
            *count += 1;
        }
    }

    fn mark1(_kernel: &mut Kernel, data: UserData) {
        if let Some(log) = unsafe { data.deref_mut::<u32>() } {
            *log = *log * 10 + 1;
        }
    }

    fn mark2(_kernel: &mut Kernel, data: UserData) {
        if let Some(log) = unsafe { data.deref_mut::<u32>() } {
            *log = *log * 10 + 2;
        }
    }

    #[test]
    fn test_tick_before_init_not_initialized() {
        let mut k = Kernel::new();
        assert_eq!(k.tick(), Err(KernelError::NotInitialized));
        k.init();
        assert_eq!(k.tick(), Ok(()));
        assert_eq!(k.now(), 1);
    }

    #[test]
    fn test_task_first_fires_at_period() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(0, bump, UserData::from_mut(&mut hits), 5).unwrap();

        // Pass frequency must not matter: many passes before the period
        // elapses fire nothing.
        for _ in 0..10 {
            k.poll();
        }
        assert_eq!(hits, 0);

        run_ticks(&mut k, 4);
        assert_eq!(hits, 0);
        run_ticks(&mut k, 1); // tick 5
        assert_eq!(hits, 1);

        // Next due time is anchored at the invocation tick.
        run_ticks(&mut k, 4);
        assert_eq!(hits, 1);
        run_ticks(&mut k, 1); // tick 10
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_lower_id_runs_first_within_pass() {
        let mut k = kernel();
        let mut log = 0u32;
        // Registered high id first; evaluation order is still ascending.
        k.add_task(4, mark2, UserData::from_mut(&mut log), 0).unwrap();
        k.add_task(1, mark1, UserData::from_mut(&mut log), 0).unwrap();
        k.poll();
        assert_eq!(log, 12);
        assert_eq!(k.current_task_id(), 4);
    }

    #[test]
    fn test_suspend_resume_task() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(2, bump, UserData::from_mut(&mut hits), 0).unwrap();
        k.poll();
        assert_eq!(hits, 1);
        k.suspend_task(2).unwrap();
        k.poll();
        k.poll();
        assert_eq!(hits, 1);
        k.resume_task(2).unwrap();
        k.poll();
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_sleep_blackout_then_periodic_resume() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(3, bump, UserData::from_mut(&mut hits), 1).unwrap();
        k.sleep_task(3, 40).unwrap();

        run_ticks(&mut k, 39);
        assert_eq!(hits, 0);
        run_ticks(&mut k, 1); // tick 40: wakes and runs in the same pass
        assert_eq!(hits, 1);
        run_ticks(&mut k, 3); // normal periodic evaluation resumes
        assert_eq!(hits, 4);
    }

    #[test]
    fn test_wakeup_cuts_sleep_short() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(0, bump, UserData::from_mut(&mut hits), 1).unwrap();
        k.sleep_task(0, 1000).unwrap();
        run_ticks(&mut k, 5);
        assert_eq!(hits, 0);
        k.wakeup_task(0).unwrap();
        run_ticks(&mut k, 1);
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_event_burst_drains_one_per_pass() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.register_event(2, bump, UserData::from_mut(&mut hits)).unwrap();
        k.trigger_event(2).unwrap();
        k.trigger_event(2).unwrap();
        k.trigger_event(2).unwrap();

        k.poll();
        assert_eq!(hits, 1);
        k.poll();
        assert_eq!(hits, 2);
        k.poll();
        assert_eq!(hits, 3);
        k.poll(); // drained: no further invocations
        assert_eq!(hits, 3);
        assert_eq!(k.current_event_id(), 2);
    }

    #[test]
    fn test_suspended_event_holds_pending_triggers() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.register_event(6, bump, UserData::from_mut(&mut hits)).unwrap();
        k.trigger_event(6).unwrap();
        k.suspend_event(6).unwrap();
        k.poll();
        assert_eq!(hits, 0);
        // Further triggers are refused while suspended.
        assert_eq!(k.trigger_event(6), Err(KernelError::General));
        k.resume_event(6).unwrap();
        k.poll();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_delay_timer_through_tick_notifications() {
        let mut k = kernel();
        k.start_delay(5, 100).unwrap();
        for _ in 0..99 {
            k.tick().unwrap();
        }
        assert!(!k.delay_expired(5));
        k.tick().unwrap();
        assert!(k.delay_expired(5));

        // Release and re-add on a recycled record.
        k.cancel_delay(5);
        assert!(!k.delay_expired(5));
        k.start_delay(5, 50).unwrap();
        for _ in 0..50 {
            k.tick().unwrap();
        }
        assert!(k.delay_expired(5));
    }

    #[test]
    fn test_periodic_fire_across_clock_wrap() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(0, bump, UserData::from_mut(&mut hits), 5).unwrap();

        // Position the clock near the top of the range and anchor the
        // task's last run there.
        k.set_now(u32::MAX - 2);
        k.poll();
        assert_eq!(hits, 1);

        // Four ticks straddle the wrap; the period has not yet elapsed.
        run_ticks(&mut k, 4);
        assert_eq!(k.now(), 1);
        assert_eq!(hits, 1);

        // Fifth tick since the last run: fires exactly once.
        run_ticks(&mut k, 1);
        assert_eq!(hits, 2);
    }

    fn trigger_seven(kernel: &mut Kernel, _data: UserData) {
        let _ = kernel.trigger_event(7);
    }

    #[test]
    fn test_task_callback_feeds_event_pool() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.register_event(7, bump, UserData::from_mut(&mut hits)).unwrap();
        k.add_task(0, trigger_seven, UserData::none(), 0).unwrap();

        // Pass 1: no pending trigger yet when events are dispatched; the
        // task queues one afterwards.
        k.poll();
        assert_eq!(hits, 0);
        // Pass 2 onward: each pass consumes the trigger queued by the
        // previous pass.
        k.poll();
        assert_eq!(hits, 1);
        k.poll();
        assert_eq!(hits, 2);
    }

    #[test]
    fn test_reinit_resets_everything() {
        let mut k = kernel();
        let mut hits = 0u32;
        k.add_task(1, bump, UserData::from_mut(&mut hits), 10).unwrap();
        k.register_event(2, bump, UserData::from_mut(&mut hits)).unwrap();
        k.start_delay(3, 50).unwrap();
        run_ticks(&mut k, 5);

        k.init();
        assert_eq!(k.now(), 0);
        assert_eq!(k.task_count(), 0);
        assert_eq!(k.event_count(), 0);
        assert!(!k.task(1).unwrap().used);
        assert_eq!(k.trigger_event(2), Err(KernelError::General));
        assert!(!k.delay_expired(3));
        // Pools are usable again after the reset.
        k.start_delay(3, 1).unwrap();
    }

    #[test]
    fn test_delay_blocking_rejects_zero() {
        let k = kernel();
        assert_eq!(k.delay_blocking(0), Err(KernelError::InvalidParam));
    }
}

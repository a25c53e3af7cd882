//! # Task Table
//!
//! Core scheduling state: a fixed array of task slots indexed by a
//! caller-supplied id, with the readiness logic the kernel's scheduler pass
//! drives.
//!
//! ## Scheduling Rules
//!
//! Per slot, per pass:
//! 1. Skip unused and non-running slots.
//! 2. A sleeping slot whose sleep duration has elapsed is woken and keeps
//!    being evaluated in the same pass; a still-sleeping slot is skipped.
//! 3. The callback is due once `elapsed(now, last_run) >= period`, using
//!    wraparound-safe arithmetic. After invocation, `last_run` takes the
//!    tick value observed *at invocation time*, so callback latency does
//!    not shift the next due time.
//!
//! The table itself never invokes callbacks — it hands `(func, data)` back
//! to the kernel, which owns the pass and the reentrancy story.

use crate::clock;
use crate::config::MAX_TASKS;
use crate::error::{KernelError, KernelResult};
use crate::task::{TaskFn, TaskSlot, UserData};

/// Wraparound-safe due check for a periodic task.
#[inline]
pub(crate) fn due(now: u32, last_run: u32, period: u32) -> bool {
    clock::elapsed(now, last_run) >= period
}

/// Fixed-capacity task table. The slot index is the task id and doubles as
/// its priority: the scheduler pass walks ids in ascending order.
pub struct TaskTable {
    slots: [TaskSlot; MAX_TASKS],
    /// Live-task counter. Diagnostic only; see `delete` for its exact
    /// (historical) accounting rules.
    count: u8,
}

impl TaskTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: [TaskSlot::EMPTY; MAX_TASKS],
            count: 0,
        }
    }

    /// Zero every slot and the counter.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.clear();
        }
        self.count = 0;
    }

    fn check_id(id: u8) -> KernelResult {
        if id as usize >= MAX_TASKS {
            return Err(KernelError::InvalidParam);
        }
        Ok(())
    }

    /// Register a periodic task at `id`, overwriting any previous
    /// registration at that id in place. `period` is in ticks; a period of
    /// zero makes the task due on every pass.
    pub fn add(&mut self, id: u8, func: TaskFn, data: UserData, period: u32) -> KernelResult {
        Self::check_id(id)?;
        if self.count as usize > MAX_TASKS {
            return Err(KernelError::General);
        }

        // The counter goes up even when an existing id is overwritten;
        // matches the delete-side accounting below.
        self.count += 1;
        let slot = &mut self.slots[id as usize];
        slot.func = Some(func);
        slot.data = data;
        slot.period = period;
        slot.last_run = 0;
        slot.running = true;
        slot.used = true;
        slot.sleeping = false;
        Ok(())
    }

    /// Stop a task from being scheduled until `resume` is called.
    pub fn suspend(&mut self, id: u8) -> KernelResult {
        Self::check_id(id)?;
        let slot = &mut self.slots[id as usize];
        if !slot.used {
            return Err(KernelError::NotInitialized);
        }
        slot.running = false;
        Ok(())
    }

    /// Make a suspended task schedulable again.
    pub fn resume(&mut self, id: u8) -> KernelResult {
        Self::check_id(id)?;
        let slot = &mut self.slots[id as usize];
        if !slot.used {
            return Err(KernelError::NotInitialized);
        }
        slot.running = true;
        Ok(())
    }

    /// Remove a task and zero its slot.
    ///
    /// The live counter is decremented only when the slot was still
    /// running at delete time — deleting an already-suspended task leaves
    /// the counter unchanged. Historical behavior, kept as-is.
    pub fn delete(&mut self, id: u8) -> KernelResult {
        Self::check_id(id)?;
        let slot = &mut self.slots[id as usize];
        if slot.running {
            slot.running = false;
            self.count -= 1;
        }
        slot.clear();
        Ok(())
    }

    /// Put a task to sleep for `ticks`. The current tick is stamped into
    /// `last_run` as the sleep reference point; the wake check happens
    /// lazily inside the scheduler pass.
    pub fn sleep(&mut self, id: u8, ticks: u32, now: u32) -> KernelResult {
        Self::check_id(id)?;
        if ticks == 0 {
            return Err(KernelError::InvalidParam);
        }
        let slot = &mut self.slots[id as usize];
        if !slot.used {
            return Err(KernelError::NotInitialized);
        }
        slot.sleeping = true;
        slot.sleep_ticks = ticks;
        slot.last_run = now;
        Ok(())
    }

    /// Wake a sleeping task immediately, independent of elapsed time.
    pub fn wakeup(&mut self, id: u8) -> KernelResult {
        Self::check_id(id)?;
        let slot = &mut self.slots[id as usize];
        if !slot.used {
            return Err(KernelError::NotInitialized);
        }
        slot.sleeping = false;
        slot.sleep_ticks = 0;
        Ok(())
    }

    /// Evaluate one slot for execution at `now`, applying the lazy
    /// sleep-wake rule. Returns the callback and its data if the task is
    /// due.
    pub(crate) fn ready(&mut self, id: usize, now: u32) -> Option<(TaskFn, UserData)> {
        let slot = &mut self.slots[id];
        if !slot.used || !slot.running {
            return None;
        }
        if slot.sleeping && clock::elapsed(now, slot.last_run) >= slot.sleep_ticks {
            slot.sleeping = false;
            slot.sleep_ticks = 0;
        }
        if slot.sleeping {
            return None;
        }
        if due(now, slot.last_run, slot.period) {
            slot.func.map(|func| (func, slot.data))
        } else {
            None
        }
    }

    /// Record that the callback for `id` was invoked while the clock read
    /// `now`. Written unconditionally: if the callback deleted its own
    /// slot, the stamp lands on the zeroed slot, as it always has.
    pub(crate) fn mark_ran(&mut self, id: usize, now: u32) {
        self.slots[id].last_run = now;
    }

    /// Live-task counter (see `delete` for its accounting rules).
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Inspect a slot. Out-of-range ids return `None`.
    pub fn slot(&self, id: u8) -> Option<&TaskSlot> {
        self.slots.get(id as usize)
    }
}

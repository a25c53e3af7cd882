//! # Task Slots
//!
//! Defines the task record and the callback types shared by tasks and
//! events. Task slots live in a fixed array inside the scheduler — no heap
//! allocation, no per-task stack.

use crate::kernel::Kernel;

// ---------------------------------------------------------------------------
// Opaque user data
// ---------------------------------------------------------------------------

/// Opaque user-data reference handed back to a callback on every
/// invocation.
///
/// The kernel never inspects the pointee; it only stores and forwards the
/// pointer. The caller guarantees the pointee outlives the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserData(*mut ());

// Safety: UserData is an opaque cookie the kernel only copies around. The
// registering caller owns the pointee and its lifetime; dereferencing is
// gated behind an unsafe accessor.
unsafe impl Send for UserData {}

impl UserData {
    /// A registration that carries no user data.
    pub const fn none() -> Self {
        Self(core::ptr::null_mut())
    }

    /// Attach a mutable value to a registration.
    pub fn from_mut<T>(value: &mut T) -> Self {
        Self(value as *mut T as *mut ())
    }

    /// Recover the attached value.
    ///
    /// Returns `None` for a null (no-data) registration.
    ///
    /// # Safety
    /// The caller must pass the same `T` the data was created with, and the
    /// pointee must still be live and not aliased by an active reference.
    pub unsafe fn deref_mut<'a, T>(self) -> Option<&'a mut T> {
        (self.0 as *mut T).as_mut()
    }
}

/// Task callback, invoked once per due period. Receives the kernel so it
/// can start delays, trigger events, or reconfigure tasks from inside a
/// scheduler pass; such changes take effect on the following pass.
pub type TaskFn = fn(&mut Kernel, UserData);

// ---------------------------------------------------------------------------
// Task slot
// ---------------------------------------------------------------------------

/// One entry of the fixed task table. The array index is the task id.
///
/// A slot participates in scheduling iff `used && running && !sleeping`.
#[derive(Clone, Copy)]
pub struct TaskSlot {
    /// Slot holds a live registration.
    pub used: bool,
    /// Task is eligible to run (cleared by suspend).
    pub running: bool,
    /// Task is sleeping; woken lazily by the scheduler pass.
    pub sleeping: bool,
    /// Requested sleep duration in ticks.
    pub sleep_ticks: u32,
    /// Period in ticks between invocations.
    pub period: u32,
    /// Tick observed when the callback was last invoked (or when sleep
    /// began — sleep reuses this field as its reference point).
    pub last_run: u32,
    /// Periodic callback.
    pub func: Option<TaskFn>,
    /// Opaque user data forwarded to the callback.
    pub data: UserData,
}

impl TaskSlot {
    /// An unused, zeroed slot. Used to initialize the static table.
    pub const EMPTY: Self = Self {
        used: false,
        running: false,
        sleeping: false,
        sleep_ticks: 0,
        period: 0,
        last_run: 0,
        func: None,
        data: UserData::none(),
    };

    /// Zero the slot in place, returning it to the unused state.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Whether the scheduler pass should evaluate this slot at all.
    #[inline]
    pub fn is_schedulable(&self) -> bool {
        self.used && self.running && !self.sleeping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_not_schedulable() {
        let slot = TaskSlot::EMPTY;
        assert!(!slot.used);
        assert!(!slot.is_schedulable());
    }

    #[test]
    fn test_clear_zeroes_fields() {
        let mut slot = TaskSlot::EMPTY;
        slot.used = true;
        slot.running = true;
        slot.period = 50;
        slot.last_run = 123;
        slot.clear();
        assert!(!slot.used);
        assert!(!slot.running);
        assert_eq!(slot.period, 0);
        assert_eq!(slot.last_run, 0);
        assert!(slot.func.is_none());
    }

    #[test]
    fn test_sleeping_slot_not_schedulable() {
        let mut slot = TaskSlot::EMPTY;
        slot.used = true;
        slot.running = true;
        assert!(slot.is_schedulable());
        slot.sleeping = true;
        assert!(!slot.is_schedulable());
    }

    #[test]
    fn test_user_data_roundtrip() {
        let mut value = 7u32;
        let data = UserData::from_mut(&mut value);
        let got = unsafe { data.deref_mut::<u32>() }.unwrap();
        *got += 1;
        assert_eq!(value, 8);
        assert!(unsafe { UserData::none().deref_mut::<u32>() }.is_none());
    }
}

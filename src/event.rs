//! # Event Pool
//!
//! Deferred events: fixed-capacity records keyed by a caller-chosen id,
//! each accumulating a pending-trigger count for a handler. The scheduler
//! pass drains at most one pending trigger per event per pass, so an
//! N-trigger burst spreads over exactly N passes.
//!
//! Storage uses the same index-linked free/active arena as the delay pool.

use crate::config::EVENT_POOL_SIZE;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::task::UserData;

/// Event handler, invoked once per consumed trigger. Like task callbacks,
/// handlers receive the kernel for reentrant registration and triggering.
pub type EventFn = fn(&mut Kernel, UserData);

/// One event record.
#[derive(Clone, Copy)]
struct EventSlot {
    id: u8,
    used: bool,
    running: bool,
    pending: u16,
    func: Option<EventFn>,
    data: UserData,
    next: Option<usize>,
}

impl EventSlot {
    const EMPTY: Self = Self {
        id: 0,
        used: false,
        running: false,
        pending: 0,
        func: None,
        data: UserData::none(),
        next: None,
    };
}

/// Fixed-capacity event pool.
pub struct EventPool {
    slots: [EventSlot; EVENT_POOL_SIZE],
    free_head: Option<usize>,
    active_head: Option<usize>,
    /// Number of allocated records.
    count: u8,
    /// Id of the event whose handler is (or was last) dispatched.
    current_id: u8,
}

impl EventPool {
    /// Create a pool with an empty free list; [`reset`] builds the chain.
    ///
    /// [`reset`]: EventPool::reset
    pub const fn new() -> Self {
        Self {
            slots: [EventSlot::EMPTY; EVENT_POOL_SIZE],
            free_head: None,
            active_head: None,
            count: 0,
            current_id: 0,
        }
    }

    /// Zero all records and rebuild the free list.
    pub fn reset(&mut self) {
        self.slots = [EventSlot::EMPTY; EVENT_POOL_SIZE];
        for i in 0..EVENT_POOL_SIZE - 1 {
            self.slots[i].next = Some(i + 1);
        }
        self.free_head = Some(0);
        self.active_head = None;
        self.count = 0;
        self.current_id = 0;
    }

    /// Register a new event or update an existing one.
    ///
    /// An already-active id keeps its record: handler and data are
    /// overwritten, the running flag comes back on, and the pending count
    /// drops to zero. A new id allocates from the free list or reports
    /// `Busy`.
    pub fn register(&mut self, id: u8, func: EventFn, data: UserData) -> KernelResult {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                let slot = &mut self.slots[i];
                slot.func = Some(func);
                slot.running = true;
                slot.data = data;
                slot.pending = 0;
                slot.used = true;
                return Ok(());
            }
            cursor = self.slots[i].next;
        }

        let idx = self.free_head.ok_or(KernelError::Busy)?;
        self.free_head = self.slots[idx].next;
        self.count += 1;
        self.slots[idx] = EventSlot {
            id,
            used: true,
            running: true,
            pending: 0,
            func: Some(func),
            data,
            next: self.active_head,
        };
        self.active_head = Some(idx);
        Ok(())
    }

    /// Queue one trigger for `id`. Fails when the id is absent, unused, or
    /// suspended — the causes are not distinguished.
    pub fn trigger(&mut self, id: u8) -> KernelResult {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            let slot = &mut self.slots[i];
            if slot.id == id && slot.used && slot.running {
                slot.pending = slot.pending.wrapping_add(1);
                return Ok(());
            }
            cursor = slot.next;
        }
        Err(KernelError::General)
    }

    /// Stop the handler for `id` from being dispatched, keeping the record.
    pub fn suspend(&mut self, id: u8) -> KernelResult {
        self.set_running(id, false)
    }

    /// Allow a suspended event to be dispatched again.
    pub fn resume(&mut self, id: u8) -> KernelResult {
        self.set_running(id, true)
    }

    fn set_running(&mut self, id: u8, running: bool) -> KernelResult {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                self.slots[i].running = running;
                return Ok(());
            }
            cursor = self.slots[i].next;
        }
        Err(KernelError::General)
    }

    /// Delete the event for `id`, recycling its record. No-op when absent.
    pub fn delete(&mut self, id: u8) {
        let mut prev: Option<usize> = None;
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                self.count -= 1;
                let after = self.slots[i].next;
                match prev {
                    None => self.active_head = after,
                    Some(p) => self.slots[p].next = after,
                }
                self.slots[i] = EventSlot::EMPTY;
                self.slots[i].next = self.free_head;
                self.free_head = Some(i);
                return;
            }
            prev = cursor;
            cursor = self.slots[i].next;
        }
    }

    // -- dispatch support (driven by the kernel's scheduler pass) --------

    /// Head of the active list.
    pub(crate) fn active_head(&self) -> Option<usize> {
        self.active_head
    }

    /// Successor of `idx` on the active list.
    pub(crate) fn next_of(&self, idx: usize) -> Option<usize> {
        self.slots[idx].next
    }

    /// Claim the record at `idx` for dispatch if it is used, running, and
    /// has a pending trigger. Stamps the diagnostic current-event id.
    pub(crate) fn claim(&mut self, idx: usize) -> Option<(EventFn, UserData)> {
        let slot = &self.slots[idx];
        if slot.used && slot.running && slot.pending > 0 {
            self.current_id = slot.id;
            slot.func.map(|func| (func, slot.data))
        } else {
            None
        }
    }

    /// Consume exactly one pending trigger after the handler returned.
    /// Skipped when the handler deleted its own record mid-dispatch; the
    /// saturation guards a handler that re-registered itself (which resets
    /// the count to zero).
    pub(crate) fn consume(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        if slot.used {
            slot.pending = slot.pending.saturating_sub(1);
        }
    }

    /// Number of allocated records.
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Id of the most recently dispatched event.
    pub fn current_id(&self) -> u8 {
        self.current_id
    }

    #[cfg(test)]
    pub(crate) fn pending(&self, id: u8) -> Option<u16> {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                return Some(self.slots[i].pending);
            }
            cursor = self.slots[i].next;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_kernel: &mut Kernel, _data: UserData) {}
    fn other(_kernel: &mut Kernel, _data: UserData) {}

    fn pool() -> EventPool {
        let mut p = EventPool::new();
        p.reset();
        p
    }

    #[test]
    fn test_busy_before_reset() {
        let mut p = EventPool::new();
        assert_eq!(p.register(1, noop, UserData::none()), Err(KernelError::Busy));
    }

    #[test]
    fn test_register_and_trigger() {
        let mut p = pool();
        p.register(2, noop, UserData::none()).unwrap();
        assert_eq!(p.count(), 1);
        p.trigger(2).unwrap();
        p.trigger(2).unwrap();
        p.trigger(2).unwrap();
        assert_eq!(p.pending(2), Some(3));
    }

    #[test]
    fn test_trigger_absent_fails() {
        let mut p = pool();
        assert_eq!(p.trigger(9), Err(KernelError::General));
    }

    #[test]
    fn test_trigger_suspended_fails() {
        let mut p = pool();
        p.register(2, noop, UserData::none()).unwrap();
        p.suspend(2).unwrap();
        assert_eq!(p.trigger(2), Err(KernelError::General));
        p.resume(2).unwrap();
        p.trigger(2).unwrap();
        assert_eq!(p.pending(2), Some(1));
    }

    #[test]
    fn test_suspend_absent_fails() {
        let mut p = pool();
        assert_eq!(p.suspend(7), Err(KernelError::General));
        assert_eq!(p.resume(7), Err(KernelError::General));
    }

    #[test]
    fn test_reregister_updates_in_place() {
        let mut p = pool();
        p.register(2, noop, UserData::none()).unwrap();
        p.trigger(2).unwrap();
        p.suspend(2).unwrap();
        p.register(2, other, UserData::none()).unwrap();
        // Same record, state reset: running again, pending cleared.
        assert_eq!(p.count(), 1);
        assert_eq!(p.pending(2), Some(0));
        p.trigger(2).unwrap();
        assert_eq!(p.pending(2), Some(1));
    }

    #[test]
    fn test_capacity_and_update_at_full_pool() {
        let mut p = pool();
        for id in 0..EVENT_POOL_SIZE as u8 {
            p.register(id, noop, UserData::none()).unwrap();
        }
        // One more distinct id overflows...
        assert_eq!(
            p.register(200, noop, UserData::none()),
            Err(KernelError::Busy)
        );
        // ...but updating an active id still succeeds in place.
        p.register(3, other, UserData::none()).unwrap();
        assert_eq!(p.count(), EVENT_POOL_SIZE as u8);
    }

    #[test]
    fn test_delete_recycles_record() {
        let mut p = pool();
        for id in 0..EVENT_POOL_SIZE as u8 {
            p.register(id, noop, UserData::none()).unwrap();
        }
        p.delete(5);
        assert_eq!(p.count(), EVENT_POOL_SIZE as u8 - 1);
        assert_eq!(p.trigger(5), Err(KernelError::General));
        p.register(200, noop, UserData::none()).unwrap();
        assert_eq!(p.count(), EVENT_POOL_SIZE as u8);
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut p = pool();
        p.register(1, noop, UserData::none()).unwrap();
        p.delete(42);
        assert_eq!(p.count(), 1);
    }

    #[test]
    fn test_claim_and_consume() {
        let mut p = pool();
        p.register(4, noop, UserData::none()).unwrap();
        let idx = p.active_head().unwrap();
        // Nothing pending: not claimable.
        assert!(p.claim(idx).is_none());
        p.trigger(4).unwrap();
        assert!(p.claim(idx).is_some());
        assert_eq!(p.current_id(), 4);
        p.consume(idx);
        assert_eq!(p.pending(4), Some(0));
        assert!(p.claim(idx).is_none());
    }
}

//! # Delay Pool
//!
//! Software delay timers: fixed-capacity records keyed by a caller-chosen
//! id, counting down once per tick to a sticky expired flag.
//!
//! The pool is an arena of index-linked slots with an explicit free list
//! and active list — the no-alloc equivalent of the classic intrusive
//! free/active pattern, with indices instead of raw pointers so a slot can
//! only ever be on one list.
//!
//! Expiry never reclaims a record: a timer stays on the active list, flag
//! raised, until [`DelayPool::cancel`] returns it to the free list. A
//! caller that forgets to cancel leaks the record.

use crate::config::DELAY_POOL_SIZE;
use crate::error::{KernelError, KernelResult};

/// One delay record. `id` is caller-chosen and unrelated to the slot index.
#[derive(Clone, Copy)]
struct DelaySlot {
    id: u8,
    remaining: u32,
    expired: bool,
    next: Option<usize>,
}

impl DelaySlot {
    const EMPTY: Self = Self {
        id: 0,
        remaining: 0,
        expired: false,
        next: None,
    };
}

/// Fixed-capacity delay-timer pool.
pub struct DelayPool {
    slots: [DelaySlot; DELAY_POOL_SIZE],
    free_head: Option<usize>,
    active_head: Option<usize>,
}

impl DelayPool {
    /// Create a pool with an *empty* free list. Until [`reset`] links the
    /// free chain, every `start` reports `Busy` — the same face an
    /// uninitialized kernel has always shown.
    ///
    /// [`reset`]: DelayPool::reset
    pub const fn new() -> Self {
        Self {
            slots: [DelaySlot::EMPTY; DELAY_POOL_SIZE],
            free_head: None,
            active_head: None,
        }
    }

    /// Zero all records and rebuild the free list.
    pub fn reset(&mut self) {
        self.slots = [DelaySlot::EMPTY; DELAY_POOL_SIZE];
        for i in 0..DELAY_POOL_SIZE - 1 {
            self.slots[i].next = Some(i + 1);
        }
        self.free_head = Some(0);
        self.active_head = None;
    }

    /// Start or refresh the delay timer for `id`.
    ///
    /// An already-active id is updated in place: remaining ticks
    /// overwritten, expired flag cleared. Otherwise a record is taken from
    /// the free list; `Busy` if none is left, with the active list
    /// untouched.
    pub fn start(&mut self, id: u8, ticks: u32) -> KernelResult {
        if ticks == 0 {
            return Err(KernelError::InvalidParam);
        }

        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                self.slots[i].remaining = ticks;
                self.slots[i].expired = false;
                return Ok(());
            }
            cursor = self.slots[i].next;
        }

        let idx = self.free_head.ok_or(KernelError::Busy)?;
        self.free_head = self.slots[idx].next;
        self.slots[idx] = DelaySlot {
            id,
            remaining: ticks,
            expired: false,
            next: self.active_head,
        };
        self.active_head = Some(idx);
        Ok(())
    }

    /// Whether the timer for `id` has expired. `false` when `id` has no
    /// active record.
    pub fn expired(&self, id: u8) -> bool {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                return self.slots[i].expired;
            }
            cursor = self.slots[i].next;
        }
        false
    }

    /// Remove the timer for `id`, recycling its record. Silently accepted
    /// when `id` has no active record.
    pub fn cancel(&mut self, id: u8) {
        let mut prev: Option<usize> = None;
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].id == id {
                let after = self.slots[i].next;
                match prev {
                    None => self.active_head = after,
                    Some(p) => self.slots[p].next = after,
                }
                self.slots[i] = DelaySlot::EMPTY;
                self.slots[i].next = self.free_head;
                self.free_head = Some(i);
                return;
            }
            prev = cursor;
            cursor = self.slots[i].next;
        }
    }

    /// Per-tick countdown, driven by the tick notification. Every active
    /// record with ticks remaining is decremented; hitting zero raises the
    /// sticky expired flag and leaves the record on the active list.
    pub fn tick(&mut self) {
        let mut cursor = self.active_head;
        while let Some(i) = cursor {
            if self.slots[i].remaining > 0 {
                self.slots[i].remaining -= 1;
                if self.slots[i].remaining == 0 {
                    self.slots[i].expired = true;
                }
            }
            cursor = self.slots[i].next;
        }
    }
}

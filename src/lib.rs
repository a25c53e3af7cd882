//! # TickOS — a cooperative, tick-driven task runtime
//!
//! TickOS is a minimal task runtime for resource-constrained
//! microcontrollers. A single [`Kernel`](kernel::Kernel) instance schedules
//! periodic callbacks, provides software delay timers, and dispatches
//! deferred events — all from fixed-capacity storage, with no heap and no
//! per-task stacks.
//!
//! ## Overview
//!
//! Scheduling is strictly cooperative: every callback runs to completion
//! before the next one is considered, and a task's id doubles as its
//! priority (lower id is serviced first within a pass). The only external
//! input is a periodic "tick occurred" notification, normally wired to a
//! hardware timer interrupt.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  Application Callbacks                  │
//! ├────────────────────────────────────────────────────────┤
//! │                Kernel API (kernel.rs)                   │
//! │   init() · add_task() · start() · tick() · poll()      │
//! ├──────────────┬──────────────────┬─────────────────────┤
//! │  Task Table  │   Delay Pool     │     Event Pool      │
//! │ scheduler.rs │   delay.rs       │     event.rs        │
//! │ ─ due check  │ ─ start/cancel   │ ─ register/trigger  │
//! │ ─ sleep/wake │ ─ sticky expiry  │ ─ one fire per pass │
//! ├──────────────┴──────────────────┴─────────────────────┤
//! │                 Tick Clock (clock.rs)                   │
//! │     single-writer AtomicU32 · wraparound-safe math     │
//! ├────────────────────────────────────────────────────────┤
//! │              Arch Port (arch/cortex_m4.rs)              │
//! │           SysTick configuration at TICK_HZ             │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Each scheduler pass first drains ready events (at most one pending
//! trigger per event per pass), then walks the task table in ascending id
//! order and invokes every callback whose period has elapsed. Callbacks
//! receive the kernel itself, so they can start delays or trigger events
//! that take effect on the next pass.
//!
//! ## Concurrency Model
//!
//! There is exactly one concurrent context: the tick notification, expected
//! to originate from a timer ISR. The tick counter is an atomic with a
//! single writer; everything else is mutated only through `&mut Kernel`
//! from the cooperative context. A caller that shares a kernel between the
//! main loop and an ISR owns the critical-section discipline
//! (`cortex_m::interrupt::free` on Cortex-M).
//!
//! ## Memory Model
//!
//! - **No heap**: all state is statically sized
//! - **No `alloc`**: pure `core` only
//! - **Fixed task table**: `[TaskSlot; MAX_TASKS]`, indexed by task id
//! - **Fixed pools**: delay and event records live in index-linked arenas
//!   with explicit free and active lists

#![no_std]

pub mod arch;
pub mod clock;
pub mod config;
pub mod delay;
pub mod error;
pub mod event;
pub mod kernel;
pub mod scheduler;
pub mod task;

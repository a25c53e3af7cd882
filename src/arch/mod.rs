//! # Architecture Port Layer
//!
//! Hardware wiring for the tick notification. The kernel itself only
//! consumes "tick occurred"; this layer configures a periodic timer to
//! produce it. Currently provides the Cortex-M port; extensible to other
//! architectures by adding sibling modules.

pub mod cortex_m4;

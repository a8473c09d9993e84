//! Core traits and types for cycle-accurate emulation.
//!
//! Everything advances in virtual ticks. Components never block; deferred
//! work is a tagged event on a [`Scheduler`] with a tick deadline.

mod bus;
mod observable;
mod scheduler;
mod ticks;

pub use bus::{ChipBus, WordRam};
pub use observable::{Observable, Value};
pub use scheduler::Scheduler;
pub use ticks::Ticks;

//! Tick scheduling module
//!
//! This module contains the schedulers that drive the one-second countdown tick.

pub mod manual;
pub mod scheduler;

// Re-export main types
pub use manual::ManualScheduler;
pub use scheduler::{Scheduler, TaskHandle, TickCallback, TokioScheduler};

//! Tickwheel - countdown timer core for a circular drag-to-set dial
//! 
//! This library provides the countdown state machine, the mapping between
//! dial angles and seconds, and the cancellable one-second tick that drives
//! the countdown, plus an HTTP surface for driving it remotely.

pub mod config;
pub mod dial;
pub mod error;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, Countdown, TimerSnapshot, TimerState, TimerStatus};
pub use api::create_router;
pub use tasks::{ManualScheduler, Scheduler, TaskHandle, TokioScheduler};
pub use utils::signals::shutdown_signal;

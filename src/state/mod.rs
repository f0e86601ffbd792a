//! State management module
//! 
//! This module contains the countdown state machine, the controller that
//! drives it and the daemon state that wraps them.

pub mod app_state;
pub mod countdown;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use countdown::{Countdown, DEFAULT_TICK_INTERVAL};
pub use timer_state::{format_time, TickOutcome, TimerSnapshot, TimerState, TimerStatus, Toggle};

//! Daemon state shared by the HTTP handlers

use std::{
    sync::{Mutex, PoisonError},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Countdown, TimerSnapshot};
use crate::error::Result;

/// Daemon state: the countdown plus server metadata
pub struct AppState {
    /// The tick wheel being driven
    pub countdown: Countdown,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create a new AppState around an existing countdown
    pub fn new(port: u16, host: String, countdown: Countdown) -> Self {
        Self {
            countdown,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Run a countdown operation and remember it as the last action on success
    pub fn apply<F>(&self, action: &str, operation: F) -> Result<TimerSnapshot>
    where
        F: FnOnce(&Countdown) -> Result<TimerSnapshot>,
    {
        let snapshot = operation(&self.countdown)?;
        debug!("Action {} applied, timer now {}", action, snapshot.formatted);

        let mut last_action = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        *last_action = Some((action.to_string(), Utc::now()));
        Ok(snapshot)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        match last_action.clone() {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

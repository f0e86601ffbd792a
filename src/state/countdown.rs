//! Countdown controller: one timer, its tick and its subscribers
//!
//! Every operation takes the state lock for exactly one transition, so drag
//! input and ticks are serialized no matter which thread delivers them. The
//! controller holds at most one tick handle; each scheduled tick carries the
//! generation it was scheduled under and is ignored once that generation has
//! been superseded.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::timer_state::{TickOutcome, TimerSnapshot, TimerState, TimerStatus, Toggle};
use crate::{
    dial::{Offset, PointerTracker},
    error::{Result, TimerError},
    tasks::{Scheduler, TaskHandle},
};

/// Default interval between countdown ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Inner {
    timer: TimerState,
    tick: Option<TaskHandle>,
    generation: u64,
    pointer: Option<PointerTracker>,
}

impl Inner {
    fn cancel_tick(&mut self) {
        if let Some(mut tick) = self.tick.take() {
            tick.cancel();
        }
        self.generation += 1;
    }
}

struct Shared {
    inner: Mutex<Inner>,
    updates_tx: watch::Sender<TimerSnapshot>,
    /// Keep one receiver alive so publishing never fails for lack of listeners
    _updates_rx: watch::Receiver<TimerSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: &TimerSnapshot) {
        if let Err(e) = self.updates_tx.send(snapshot.clone()) {
            warn!("Failed to publish timer update: {}", e);
        }
    }

    fn on_tick(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation || !inner.timer.is_running() {
            debug!("Ignoring stale tick from generation {}", generation);
            return;
        }

        let mut finished = None;
        match inner.timer.tick() {
            Ok(TickOutcome::Continue(remaining)) => {
                debug!("Tick: {}s remaining", remaining);
            }
            Ok(TickOutcome::Expired) => {
                info!("Countdown expired");
                finished = inner.tick.take();
                inner.generation += 1;
            }
            Err(e) => {
                warn!("Tick rejected: {}", e);
                return;
            }
        }
        let snapshot = inner.timer.snapshot();
        drop(inner);

        // Release our own schedule outside the state lock
        drop(finished);
        self.publish(&snapshot);
    }
}

/// Owns one `TimerState` and drives it with a scheduled tick.
///
/// Dropping the countdown cancels its tick.
pub struct Countdown {
    shared: Arc<Shared>,
    scheduler: Arc<dyn Scheduler>,
    tick_interval: Duration,
}

impl Countdown {
    pub fn new(scheduler: Arc<dyn Scheduler>, tick_interval: Duration) -> Self {
        let timer = TimerState::new();
        let (updates_tx, updates_rx) = watch::channel(timer.snapshot());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    timer,
                    tick: None,
                    generation: 0,
                    pointer: None,
                }),
                updates_tx,
                _updates_rx: updates_rx,
            }),
            scheduler,
            tick_interval,
        }
    }

    /// Countdown ticking once a second
    pub fn with_default_interval(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::new(scheduler, DEFAULT_TICK_INTERVAL)
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock().timer.snapshot()
    }

    pub fn status(&self) -> TimerStatus {
        self.shared.lock().timer.status()
    }

    pub fn formatted_time(&self) -> String {
        self.shared.lock().timer.formatted_time()
    }

    /// Whether a tick is currently scheduled
    pub fn has_active_tick(&self) -> bool {
        self.shared.lock().tick.is_some()
    }

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.updates_tx.subscribe()
    }

    /// Apply one transition under the lock and publish the result
    fn update<F>(&self, updater: F) -> Result<TimerSnapshot>
    where
        F: FnOnce(&Self, &mut Inner) -> Result<()>,
    {
        let mut inner = self.shared.lock();
        updater(self, &mut *inner)?;
        let snapshot = inner.timer.snapshot();
        drop(inner);

        self.shared.publish(&snapshot);
        Ok(snapshot)
    }

    fn schedule_tick(&self, inner: &mut Inner) {
        inner.cancel_tick();
        let generation = inner.generation;
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let handle = self.scheduler.schedule_repeating(
            self.tick_interval,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.on_tick(generation);
                }
            }),
        );
        inner.tick = Some(handle);
    }

    /// Start a drag at `initial_angle`, halting any running countdown
    pub fn begin_adjust(&self, initial_angle: f32) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            inner.timer.begin_adjust(initial_angle)?;
            inner.cancel_tick();
            inner.pointer = None;
            Ok(())
        })
    }

    /// Rotate the dragged pointer by `delta_angle` degrees
    pub fn adjust(&self, delta_angle: f32) -> Result<TimerSnapshot> {
        self.update(|_, inner| inner.timer.adjust(delta_angle).map(|_| ()))
    }

    pub fn end_adjust(&self) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            let status = inner.timer.end_adjust()?;
            inner.pointer = None;
            info!("Duration set to {}, {}", inner.timer.formatted_time(), status);
            Ok(())
        })
    }

    /// Start a drag at a pointer position relative to the dial center
    pub fn drag_start(&self, position: Offset) -> Result<TimerSnapshot> {
        if !position.is_finite() {
            return Err(TimerError::InvalidInput(format!(
                "pointer position must be finite, got ({}, {})",
                position.x, position.y
            )));
        }
        self.update(|_, inner| {
            let (tracker, angle) = PointerTracker::begin(position);
            inner.timer.begin_adjust(angle)?;
            inner.cancel_tick();
            inner.pointer = Some(tracker);
            Ok(())
        })
    }

    /// Move the dragged pointer by `delta`
    pub fn drag_move(&self, delta: Offset) -> Result<TimerSnapshot> {
        if !delta.is_finite() {
            return Err(TimerError::InvalidInput(format!(
                "pointer delta must be finite, got ({}, {})",
                delta.x, delta.y
            )));
        }
        self.update(|_, inner| {
            let status = inner.timer.status();
            let tracker = inner
                .pointer
                .as_mut()
                .ok_or(TimerError::InvalidStateTransition {
                    operation: "drag move",
                    status,
                })?;
            let delta_angle = tracker.move_by(delta);
            inner.timer.adjust(delta_angle).map(|_| ())
        })
    }

    pub fn drag_end(&self) -> Result<TimerSnapshot> {
        self.end_adjust()
    }

    /// Start counting down; a no-op when already running or at zero
    pub fn start(&self) -> Result<TimerSnapshot> {
        self.update(|this, inner| {
            if inner.timer.start()? {
                info!("Countdown started at {}", inner.timer.formatted_time());
                this.schedule_tick(inner);
            }
            Ok(())
        })
    }

    pub fn pause(&self) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            inner.timer.pause()?;
            inner.cancel_tick();
            info!("Countdown paused at {}", inner.timer.formatted_time());
            Ok(())
        })
    }

    pub fn resume(&self) -> Result<TimerSnapshot> {
        self.update(|this, inner| {
            if inner.timer.resume()? {
                info!("Countdown resumed at {}", inner.timer.formatted_time());
                this.schedule_tick(inner);
            }
            Ok(())
        })
    }

    /// Pause when running, start otherwise
    pub fn toggle(&self) -> Result<TimerSnapshot> {
        self.update(|this, inner| {
            match inner.timer.toggle()? {
                Toggle::Started => {
                    info!("Countdown started at {}", inner.timer.formatted_time());
                    this.schedule_tick(inner);
                }
                Toggle::Paused => {
                    inner.cancel_tick();
                    info!("Countdown paused at {}", inner.timer.formatted_time());
                }
                Toggle::Unchanged => debug!("Toggle ignored, nothing on the clock"),
            }
            Ok(())
        })
    }

    pub fn set_duration(&self, seconds: i64) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            inner.timer.set_duration(seconds)?;
            info!("Duration set to {}", inner.timer.formatted_time());
            Ok(())
        })
    }

    pub fn set_duration_hms(&self, hours: i64, minutes: i64, seconds: i64) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            inner.timer.set_duration_hms(hours, minutes, seconds)?;
            info!("Duration set to {}", inner.timer.formatted_time());
            Ok(())
        })
    }

    /// Cancel any tick and clear the clock
    pub fn reset(&self) -> Result<TimerSnapshot> {
        self.update(|_, inner| {
            inner.timer.reset()?;
            inner.cancel_tick();
            info!("Countdown reset");
            Ok(())
        })
    }
}

//! Countdown state machine
//!
//! `TimerState` is plain data: it knows nothing about scheduling. Whoever owns
//! it is responsible for running `tick` once a second while the status is
//! `Running` and for dropping that tick when any other status is entered.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    dial::{
        angle_for_seconds, dial_reading, normalize_degrees, seam_crossings,
        MAX_DRAG_SAMPLE_DEGREES, SECONDS_PER_REVOLUTION,
    },
    error::{Result, TimerError},
};

/// Largest hour value accepted by the picker
pub const MAX_PICKER_HOURS: i64 = 23;

/// Where the countdown is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Dragging,
    Running,
    Paused,
    Expired,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Dragging => "dragging",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// Result of a `toggle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The countdown is now running and needs a tick
    Started,
    /// The countdown was running and is now paused
    Paused,
    /// Nothing to count down; no tick needed
    Unchanged,
}

/// Result of a single `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue(u64),
    Expired,
}

/// Everything a rendering surface needs to draw the dial and readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub total_seconds: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub status: TimerStatus,
    pub formatted: String,
    pub pointer_angle: Option<f32>,
    pub arc_sweep_degrees: f32,
}

/// Format seconds as zero-padded `MM:SS`; minutes are not capped at 59
pub fn format_time(total_seconds: u64) -> String {
    format!(
        "{:02}:{:02}",
        total_seconds / SECONDS_PER_REVOLUTION,
        total_seconds % SECONDS_PER_REVOLUTION
    )
}

/// Countdown state for one tick wheel
#[derive(Debug, Clone)]
pub struct TimerState {
    total_seconds: u64,
    status: TimerStatus,
    pointer_angle: Option<f32>,
    /// Pointer angle when the current drag began
    drag_origin: f64,
    accumulated_angle: f64,
    /// Whole minutes on the clock when the current drag began
    drag_base_minutes: u64,
    /// Net seam crossings since the current drag began
    revolutions: i64,
    /// Duration the current countdown started from, for the arc sweep
    initial_seconds: u64,
    /// Status to fall back to when the current drag ends
    resume_to: TimerStatus,
}

impl TimerState {
    /// Create an idle timer with nothing on the clock
    pub fn new() -> Self {
        Self {
            total_seconds: 0,
            status: TimerStatus::Idle,
            pointer_angle: None,
            drag_origin: 0.0,
            accumulated_angle: 0.0,
            drag_base_minutes: 0,
            revolutions: 0,
            initial_seconds: 0,
            resume_to: TimerStatus::Idle,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Whole minutes on the clock
    pub fn minutes(&self) -> u64 {
        self.total_seconds / SECONDS_PER_REVOLUTION
    }

    /// Seconds past the whole minute, i.e. the position on the dial
    pub fn seconds(&self) -> u64 {
        self.total_seconds % SECONDS_PER_REVOLUTION
    }

    pub fn pointer_angle(&self) -> Option<f32> {
        self.pointer_angle
    }

    /// Signed angle travelled since the current drag began
    pub fn accumulated_angle(&self) -> f32 {
        self.accumulated_angle as f32
    }

    /// Enter `Dragging` with the pointer at `initial_angle`.
    ///
    /// A running countdown is halted; the caller must drop its tick.
    pub fn begin_adjust(&mut self, initial_angle: f32) -> Result<()> {
        if !initial_angle.is_finite() {
            return Err(TimerError::InvalidInput(format!(
                "drag start angle must be finite, got {}",
                initial_angle
            )));
        }

        self.resume_to = match self.status {
            TimerStatus::Running | TimerStatus::Paused => TimerStatus::Paused,
            TimerStatus::Dragging => self.resume_to,
            TimerStatus::Idle | TimerStatus::Expired => TimerStatus::Idle,
        };
        let origin = normalize_degrees(initial_angle);
        self.status = TimerStatus::Dragging;
        self.pointer_angle = Some(origin);
        self.drag_origin = f64::from(origin);
        self.accumulated_angle = 0.0;
        self.drag_base_minutes = self.minutes();
        self.revolutions = 0;
        debug!("Drag started at {:.1} degrees", initial_angle);
        Ok(())
    }

    /// Rotate the pointer by `delta_angle` and recompute the duration.
    ///
    /// The duration depends only on where the drag started and the total
    /// angle travelled, not on how the movement was split into samples.
    /// Returns the new total in seconds.
    pub fn adjust(&mut self, delta_angle: f32) -> Result<u64> {
        if self.status != TimerStatus::Dragging {
            return Err(TimerError::transition("adjust", self.status));
        }
        if !delta_angle.is_finite() {
            return Err(TimerError::InvalidInput(format!(
                "drag delta must be finite, got {}",
                delta_angle
            )));
        }

        if delta_angle.abs() > MAX_DRAG_SAMPLE_DEGREES {
            return Err(TimerError::InvalidInput(format!(
                "drag delta must be within ±{} degrees, got {}",
                MAX_DRAG_SAMPLE_DEGREES, delta_angle
            )));
        }

        let from = self.drag_origin + self.accumulated_angle;
        self.accumulated_angle += f64::from(delta_angle);
        let to = self.drag_origin + self.accumulated_angle;
        self.revolutions += seam_crossings(from, to);

        // Backward past zero minutes stays at zero
        let minutes = self.drag_base_minutes.saturating_add_signed(self.revolutions);
        let (pointer, seconds) = dial_reading(to);
        self.total_seconds = minutes * SECONDS_PER_REVOLUTION + seconds;
        self.pointer_angle = Some(pointer);

        debug!(
            "Drag moved {:.1} -> {:.1} degrees, total {}s",
            from, to, self.total_seconds
        );
        Ok(self.total_seconds)
    }

    /// Leave `Dragging`, keeping the duration the drag produced.
    pub fn end_adjust(&mut self) -> Result<TimerStatus> {
        if self.status != TimerStatus::Dragging {
            return Err(TimerError::transition("end adjust", self.status));
        }

        self.status = if self.resume_to == TimerStatus::Paused && self.total_seconds > 0 {
            TimerStatus::Paused
        } else {
            TimerStatus::Idle
        };
        self.initial_seconds = self.total_seconds;
        self.resume_to = TimerStatus::Idle;
        debug!("Drag ended at {}s, now {}", self.total_seconds, self.status);
        Ok(self.status)
    }

    /// Enter `Running` if there is time on the clock.
    ///
    /// Returns `true` when the caller must schedule a tick.
    pub fn start(&mut self) -> Result<bool> {
        match self.status {
            TimerStatus::Dragging => Err(TimerError::transition("start", self.status)),
            TimerStatus::Running => Ok(false),
            _ if self.total_seconds == 0 => Ok(false),
            status => {
                if status != TimerStatus::Paused {
                    self.initial_seconds = self.total_seconds;
                }
                self.status = TimerStatus::Running;
                self.pointer_angle = Some(angle_for_seconds(self.total_seconds));
                Ok(true)
            }
        }
    }

    /// Halt a running countdown, keeping the remaining time
    pub fn pause(&mut self) -> Result<()> {
        if self.status != TimerStatus::Running {
            return Err(TimerError::transition("pause", self.status));
        }
        self.status = TimerStatus::Paused;
        Ok(())
    }

    /// Continue a paused countdown
    pub fn resume(&mut self) -> Result<bool> {
        if self.status != TimerStatus::Paused {
            return Err(TimerError::transition("resume", self.status));
        }
        self.start()
    }

    /// Pause when running, start otherwise
    pub fn toggle(&mut self) -> Result<Toggle> {
        if self.is_running() {
            self.pause()?;
            return Ok(Toggle::Paused);
        }
        if self.start()? {
            Ok(Toggle::Started)
        } else {
            Ok(Toggle::Unchanged)
        }
    }

    /// Count down one second
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.status != TimerStatus::Running {
            return Err(TimerError::transition("tick", self.status));
        }

        self.total_seconds = self.total_seconds.saturating_sub(1);
        if self.total_seconds == 0 {
            self.status = TimerStatus::Expired;
            self.pointer_angle = None;
            return Ok(TickOutcome::Expired);
        }

        self.pointer_angle = Some(angle_for_seconds(self.total_seconds));
        Ok(TickOutcome::Continue(self.total_seconds))
    }

    /// Load a duration, e.g. from a picker. Negative values are rejected.
    pub fn set_duration(&mut self, seconds: i64) -> Result<()> {
        if matches!(self.status, TimerStatus::Running | TimerStatus::Dragging) {
            return Err(TimerError::transition("set duration", self.status));
        }
        let seconds = u64::try_from(seconds).map_err(|_| {
            TimerError::InvalidInput(format!("duration must not be negative, got {}", seconds))
        })?;

        self.total_seconds = seconds;
        self.initial_seconds = seconds;
        self.status = TimerStatus::Idle;
        self.pointer_angle = (seconds > 0).then(|| angle_for_seconds(seconds));
        Ok(())
    }

    /// Load a duration from hour/minute/second picker columns
    pub fn set_duration_hms(&mut self, hours: i64, minutes: i64, seconds: i64) -> Result<()> {
        if !(0..=MAX_PICKER_HOURS).contains(&hours) {
            return Err(TimerError::InvalidInput(format!(
                "hours must be within 0..={}, got {}",
                MAX_PICKER_HOURS, hours
            )));
        }
        for (name, value) in [("minutes", minutes), ("seconds", seconds)] {
            if !(0..60).contains(&value) {
                return Err(TimerError::InvalidInput(format!(
                    "{} must be within 0..=59, got {}",
                    name, value
                )));
            }
        }
        self.set_duration(hours * 3600 + minutes * 60 + seconds)
    }

    /// Clear the clock and return to `Idle`
    pub fn reset(&mut self) -> Result<()> {
        if self.status == TimerStatus::Dragging {
            return Err(TimerError::transition("reset", self.status));
        }
        *self = Self::new();
        Ok(())
    }

    /// Zero-padded `MM:SS` readout
    pub fn formatted_time(&self) -> String {
        format_time(self.total_seconds)
    }

    /// Degrees of the dial still lit for the remaining fraction of the countdown
    pub fn arc_sweep_degrees(&self) -> f32 {
        if self.status == TimerStatus::Expired || self.initial_seconds == 0 {
            return 360.0;
        }
        let remaining = self.total_seconds.min(self.initial_seconds) as f32;
        360.0 * remaining / self.initial_seconds as f32
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            total_seconds: self.total_seconds,
            minutes: self.minutes(),
            seconds: self.seconds(),
            status: self.status,
            formatted: self.formatted_time(),
            pointer_angle: self.pointer_angle,
            arc_sweep_degrees: self.arc_sweep_degrees(),
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(seconds: i64) -> TimerState {
        let mut timer = TimerState::new();
        timer.set_duration(seconds).unwrap();
        assert!(timer.start().unwrap());
        timer
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(3599), "59:59");
        assert_eq!(format_time(6000), "100:00");
        for n in [1u64, 61, 599, 601, 86_399] {
            assert_eq!(format_time(n), format!("{:02}:{:02}", n / 60, n % 60));
        }
    }

    #[test]
    fn test_new_timer_is_idle() {
        let timer = TimerState::new();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.total_seconds(), 0);
        assert_eq!(timer.formatted_time(), "00:00");
        assert_eq!(timer.pointer_angle(), None);
    }

    #[test]
    fn test_countdown_to_expiry() {
        let mut timer = running(3);
        assert_eq!(timer.tick().unwrap(), TickOutcome::Continue(2));
        assert_eq!(timer.tick().unwrap(), TickOutcome::Continue(1));
        assert_eq!(timer.tick().unwrap(), TickOutcome::Expired);
        assert_eq!(timer.total_seconds(), 0);
        assert_eq!(timer.status(), TimerStatus::Expired);
        assert_eq!(timer.pointer_angle(), None);

        // No further ticks once expired
        assert!(matches!(
            timer.tick(),
            Err(TimerError::InvalidStateTransition { operation: "tick", .. })
        ));
        assert_eq!(timer.total_seconds(), 0);
    }

    #[test]
    fn test_tick_updates_display_angle() {
        let mut timer = running(62);
        timer.tick().unwrap();
        assert_eq!(timer.pointer_angle(), Some(angle_for_seconds(1)));
        assert_eq!(timer.formatted_time(), "01:01");
    }

    #[test]
    fn test_toggle_pauses_and_resumes() {
        let mut timer = TimerState::new();
        timer.set_duration(10).unwrap();
        assert_eq!(timer.toggle().unwrap(), Toggle::Started);
        timer.tick().unwrap();
        assert_eq!(timer.toggle().unwrap(), Toggle::Paused);
        assert_eq!(timer.status(), TimerStatus::Paused);
        assert!(timer.tick().is_err());
        assert_eq!(timer.total_seconds(), 9);

        assert_eq!(timer.toggle().unwrap(), Toggle::Started);
        assert_eq!(timer.status(), TimerStatus::Running);
    }

    #[test]
    fn test_start_with_nothing_on_clock_is_noop() {
        let mut timer = TimerState::new();
        assert_eq!(timer.toggle().unwrap(), Toggle::Unchanged);
        assert_eq!(timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_end_adjust_without_begin() {
        let mut timer = TimerState::new();
        timer.set_duration(42).unwrap();
        let err = timer.end_adjust().unwrap_err();
        assert_eq!(
            err,
            TimerError::InvalidStateTransition {
                operation: "end adjust",
                status: TimerStatus::Idle
            }
        );
        assert_eq!(timer.total_seconds(), 42);
        assert_eq!(timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_adjust_requires_drag() {
        let mut timer = TimerState::new();
        assert!(matches!(
            timer.adjust(5.0),
            Err(TimerError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_seam_crossing_adds_one_minute_for_any_step() {
        for step in [0.25f32, 0.5, 1.0, 2.0] {
            let mut timer = TimerState::new();
            timer.begin_adjust(179.0).unwrap();
            let steps = (2.0 / step) as usize;
            for _ in 0..steps {
                timer.adjust(step).unwrap();
            }
            assert_eq!(timer.minutes(), 1, "step {}", step);
            assert_eq!(timer.total_seconds(), 60, "step {}", step);
            assert!((timer.pointer_angle().unwrap() + 179.0).abs() < 1e-3);
            assert!((timer.accumulated_angle() - 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_multiple_revolutions() {
        let mut timer = TimerState::new();
        timer.begin_adjust(-170.0).unwrap();
        // Three full turns plus a quarter, in 10 degree steps
        for _ in 0..(3 * 36 + 9) {
            timer.adjust(10.0).unwrap();
        }
        assert_eq!(timer.minutes(), 3);
        assert_eq!(timer.seconds(), crate::dial::seconds_from_angle(-80.0));
        assert!((timer.accumulated_angle() - 1170.0).abs() < 1e-2);
    }

    #[test]
    fn test_backward_crossing_never_goes_negative() {
        let mut timer = TimerState::new();
        timer.begin_adjust(-179.0).unwrap();
        timer.adjust(-2.0).unwrap();
        assert_eq!(timer.minutes(), 0);
        assert_eq!(timer.total_seconds(), 59);

        // Coming back undoes the crossing instead of adding a minute
        timer.adjust(2.0).unwrap();
        assert_eq!(timer.total_seconds(), 0);
        timer.adjust(-2.0).unwrap();
        assert_eq!(timer.total_seconds(), 59);
    }

    #[test]
    fn test_large_sample_from_band_edge_crosses_seam() {
        let mut timer = TimerState::new();
        timer.begin_adjust(90.0).unwrap();
        timer.adjust(91.0).unwrap();
        assert_eq!(timer.pointer_angle(), Some(-179.0));
        assert_eq!(timer.minutes(), 1);
        assert_eq!(timer.total_seconds(), 60);
    }

    fn drag_from(start: f32, samples: &[f32]) -> TimerState {
        let mut timer = TimerState::new();
        timer.begin_adjust(start).unwrap();
        for delta in samples {
            timer.adjust(*delta).unwrap();
        }
        timer
    }

    #[test]
    fn test_duration_ignores_sampling() {
        let fine = drag_from(170.0, &[10.0; 11]);
        let coarse = drag_from(170.0, &[100.0, 10.0]);
        let single = drag_from(170.0, &[110.0]);
        for timer in [&fine, &coarse, &single] {
            assert_eq!(timer.minutes(), 1);
            assert_eq!(timer.total_seconds(), 76);
            assert_eq!(timer.pointer_angle(), Some(-80.0));
        }

        let stepped = drag_from(179.0, &[2.0; 181]);
        let jump = drag_from(179.0, &[362.0]);
        assert_eq!(jump.total_seconds(), 120);
        assert_eq!(stepped.total_seconds(), jump.total_seconds());
        assert_eq!(stepped.pointer_angle(), jump.pointer_angle());
    }

    #[test]
    fn test_oversized_drag_sample_is_rejected() {
        let mut timer = TimerState::new();
        timer.begin_adjust(0.0).unwrap();
        assert!(matches!(
            timer.adjust(MAX_DRAG_SAMPLE_DEGREES * 2.0),
            Err(TimerError::InvalidInput(_))
        ));
        assert_eq!(timer.total_seconds(), 0);
        assert_eq!(timer.accumulated_angle(), 0.0);
    }

    #[test]
    fn test_redrag_keeps_minutes_from_previous_drag() {
        let mut timer = drag_from(170.0, &[20.0]);
        timer.end_adjust().unwrap();
        assert_eq!(timer.minutes(), 1);

        timer.begin_adjust(170.0).unwrap();
        timer.adjust(20.0).unwrap();
        assert_eq!(timer.minutes(), 2);
    }

    #[test]
    fn test_drag_interrupting_countdown_pauses() {
        let mut timer = running(30);
        timer.tick().unwrap();
        timer.begin_adjust(0.0).unwrap();
        assert_eq!(timer.status(), TimerStatus::Dragging);
        assert!(timer.tick().is_err());
        assert!(timer.toggle().is_err());

        timer.adjust(6.0).unwrap();
        assert_eq!(timer.end_adjust().unwrap(), TimerStatus::Paused);
        assert_eq!(timer.total_seconds(), 31);
    }

    #[test]
    fn test_drag_from_idle_ends_idle() {
        let mut timer = TimerState::new();
        timer.begin_adjust(0.0).unwrap();
        timer.adjust(-30.0).unwrap();
        assert_eq!(timer.end_adjust().unwrap(), TimerStatus::Idle);
        assert_eq!(timer.total_seconds(), 25);
    }

    #[test]
    fn test_invalid_inputs() {
        let mut timer = TimerState::new();
        assert!(matches!(timer.set_duration(-1), Err(TimerError::InvalidInput(_))));
        assert!(matches!(timer.set_duration_hms(24, 0, 0), Err(TimerError::InvalidInput(_))));
        assert!(matches!(timer.set_duration_hms(0, 60, 0), Err(TimerError::InvalidInput(_))));
        assert!(matches!(timer.set_duration_hms(0, 0, -1), Err(TimerError::InvalidInput(_))));
        assert!(matches!(timer.begin_adjust(f32::NAN), Err(TimerError::InvalidInput(_))));
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.total_seconds(), 0);

        timer.set_duration_hms(1, 2, 3).unwrap();
        assert_eq!(timer.total_seconds(), 3723);
    }

    #[test]
    fn test_set_duration_rejected_while_running() {
        let mut timer = running(5);
        assert!(matches!(
            timer.set_duration(9),
            Err(TimerError::InvalidStateTransition { .. })
        ));
        assert_eq!(timer.total_seconds(), 5);
    }

    #[test]
    fn test_arc_sweep() {
        let mut timer = running(4);
        assert_eq!(timer.arc_sweep_degrees(), 360.0);
        timer.tick().unwrap();
        assert_eq!(timer.arc_sweep_degrees(), 270.0);
        timer.tick().unwrap();
        timer.tick().unwrap();
        timer.tick().unwrap();
        assert_eq!(timer.status(), TimerStatus::Expired);
        assert_eq!(timer.arc_sweep_degrees(), 360.0);
    }

    #[test]
    fn test_reset() {
        let mut timer = running(5);
        timer.reset().unwrap();
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.total_seconds(), 0);

        timer.begin_adjust(0.0).unwrap();
        assert!(timer.reset().is_err());
    }

    #[test]
    fn test_snapshot_serializes_status_lowercase() {
        let mut timer = TimerState::new();
        timer.set_duration(125).unwrap();
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.formatted, "02:05");
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["total_seconds"], 125);
    }
}

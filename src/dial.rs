//! Dial geometry: mapping pointer angles onto seconds
//!
//! One revolution of the dial is sixty seconds. Angles are in degrees and
//! normalized into (-180, 180], with -180/180 being the seam where a full
//! revolution wraps into the next minute.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Seconds covered by one revolution of the dial
pub const SECONDS_PER_REVOLUTION: u64 = 60;

/// Degrees swept by one second on the dial
pub const DEGREES_PER_SECOND: f32 = 360.0 / SECONDS_PER_REVOLUTION as f32;

/// Half-width of the hysteresis band used to detect seam crossings
pub const WRAP_BAND_DEGREES: f32 = 90.0;

/// Largest rotation a single drag sample may carry (one hundred turns)
pub const MAX_DRAG_SAMPLE_DEGREES: f32 = 36_000.0;

/// Sub-step used when walking a rotation for seam crossings.
/// Must stay below the band width so every crossing lands outside the band.
const CROSSING_STEP_DEGREES: f64 = 45.0;

/// Map any finite angle into (-180, 180]
pub fn normalize_degrees(angle: f32) -> f32 {
    normalize_wide(f64::from(angle)) as f32
}

fn normalize_wide(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn seconds_at(angle: f64) -> u64 {
    let from_seam = normalize_wide(angle) + 180.0;
    let seconds = (from_seam / f64::from(DEGREES_PER_SECOND)).floor() as u64;
    seconds.min(SECONDS_PER_REVOLUTION - 1)
}

/// Seconds (0..=59) shown by the dial when the pointer sits at `angle`.
///
/// The seam itself (exactly 180) reads as 59 so a drag that stops on the seam
/// never drops a minute before the crossing has been registered.
pub fn seconds_from_angle(angle: f32) -> u64 {
    seconds_at(f64::from(angle))
}

/// Pointer angle and dial seconds for an unwrapped angle
pub fn dial_reading(unwrapped: f64) -> (f32, u64) {
    (normalize_wide(unwrapped) as f32, seconds_at(unwrapped))
}

/// Net seam crossings when rotating from `from` to `to` (unwrapped degrees).
///
/// The rotation is walked in sub-steps narrower than the band, each one
/// classified by `Crossing::between`, so the count only depends on the two
/// end points and never on how the rotation was sampled.
pub fn seam_crossings(from: f64, to: f64) -> i64 {
    let span = to - from;
    let steps = (span.abs() / CROSSING_STEP_DEGREES).ceil().max(1.0) as u64;

    let mut crossings = 0;
    let mut prev = normalize_wide(from);
    for i in 1..=steps {
        let point = if i == steps {
            to
        } else {
            from + span * i as f64 / steps as f64
        };
        let next = normalize_wide(point);
        match Crossing::between(prev as f32, next as f32) {
            Crossing::Forward => crossings += 1,
            Crossing::Backward => crossings -= 1,
            Crossing::None => {}
        }
        prev = next;
    }
    crossings
}

/// Pointer angle that displays `seconds % 60` on the dial
pub fn angle_for_seconds(seconds: u64) -> f32 {
    let on_dial = (seconds % SECONDS_PER_REVOLUTION) as f32;
    normalize_degrees(on_dial * DEGREES_PER_SECOND - 180.0)
}

/// Signed shortest rotation from `from` to `to`
pub fn shortest_delta(from: f32, to: f32) -> f32 {
    normalize_degrees(to - from)
}

/// Direction in which a pointer move crossed the dial seam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Clockwise past 180 into the negative half: one more minute
    Forward,
    /// Counter-clockwise past -180 into the positive half: one minute less
    Backward,
    None,
}

impl Crossing {
    /// Classify the move from `prev` to `next`.
    ///
    /// Both ends must lie strictly outside the ±90° band on opposite sides.
    /// A pointer sitting exactly on ±90° is inside the band and never counts.
    pub fn between(prev: f32, next: f32) -> Self {
        if prev > WRAP_BAND_DEGREES && next < -WRAP_BAND_DEGREES {
            Crossing::Forward
        } else if prev < -WRAP_BAND_DEGREES && next > WRAP_BAND_DEGREES {
            Crossing::Backward
        } else {
            Crossing::None
        }
    }
}

/// Pointer position relative to the dial center
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Angle of this offset around the center, in degrees
    pub fn theta(&self) -> f32 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Turns raw pointer movement into the angle deltas the timer consumes.
#[derive(Debug, Clone, Copy)]
pub struct PointerTracker {
    position: Offset,
}

impl PointerTracker {
    /// Start tracking at `position`, returning its angle
    pub fn begin(position: Offset) -> (Self, f32) {
        (Self { position }, position.theta())
    }

    /// Move the tracked pointer by `delta`, returning the signed angle change
    pub fn move_by(&mut self, delta: Offset) -> f32 {
        let prev = self.position.theta();
        self.position = self.position + delta;
        shortest_delta(prev, self.position.theta())
    }

    pub fn position(&self) -> Offset {
        self.position
    }
}

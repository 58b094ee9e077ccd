//! Resumable motions that carry the head between phases.

use std::{f32::consts::PI, time::Duration};

use glam::Vec3;

/// Constant-speed straight-line motion that started at a fixed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct LinearMotion {
    pub(crate) from: Vec3,
    pub(crate) to: Vec3,
    pub(crate) started: Duration,
    pub(crate) speed: f32,
}

/// Where a motion places the head on a given tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Progress {
    pub(crate) position: Vec3,
    pub(crate) arrived: bool,
}

impl LinearMotion {
    pub(crate) fn new(from: Vec3, to: Vec3, started: Duration, speed: f32) -> Self {
        Self {
            from,
            to,
            started,
            speed,
        }
    }

    /// Position reached at `now`. Arrival snaps exactly onto the destination.
    pub(crate) fn progress(&self, now: Duration, tolerance: f32) -> Progress {
        let length = self.from.distance(self.to);
        let elapsed = now.saturating_sub(self.started).as_secs_f32();
        let fraction = if length <= f32::EPSILON {
            1.0
        } else {
            (elapsed * self.speed / length).min(1.0)
        };

        let position = self.from.lerp(self.to, fraction);
        if fraction >= 1.0 || position.distance(self.to) <= tolerance {
            return Progress {
                position: self.to,
                arrived: true,
            };
        }

        Progress {
            position,
            arrived: false,
        }
    }
}

/// Sine-shaped ascent from the staging point to the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ArcMotion {
    pub(crate) from: Vec3,
    pub(crate) to: Vec3,
    pub(crate) elapsed: Duration,
    pub(crate) duration: Duration,
}

impl ArcMotion {
    /// Creates an arc whose duration is the straight-line distance over `speed`.
    pub(crate) fn new(from: Vec3, to: Vec3, speed: f32) -> Self {
        let seconds = from.distance(to) / speed;
        let duration = Duration::try_from_secs_f32(seconds).unwrap_or(Duration::ZERO);
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Accumulates `dt` and returns the position along the arc lifted by up to `height`.
    pub(crate) fn advance(&mut self, dt: Duration, height: f32) -> Progress {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            return Progress {
                position: self.to,
                arrived: true,
            };
        }

        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let mut position = self.from.lerp(self.to, t);
        position.y += (t * PI).sin() * height;
        Progress {
            position,
            arrived: false,
        }
    }
}

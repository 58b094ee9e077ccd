//! Smoothed pursuit of lagged head samples.

use std::time::Duration;

use glam::{Mat3, Quat, Vec3};
use sandworm_core::{CreatureConfig, Pose, Segment};
use sandworm_system_terrain::TerrainSampler;

use crate::PositionHistory;

/// Tunables that shape how segments trail the head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowSettings {
    /// Exponential smoothing rate per second.
    pub smoothing_rate: f32,
    /// Height above a segment's target from which the ground probe starts.
    pub probe_height: f32,
    /// Length of the ground probe.
    pub probe_distance: f32,
    /// Height kept between the ground and a segment's target.
    pub height_offset: f32,
}

impl From<&CreatureConfig> for FollowSettings {
    fn from(config: &CreatureConfig) -> Self {
        Self {
            smoothing_rate: config.segment_smoothing_rate,
            probe_height: config.segment_probe_height,
            probe_distance: config.segment_probe_distance,
            height_offset: config.segment_height_offset,
        }
    }
}

/// Moves every live segment toward the head position it should be replaying.
#[derive(Clone, Copy, Debug)]
pub struct SegmentFollower {
    settings: FollowSettings,
}

impl SegmentFollower {
    /// Creates a follower with the provided settings.
    #[must_use]
    pub const fn new(settings: FollowSettings) -> Self {
        Self { settings }
    }

    /// Advances all live segments by one tick.
    ///
    /// Segment `i` reads the head trajectory through reader `i` of `history`
    /// at its own follow delay. Destroyed segments neither move nor serve as
    /// the orientation anchor for the segment behind them.
    pub fn advance(
        &self,
        head: &Pose,
        segments: &mut [Segment],
        history: &mut PositionHistory,
        sampler: &TerrainSampler<'_>,
        now: Duration,
        dt: Duration,
    ) {
        let mut anchor = head.position;
        for (index, segment) in segments.iter_mut().enumerate() {
            if !segment.is_live() {
                continue;
            }

            let mut target =
                history.sample_at_lag(index, now, segment.follow_delay, segment.target_position);
            if let Some(ground) = sampler.probe(
                target,
                self.settings.probe_height,
                self.settings.probe_distance,
            ) {
                target.y = ground.height + self.settings.height_offset;
            }
            segment.target_position = target;

            self.step(segment, target, anchor, dt);
            anchor = segment.pose.position;
        }
    }

    /// Moves a single segment toward `target` and turns it to face away from `anchor`.
    pub fn step(&self, segment: &mut Segment, target: Vec3, anchor: Vec3, dt: Duration) {
        let alpha = smoothing_factor(self.settings.smoothing_rate, dt);
        segment.pose.position = segment.pose.position.lerp(target, alpha);

        if let Some(facing) = look_rotation(segment.pose.position - anchor) {
            segment.pose.orientation = segment.pose.orientation.slerp(facing, alpha).normalize();
        }
    }
}

/// Fraction of the remaining distance covered in `dt` by exponential smoothing.
///
/// The result is independent of how a span of time is split into ticks.
#[must_use]
pub fn smoothing_factor(rate: f32, dt: Duration) -> f32 {
    1.0 - (-rate * dt.as_secs_f32()).exp()
}

/// Rotation whose local +Z axis points along `forward` with +Y kept up.
///
/// Returns `None` for a zero-length direction.
#[must_use]
pub fn look_rotation(forward: Vec3) -> Option<Quat> {
    let forward = forward.try_normalize()?;
    match Vec3::Y.cross(forward).try_normalize() {
        Some(right) => {
            let up = forward.cross(right);
            Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)))
        }
        None => Some(Quat::from_rotation_arc(Vec3::Z, forward)),
    }
}

//! Spawn-time tunables for segmented creatures.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Largest number of segments a creature may be spawned with.
///
/// Spacing enforcement checks every pair, so counts stay in the tens.
pub const MAX_SEGMENTS: u32 = 64;

/// Tunables supplied when a creature is spawned.
///
/// Every field falls back to its default when omitted from a serialized
/// configuration. Durations are written as floating-point seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    /// Number of segments trailing the head.
    pub segment_count: u32,
    /// Local mounting offsets of the eyes placed on every segment.
    pub eye_offsets: Vec<Vec3>,
    /// Hit points each eye starts with.
    pub eye_hit_points: f32,
    /// Distance between consecutive segments at spawn.
    pub segment_spacing: f32,
    /// Follow delay of the first segment; segment `i` lags by `(i + 1)` times this.
    #[serde(with = "seconds")]
    pub base_segment_delay: Duration,
    /// Exponential smoothing rate used when segments chase their targets.
    pub segment_smoothing_rate: f32,
    /// Height kept between a grounded segment and the terrain.
    pub segment_height_offset: f32,
    /// Height above a segment target from which the ground probe starts.
    pub segment_probe_height: f32,
    /// Maximum length of the segment ground probe.
    pub segment_probe_distance: f32,
    /// Minimum distance enforced between any two live segments.
    pub min_segment_distance: f32,
    /// Maximum number of head samples retained in the history log.
    pub history_capacity: usize,
    /// Head displacement required before a new history sample is recorded.
    pub motion_threshold: f32,
    /// Shallowest depth the creature rests at below the surface.
    pub min_burrow_depth: f32,
    /// Deepest staging depth used before an emerge.
    pub max_burrow_depth: f32,
    /// Speed of the arc toward the surface.
    pub emerge_speed: f32,
    /// Speed of underground travel and retreat.
    pub burrow_speed: f32,
    /// Time spent above ground after emerging.
    #[serde(with = "seconds")]
    pub surface_duration: Duration,
    /// Rest period after a completed retreat.
    #[serde(with = "seconds")]
    pub emerge_cooldown: Duration,
    /// Delay before retrying a refused or out-of-range attack.
    #[serde(with = "seconds")]
    pub retry_cooldown: Duration,
    /// Longest an emerge may run before the creature is forcibly reset.
    #[serde(with = "seconds")]
    pub failsafe_duration: Duration,
    /// How far ahead the target's motion is extrapolated.
    #[serde(with = "seconds")]
    pub prediction_horizon: Duration,
    /// Upper bound on the vertical emerge offset and the arc height.
    pub max_jump_height: f32,
    /// Closest distance at which the creature will attack.
    pub min_attack_distance: f32,
    /// Furthest distance at which the creature will attack.
    pub max_attack_distance: f32,
    /// Height above a candidate emerge site from which the ground probe starts.
    pub terrain_check_offset: f32,
    /// Maximum length of the long terrain probes.
    pub ground_check_distance: f32,
    /// Steepest slope, in degrees, accepted for an emerge site.
    pub max_terrain_angle_degrees: f32,
    /// Radius kept clear of obstacles around an emerge site.
    pub burrow_check_radius: f32,
    /// Clearance kept between the emerge arc and the terrain.
    pub arc_ground_clearance: f32,
    /// Distance at which linear travel counts as arrived.
    pub arrival_tolerance: f32,
}

impl CreatureConfig {
    /// Checks the configuration for values that would break the simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_count > MAX_SEGMENTS {
            return Err(ConfigError::TooManySegments {
                count: self.segment_count,
                limit: MAX_SEGMENTS,
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if self.base_segment_delay.is_zero() {
            return Err(ConfigError::ZeroSegmentDelay);
        }

        let positive = [
            ("eye_hit_points", self.eye_hit_points),
            ("segment_smoothing_rate", self.segment_smoothing_rate),
            ("emerge_speed", self.emerge_speed),
            ("burrow_speed", self.burrow_speed),
            ("ground_check_distance", self.ground_check_distance),
            ("segment_probe_distance", self.segment_probe_distance),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("segment_spacing", self.segment_spacing),
            ("min_segment_distance", self.min_segment_distance),
            ("motion_threshold", self.motion_threshold),
            ("min_burrow_depth", self.min_burrow_depth),
            ("max_jump_height", self.max_jump_height),
            ("min_attack_distance", self.min_attack_distance),
            ("max_attack_distance", self.max_attack_distance),
            ("burrow_check_radius", self.burrow_check_radius),
            ("arrival_tolerance", self.arrival_tolerance),
        ];
        for (field, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.min_attack_distance > self.max_attack_distance {
            return Err(ConfigError::AttackRangeInverted {
                min: self.min_attack_distance,
                max: self.max_attack_distance,
            });
        }
        if self.min_burrow_depth > self.max_burrow_depth {
            return Err(ConfigError::BurrowDepthInverted {
                min: self.min_burrow_depth,
                max: self.max_burrow_depth,
            });
        }

        Ok(())
    }

    /// Follow delay assigned to the segment at `index`.
    #[must_use]
    pub fn follow_delay_for(&self, index: u32) -> Duration {
        self.base_segment_delay.saturating_mul(index.saturating_add(1))
    }

    /// Maximum accepted slope expressed in radians.
    #[must_use]
    pub fn max_terrain_angle(&self) -> f32 {
        self.max_terrain_angle_degrees.to_radians()
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            segment_count: 6,
            eye_offsets: vec![Vec3::new(-0.45, 0.35, 0.2), Vec3::new(0.45, 0.35, 0.2)],
            eye_hit_points: 50.0,
            segment_spacing: 2.0,
            base_segment_delay: Duration::from_millis(100),
            segment_smoothing_rate: 5.0,
            segment_height_offset: 0.5,
            segment_probe_height: 2.0,
            segment_probe_distance: 3.0,
            min_segment_distance: 1.0,
            history_capacity: 100,
            motion_threshold: 0.1,
            min_burrow_depth: 5.0,
            max_burrow_depth: 15.0,
            emerge_speed: 15.0,
            burrow_speed: 8.0,
            surface_duration: Duration::from_secs(3),
            emerge_cooldown: Duration::from_secs(2),
            retry_cooldown: Duration::from_millis(500),
            failsafe_duration: Duration::from_secs(5),
            prediction_horizon: Duration::from_millis(750),
            max_jump_height: 10.0,
            min_attack_distance: 5.0,
            max_attack_distance: 30.0,
            terrain_check_offset: 2.0,
            ground_check_distance: 100.0,
            max_terrain_angle_degrees: 45.0,
            burrow_check_radius: 1.0,
            arc_ground_clearance: 0.5,
            arrival_tolerance: 0.1,
        }
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds)
            .map_err(|error| D::Error::custom(format!("invalid duration {seconds}: {error}")))
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure predictive targeting that picks the point a creature should attack.

use std::time::Duration;

use glam::Vec3;

/// Scale applied to the target's height above ground when lifting the aim point.
pub const EMERGE_HEIGHT_SCALE: f32 = 1.2;

/// Everything [`predict`] needs to know about the target and the attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictionInput {
    /// Current position of the target.
    pub target_position: Vec3,
    /// Current velocity of the target.
    pub target_velocity: Vec3,
    /// How far ahead the target's motion is extrapolated.
    pub prediction_horizon: Duration,
    /// Ground height below the target.
    pub ground_height: f32,
    /// Upper bound on the vertical lift added to the aim point.
    pub max_jump_height: f32,
    /// Furthest the aim point may lie from the attacker.
    pub max_attack_distance: f32,
    /// Current position of the attacker.
    pub creature_position: Vec3,
}

/// Estimates where the target will be, bounded by the attack envelope.
///
/// The target's position is extrapolated linearly over the horizon and lifted
/// by `min(1.2 * height_above_ground, max_jump_height)`. When the result lies
/// beyond `max_attack_distance` it is pulled back along the line from the
/// creature so that it sits exactly at that distance.
#[must_use]
pub fn predict(input: &PredictionInput) -> Vec3 {
    let horizon = input.prediction_horizon.as_secs_f32();
    let mut predicted = input.target_position + input.target_velocity * horizon;

    let height_above_ground = input.target_position.y - input.ground_height;
    predicted.y += (height_above_ground * EMERGE_HEIGHT_SCALE).min(input.max_jump_height);

    clamp_to_reach(input.creature_position, predicted, input.max_attack_distance)
}

/// Pulls `point` toward `origin` so that it is no further than `reach` away.
#[must_use]
pub fn clamp_to_reach(origin: Vec3, point: Vec3, reach: f32) -> Vec3 {
    let offset = point - origin;
    if offset.length() <= reach {
        return point;
    }

    match offset.try_normalize() {
        Some(direction) => origin + direction * reach,
        None => point,
    }
}

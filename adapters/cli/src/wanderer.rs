//! Seeded random walk standing in for the pursued player.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sandworm_core::TargetSnapshot;

use crate::scenario::TargetSpec;

/// Target that strolls across the terrain, turning at random and never
/// straying further than its leash from the world origin.
#[derive(Debug)]
pub(crate) struct Wanderer {
    rng: ChaCha8Rng,
    spec: TargetSpec,
    position: Vec3,
    heading: f32,
    until_turn: f32,
}

impl Wanderer {
    pub(crate) fn new(spec: TargetSpec, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let heading = rng.gen_range(0.0..TAU);
        Self {
            rng,
            position: spec.start,
            heading,
            until_turn: spec.turn_interval,
            spec,
        }
    }

    /// Walks for `dt` seconds over ground described by `height_at(x, z)`.
    pub(crate) fn step(&mut self, dt: f32, height_at: impl Fn(f32, f32) -> f32) -> TargetSnapshot {
        self.until_turn -= dt;
        if self.until_turn <= 0.0 {
            self.heading += self.rng.gen_range(-FRAC_PI_2..=FRAC_PI_2);
            self.until_turn += self.spec.turn_interval;
        }

        let horizontal = Vec3::new(self.position.x, 0.0, self.position.z);
        if horizontal.length() > self.spec.leash_radius {
            self.heading = (-horizontal.z).atan2(-horizontal.x);
        }

        let previous = self.position;
        let direction = Vec3::new(self.heading.cos(), 0.0, self.heading.sin());
        let mut next = previous + direction * self.spec.speed * dt;
        next.y = height_at(next.x, next.z) + self.spec.altitude;
        self.position = next;

        let velocity = if dt > 0.0 {
            (next - previous) / dt
        } else {
            Vec3::ZERO
        };
        TargetSnapshot {
            position: next,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TargetSpec {
        TargetSpec {
            start: Vec3::new(3.0, 0.0, 0.0),
            speed: 4.0,
            altitude: 1.0,
            leash_radius: 10.0,
            turn_interval: 0.5,
        }
    }

    #[test]
    fn same_seed_walks_the_same_path() {
        let mut first = Wanderer::new(spec(), 11);
        let mut second = Wanderer::new(spec(), 11);

        for _ in 0..500 {
            assert_eq!(first.step(0.05, |_, _| 0.0), second.step(0.05, |_, _| 0.0));
        }
    }

    #[test]
    fn leash_pulls_the_walker_home() {
        let mut wanderer = Wanderer::new(spec(), 3);

        for _ in 0..4_000 {
            let snapshot = wanderer.step(0.05, |_, _| 0.0);
            let horizontal = Vec3::new(snapshot.position.x, 0.0, snapshot.position.z);
            assert!(horizontal.length() <= 10.0 + 4.0 * 0.05 + 1e-3);
        }
    }

    #[test]
    fn walker_hovers_over_the_ground() {
        let mut wanderer = Wanderer::new(spec(), 5);
        let snapshot = wanderer.step(0.1, |x, _| x * 0.5);

        assert!((snapshot.position.y - (snapshot.position.x * 0.5 + 1.0)).abs() < 1e-5);
        let ground_speed = Vec3::new(snapshot.velocity.x, 0.0, snapshot.velocity.z).length();
        assert!((ground_speed - 4.0).abs() < 1e-3);
    }
}

//! Reference terrains for tests and headless drivers.

use std::fmt;

use glam::Vec3;
use sandworm_core::{GroundHit, TerrainQuery};

const NORMAL_SAMPLE_STEP: f32 = 0.05;

/// Solid sphere that blocks emerge sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    center: Vec3,
    radius: f32,
}

impl Obstacle {
    /// Creates an obstacle occupying the sphere at `center`.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    fn overlaps(&self, center: Vec3, radius: f32) -> bool {
        self.center.distance(center) < self.radius + radius
    }
}

/// Terrain with no ground anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGround;

impl TerrainQuery for NoGround {
    fn cast_down(&self, _origin: Vec3, _max_distance: f32) -> Option<GroundHit> {
        None
    }

    fn obstacle_within(&self, _center: Vec3, _radius: f32) -> bool {
        false
    }
}

/// Infinite horizontal plane.
#[derive(Clone, Debug, Default)]
pub struct FlatGround {
    height: f32,
    obstacles: Vec<Obstacle>,
}

impl FlatGround {
    /// Creates a plane at `height`.
    #[must_use]
    pub fn new(height: f32) -> Self {
        Self {
            height,
            obstacles: Vec::new(),
        }
    }

    /// Adds an obstacle resting on the plane.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }
}

impl TerrainQuery for FlatGround {
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        let drop = origin.y - self.height;
        if !(0.0..=max_distance).contains(&drop) {
            return None;
        }

        Some(GroundHit {
            point: Vec3::new(origin.x, self.height, origin.z),
            normal: Vec3::Y,
        })
    }

    fn obstacle_within(&self, center: Vec3, radius: f32) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.overlaps(center, radius))
    }
}

/// Terrain whose height is a function of the horizontal coordinates.
pub struct Heightfield<F> {
    height_at: F,
    obstacles: Vec<Obstacle>,
}

impl<F> Heightfield<F>
where
    F: Fn(f32, f32) -> f32,
{
    /// Creates a heightfield evaluating `height_at(x, z)`.
    #[must_use]
    pub fn new(height_at: F) -> Self {
        Self {
            height_at,
            obstacles: Vec::new(),
        }
    }

    /// Adds an obstacle to the field.
    #[must_use]
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Height of the surface at `(x, z)`.
    #[must_use]
    pub fn height(&self, x: f32, z: f32) -> f32 {
        (self.height_at)(x, z)
    }

    fn normal(&self, x: f32, z: f32) -> Vec3 {
        let step = NORMAL_SAMPLE_STEP;
        let slope_x = (self.height(x + step, z) - self.height(x - step, z)) / (2.0 * step);
        let slope_z = (self.height(x, z + step) - self.height(x, z - step)) / (2.0 * step);
        Vec3::new(-slope_x, 1.0, -slope_z).normalize_or_zero()
    }
}

impl<F> fmt::Debug for Heightfield<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heightfield")
            .field("obstacles", &self.obstacles)
            .finish_non_exhaustive()
    }
}

impl<F> TerrainQuery for Heightfield<F>
where
    F: Fn(f32, f32) -> f32,
{
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        let height = self.height(origin.x, origin.z);
        let drop = origin.y - height;
        if !(0.0..=max_distance).contains(&drop) {
            return None;
        }

        Some(GroundHit {
            point: Vec3::new(origin.x, height, origin.z),
            normal: self.normal(origin.x, origin.z),
        })
    }

    fn obstacle_within(&self, center: Vec3, radius: f32) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.overlaps(center, radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_ground_ignores_origins_below_surface() {
        let ground = FlatGround::new(0.0);
        assert!(ground.cast_down(Vec3::new(0.0, -1.0, 0.0), 10.0).is_none());
        assert!(ground.cast_down(Vec3::new(0.0, 1.0, 0.0), 10.0).is_some());
    }

    #[test]
    fn heightfield_normal_tilts_against_slope() {
        let field = Heightfield::new(|x, _z| x);
        let hit = field
            .cast_down(Vec3::new(0.0, 10.0, 0.0), 20.0)
            .expect("ground below origin");
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        assert!((hit.normal - expected).length() < 1e-3);
    }

    #[test]
    fn obstacles_overlap_by_combined_radius() {
        let ground = FlatGround::new(0.0).with_obstacle(Obstacle::new(Vec3::X * 3.0, 1.0));
        assert!(ground.obstacle_within(Vec3::ZERO, 2.5));
        assert!(!ground.obstacle_within(Vec3::ZERO, 1.5));
    }
}

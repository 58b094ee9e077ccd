#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Side-effect-free terrain sampling on top of a host-supplied terrain query.

mod ground;

use glam::Vec3;
use sandworm_core::{CreatureConfig, Fault, SiteRejection, TerrainQuery};

pub use ground::{FlatGround, Heightfield, NoGround, Obstacle};

/// Ground height and surface normal found below a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSample {
    /// Height of the ground contact.
    pub height: f32,
    /// Unit surface normal at the contact.
    pub normal: Vec3,
}

/// Probe dimensions and acceptance limits used by [`TerrainSampler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerSettings {
    /// Height above the queried point from which the default probe starts.
    pub probe_offset: f32,
    /// Length of the default probe.
    pub max_distance: f32,
    /// Steepest accepted slope in radians.
    pub max_slope: f32,
    /// Radius kept clear of obstacles around an emerge site.
    pub clearance_radius: f32,
}

impl From<&CreatureConfig> for SamplerSettings {
    fn from(config: &CreatureConfig) -> Self {
        Self {
            probe_offset: config.terrain_check_offset,
            max_distance: config.ground_check_distance,
            max_slope: config.max_terrain_angle(),
            clearance_radius: config.burrow_check_radius,
        }
    }
}

/// Read-only adapter that turns raw ray casts into terrain samples.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSampler<'a> {
    terrain: &'a dyn TerrainQuery,
    settings: SamplerSettings,
}

impl<'a> TerrainSampler<'a> {
    /// Creates a sampler over `terrain` using the provided settings.
    #[must_use]
    pub fn new(terrain: &'a dyn TerrainQuery, settings: SamplerSettings) -> Self {
        Self { terrain, settings }
    }

    /// Settings the sampler was created with.
    #[must_use]
    pub const fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Samples the ground below `point` with the default probe.
    #[must_use]
    pub fn sample(&self, point: Vec3) -> Option<TerrainSample> {
        self.probe(point, self.settings.probe_offset, self.settings.max_distance)
    }

    /// Samples the ground with a probe starting `offset` above `point` and
    /// reaching at most `max_distance` downward.
    #[must_use]
    pub fn probe(&self, point: Vec3, offset: f32, max_distance: f32) -> Option<TerrainSample> {
        let origin = point + Vec3::Y * offset;
        self.terrain
            .cast_down(origin, max_distance)
            .map(|hit| TerrainSample {
                height: hit.point.y,
                normal: hit.normal,
            })
    }

    /// Like [`TerrainSampler::probe`], but reports a miss as [`Fault::TerrainNotFound`].
    pub fn ground_at(
        &self,
        point: Vec3,
        offset: f32,
        max_distance: f32,
    ) -> Result<TerrainSample, Fault> {
        self.probe(point, offset, max_distance)
            .ok_or(Fault::TerrainNotFound {
                point: point + Vec3::Y * offset,
                max_distance,
            })
    }

    /// Height of the ground around `point`, probing from well above it.
    ///
    /// Falls back to the point's own height when nothing is found.
    #[must_use]
    pub fn ground_height(&self, point: Vec3) -> f32 {
        let reach = self.settings.max_distance;
        self.probe(point, reach, reach * 2.0)
            .map_or(point.y, |sample| sample.height)
    }

    /// Reports whether `normal` leans no further than the configured limit.
    #[must_use]
    pub fn is_slope_acceptable(&self, normal: Vec3) -> bool {
        is_slope_acceptable(normal, self.settings.max_slope)
    }

    /// Validates `point` as a place to break the surface.
    ///
    /// A valid site has ground below it, an acceptable slope and no obstacle
    /// within the clearance radius.
    pub fn validate_emerge_site(&self, point: Vec3) -> Result<TerrainSample, SiteRejection> {
        let sample = self.sample(point).ok_or(SiteRejection::NoGround)?;

        if !self.is_slope_acceptable(sample.normal) {
            return Err(SiteRejection::TooSteep {
                angle_degrees: slope_angle(sample.normal).to_degrees(),
                max_degrees: self.settings.max_slope.to_degrees(),
            });
        }

        let radius = self.settings.clearance_radius;
        if self.terrain.obstacle_within(point, radius) {
            return Err(SiteRejection::Obstructed { radius });
        }

        Ok(sample)
    }
}

/// Reports whether the angle between `normal` and the up axis is at most `max_angle` radians.
///
/// Degenerate normals are never acceptable.
#[must_use]
pub fn is_slope_acceptable(normal: Vec3, max_angle: f32) -> bool {
    slope_angle(normal) <= max_angle
}

fn slope_angle(normal: Vec3) -> f32 {
    match normal.try_normalize() {
        Some(unit) => unit.dot(Vec3::Y).clamp(-1.0, 1.0).acos(),
        None => f32::NAN,
    }
}

//! Recoverable faults raised inside a creature's own update.

use std::time::Duration;

use glam::Vec3;
use thiserror::Error;

use crate::TargetId;

/// Diagnostics produced while a creature updates itself.
///
/// None of these are fatal. Each one is recovered inside the creature's state
/// machine and reported through the log.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Fault {
    /// No ground was found within probe range of a queried point.
    #[error("no ground within {max_distance} units below {point}")]
    TerrainNotFound {
        /// Point the probe started from.
        point: Vec3,
        /// Length of the probe.
        max_distance: f32,
    },
    /// A candidate emerge site failed validation.
    #[error("emerge site at {point} rejected: {rejection}")]
    InvalidEmergeSite {
        /// Candidate site.
        point: Vec3,
        /// Why the site was refused.
        rejection: SiteRejection,
    },
    /// An emerge ran past the failsafe duration.
    #[error("emerge stalled after {elapsed:?}")]
    StuckTransition {
        /// Time spent in the emerge when the failsafe fired.
        elapsed: Duration,
    },
    /// The pursued entity has no current observation.
    #[error("pursued {target} is unavailable")]
    TargetUnavailable {
        /// Identifier of the missing entity.
        target: TargetId,
    },
}

/// Reasons an emerge site may be refused.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SiteRejection {
    /// The ground probe found nothing.
    #[error("no ground below the site")]
    NoGround,
    /// The terrain normal leans too far from vertical.
    #[error("slope of {angle_degrees:.1} degrees exceeds {max_degrees:.1}")]
    TooSteep {
        /// Measured slope.
        angle_degrees: f32,
        /// Largest accepted slope.
        max_degrees: f32,
    },
    /// Something solid overlaps the site.
    #[error("obstacle within {radius} units")]
    Obstructed {
        /// Radius that was checked.
        radius: f32,
    },
}

/// Reasons a creature configuration may be refused at spawn.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// More segments were requested than the simulation supports.
    #[error("{count} segments requested but at most {limit} are supported")]
    TooManySegments {
        /// Requested segment count.
        count: u32,
        /// Supported maximum.
        limit: u32,
    },
    /// The history log would be unable to hold any sample.
    #[error("history capacity must be at least one sample")]
    ZeroHistoryCapacity,
    /// Segment delays would not strictly increase with index.
    #[error("base segment delay must be greater than zero")]
    ZeroSegmentDelay,
    /// A field that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Supplied value.
        value: f32,
    },
    /// A field that must not be negative was.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Supplied value.
        value: f32,
    },
    /// The attack window is empty.
    #[error("min attack distance {min} exceeds max attack distance {max}")]
    AttackRangeInverted {
        /// Supplied minimum.
        min: f32,
        /// Supplied maximum.
        max: f32,
    },
    /// The burrow depth range is empty.
    #[error("min burrow depth {min} exceeds max burrow depth {max}")]
    BurrowDepthInverted {
        /// Supplied minimum.
        min: f32,
        /// Supplied maximum.
        max: f32,
    },
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Sandworm simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for effect,
//! audio and collectible collaborators to react to. Systems receive mutable
//! borrows of the creature data they own for the duration of a tick and push
//! any notifications into the same event stream.

mod config;
mod fault;

use std::{fmt, time::Duration};

use glam::{Quat, Vec3};

pub use config::{CreatureConfig, MAX_SEGMENTS};
pub use fault::{ConfigError, Fault, SiteRejection};

/// Unique identifier assigned to an enemy managed by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

/// Identifier of a pursued entity owned by a collaborator.
///
/// Creatures reference their target by id only; the world caches the latest
/// observation reported for each id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Creates a new target identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Locates an eye by the index of its segment and its slot inside that segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EyeId {
    segment: u32,
    slot: u32,
}

impl EyeId {
    /// Creates a new eye locator.
    #[must_use]
    pub const fn new(segment: u32, slot: u32) -> Self {
        Self { segment, slot }
    }

    /// Index of the segment that owns the eye.
    #[must_use]
    pub const fn segment(&self) -> u32 {
        self.segment
    }

    /// Position of the eye within its segment's eye set.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }
}

/// Position and orientation of a body in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quat,
}

impl Pose {
    /// Creates a pose from explicit position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates an unrotated pose located at `position`.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Maps a point expressed in this pose's local frame into world space.
    #[must_use]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Independently destructible sub-component mounted on a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct Eye {
    /// Mounting offset expressed in the owning segment's local frame.
    pub local_offset: Vec3,
    /// World-space pose, refreshed from the segment after every tick.
    pub pose: Pose,
    /// Remaining hit points. Only the lethal hit may push this below zero.
    pub hit_points: f32,
    /// Set once the eye has been destroyed. Destroyed eyes are never removed.
    pub destroyed: bool,
}

impl Eye {
    /// Creates an intact eye mounted at `local_offset` on a segment at `segment_pose`.
    #[must_use]
    pub fn mounted(local_offset: Vec3, segment_pose: &Pose, hit_points: f32) -> Self {
        Self {
            local_offset,
            pose: Pose::new(
                segment_pose.transform_point(local_offset),
                segment_pose.orientation,
            ),
            hit_points,
            destroyed: false,
        }
    }

    /// Reports whether the eye can still take damage.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.destroyed
    }
}

/// Trailing body part that follows the head with a time lag.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Current world-space pose.
    pub pose: Pose,
    /// Last position the segment was asked to move toward.
    pub target_position: Vec3,
    /// Lag behind the head's recorded trajectory. Strictly increases with index.
    pub follow_delay: Duration,
    /// Destroyed segments keep their slot but stop moving.
    pub destroyed: bool,
    /// Eyes owned by the segment, in creation order.
    pub eyes: Vec<Eye>,
}

impl Segment {
    /// Creates a live segment resting at `pose` with the provided eyes.
    #[must_use]
    pub fn new(pose: Pose, follow_delay: Duration, eyes: Vec<Eye>) -> Self {
        Self {
            pose,
            target_position: pose.position,
            follow_delay,
            destroyed: false,
            eyes,
        }
    }

    /// Reports whether the segment still takes part in following and spacing.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.destroyed
    }

    /// Moves the segment and its target to `position` without smoothing.
    pub fn place_at(&mut self, position: Vec3) {
        self.pose.position = position;
        self.target_position = position;
    }

    /// Recomputes the world pose of every eye from the segment pose.
    pub fn refresh_eye_poses(&mut self) {
        let pose = self.pose;
        for eye in &mut self.eyes {
            eye.pose = Pose::new(pose.transform_point(eye.local_offset), pose.orientation);
        }
    }

    /// Reports whether the segment owned eyes and all of them are destroyed.
    #[must_use]
    pub fn all_eyes_destroyed(&self) -> bool {
        !self.eyes.is_empty() && self.eyes.iter().all(|eye| eye.destroyed)
    }
}

/// Coarse phase discriminant used for transition bookkeeping and events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Resting underground, waiting for the next attack window.
    Burrowed,
    /// Tunnelling toward the staging point and arcing to the surface.
    Emerging,
    /// Exposed above ground.
    Surfaced,
    /// Digging back down.
    Retreating,
}

impl PhaseKind {
    /// Reports whether a direct transition from `self` to `next` is permitted.
    ///
    /// Remaining in the same phase is always allowed.
    #[must_use]
    pub const fn may_transition_to(self, next: PhaseKind) -> bool {
        matches!(
            (self, next),
            (Self::Burrowed, Self::Burrowed | Self::Emerging)
                | (Self::Emerging, Self::Emerging | Self::Surfaced | Self::Burrowed)
                | (Self::Surfaced, Self::Surfaced | Self::Retreating)
                | (Self::Retreating, Self::Retreating | Self::Burrowed)
        )
    }
}

/// Creature-level motion phase together with the data each phase carries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Resting underground.
    Burrowed,
    /// Moving toward the surface at `target_position`.
    Emerging {
        /// World-space point the creature is attacking.
        target_position: Vec3,
        /// Simulation time at which the emerge began.
        start_time: Duration,
    },
    /// Exposed above ground since `emerge_time`.
    Surfaced {
        /// Simulation time at which the creature reached the surface.
        emerge_time: Duration,
    },
    /// Digging back down since `start_time`.
    Retreating {
        /// Simulation time at which the retreat began.
        start_time: Duration,
    },
}

impl Phase {
    /// Returns the discriminant of the phase.
    #[must_use]
    pub const fn kind(&self) -> PhaseKind {
        match self {
            Self::Burrowed => PhaseKind::Burrowed,
            Self::Emerging { .. } => PhaseKind::Emerging,
            Self::Surfaced { .. } => PhaseKind::Surfaced,
            Self::Retreating { .. } => PhaseKind::Retreating,
        }
    }
}

/// Result of a downward terrain probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundHit {
    /// World-space point where the probe met the ground.
    pub point: Vec3,
    /// Unit surface normal at `point`.
    pub normal: Vec3,
}

/// Terrain query service supplied by the host environment.
pub trait TerrainQuery: fmt::Debug {
    /// Casts a ray straight down from `origin`, reporting the first ground
    /// contact no further than `max_distance` away.
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit>;

    /// Reports whether any ground obstacle overlaps the sphere at `center`.
    fn obstacle_within(&self, center: Vec3, radius: f32) -> bool;
}

/// Latest observation of a pursued entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSnapshot {
    /// World-space position of the target.
    pub position: Vec3,
    /// Current velocity of the target in units per second.
    pub velocity: Vec3,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Spawns a segmented burrowing creature.
    SpawnCreature {
        /// Surface position the creature is spawned beneath.
        position: Vec3,
        /// Heading used to lay out the segments behind the head.
        forward: Vec3,
        /// Entity the creature pursues.
        target: TargetId,
        /// Tunables applied to the creature.
        config: CreatureConfig,
    },
    /// Spawns an enemy whose health is a single scalar.
    SpawnSimpleEnemy {
        /// World-space position of the enemy.
        position: Vec3,
        /// Hit points the enemy starts with.
        max_health: f32,
        /// Entity that receives the collectible dropped on death.
        target: TargetId,
    },
    /// Reports the current position and velocity of a pursued entity.
    ObserveTarget {
        /// Identifier of the observed entity.
        target: TargetId,
        /// Current position of the entity.
        position: Vec3,
        /// Current velocity of the entity.
        velocity: Vec3,
    },
    /// Declares that a pursued entity no longer exists.
    ForgetTarget {
        /// Identifier of the entity that disappeared.
        target: TargetId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Delivers a hit to an enemy.
    ApplyHit {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// World-space point of impact.
        hit_point: Vec3,
        /// Damage carried by the hit.
        damage: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a segmented creature was created.
    CreatureSpawned {
        /// Identifier assigned to the creature.
        enemy: EnemyId,
        /// Number of segments trailing the head.
        segments: u32,
        /// Total number of eyes across all segments.
        eyes: u32,
    },
    /// Confirms that a scalar-health enemy was created.
    SimpleEnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
    },
    /// Reports that a spawn request carried an unusable configuration.
    SpawnRejected {
        /// Reason the configuration was refused.
        reason: ConfigError,
    },
    /// Announces that a creature entered a new phase.
    PhaseChanged {
        /// Creature whose phase changed.
        enemy: EnemyId,
        /// Phase that was left.
        from: PhaseKind,
        /// Phase that became active.
        to: PhaseKind,
    },
    /// The creature reached its staging point and starts breaching the surface.
    EmergeStarted {
        /// Creature that is emerging.
        enemy: EnemyId,
        /// Where the emerge effect should play.
        position: Vec3,
    },
    /// The creature starts digging back underground.
    BurrowStarted {
        /// Creature that is burrowing.
        enemy: EnemyId,
        /// Where the burrow effect should play.
        position: Vec3,
    },
    /// An emerge stalled and the creature was snapped back to its anchor.
    FailsafeReset {
        /// Creature that was reset.
        enemy: EnemyId,
        /// Anchor the head was returned to.
        anchor: Vec3,
    },
    /// An eye ran out of hit points.
    EyeDestroyed {
        /// Creature that owned the eye.
        enemy: EnemyId,
        /// Locator of the destroyed eye.
        eye: EyeId,
        /// World-space position of the eye when it was destroyed.
        position: Vec3,
    },
    /// Asks the collectible spawner to create a pickup homing on `follow`.
    CollectibleRequested {
        /// Spawn position of the collectible.
        position: Vec3,
        /// Entity the collectible should follow.
        follow: TargetId,
    },
    /// An enemy died and was removed from the world.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Last known position of the enemy.
        position: Vec3,
    },
}

/// Effect of a single hit on a damageable enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOutcome {
    /// Nothing was left to damage.
    Ignored,
    /// Damage was absorbed without destroying anything.
    Absorbed,
    /// A sub-component was destroyed but the enemy survives.
    ComponentDestroyed,
    /// The hit killed the enemy.
    Killed,
}

/// Capability shared by every enemy variant that can be hit.
pub trait Damageable {
    /// Applies `damage` at `hit_point`, pushing any resulting notifications to `out`.
    fn apply_hit(&mut self, hit_point: Vec3, damage: f32, out: &mut Vec<Event>) -> HitOutcome;

    /// Reports whether the enemy has died.
    fn is_dead(&self) -> bool;

    /// World-space reference position of the enemy.
    fn position(&self) -> Vec3;
}

/// Immutable representation of a single eye used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeSnapshot {
    /// Locator of the eye.
    pub id: EyeId,
    /// World-space position of the eye.
    pub position: Vec3,
    /// Remaining hit points.
    pub hit_points: f32,
    /// Whether the eye has been destroyed.
    pub destroyed: bool,
}

/// Immutable representation of a single segment used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentSnapshot {
    /// Current pose of the segment.
    pub pose: Pose,
    /// Whether the segment has been destroyed.
    pub destroyed: bool,
    /// Eyes mounted on the segment.
    pub eyes: Vec<EyeSnapshot>,
}

/// Read-only snapshot of a segmented creature for rendering and animation.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureSnapshot {
    /// Identifier of the creature.
    pub id: EnemyId,
    /// Pose of the head.
    pub head: Pose,
    /// Current phase.
    pub phase: Phase,
    /// Segments in index order.
    pub segments: Vec<SegmentSnapshot>,
}

impl CreatureSnapshot {
    /// Iterator over every eye across all segments.
    pub fn eyes(&self) -> impl Iterator<Item = &EyeSnapshot> {
        self.segments.iter().flat_map(|segment| segment.eyes.iter())
    }

    /// Number of eyes that have not been destroyed.
    #[must_use]
    pub fn live_eyes(&self) -> usize {
        self.eyes().filter(|eye| !eye.destroyed).count()
    }
}

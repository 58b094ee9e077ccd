//! Segmented burrowing creature owned by the world.

use std::time::Duration;

use glam::{Quat, Vec3};
use sandworm_core::{
    CreatureConfig, CreatureSnapshot, Damageable, EnemyId, Event, Eye, EyeId, EyeSnapshot,
    HitOutcome, Phase, Pose, Segment, SegmentSnapshot, TargetId, TargetSnapshot, TerrainQuery,
};
use sandworm_system_burrowing::{BurrowContext, BurrowMachine, TickOutcome};
use sandworm_system_damage::{self as damage, HitContext};
use sandworm_system_following::{
    enforce_spacing, FollowSettings, PositionHistory, SegmentFollower,
};
use sandworm_system_terrain::{SamplerSettings, TerrainSampler};

#[derive(Debug)]
pub(crate) struct Creature {
    id: EnemyId,
    target: TargetId,
    config: CreatureConfig,
    heading: Vec3,
    head: Pose,
    segments: Vec<Segment>,
    history: PositionHistory,
    follower: SegmentFollower,
    burrow: BurrowMachine,
}

impl Creature {
    /// Builds a burrowed creature beneath `position` with its body trailing
    /// opposite `forward`. The configuration must already be validated.
    pub(crate) fn spawn(
        id: EnemyId,
        position: Vec3,
        forward: Vec3,
        target: TargetId,
        config: CreatureConfig,
        now: Duration,
    ) -> Self {
        let heading = forward.try_normalize().unwrap_or(Vec3::Z);
        let orientation = Quat::from_rotation_arc(Vec3::Z, heading);
        let head = Pose::new(position - Vec3::Y * config.min_burrow_depth, orientation);

        let segments = (0..config.segment_count)
            .map(|index| {
                let pose = Pose::new(
                    trailing_position(head.position, heading, config.segment_spacing, index),
                    orientation,
                );
                let eyes = config
                    .eye_offsets
                    .iter()
                    .map(|offset| Eye::mounted(*offset, &pose, config.eye_hit_points))
                    .collect();
                Segment::new(pose, config.follow_delay_for(index), eyes)
            })
            .collect();

        let mut history = PositionHistory::new(
            config.history_capacity,
            config.motion_threshold,
            config.segment_count as usize,
        );
        history.rest_at(head.position);

        Self {
            id,
            target,
            heading,
            head,
            segments,
            history,
            follower: SegmentFollower::new(FollowSettings::from(&config)),
            burrow: BurrowMachine::new(head.position, now),
            config,
        }
    }

    pub(crate) const fn target(&self) -> TargetId {
        self.target
    }

    pub(crate) fn phase(&self) -> Phase {
        self.burrow.phase()
    }

    /// Runs one simulation step: phase logic first, then the body follows.
    pub(crate) fn tick(
        &mut self,
        terrain: &dyn TerrainQuery,
        target: Option<TargetSnapshot>,
        now: Duration,
        dt: Duration,
        out: &mut Vec<Event>,
    ) {
        let sampler = TerrainSampler::new(terrain, SamplerSettings::from(&self.config));
        let context = BurrowContext {
            enemy: self.id,
            target_id: self.target,
            target,
            now,
            dt,
            config: &self.config,
            sampler,
        };

        if let TickOutcome::Reset { anchor } = self.burrow.tick(&context, &mut self.head, out) {
            self.lay_out_behind(anchor);
        }

        let _ = self.history.record(self.head.position, now);
        self.follower.advance(
            &self.head,
            &mut self.segments,
            &mut self.history,
            &sampler,
            now,
            dt,
        );
        let _ = enforce_spacing(&mut self.segments, self.config.min_segment_distance);

        for segment in self.segments.iter_mut().filter(|segment| segment.is_live()) {
            segment.refresh_eye_poses();
        }
    }

    /// Re-lays every live segment behind `anchor` along the spawn heading and
    /// forgets the recorded trajectory.
    fn lay_out_behind(&mut self, anchor: Vec3) {
        let orientation = Quat::from_rotation_arc(Vec3::Z, self.heading);
        self.head = Pose::new(anchor, orientation);

        for (index, segment) in self.segments.iter_mut().enumerate() {
            if !segment.is_live() {
                continue;
            }
            segment.place_at(trailing_position(
                anchor,
                self.heading,
                self.config.segment_spacing,
                index as u32,
            ));
            segment.pose.orientation = orientation;
            segment.refresh_eye_poses();
        }

        self.history.clear();
        self.history.rest_at(anchor);
    }

    pub(crate) fn snapshot(&self) -> CreatureSnapshot {
        let segments = self
            .segments
            .iter()
            .zip(0u32..)
            .map(|(segment, segment_index)| SegmentSnapshot {
                pose: segment.pose,
                destroyed: segment.destroyed,
                eyes: segment
                    .eyes
                    .iter()
                    .zip(0u32..)
                    .map(|(eye, slot)| EyeSnapshot {
                        id: EyeId::new(segment_index, slot),
                        position: eye.pose.position,
                        hit_points: eye.hit_points,
                        destroyed: eye.destroyed,
                    })
                    .collect(),
            })
            .collect();

        CreatureSnapshot {
            id: self.id,
            head: self.head,
            phase: self.phase(),
            segments,
        }
    }

    pub(crate) fn eye_count(&self) -> u32 {
        self.segments
            .iter()
            .map(|segment| segment.eyes.len() as u32)
            .sum()
    }
}

impl Damageable for Creature {
    fn apply_hit(&mut self, hit_point: Vec3, damage: f32, out: &mut Vec<Event>) -> HitOutcome {
        let context = HitContext {
            enemy: self.id,
            follow: self.target,
            head: self.head.position,
        };
        damage::apply_hit(&mut self.segments, &context, hit_point, damage, out)
    }

    fn is_dead(&self) -> bool {
        damage::all_eyes_destroyed(&self.segments)
    }

    fn position(&self) -> Vec3 {
        self.head.position
    }
}

fn trailing_position(head: Vec3, heading: Vec3, spacing: f32, index: u32) -> Vec3 {
    head - heading * spacing * (index as f32 + 1.0)
}

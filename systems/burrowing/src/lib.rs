#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Burrow state machine that drives the head through its attack cycle.
//!
//! The machine is resumable: every tick it inspects the active phase, checks
//! whether the phase's completion condition holds and either advances the
//! in-flight motion or transitions. Nothing blocks and no tick can skip a
//! transition because `now` strictly increases.

mod motion;

use std::time::Duration;

use glam::{Quat, Vec3};
use log::{debug, info, warn};
use sandworm_core::{
    CreatureConfig, EnemyId, Event, Fault, Phase, Pose, TargetId, TargetSnapshot,
};
use sandworm_system_targeting::{predict, PredictionInput};
use sandworm_system_terrain::TerrainSampler;

use crate::motion::{ArcMotion, LinearMotion};

/// Scale applied to the target's height above ground when shaping the emerge arc.
pub const ARC_HEIGHT_SCALE: f32 = 1.5;

/// Everything the machine reads during one tick.
#[derive(Clone, Copy, Debug)]
pub struct BurrowContext<'a> {
    /// Creature being driven, used to tag events.
    pub enemy: EnemyId,
    /// Entity the creature pursues.
    pub target_id: TargetId,
    /// Latest observation of the pursued entity, if any.
    pub target: Option<TargetSnapshot>,
    /// Simulation time after this tick's advance.
    pub now: Duration,
    /// Length of this tick.
    pub dt: Duration,
    /// Creature tunables.
    pub config: &'a CreatureConfig,
    /// Terrain access.
    pub sampler: TerrainSampler<'a>,
}

/// What the caller must do after a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Nothing beyond the head pose changed.
    Continue,
    /// The failsafe fired and the head was snapped back to `anchor`.
    ///
    /// The caller must re-lay the body behind the head and clear its history.
    Reset {
        /// Burrow anchor the head now rests at.
        anchor: Vec3,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum EmergeStage {
    Tunnelling(LinearMotion),
    Breaching { arc: ArcMotion, arc_height: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    Burrowed,
    Emerging {
        target_position: Vec3,
        start_time: Duration,
        stage: EmergeStage,
    },
    Surfaced {
        emerge_time: Duration,
    },
    Retreating {
        start_time: Duration,
        motion: LinearMotion,
    },
}

impl State {
    fn phase(&self) -> Phase {
        match *self {
            Self::Burrowed => Phase::Burrowed,
            Self::Emerging {
                target_position,
                start_time,
                ..
            } => Phase::Emerging {
                target_position,
                start_time,
            },
            Self::Surfaced { emerge_time } => Phase::Surfaced { emerge_time },
            Self::Retreating { start_time, .. } => Phase::Retreating { start_time },
        }
    }
}

/// Per-creature burrow state.
#[derive(Clone, Debug)]
pub struct BurrowMachine {
    state: State,
    next_attempt: Duration,
    anchor: Vec3,
}

impl BurrowMachine {
    /// Creates a burrowed machine resting at `anchor` that may attack at `first_attempt`.
    #[must_use]
    pub fn new(anchor: Vec3, first_attempt: Duration) -> Self {
        Self {
            state: State::Burrowed,
            next_attempt: first_attempt,
            anchor,
        }
    }

    /// Current phase with its associated data.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Point the head returns to when the failsafe fires.
    #[must_use]
    pub const fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Earliest time the next emerge may be attempted.
    #[must_use]
    pub const fn next_attempt(&self) -> Duration {
        self.next_attempt
    }

    /// Advances the machine by one tick, moving `head` and pushing events to `out`.
    pub fn tick(
        &mut self,
        context: &BurrowContext<'_>,
        head: &mut Pose,
        out: &mut Vec<Event>,
    ) -> TickOutcome {
        match self.state {
            State::Burrowed => {
                self.evaluate_attack(context, head, out);
                TickOutcome::Continue
            }
            State::Emerging { start_time, .. } => {
                let elapsed = context.now.saturating_sub(start_time);
                if elapsed > context.config.failsafe_duration {
                    return self.force_reset(context, head, elapsed, out);
                }
                self.advance_emerge(context, head, out);
                TickOutcome::Continue
            }
            State::Surfaced { emerge_time } => {
                if context.now.saturating_sub(emerge_time) >= context.config.surface_duration {
                    self.begin_retreat(context, head, out);
                }
                TickOutcome::Continue
            }
            State::Retreating { motion, .. } => {
                let progress = motion.progress(context.now, context.config.arrival_tolerance);
                move_head(head, progress.position);
                if progress.arrived {
                    self.next_attempt = context.now.saturating_add(context.config.emerge_cooldown);
                    self.transition(State::Burrowed, context, out);
                }
                TickOutcome::Continue
            }
        }
    }

    fn evaluate_attack(&mut self, context: &BurrowContext<'_>, head: &Pose, out: &mut Vec<Event>) {
        if context.now < self.next_attempt {
            return;
        }

        let config = context.config;
        let Some(target) = context.target else {
            self.defer(context, &Fault::TargetUnavailable {
                target: context.target_id,
            });
            return;
        };

        let distance = head.position.distance(target.position);
        if distance < config.min_attack_distance || distance > config.max_attack_distance {
            self.anchor_beneath(context, head.position);
            debug!(
                "{} holds: {} is {distance:.2} units away",
                context.enemy, context.target_id
            );
            self.next_attempt = context.now.saturating_add(config.retry_cooldown);
            return;
        }

        let predicted = predict(&PredictionInput {
            target_position: target.position,
            target_velocity: target.velocity,
            prediction_horizon: config.prediction_horizon,
            ground_height: context.sampler.ground_height(target.position),
            max_jump_height: config.max_jump_height,
            max_attack_distance: config.max_attack_distance,
            creature_position: head.position,
        });

        let site = match context.sampler.validate_emerge_site(predicted) {
            Ok(sample) => Some((predicted, sample.height)),
            Err(rejection) => {
                debug!(
                    "{}: {}",
                    context.enemy,
                    Fault::InvalidEmergeSite {
                        point: predicted,
                        rejection
                    }
                );
                match context.sampler.validate_emerge_site(target.position) {
                    Ok(sample) => Some((target.position, sample.height)),
                    Err(rejection) => {
                        self.defer(context, &Fault::InvalidEmergeSite {
                            point: target.position,
                            rejection,
                        });
                        None
                    }
                }
            }
        };

        if let Some((emerge_point, ground)) = site {
            self.begin_emerge(context, head, emerge_point, ground, out);
        }
    }

    fn begin_emerge(
        &mut self,
        context: &BurrowContext<'_>,
        head: &Pose,
        emerge_point: Vec3,
        ground: f32,
        out: &mut Vec<Event>,
    ) {
        let config = context.config;
        let depth = (emerge_point.y - ground).clamp(config.min_burrow_depth, config.max_burrow_depth);
        let staging = Vec3::new(emerge_point.x, ground - depth, emerge_point.z);

        let tunnel = LinearMotion::new(head.position, staging, context.now, config.burrow_speed);
        self.transition(
            State::Emerging {
                target_position: emerge_point,
                start_time: context.now,
                stage: EmergeStage::Tunnelling(tunnel),
            },
            context,
            out,
        );
    }

    fn advance_emerge(&mut self, context: &BurrowContext<'_>, head: &mut Pose, out: &mut Vec<Event>) {
        let State::Emerging {
            target_position,
            start_time,
            stage,
        } = self.state
        else {
            return;
        };
        let config = context.config;

        match stage {
            EmergeStage::Tunnelling(tunnel) => {
                let progress = tunnel.progress(context.now, config.arrival_tolerance);
                move_head(head, progress.position);
                if !progress.arrived {
                    return;
                }

                out.push(Event::EmergeStarted {
                    enemy: context.enemy,
                    position: head.position + Vec3::Y,
                });

                let ground = context.sampler.ground_height(target_position);
                let surface = Vec3::new(target_position.x, ground, target_position.z);
                let arc = ArcMotion::new(head.position, surface, config.emerge_speed);
                self.state = State::Emerging {
                    target_position,
                    start_time,
                    stage: EmergeStage::Breaching {
                        arc,
                        arc_height: arc_height(context, ground),
                    },
                };
            }
            EmergeStage::Breaching {
                mut arc,
                arc_height: previous_height,
            } => {
                let ground = context.sampler.ground_height(target_position);
                let height = match context.target {
                    Some(_) => arc_height(context, ground),
                    None => previous_height,
                };

                let progress = arc.advance(context.dt, height);
                if progress.arrived {
                    move_head(head, progress.position);
                    self.transition(
                        State::Surfaced {
                            emerge_time: context.now,
                        },
                        context,
                        out,
                    );
                    return;
                }

                let mut position = progress.position;
                if let Some(terrain) = context.sampler.probe(position, 1.0, config.ground_check_distance)
                {
                    position.y = position.y.max(terrain.height + config.arc_ground_clearance);
                }
                move_head(head, position);
                self.state = State::Emerging {
                    target_position,
                    start_time,
                    stage: EmergeStage::Breaching {
                        arc,
                        arc_height: height,
                    },
                };
            }
        }
    }

    fn begin_retreat(&mut self, context: &BurrowContext<'_>, head: &Pose, out: &mut Vec<Event>) {
        out.push(Event::BurrowStarted {
            enemy: context.enemy,
            position: head.position,
        });

        let destination = head.position - Vec3::Y * context.config.min_burrow_depth;
        self.anchor = destination;
        let motion = LinearMotion::new(
            head.position,
            destination,
            context.now,
            context.config.burrow_speed,
        );
        self.transition(
            State::Retreating {
                start_time: context.now,
                motion,
            },
            context,
            out,
        );
    }

    fn force_reset(
        &mut self,
        context: &BurrowContext<'_>,
        head: &mut Pose,
        elapsed: Duration,
        out: &mut Vec<Event>,
    ) -> TickOutcome {
        warn!(
            "{}: {}; returning to {}",
            context.enemy,
            Fault::StuckTransition { elapsed },
            self.anchor
        );

        *head = Pose::new(self.anchor, head.orientation);
        self.next_attempt = context.now.saturating_add(context.config.emerge_cooldown);
        self.transition(State::Burrowed, context, out);
        out.push(Event::FailsafeReset {
            enemy: context.enemy,
            anchor: self.anchor,
        });
        TickOutcome::Reset {
            anchor: self.anchor,
        }
    }

    fn anchor_beneath(&mut self, context: &BurrowContext<'_>, position: Vec3) {
        let reach = context.sampler.settings().max_distance;
        match context.sampler.ground_at(position, reach, reach * 2.0) {
            Ok(ground) => {
                self.anchor = Vec3::new(
                    position.x,
                    ground.height - context.config.min_burrow_depth,
                    position.z,
                );
            }
            Err(fault) => {
                debug!("{}: {fault}; keeping anchor at head", context.enemy);
                self.anchor = position;
            }
        }
    }

    fn defer(&mut self, context: &BurrowContext<'_>, fault: &Fault) {
        debug!(
            "{} defers emerge by {:?}: {fault}",
            context.enemy, context.config.retry_cooldown
        );
        self.next_attempt = context.now.saturating_add(context.config.retry_cooldown);
    }

    fn transition(&mut self, next: State, context: &BurrowContext<'_>, out: &mut Vec<Event>) {
        let from = self.state.phase().kind();
        let to = next.phase().kind();
        debug_assert!(from.may_transition_to(to), "illegal edge {from:?} -> {to:?}");

        self.state = next;
        if from != to {
            info!("{} {from:?} -> {to:?} at {:?}", context.enemy, context.now);
            out.push(Event::PhaseChanged {
                enemy: context.enemy,
                from,
                to,
            });
        }
    }
}

fn arc_height(context: &BurrowContext<'_>, ground: f32) -> f32 {
    context.target.map_or(0.0, |target| {
        ((target.position.y - ground) * ARC_HEIGHT_SCALE)
            .min(context.config.max_jump_height)
            .max(0.0)
    })
}

fn move_head(head: &mut Pose, position: Vec3) {
    if let Some(direction) = (position - head.position).try_normalize() {
        head.orientation = Quat::from_rotation_arc(Vec3::Z, direction);
    }
    head.position = position;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandworm_core::PhaseKind;
    use sandworm_system_terrain::{FlatGround, SamplerSettings};

    const TICK: Duration = Duration::from_millis(10);

    fn context<'a>(
        config: &'a CreatureConfig,
        sampler: TerrainSampler<'a>,
        target: Option<TargetSnapshot>,
        now: Duration,
    ) -> BurrowContext<'a> {
        BurrowContext {
            enemy: EnemyId::new(0),
            target_id: TargetId::new(1),
            target,
            now,
            dt: TICK,
            config,
            sampler,
        }
    }

    fn standing_at(position: Vec3) -> Option<TargetSnapshot> {
        Some(TargetSnapshot {
            position,
            velocity: Vec3::ZERO,
        })
    }

    #[test]
    fn missing_target_defers_by_retry_cooldown() {
        let config = CreatureConfig::default();
        let ground = FlatGround::new(0.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let mut machine = BurrowMachine::new(Vec3::new(0.0, -5.0, 0.0), Duration::ZERO);
        let mut head = Pose::at(machine.anchor());
        let mut events = Vec::new();

        let now = Duration::from_secs(1);
        let outcome = machine.tick(&context(&config, sampler, None, now), &mut head, &mut events);

        assert_eq!(outcome, TickOutcome::Continue);
        assert_eq!(machine.phase(), Phase::Burrowed);
        assert_eq!(machine.next_attempt(), now + config.retry_cooldown);
        assert!(events.is_empty());
    }

    #[test]
    fn out_of_range_target_refreshes_anchor() {
        let config = CreatureConfig::default();
        let ground = FlatGround::new(2.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let mut machine = BurrowMachine::new(Vec3::ZERO, Duration::ZERO);
        let mut head = Pose::at(Vec3::new(3.0, -1.0, 4.0));
        let mut events = Vec::new();

        let target = standing_at(Vec3::new(200.0, 2.0, 0.0));
        let _ = machine.tick(
            &context(&config, sampler, target, Duration::ZERO),
            &mut head,
            &mut events,
        );

        assert_eq!(machine.phase(), Phase::Burrowed);
        assert_eq!(machine.anchor(), Vec3::new(3.0, -3.0, 4.0));
        assert_eq!(machine.next_attempt(), config.retry_cooldown);
    }

    #[test]
    fn in_range_target_starts_emerge_toward_target() {
        let config = CreatureConfig::default();
        let ground = FlatGround::new(0.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let mut machine = BurrowMachine::new(Vec3::new(0.0, -5.0, 0.0), Duration::ZERO);
        let mut head = Pose::at(machine.anchor());
        let mut events = Vec::new();

        let target = Vec3::new(15.0, 0.0, 0.0);
        let _ = machine.tick(
            &context(&config, sampler, standing_at(target), Duration::ZERO),
            &mut head,
            &mut events,
        );

        assert_eq!(
            machine.phase(),
            Phase::Emerging {
                target_position: target,
                start_time: Duration::ZERO
            }
        );
        assert_eq!(
            events,
            vec![Event::PhaseChanged {
                enemy: EnemyId::new(0),
                from: PhaseKind::Burrowed,
                to: PhaseKind::Emerging
            }]
        );
    }

    #[test]
    fn failsafe_fires_just_after_limit() {
        let config = CreatureConfig {
            burrow_speed: 1.0,
            ..CreatureConfig::default()
        };
        let ground = FlatGround::new(0.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let anchor = Vec3::new(0.0, -5.0, 0.0);
        let mut machine = BurrowMachine::new(anchor, Duration::ZERO);
        let mut head = Pose::at(anchor);
        let mut events = Vec::new();
        let target = standing_at(Vec3::new(20.0, 0.0, 0.0));

        let _ = machine.tick(
            &context(&config, sampler, target, Duration::ZERO),
            &mut head,
            &mut events,
        );
        assert_eq!(machine.phase().kind(), PhaseKind::Emerging);

        let mut now = Duration::ZERO;
        while now < Duration::from_secs(5) {
            now += TICK;
            let outcome = machine.tick(&context(&config, sampler, target, now), &mut head, &mut events);
            assert_eq!(outcome, TickOutcome::Continue);
        }
        assert_eq!(machine.phase().kind(), PhaseKind::Emerging);
        assert_ne!(head.position, anchor);

        now += TICK;
        events.clear();
        let outcome = machine.tick(&context(&config, sampler, target, now), &mut head, &mut events);

        assert_eq!(now, Duration::from_millis(5_010));
        assert_eq!(outcome, TickOutcome::Reset { anchor });
        assert_eq!(machine.phase(), Phase::Burrowed);
        assert_eq!(head.position, anchor);
        assert_eq!(machine.next_attempt(), now + config.emerge_cooldown);
        assert!(events.contains(&Event::FailsafeReset {
            enemy: EnemyId::new(0),
            anchor
        }));
    }

    #[test]
    fn tunnel_to_staging_travels_at_burrow_speed() {
        let config = CreatureConfig {
            burrow_speed: 8.0,
            emerge_speed: 15.0,
            ..CreatureConfig::default()
        };
        let ground = FlatGround::new(0.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let anchor = Vec3::new(0.0, -5.0, 0.0);
        let mut machine = BurrowMachine::new(anchor, Duration::ZERO);
        let mut head = Pose::at(anchor);
        let mut events = Vec::new();
        let target = standing_at(Vec3::new(20.0, 0.0, 0.0));

        let _ = machine.tick(
            &context(&config, sampler, target, Duration::ZERO),
            &mut head,
            &mut events,
        );
        let _ = machine.tick(
            &context(&config, sampler, target, Duration::from_secs(1)),
            &mut head,
            &mut events,
        );

        assert_eq!(machine.phase().kind(), PhaseKind::Emerging);
        assert!((head.position - Vec3::new(8.0, -5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn huge_cooldowns_saturate_instead_of_overflowing() {
        let config = CreatureConfig {
            retry_cooldown: Duration::MAX,
            ..CreatureConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
        let ground = FlatGround::new(0.0);
        let sampler = TerrainSampler::new(&ground, SamplerSettings::from(&config));
        let mut machine = BurrowMachine::new(Vec3::new(0.0, -5.0, 0.0), Duration::ZERO);
        let mut head = Pose::at(machine.anchor());
        let mut events = Vec::new();

        let outcome = machine.tick(
            &context(&config, sampler, None, Duration::from_secs(1)),
            &mut head,
            &mut events,
        );

        assert_eq!(outcome, TickOutcome::Continue);
        assert_eq!(machine.next_attempt(), Duration::MAX);
        assert_eq!(machine.phase(), Phase::Burrowed);
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Sandworm simulation.
//!
//! All mutation flows through [`apply`]; read access goes through [`query`].

mod creature;
mod simple;

use std::{collections::BTreeMap, time::Duration};

use log::{debug, warn};
use sandworm_core::{Command, Damageable, EnemyId, Event, TargetId, TargetSnapshot, TerrainQuery};

use crate::{creature::Creature, simple::SimpleEnemy};

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    terrain: Box<dyn TerrainQuery>,
    clock: Duration,
    tick_index: u64,
    next_enemy: u32,
    creatures: BTreeMap<EnemyId, Creature>,
    simple_enemies: BTreeMap<EnemyId, SimpleEnemy>,
    targets: BTreeMap<TargetId, TargetSnapshot>,
}

impl World {
    /// Creates an empty world over the provided terrain.
    #[must_use]
    pub fn new(terrain: Box<dyn TerrainQuery>) -> Self {
        Self {
            terrain,
            clock: Duration::ZERO,
            tick_index: 0,
            next_enemy: 0,
            creatures: BTreeMap::new(),
            simple_enemies: BTreeMap::new(),
            targets: BTreeMap::new(),
        }
    }

    fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);
        id
    }

    fn damageable_mut(&mut self, enemy: EnemyId) -> Option<&mut dyn Damageable> {
        if self.creatures.contains_key(&enemy) {
            return self
                .creatures
                .get_mut(&enemy)
                .map(|creature| creature as &mut dyn Damageable);
        }
        self.simple_enemies
            .get_mut(&enemy)
            .map(|enemy| enemy as &mut dyn Damageable)
    }

    fn remove_enemy(&mut self, enemy: EnemyId) {
        let _ = self.creatures.remove(&enemy);
        let _ = self.simple_enemies.remove(&enemy);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnCreature {
            position,
            forward,
            target,
            config,
        } => {
            if let Err(reason) = config.validate() {
                warn!("creature spawn rejected: {reason}");
                out_events.push(Event::SpawnRejected { reason });
                return;
            }

            let enemy = world.allocate_enemy_id();
            let creature = Creature::spawn(enemy, position, forward, target, config, world.clock);
            out_events.push(Event::CreatureSpawned {
                enemy,
                segments: creature.snapshot().segments.len() as u32,
                eyes: creature.eye_count(),
            });
            let _ = world.creatures.insert(enemy, creature);
        }
        Command::SpawnSimpleEnemy {
            position,
            max_health,
            target,
        } => {
            let enemy = world.allocate_enemy_id();
            let _ = world
                .simple_enemies
                .insert(enemy, SimpleEnemy::new(enemy, position, max_health, target));
            out_events.push(Event::SimpleEnemySpawned { enemy });
        }
        Command::ObserveTarget {
            target,
            position,
            velocity,
        } => {
            let _ = world
                .targets
                .insert(target, TargetSnapshot { position, velocity });
        }
        Command::ForgetTarget { target } => {
            let _ = world.targets.remove(&target);
        }
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            let now = world.clock;
            let terrain = world.terrain.as_ref();
            for creature in world.creatures.values_mut() {
                let target = world.targets.get(&creature.target()).copied();
                creature.tick(terrain, target, now, dt, out_events);
            }
        }
        Command::ApplyHit {
            enemy,
            hit_point,
            damage,
        } => {
            let Some(victim) = world.damageable_mut(enemy) else {
                debug!("hit on unknown {enemy} ignored");
                return;
            };

            let _ = victim.apply_hit(hit_point, damage, out_events);
            if victim.is_dead() {
                world.remove_enemy(enemy);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use sandworm_core::{CreatureSnapshot, EnemyId, Phase, TargetId, TargetSnapshot};

    use super::World;

    /// Simulation time accumulated from all ticks.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Identifiers of all living segmented creatures in ascending order.
    #[must_use]
    pub fn creature_ids(world: &World) -> Vec<EnemyId> {
        world.creatures.keys().copied().collect()
    }

    /// Identifiers of all living scalar-health enemies in ascending order.
    #[must_use]
    pub fn simple_enemy_ids(world: &World) -> Vec<EnemyId> {
        world.simple_enemies.keys().copied().collect()
    }

    /// Current phase of a creature, or `None` if it does not exist.
    #[must_use]
    pub fn phase(world: &World, enemy: EnemyId) -> Option<Phase> {
        world.creatures.get(&enemy).map(|creature| creature.phase())
    }

    /// Read-only snapshot of a creature's head, phase, segments and eyes.
    #[must_use]
    pub fn creature(world: &World, enemy: EnemyId) -> Option<CreatureSnapshot> {
        world.creatures.get(&enemy).map(|creature| creature.snapshot())
    }

    /// Entity pursued by a creature.
    #[must_use]
    pub fn pursued_target(world: &World, enemy: EnemyId) -> Option<TargetId> {
        world.creatures.get(&enemy).map(|creature| creature.target())
    }

    /// Remaining health of a scalar-health enemy.
    #[must_use]
    pub fn simple_enemy_health(world: &World, enemy: EnemyId) -> Option<f32> {
        world.simple_enemies.get(&enemy).map(|enemy| enemy.health())
    }

    /// Latest observation cached for a target.
    #[must_use]
    pub fn target(world: &World, target: TargetId) -> Option<TargetSnapshot> {
        world.targets.get(&target).copied()
    }
}

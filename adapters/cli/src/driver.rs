//! Headless run loop feeding a world from a scenario.

use std::{f32::consts::TAU, fmt, io::Write, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use log::{debug, info};
use sandworm_core::{Command, EnemyId, Event, PhaseKind, TargetId};
use sandworm_system_terrain::{Heightfield, Obstacle};
use sandworm_world::{self as world, query, World};

use crate::{
    report::EventRecord,
    scenario::{Scenario, TerrainSpec},
    wanderer::Wanderer,
};

const TARGET: TargetId = TargetId::new(1);

/// How event records are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Tally of a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) simulated: Duration,
    pub(crate) emerges: usize,
    pub(crate) burrows: usize,
    pub(crate) failsafes: usize,
    pub(crate) shots: usize,
    pub(crate) eyes_destroyed: usize,
    pub(crate) surviving_eyes: usize,
    pub(crate) creature_died: bool,
}

impl Summary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EmergeStarted { .. } => self.emerges += 1,
            Event::BurrowStarted { .. } => self.burrows += 1,
            Event::FailsafeReset { .. } => self.failsafes += 1,
            Event::EyeDestroyed { .. } => self.eyes_destroyed += 1,
            Event::EnemyDied { .. } => self.creature_died = true,
            _ => {}
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks over {:.2}s: {} emerges, {} burrows, {} failsafe resets, {} shots, {} eyes destroyed, {} left",
            self.ticks,
            self.simulated.as_secs_f32(),
            self.emerges,
            self.burrows,
            self.failsafes,
            self.shots,
            self.eyes_destroyed,
            self.surviving_eyes
        )?;
        if self.creature_died {
            write!(f, ", creature killed")?;
        }
        Ok(())
    }
}

/// Rolling hills built from two crossed sine waves.
#[derive(Clone, Copy, Debug)]
struct Hills {
    amplitude: f32,
    wavenumber: f32,
}

impl Hills {
    fn height(&self, x: f32, z: f32) -> f32 {
        0.5 * self.amplitude * ((x * self.wavenumber).sin() + (z * self.wavenumber).sin())
    }
}

impl From<&TerrainSpec> for Hills {
    fn from(spec: &TerrainSpec) -> Self {
        Self {
            amplitude: spec.amplitude,
            wavenumber: TAU / spec.wavelength,
        }
    }
}

/// Runs `scenario` to completion, writing every reported event to `out`.
pub(crate) fn run<W: Write>(scenario: &Scenario, format: Format, out: &mut W) -> Result<Summary> {
    let hills = Hills::from(&scenario.terrain);
    let terrain = scenario.obstacles.iter().fold(
        Heightfield::new(move |x: f32, z: f32| hills.height(x, z)),
        |terrain, obstacle| terrain.with_obstacle(Obstacle::new(obstacle.center, obstacle.radius)),
    );
    let mut world = World::new(Box::new(terrain));
    let mut events = Vec::new();
    let mut summary = Summary::default();

    world::apply(
        &mut world,
        Command::SpawnCreature {
            position: Vec3::new(0.0, hills.height(0.0, 0.0), 0.0),
            forward: Vec3::Z,
            target: TARGET,
            config: scenario.creature.clone(),
        },
        &mut events,
    );
    flush(&world, &mut events, &mut summary, format, out)?;
    let Some(enemy) = query::creature_ids(&world).first().copied() else {
        bail!("creature spawn was rejected");
    };

    let mut wanderer = Wanderer::new(scenario.target, scenario.seed);
    let dt = scenario.tick();
    let shot_interval = scenario.shooter.interval;
    let mut next_shot = shot_interval;

    for _ in 0..scenario.tick_count() {
        let observed = wanderer.step(dt.as_secs_f32(), |x, z| hills.height(x, z));
        world::apply(
            &mut world,
            Command::ObserveTarget {
                target: TARGET,
                position: observed.position,
                velocity: observed.velocity,
            },
            &mut events,
        );
        world::apply(&mut world, Command::Tick { dt }, &mut events);
        summary.ticks += 1;

        if query::clock(&world).as_secs_f32() >= next_shot {
            next_shot += shot_interval;
            let damage = scenario.shooter.damage;
            if fire(&mut world, enemy, observed.position, damage, &mut events) {
                summary.shots += 1;
            }
        }

        flush(&world, &mut events, &mut summary, format, out)?;
        if summary.creature_died {
            info!("{enemy} killed after {} ticks", summary.ticks);
            break;
        }
    }

    out.flush().context("failed to flush event log")?;
    summary.simulated = query::clock(&world);
    summary.surviving_eyes =
        query::creature(&world, enemy).map_or(0, |creature| creature.live_eyes());
    Ok(summary)
}

/// Shoots the live eye closest to the shooter while the creature is exposed.
fn fire(
    world: &mut World,
    enemy: EnemyId,
    shooter: Vec3,
    damage: f32,
    events: &mut Vec<Event>,
) -> bool {
    let Some(creature) = query::creature(world, enemy) else {
        return false;
    };
    if creature.phase.kind() != PhaseKind::Surfaced {
        return false;
    }
    let Some(eye) = creature
        .eyes()
        .filter(|eye| !eye.destroyed)
        .min_by(|a, b| {
            a.position
                .distance_squared(shooter)
                .total_cmp(&b.position.distance_squared(shooter))
        })
    else {
        return false;
    };

    debug!("shooting {enemy} at {}", eye.position);
    world::apply(
        world,
        Command::ApplyHit {
            enemy,
            hit_point: eye.position,
            damage,
        },
        events,
    );
    true
}

fn flush<W: Write>(
    world: &World,
    events: &mut Vec<Event>,
    summary: &mut Summary,
    format: Format,
    out: &mut W,
) -> Result<()> {
    let clock = query::clock(world);
    for event in events.drain(..) {
        summary.record(&event);
        let Some(record) = EventRecord::from_event(clock, &event) else {
            continue;
        };
        match format {
            Format::Text => writeln!(out, "{record}").context("failed to write event")?,
            Format::Json => {
                serde_json::to_writer(&mut *out, &record).context("failed to encode event")?;
                writeln!(out).context("failed to write event")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ShooterSpec, TargetSpec};
    use sandworm_core::CreatureConfig;

    fn still_target_scenario(seconds: f32, shooter: ShooterSpec) -> Scenario {
        Scenario {
            seconds,
            tick_hz: 100,
            terrain: TerrainSpec {
                amplitude: 0.0,
                wavelength: 40.0,
            },
            target: TargetSpec {
                start: Vec3::new(15.0, 0.0, 0.0),
                speed: 0.0,
                ..TargetSpec::default()
            },
            shooter,
            ..Scenario::default()
        }
    }

    #[test]
    fn identical_scenarios_write_identical_logs() {
        let scenario = Scenario {
            seconds: 20.0,
            ..Scenario::default()
        };
        let mut first = Vec::new();
        let mut second = Vec::new();

        let first_summary = run(&scenario, Format::Text, &mut first).expect("first run");
        let second_summary = run(&scenario, Format::Text, &mut second).expect("second run");

        assert_eq!(first, second);
        assert_eq!(first_summary, second_summary);
        assert!(String::from_utf8(first)
            .expect("utf8")
            .starts_with("[   0.000s] creature_spawned enemy#0"));
    }

    #[test]
    fn harmless_shooter_sees_a_full_cycle() {
        let scenario = still_target_scenario(
            8.0,
            ShooterSpec {
                damage: 0.0,
                interval: 0.5,
            },
        );
        let mut log = Vec::new();
        let summary = run(&scenario, Format::Text, &mut log).expect("run");

        assert_eq!(summary.ticks, 800);
        assert!(summary.emerges >= 1);
        assert!(summary.burrows >= 1);
        assert!(summary.shots >= 1);
        assert_eq!(summary.eyes_destroyed, 0);
        assert_eq!(summary.surviving_eyes, 12);
        assert!(!summary.creature_died);
    }

    #[test]
    fn exposed_creature_can_be_killed() {
        let mut scenario = still_target_scenario(
            10.0,
            ShooterSpec {
                damage: 50.0,
                interval: 0.5,
            },
        );
        scenario.creature = CreatureConfig {
            segment_count: 1,
            eye_offsets: vec![Vec3::new(0.0, 0.5, 0.0)],
            eye_hit_points: 10.0,
            ..CreatureConfig::default()
        };
        let mut log = Vec::new();
        let summary = run(&scenario, Format::Json, &mut log).expect("run");

        assert!(summary.creature_died);
        assert_eq!(summary.eyes_destroyed, 1);
        assert_eq!(summary.surviving_eyes, 0);
        assert!(summary.ticks < 1_000);

        let log = String::from_utf8(log).expect("utf8");
        let kinds: Vec<String> = log
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).expect("json line");
                value["kind"].as_str().expect("kind").to_owned()
            })
            .collect();
        assert_eq!(kinds.first().map(String::as_str), Some("creature_spawned"));
        assert_eq!(kinds.last().map(String::as_str), Some("enemy_died"));
    }
}

//! Scenario files that describe a headless run.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use sandworm_core::CreatureConfig;
use serde::Deserialize;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Everything needed to reproduce a run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) version: u32,
    pub(crate) seed: u64,
    pub(crate) seconds: f32,
    pub(crate) tick_hz: u32,
    pub(crate) terrain: TerrainSpec,
    pub(crate) obstacles: Vec<ObstacleSpec>,
    pub(crate) target: TargetSpec,
    pub(crate) shooter: ShooterSpec,
    pub(crate) creature: CreatureConfig,
}

/// Rolling hills described by two crossed sine waves.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TerrainSpec {
    pub(crate) amplitude: f32,
    pub(crate) wavelength: f32,
}

/// Spherical obstacle resting on the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ObstacleSpec {
    pub(crate) center: Vec3,
    pub(crate) radius: f32,
}

/// Wandering target pursued by the creature.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TargetSpec {
    pub(crate) start: Vec3,
    pub(crate) speed: f32,
    pub(crate) altitude: f32,
    pub(crate) leash_radius: f32,
    pub(crate) turn_interval: f32,
}

/// Periodic shots fired at the nearest live eye while the creature is exposed.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ShooterSpec {
    pub(crate) damage: f32,
    pub(crate) interval: f32,
}

impl Scenario {
    /// Length of one simulation step.
    pub(crate) fn tick(&self) -> Duration {
        Duration::from_secs(1) / self.tick_hz.max(1)
    }

    /// Number of steps needed to cover the configured duration.
    pub(crate) fn tick_count(&self) -> u64 {
        (f64::from(self.seconds) * f64::from(self.tick_hz)).ceil() as u64
    }

    /// Rejects scenarios the driver cannot run.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                self.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }
        if self.tick_hz == 0 {
            bail!("tick_hz must be at least 1");
        }
        if !self.seconds.is_finite() || self.seconds <= 0.0 {
            bail!("seconds must be positive, got {}", self.seconds);
        }
        if self.terrain.wavelength <= 0.0 {
            bail!("terrain wavelength must be positive");
        }
        if self.target.turn_interval <= 0.0 || self.shooter.interval <= 0.0 {
            bail!("target turn interval and shooter interval must be positive");
        }
        self.creature
            .validate()
            .context("creature configuration rejected")?;
        Ok(())
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            version: SUPPORTED_SCENARIO_VERSION,
            seed: 0x5eed_0f_d00e,
            seconds: 60.0,
            tick_hz: 60,
            terrain: TerrainSpec::default(),
            obstacles: Vec::new(),
            target: TargetSpec::default(),
            shooter: ShooterSpec::default(),
            creature: CreatureConfig::default(),
        }
    }
}

impl Default for TerrainSpec {
    fn default() -> Self {
        Self {
            amplitude: 1.5,
            wavelength: 40.0,
        }
    }
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            start: Vec3::new(12.0, 0.0, 0.0),
            speed: 4.0,
            altitude: 0.0,
            leash_radius: 25.0,
            turn_interval: 1.5,
        }
    }
}

impl Default for ShooterSpec {
    fn default() -> Self {
        Self {
            damage: 20.0,
            interval: 0.5,
        }
    }
}

/// Reads and validates a scenario from `path`.
pub(crate) fn load(path: &Path) -> Result<Scenario> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
}

fn parse(contents: &str) -> Result<Scenario> {
    let scenario: Scenario =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    scenario.validate()?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let scenario = parse("").expect("defaults are valid");
        assert_eq!(scenario, Scenario::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let scenario = parse(
            r#"
            seed = 7
            tick_hz = 30

            [creature]
            segment_count = 3
            surface_duration = 1.5

            [[obstacles]]
            center = [4.0, 0.0, -2.0]
            radius = 1.0
            "#,
        )
        .expect("scenario parses");

        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.tick(), Duration::from_secs(1) / 30);
        assert_eq!(scenario.creature.segment_count, 3);
        assert_eq!(scenario.creature.surface_duration, Duration::from_millis(1_500));
        assert_eq!(
            scenario.creature.emerge_speed,
            CreatureConfig::default().emerge_speed
        );
        assert_eq!(
            scenario.obstacles,
            vec![ObstacleSpec {
                center: Vec3::new(4.0, 0.0, -2.0),
                radius: 1.0
            }]
        );
    }

    #[test]
    fn bundled_dunes_scenario_is_valid() {
        let scenario = parse(include_str!("../scenarios/dunes.toml")).expect("bundled scenario");
        assert_eq!(scenario.seed, 1337);
        assert_eq!(scenario.obstacles.len(), 2);
        assert_eq!(scenario.creature.segment_count, 8);
        assert_eq!(scenario.tick_count(), 5_400);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let error = parse("version = 2").expect_err("version 2 is unsupported");
        assert!(error.to_string().contains("unsupported scenario version 2"));
    }

    #[test]
    fn invalid_creature_is_rejected() {
        let error = parse("[creature]\nmin_attack_distance = 40.0").expect_err("window inverted");
        assert_eq!(error.to_string(), "creature configuration rejected");
    }

    #[test]
    fn tick_count_covers_duration() {
        let scenario = Scenario {
            seconds: 0.125,
            tick_hz: 60,
            ..Scenario::default()
        };
        assert_eq!(scenario.tick_count(), 8);
    }
}

//! Flat, serializable rendering of world events.

use std::{fmt, time::Duration};

use glam::Vec3;
use sandworm_core::Event;
use serde::Serialize;

/// One line of the run log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct EventRecord {
    pub(crate) time: f32,
    pub(crate) kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) enemy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) position: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
}

impl EventRecord {
    /// Converts `event` observed at `clock`. Clock ticks are not reported.
    pub(crate) fn from_event(clock: Duration, event: &Event) -> Option<Self> {
        let build = |kind: &'static str,
                     enemy: Option<u32>,
                     position: Option<Vec3>,
                     detail: Option<String>| Self {
            time: clock.as_secs_f32(),
            kind,
            enemy,
            position,
            detail,
        };

        let record = match event {
            Event::TimeAdvanced { .. } => return None,
            Event::CreatureSpawned {
                enemy,
                segments,
                eyes,
            } => build(
                "creature_spawned",
                Some(enemy.get()),
                None,
                Some(format!("{segments} segments, {eyes} eyes")),
            ),
            Event::SimpleEnemySpawned { enemy } => {
                build("simple_enemy_spawned", Some(enemy.get()), None, None)
            }
            Event::SpawnRejected { reason } => {
                build("spawn_rejected", None, None, Some(reason.to_string()))
            }
            Event::PhaseChanged { enemy, from, to } => build(
                "phase_changed",
                Some(enemy.get()),
                None,
                Some(format!("{from:?} -> {to:?}")),
            ),
            Event::EmergeStarted { enemy, position } => {
                build("emerge_started", Some(enemy.get()), Some(*position), None)
            }
            Event::BurrowStarted { enemy, position } => {
                build("burrow_started", Some(enemy.get()), Some(*position), None)
            }
            Event::FailsafeReset { enemy, anchor } => {
                build("failsafe_reset", Some(enemy.get()), Some(*anchor), None)
            }
            Event::EyeDestroyed {
                enemy,
                eye,
                position,
            } => build(
                "eye_destroyed",
                Some(enemy.get()),
                Some(*position),
                Some(format!("segment {} slot {}", eye.segment(), eye.slot())),
            ),
            Event::CollectibleRequested { position, follow } => build(
                "collectible_requested",
                None,
                Some(*position),
                Some(format!("follows {follow}")),
            ),
            Event::EnemyDied { enemy, position } => {
                build("enemy_died", Some(enemy.get()), Some(*position), None)
            }
        };
        Some(record)
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:>8.3}s] {}", self.time, self.kind)?;
        if let Some(enemy) = self.enemy {
            write!(f, " enemy#{enemy}")?;
        }
        if let Some(position) = self.position {
            write!(
                f,
                " at ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            )?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandworm_core::{EnemyId, PhaseKind, TargetId};

    #[test]
    fn clock_ticks_are_not_reported() {
        let event = Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        };
        assert_eq!(EventRecord::from_event(Duration::ZERO, &event), None);
    }

    #[test]
    fn phase_change_renders_as_text() {
        let event = Event::PhaseChanged {
            enemy: EnemyId::new(2),
            from: PhaseKind::Burrowed,
            to: PhaseKind::Emerging,
        };
        let record =
            EventRecord::from_event(Duration::from_millis(1_500), &event).expect("reported");

        assert_eq!(
            record.to_string(),
            "[   1.500s] phase_changed enemy#2 (Burrowed -> Emerging)"
        );
    }

    #[test]
    fn json_lines_skip_missing_fields() {
        let event = Event::CollectibleRequested {
            position: Vec3::new(1.0, 2.0, 3.0),
            follow: TargetId::new(1),
        };
        let record = EventRecord::from_event(Duration::from_secs(2), &event).expect("reported");
        let json = serde_json::to_string(&record).expect("serializes");

        assert_eq!(
            json,
            r#"{"time":2.0,"kind":"collectible_requested","position":[1.0,2.0,3.0],"detail":"follows target#1"}"#
        );
    }
}

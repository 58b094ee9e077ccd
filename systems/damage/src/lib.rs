#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Damage model for segmented creatures whose eyes are destroyed one by one.

use glam::Vec3;
use log::{debug, info};
use sandworm_core::{EnemyId, Event, EyeId, HitOutcome, Segment, TargetId};

/// Identity of the creature receiving a hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitContext {
    /// Creature being hit.
    pub enemy: EnemyId,
    /// Entity that collectibles spawned by this hit should follow.
    pub follow: TargetId,
    /// Current head position, where the death collectible appears.
    pub head: Vec3,
}

/// Locates the live eye closest to `point`.
///
/// Ties resolve to the eye with the lowest segment index and slot.
#[must_use]
pub fn nearest_live_eye(segments: &[Segment], point: Vec3) -> Option<EyeId> {
    let mut nearest: Option<(EyeId, f32)> = None;
    for (segment_index, segment) in segments.iter().enumerate() {
        for (slot, eye) in segment.eyes.iter().enumerate() {
            if !eye.is_live() {
                continue;
            }
            let distance = eye.pose.position.distance_squared(point);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((EyeId::new(index(segment_index), index(slot)), distance));
            }
        }
    }
    nearest.map(|(id, _)| id)
}

/// Reports whether the creature owns eyes and all of them are destroyed.
#[must_use]
pub fn all_eyes_destroyed(segments: &[Segment]) -> bool {
    let mut eyes = segments.iter().flat_map(|segment| segment.eyes.iter()).peekable();
    eyes.peek().is_some() && eyes.all(|eye| eye.destroyed)
}

/// Applies `damage` to the live eye nearest `hit_point`.
///
/// Negative or NaN damage counts as zero so hit points never rise.
/// Destroying an eye requests a collectible at the eye, marks its segment
/// destroyed once every eye on it is gone, and kills the creature when it was
/// the last live eye overall. Hits are ignored once no live eye remains.
pub fn apply_hit(
    segments: &mut [Segment],
    context: &HitContext,
    hit_point: Vec3,
    damage: f32,
    out: &mut Vec<Event>,
) -> HitOutcome {
    let Some(id) = nearest_live_eye(segments, hit_point) else {
        return HitOutcome::Ignored;
    };
    let Some(segment) = segments.get_mut(id.segment() as usize) else {
        return HitOutcome::Ignored;
    };
    let Some(eye) = segment.eyes.get_mut(id.slot() as usize) else {
        return HitOutcome::Ignored;
    };

    let damage = damage.max(0.0);
    eye.hit_points -= damage;
    if eye.hit_points > 0.0 {
        debug!(
            "{} eye {}:{} absorbed {damage}, {} left",
            context.enemy,
            id.segment(),
            id.slot(),
            eye.hit_points
        );
        return HitOutcome::Absorbed;
    }

    eye.destroyed = true;
    let position = eye.pose.position;
    info!(
        "{} lost eye {}:{} at {position}",
        context.enemy,
        id.segment(),
        id.slot()
    );
    out.push(Event::EyeDestroyed {
        enemy: context.enemy,
        eye: id,
        position,
    });
    out.push(Event::CollectibleRequested {
        position,
        follow: context.follow,
    });

    if segment.all_eyes_destroyed() {
        segment.destroyed = true;
        debug!("{} segment {} destroyed", context.enemy, id.segment());
    }

    if all_eyes_destroyed(segments) {
        info!("{} died", context.enemy);
        out.push(Event::CollectibleRequested {
            position: context.head + Vec3::Y,
            follow: context.follow,
        });
        out.push(Event::EnemyDied {
            enemy: context.enemy,
            position: context.head,
        });
        return HitOutcome::Killed;
    }

    HitOutcome::ComponentDestroyed
}

fn index(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use sandworm_core::{Eye, Pose};

    fn context() -> HitContext {
        HitContext {
            enemy: EnemyId::new(3),
            follow: TargetId::new(1),
            head: Vec3::new(0.0, 1.0, 0.0),
        }
    }

    fn segment_with_eyes(position: Vec3, offsets: &[Vec3], hit_points: f32) -> Segment {
        let pose = Pose::at(position);
        let eyes = offsets
            .iter()
            .map(|offset| Eye::mounted(*offset, &pose, hit_points))
            .collect();
        Segment::new(pose, Duration::from_millis(100), eyes)
    }

    #[test]
    fn nearest_eye_takes_the_hit() {
        let segments = vec![
            segment_with_eyes(Vec3::ZERO, &[-Vec3::X, Vec3::X], 10.0),
            segment_with_eyes(Vec3::Z * 5.0, &[Vec3::X], 10.0),
        ];

        assert_eq!(
            nearest_live_eye(&segments, Vec3::new(1.2, 0.0, 0.3)),
            Some(EyeId::new(0, 1))
        );
        assert_eq!(
            nearest_live_eye(&segments, Vec3::new(0.0, 0.0, 4.0)),
            Some(EyeId::new(1, 0))
        );
    }

    #[test]
    fn destroyed_eyes_are_skipped() {
        let mut segments = vec![segment_with_eyes(Vec3::ZERO, &[-Vec3::X, Vec3::X], 10.0)];
        segments[0].eyes[1].destroyed = true;

        assert_eq!(
            nearest_live_eye(&segments, Vec3::X),
            Some(EyeId::new(0, 0))
        );
    }

    #[test]
    fn two_hits_destroy_a_fifty_point_eye() {
        let mut segments = vec![
            segment_with_eyes(Vec3::ZERO, &[Vec3::X], 50.0),
            segment_with_eyes(Vec3::Z * 4.0, &[Vec3::X], 50.0),
        ];
        let mut events = Vec::new();

        let first = apply_hit(&mut segments, &context(), Vec3::X, 30.0, &mut events);
        assert_eq!(first, HitOutcome::Absorbed);
        assert_eq!(segments[0].eyes[0].hit_points, 20.0);
        assert!(!segments[0].eyes[0].destroyed);
        assert!(events.is_empty());

        let second = apply_hit(&mut segments, &context(), Vec3::X, 30.0, &mut events);
        assert_eq!(second, HitOutcome::ComponentDestroyed);
        assert!(segments[0].eyes[0].destroyed);
        assert!(segments[0].eyes[0].hit_points <= 0.0);
        assert!(segments[0].destroyed);

        let destroyed = events
            .iter()
            .filter(|event| matches!(event, Event::EyeDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 1);
        assert!(events.contains(&Event::CollectibleRequested {
            position: Vec3::X,
            follow: TargetId::new(1)
        }));
    }

    #[test]
    fn segment_survives_while_any_eye_lives() {
        let mut segments = vec![segment_with_eyes(Vec3::ZERO, &[-Vec3::X, Vec3::X], 5.0)];
        let mut events = Vec::new();

        let outcome = apply_hit(&mut segments, &context(), Vec3::X, 10.0, &mut events);
        assert_eq!(outcome, HitOutcome::ComponentDestroyed);
        assert!(!segments[0].destroyed);
    }

    #[test]
    fn last_eye_kills_once() {
        let mut segments = vec![segment_with_eyes(Vec3::ZERO, &[-Vec3::X, Vec3::X], 5.0)];
        let mut events = Vec::new();

        let _ = apply_hit(&mut segments, &context(), Vec3::X, 10.0, &mut events);
        let outcome = apply_hit(&mut segments, &context(), Vec3::X, 10.0, &mut events);
        assert_eq!(outcome, HitOutcome::Killed);

        let after = apply_hit(&mut segments, &context(), Vec3::X, 10.0, &mut events);
        assert_eq!(after, HitOutcome::Ignored);

        let deaths: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::EnemyDied { .. }))
            .collect();
        assert_eq!(
            deaths,
            vec![&Event::EnemyDied {
                enemy: EnemyId::new(3),
                position: Vec3::new(0.0, 1.0, 0.0)
            }]
        );
        assert!(events.contains(&Event::CollectibleRequested {
            position: Vec3::new(0.0, 2.0, 0.0),
            follow: TargetId::new(1)
        }));
    }

    #[test]
    fn eyeless_creature_ignores_hits() {
        let mut segments = vec![segment_with_eyes(Vec3::ZERO, &[], 5.0)];
        let mut events = Vec::new();
        let outcome = apply_hit(&mut segments, &context(), Vec3::ZERO, 10.0, &mut events);
        assert_eq!(outcome, HitOutcome::Ignored);
        assert!(!all_eyes_destroyed(&segments));
    }

    #[test]
    fn negative_and_nan_damage_leave_the_eye_intact() {
        let mut segments = vec![segment_with_eyes(Vec3::ZERO, &[Vec3::X], 50.0)];
        let mut events = Vec::new();

        for damage in [-5.0, f32::NAN] {
            let outcome = apply_hit(&mut segments, &context(), Vec3::X, damage, &mut events);
            assert_eq!(outcome, HitOutcome::Absorbed);
            assert_eq!(segments[0].eyes[0].hit_points, 50.0);
        }
        assert!(!segments[0].eyes[0].destroyed);
        assert!(events.is_empty());
    }
}

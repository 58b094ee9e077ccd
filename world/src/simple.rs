//! Enemy whose health is a single scalar.

use glam::Vec3;
use log::info;
use sandworm_core::{Damageable, EnemyId, Event, HitOutcome, TargetId};

#[derive(Clone, Debug)]
pub(crate) struct SimpleEnemy {
    id: EnemyId,
    position: Vec3,
    health: f32,
    follow: TargetId,
    dead: bool,
}

impl SimpleEnemy {
    pub(crate) fn new(id: EnemyId, position: Vec3, max_health: f32, follow: TargetId) -> Self {
        Self {
            id,
            position,
            health: max_health,
            follow,
            dead: false,
        }
    }

    pub(crate) const fn health(&self) -> f32 {
        self.health
    }
}

impl Damageable for SimpleEnemy {
    fn apply_hit(&mut self, _hit_point: Vec3, damage: f32, out: &mut Vec<Event>) -> HitOutcome {
        if self.dead {
            return HitOutcome::Ignored;
        }

        self.health -= damage.max(0.0);
        if self.health > 0.0 {
            return HitOutcome::Absorbed;
        }

        self.dead = true;
        info!("{} died at {}", self.id, self.position);
        out.push(Event::CollectibleRequested {
            position: self.position + Vec3::Y,
            follow: self.follow,
        });
        out.push(Event::EnemyDied {
            enemy: self.id,
            position: self.position,
        });
        HitOutcome::Killed
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

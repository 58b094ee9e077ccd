//! Pairwise separation of live segments.

use glam::Vec3;
use sandworm_core::Segment;

const MAX_PASSES: usize = 32;
const TOLERANCE: f32 = 1e-4;

/// Pushes overlapping live segments apart until every pair is at least
/// `min_distance` apart or the pass budget runs out.
///
/// Each violating pair moves symmetrically by half the deficit and both
/// targets are reset to the corrected positions so the follower does not pull
/// them back together. Coincident segments separate along +X. Returns the
/// number of corrections made.
pub fn enforce_spacing(segments: &mut [Segment], min_distance: f32) -> usize {
    let mut corrections = 0;
    for _ in 0..MAX_PASSES {
        let pass = relax_once(segments, min_distance);
        corrections += pass;
        if pass == 0 {
            break;
        }
    }
    corrections
}

fn relax_once(segments: &mut [Segment], min_distance: f32) -> usize {
    let mut corrections = 0;
    for split in 1..segments.len() {
        let (front, back) = segments.split_at_mut(split);
        let Some(first) = front.last_mut() else {
            continue;
        };
        if !first.is_live() {
            continue;
        }

        for second in back.iter_mut().filter(|segment| segment.is_live()) {
            let offset = second.pose.position - first.pose.position;
            let distance = offset.length();
            if distance >= min_distance - TOLERANCE {
                continue;
            }

            let direction = offset.try_normalize().unwrap_or(Vec3::X);
            let push = direction * ((min_distance - distance) * 0.5);
            first.place_at(first.pose.position - push);
            second.place_at(second.pose.position + push);
            corrections += 1;
        }
    }
    corrections
}

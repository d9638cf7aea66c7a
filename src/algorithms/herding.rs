use crate::models::agents::{Kinematics, Sheep, Shepherd};
use crate::sim::SimConfig;
use nalgebra::Vector2;
use rand::Rng;
use serde::Serialize;
use std::f64::consts::TAU;

/// Crawl factor applied to the shepherd while it is inside the flock's
/// personal space.
pub const SLOW_FACTOR: f64 = 0.05;

/// Steering regime chosen for one tick. Selection is memoryless: it is
/// re-derived from the current geometry every tick, so the shepherd may
/// switch regimes between consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShepherdMode {
    /// Close enough to a sheep that the shepherd creeps on its previous
    /// heading instead of pursuing a target.
    SlowApproach,
    /// A straggler drifted past the cohesion threshold; aim behind it.
    Collect,
    /// The flock is gathered; aim behind the barycenter, away from the goal.
    Drive,
}

/// Distance from the shepherd to its nearest sheep, if any sheep exist.
pub fn nearest_sheep_distance(shepherd: &Shepherd, flock: &[Sheep]) -> Option<f64> {
    flock
        .iter()
        .map(|s| (s.pos - shepherd.pos).norm())
        .min_by(|a, b| a.total_cmp(b))
}

/// Pick the pursuit target from the current flock geometry.
///
/// Returns `None` for an empty flock. Collect aims `p_collect` past the
/// farthest sheep along its barycenter offset; drive aims `p_drive` past
/// the barycenter on the side away from the goal. When every sheep sits
/// exactly on the barycenter the collect geometry is undefined and the
/// drive formula is used instead.
pub fn select_target(flock: &[Sheep], cfg: &SimConfig) -> Option<(ShepherdMode, Vector2<f64>)> {
    if flock.is_empty() {
        return None;
    }

    let barycenter = flock.iter().map(|s| s.pos).sum::<Vector2<f64>>() / flock.len() as f64;

    let mut far_offset = Vector2::zeros();
    let mut d_far = 0.0;
    for sheep in flock {
        let offset = sheep.pos - barycenter;
        let dist = offset.norm();
        if dist > d_far {
            d_far = dist;
            far_offset = offset;
        }
    }

    if d_far > cfg.f_n && d_far > 0.0 {
        let target = barycenter + far_offset / d_far * (d_far + cfg.p_collect);
        return Some((ShepherdMode::Collect, target));
    }

    let away = barycenter - cfg.goal();
    let norm = away.norm();
    let direction = if norm > 0.0 { away / norm } else { Vector2::zeros() };
    Some((ShepherdMode::Drive, barycenter + direction * cfg.p_drive))
}

/// Advance one shepherd by one tick against the pre-move flock.
///
/// Returns the regime that was applied, or `None` when there are no sheep
/// to react to (the shepherd then holds position). Zero-norm pursuit
/// geometry also holds position for the tick; neither case is an error.
pub fn update_shepherd<R: Rng>(
    shepherd: &mut Shepherd,
    flock: &[Sheep],
    cfg: &SimConfig,
    rng: &mut R,
) -> Option<ShepherdMode> {
    let nearest = nearest_sheep_distance(shepherd, flock)?;

    // Inside the flock's personal space: decelerate to a crawl on the
    // previous heading. A shepherd that was at rest stays at rest.
    if nearest < cfg.d_rep {
        shepherd.vel *= SLOW_FACTOR;
        shepherd.pos += shepherd.vel * cfg.dt;
        return Some(ShepherdMode::SlowApproach);
    }

    let (mode, target) = select_target(flock, cfg)?;

    let to_target = target - shepherd.pos;
    let dist = to_target.norm();
    if dist == 0.0 {
        return Some(mode);
    }

    // Noisy pursuit: jitter the bearing with a random unit vector scaled
    // by the noise strength, then renormalize.
    let angle = rng.random_range(0.0..TAU);
    let jittered = to_target / dist + Vector2::new(angle.cos(), angle.sin()) * cfg.noise;
    let norm = jittered.norm();
    if norm == 0.0 {
        return Some(mode);
    }

    shepherd.vel = jittered / norm * cfg.v_dog;
    shepherd.pos += shepherd.vel * cfg.dt;
    Some(mode)
}

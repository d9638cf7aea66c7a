use crate::models::agents::{Kinematics, Sheep, Shepherd};
use crate::sim::SimConfig;
use nalgebra::Vector2;
use rand::Rng;
use rand::seq::index::sample;

/// Per-tick social force breakdown for one sheep.
///
/// These are transient values: recomputed from the pre-move state every
/// tick and consumed by [`blend_velocity`], never carried across ticks.
/// The noise slot keeps the raw uniform draws; the blend maps them onto
/// [-1, 1) and applies the configured strength.
#[derive(Debug, Clone, Copy)]
pub struct SocialForces {
    pub attraction: Vector2<f64>,
    pub alignment: Vector2<f64>,
    pub repulsion: Vector2<f64>,
    pub shepherd_repulsion: Vector2<f64>,
    pub noise: (f64, f64),
}

impl SocialForces {
    fn zero() -> Self {
        Self {
            attraction: Vector2::zeros(),
            alignment: Vector2::zeros(),
            repulsion: Vector2::zeros(),
            shepherd_repulsion: Vector2::zeros(),
            noise: (0.0, 0.0),
        }
    }
}

/// Compute the social forces acting on the sheep at `index`.
///
/// Every read is against the pre-move flock and shepherd positions, so the
/// caller may evaluate all sheep in any order (or in parallel) before
/// integrating. Neighbor sampling is without replacement; sample sizes are
/// clamped to what is available, and pairs at exactly zero distance are
/// skipped in the directional sums.
pub fn social_forces<R: Rng>(
    index: usize,
    flock: &[Sheep],
    shepherds: &[Shepherd],
    cfg: &SimConfig,
    rng: &mut R,
) -> SocialForces {
    let mut forces = SocialForces::zero();
    let sheep = &flock[index];

    // Neighbor list index -> flock index, skipping ourselves.
    let neighbor = |j: usize| if j < index { j } else { j + 1 };
    let neighbor_count = flock.len() - 1;

    // Attraction toward a random subset of the flock.
    let k_att = cfg.n_att.min(neighbor_count);
    let mut att_sample = Vec::new();
    if k_att > 0 {
        att_sample = sample(rng, neighbor_count, k_att)
            .iter()
            .map(neighbor)
            .collect::<Vec<_>>();

        let mut sum = Vector2::zeros();
        for &j in &att_sample {
            let offset = flock[j].pos - sheep.pos;
            let dist = offset.norm();
            if dist > 0.0 {
                sum += offset / dist;
            }
        }
        forces.attraction = sum * (cfg.w_att / k_att as f64);
    }

    // Alignment with a further subsample of the attraction sample.
    let k_ali = cfg.n_ali.min(k_att);
    if k_ali > 0 {
        let mut sum = Vector2::zeros();
        for pick in sample(rng, att_sample.len(), k_ali) {
            sum += flock[att_sample[pick]].direction();
        }
        forces.alignment = sum * (cfg.w_ali / k_ali as f64);
    }

    // Short-range repulsion from every flockmate inside d_rep.
    let mut rep_sum = Vector2::zeros();
    let mut rep_count = 0usize;
    for (j, other) in flock.iter().enumerate() {
        if j == index {
            continue;
        }
        let offset = other.pos - sheep.pos;
        let dist = offset.norm();
        if dist > 0.0 && dist < cfg.d_rep {
            rep_sum += offset / dist;
            rep_count += 1;
        }
    }
    if rep_count > 0 {
        forces.repulsion = rep_sum * (-cfg.w_rep / rep_count as f64);
    }

    // Repulsion from every shepherd inside d_dog. Contributions are summed
    // rather than taking the nearest shepherd only, so two dogs flanking a
    // sheep both push on it.
    let mut dog_sum = Vector2::zeros();
    for dog in shepherds {
        let offset = sheep.pos - dog.pos;
        let dist = offset.norm();
        if dist > 0.0 && dist < cfg.d_dog {
            dog_sum += offset / dist;
        }
    }
    forces.shepherd_repulsion = dog_sum * cfg.w_dog;

    forces.noise = (rng.random::<f64>(), rng.random::<f64>());
    forces
}

/// Blend the force breakdown with the previous travel direction and return
/// the sheep's velocity for this tick.
///
/// A zero-norm blend means the sheep stops for the tick; that is the
/// defined outcome for a lone, unforced sheep, not an error.
pub fn blend_velocity(sheep: &Sheep, forces: &SocialForces, cfg: &SimConfig) -> Vector2<f64> {
    let noise = Vector2::new(
        (forces.noise.0 - 0.5) * 2.0,
        (forces.noise.1 - 0.5) * 2.0,
    ) * cfg.noise;

    let heading = sheep.direction() * cfg.inertia
        + forces.attraction
        + forces.alignment
        + forces.repulsion
        + forces.shepherd_repulsion
        + noise;

    let norm = heading.norm();
    if norm > 0.0 {
        heading / norm * cfg.v_sheep
    } else {
        Vector2::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn quiet_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.noise = 0.0;
        cfg
    }

    #[test]
    fn lone_sheep_feels_no_social_forces() {
        let cfg = quiet_config();
        let flock = vec![Sheep::new(10.0, 10.0)];
        let mut rng = SmallRng::seed_from_u64(1);

        let forces = social_forces(0, &flock, &[], &cfg, &mut rng);
        assert_eq!(forces.attraction, Vector2::zeros());
        assert_eq!(forces.alignment, Vector2::zeros());
        assert_eq!(forces.repulsion, Vector2::zeros());
        assert_eq!(forces.shepherd_repulsion, Vector2::zeros());

        // Previous direction is zero too, so the blend stalls the sheep.
        assert_eq!(blend_velocity(&flock[0], &forces, &cfg), Vector2::zeros());
    }

    #[test]
    fn attraction_points_toward_single_neighbor() {
        let mut cfg = quiet_config();
        cfg.w_att = 1.5;
        cfg.w_ali = 0.0;
        let flock = vec![Sheep::new(0.0, 0.0), Sheep::new(4.0, 0.0)];
        let mut rng = SmallRng::seed_from_u64(3);

        let forces = social_forces(0, &flock, &[], &cfg, &mut rng);
        // Sample size clamps to the one available neighbor.
        assert!((forces.attraction - Vector2::new(1.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn coincident_neighbor_is_skipped_not_divided_by_zero() {
        let cfg = quiet_config();
        let flock = vec![Sheep::new(5.0, 5.0), Sheep::new(5.0, 5.0)];
        let mut rng = SmallRng::seed_from_u64(4);

        let forces = social_forces(0, &flock, &[], &cfg, &mut rng);
        assert!(forces.attraction.x.is_finite() && forces.attraction.y.is_finite());
        assert_eq!(forces.attraction, Vector2::zeros());
        assert_eq!(forces.repulsion, Vector2::zeros());
    }

    #[test]
    fn repulsion_pushes_away_from_close_neighbors() {
        let mut cfg = quiet_config();
        cfg.w_att = 0.0;
        cfg.w_ali = 0.0;
        cfg.w_rep = 2.0;
        cfg.d_rep = 2.0;
        // One neighbor inside the radius on the +x side, one far away.
        let flock = vec![
            Sheep::new(0.0, 0.0),
            Sheep::new(1.0, 0.0),
            Sheep::new(50.0, 0.0),
        ];
        let mut rng = SmallRng::seed_from_u64(5);

        let forces = social_forces(0, &flock, &[], &cfg, &mut rng);
        assert!((forces.repulsion - Vector2::new(-2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn shepherd_repulsion_respects_radius_and_sums_over_dogs() {
        let mut cfg = quiet_config();
        cfg.w_dog = 1.0;
        cfg.d_dog = 5.0;
        let flock = vec![Sheep::new(10.0, 10.0)];

        // Distance ~14.1: outside the radius, no push.
        let far = vec![Shepherd::new(0.0, 0.0)];
        let mut rng = SmallRng::seed_from_u64(6);
        let forces = social_forces(0, &flock, &far, &cfg, &mut rng);
        assert_eq!(forces.shepherd_repulsion, Vector2::zeros());

        // Two dogs flanking inside the radius push in both components.
        let near = vec![Shepherd::new(7.0, 10.0), Shepherd::new(10.0, 7.0)];
        let mut rng = SmallRng::seed_from_u64(6);
        let forces = social_forces(0, &flock, &near, &cfg, &mut rng);
        assert!((forces.shepherd_repulsion - Vector2::new(1.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn blend_produces_member_speed_or_rest() {
        let mut cfg = quiet_config();
        cfg.v_sheep = 1.0;
        let mut sheep = Sheep::new(0.0, 0.0);
        sheep.vel = Vector2::new(0.0, 2.0);

        let mut forces = SocialForces::zero();
        forces.attraction = Vector2::new(0.3, 0.0);
        let vel = blend_velocity(&sheep, &forces, &cfg);
        assert!((vel.norm() - cfg.v_sheep).abs() < 1e-12);

        // Opposing terms that cancel exactly stall the sheep.
        sheep.vel = Vector2::zeros();
        forces.attraction = Vector2::new(1.0, 0.0);
        forces.repulsion = Vector2::new(-1.0, 0.0);
        assert_eq!(blend_velocity(&sheep, &forces, &cfg), Vector2::zeros());
    }

    #[test]
    fn noise_draws_are_unscaled_uniform() {
        let cfg = quiet_config();
        let flock = vec![Sheep::new(0.0, 0.0), Sheep::new(3.0, 0.0)];
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let forces = social_forces(0, &flock, &[], &cfg, &mut rng);
            assert!(forces.noise.0 >= 0.0 && forces.noise.0 < 1.0);
            assert!(forces.noise.1 >= 0.0 && forces.noise.1 < 1.0);
        }
    }
}

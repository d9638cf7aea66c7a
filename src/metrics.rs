use crate::models::agents::{Kinematics, Sheep, Shepherd};
use crate::sim::TickSnapshot;
use nalgebra::Vector2;
use serde::Serialize;

/// Oriented-frame descriptors of the flock, derived fresh from one tick's
/// state and never mutated afterwards.
///
/// The frame is spanned by the group travel direction and its 90-degree
/// rotation; shepherd offsets and the rear distance are expressed in that
/// frame. The shepherd fields are absent when no shepherd is on the field.
#[derive(Debug, Clone, Serialize)]
pub struct FlockMetrics {
    pub barycenter: Vector2<f64>,
    pub velocity: Vector2<f64>,
    pub direction: Vector2<f64>,
    pub perp_direction: Vector2<f64>,
    pub cohesion: f64,
    pub polarization: f64,
    pub elongation: f64,
    /// (lateral, longitudinal) shepherd offset in the flock frame.
    pub shepherd_offsets: Option<(f64, f64)>,
    /// Along-direction gap between the rearmost sheep and the shepherd;
    /// positive when the shepherd trails the flock.
    pub shepherd_rear_distance: Option<f64>,
}

impl FlockMetrics {
    /// Derive the metrics for one tick. Fails fast on an empty flock;
    /// callers are expected to guard with a member-count check.
    pub fn compute(flock: &[Sheep], shepherd: Option<&Shepherd>) -> Result<Self, String> {
        if flock.is_empty() {
            return Err("cannot derive flock metrics from an empty flock".to_string());
        }
        let n = flock.len() as f64;

        let barycenter = flock.iter().map(|s| s.pos).sum::<Vector2<f64>>() / n;

        // Each velocity axis is averaged independently.
        let velocity = flock.iter().map(|s| s.vel).sum::<Vector2<f64>>() / n;
        let speed = velocity.norm();
        let direction = if speed > 0.0 { velocity / speed } else { Vector2::zeros() };
        let perp_direction = Vector2::new(-direction.y, direction.x);

        let mean_offset = flock.iter().map(|s| s.pos - barycenter).sum::<Vector2<f64>>() / n;
        let cohesion = mean_offset.norm();

        let polarization =
            (flock.iter().map(|s| s.direction()).sum::<Vector2<f64>>() / n).norm();

        // Oriented bounding extents of the barycenter offsets.
        let mut min_along = f64::INFINITY;
        let mut max_along = f64::NEG_INFINITY;
        let mut min_across = f64::INFINITY;
        let mut max_across = f64::NEG_INFINITY;
        for sheep in flock {
            let offset = sheep.pos - barycenter;
            let along = offset.dot(&direction);
            let across = offset.dot(&perp_direction);
            min_along = min_along.min(along);
            max_along = max_along.max(along);
            min_across = min_across.min(across);
            max_across = max_across.max(across);
        }
        let length = max_along - min_along;
        let width = max_across - min_across;
        let elongation = if width > 0.0 { length / width } else { 0.0 };

        let (shepherd_offsets, shepherd_rear_distance) = match shepherd {
            Some(dog) => {
                let offset = dog.pos - barycenter;
                let lateral = offset.dot(&perp_direction);
                let longitudinal = offset.dot(&direction);
                let rearmost = flock
                    .iter()
                    .map(|s| (s.pos - barycenter).dot(&direction))
                    .fold(f64::INFINITY, f64::min);
                (Some((lateral, longitudinal)), Some(rearmost - longitudinal))
            }
            None => (None, None),
        };

        Ok(Self {
            barycenter,
            velocity,
            direction,
            perp_direction,
            cohesion,
            polarization,
            elongation,
            shepherd_offsets,
            shepherd_rear_distance,
        })
    }
}

/// Tick index of the first snapshot whose barycenter lies within
/// `tolerance` of `goal`, if the flock ever gets there.
pub fn time_to_goal<I>(snapshots: I, goal: Vector2<f64>, tolerance: f64) -> Option<u64>
where
    I: IntoIterator<Item = TickSnapshot>,
{
    for snapshot in snapshots {
        let barycenter = match &snapshot.metrics {
            Some(m) => Some(m.barycenter),
            None => FlockMetrics::compute(&snapshot.sheep, None)
                .ok()
                .map(|m| m.barycenter),
        };
        if let Some(b) = barycenter {
            if (b - goal).norm() < tolerance {
                return Some(snapshot.tick);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheep_at(x: f64, y: f64, vx: f64, vy: f64) -> Sheep {
        let mut s = Sheep::new(x, y);
        s.vel = Vector2::new(vx, vy);
        s
    }

    #[test]
    fn empty_flock_is_an_error() {
        assert!(FlockMetrics::compute(&[], None).is_err());
    }

    #[test]
    fn group_velocity_averages_each_axis_independently() {
        // A flock moving purely along +y must not leak vx into vy.
        let flock = vec![sheep_at(0.0, 0.0, 0.0, 1.0), sheep_at(2.0, 0.0, 0.0, 3.0)];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert!(m.velocity.x.abs() < 1e-12);
        assert!((m.velocity.y - 2.0).abs() < 1e-12);
        assert!((m.direction - Vector2::new(0.0, 1.0)).norm() < 1e-12);
        assert!((m.perp_direction - Vector2::new(-1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn polarization_spans_zero_to_one() {
        let aligned = vec![sheep_at(0.0, 0.0, 1.0, 0.0), sheep_at(5.0, 0.0, 2.0, 0.0)];
        let m = FlockMetrics::compute(&aligned, None).unwrap();
        assert!((m.polarization - 1.0).abs() < 1e-12);

        let opposed = vec![sheep_at(0.0, 0.0, 1.0, 0.0), sheep_at(5.0, 0.0, -1.0, 0.0)];
        let m = FlockMetrics::compute(&opposed, None).unwrap();
        assert!(m.polarization.abs() < 1e-12);

        let at_rest = vec![sheep_at(0.0, 0.0, 0.0, 0.0)];
        let m = FlockMetrics::compute(&at_rest, None).unwrap();
        assert!(m.polarization.abs() < 1e-12);
    }

    #[test]
    fn cohesion_is_the_norm_of_the_mean_offset() {
        // Offsets from the barycenter cancel by construction, so this
        // statistic hovers at numerical zero for any finite flock.
        let flock = vec![
            sheep_at(1.0, 2.0, 0.0, 0.0),
            sheep_at(9.0, -4.0, 0.0, 0.0),
            sheep_at(-3.0, 7.5, 0.0, 0.0),
        ];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert!(m.cohesion >= 0.0);
        assert!(m.cohesion < 1e-9);
    }

    #[test]
    fn elongation_compares_extent_along_and_across_motion() {
        // Moving along +x, spread 4 long and 2 wide.
        let flock = vec![
            sheep_at(-2.0, 0.0, 1.0, 0.0),
            sheep_at(2.0, 0.0, 1.0, 0.0),
            sheep_at(0.0, 1.0, 1.0, 0.0),
            sheep_at(0.0, -1.0, 1.0, 0.0),
        ];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert!((m.elongation - 2.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_flock_has_zero_elongation() {
        // Everyone on the direction axis: zero perpendicular extent.
        let flock = vec![
            sheep_at(0.0, 0.0, 1.0, 0.0),
            sheep_at(3.0, 0.0, 1.0, 0.0),
            sheep_at(7.0, 0.0, 1.0, 0.0),
        ];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert_eq!(m.elongation, 0.0);
    }

    #[test]
    fn stationary_flock_has_zero_direction_and_elongation() {
        let flock = vec![sheep_at(0.0, 0.0, 0.0, 0.0), sheep_at(4.0, 2.0, 0.0, 0.0)];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert_eq!(m.direction, Vector2::zeros());
        assert_eq!(m.elongation, 0.0);
    }

    #[test]
    fn shepherd_frame_offsets_and_rear_distance() {
        // Flock moving +y; shepherd south of the rearmost sheep.
        let flock = vec![sheep_at(0.0, 2.0, 0.0, 1.0), sheep_at(0.0, 6.0, 0.0, 1.0)];
        let dog = Shepherd::new(1.0, -3.0);
        let m = FlockMetrics::compute(&flock, Some(&dog)).unwrap();

        let (lateral, longitudinal) = m.shepherd_offsets.unwrap();
        // Barycenter (0,4); offset (1,-7); direction (0,1); perp (-1,0).
        assert!((lateral + 1.0).abs() < 1e-12);
        assert!((longitudinal + 7.0).abs() < 1e-12);

        // Rearmost sheep projects to -2; the dog trails it by 5.
        assert!((m.shepherd_rear_distance.unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn metrics_absent_shepherd_fields_without_dogs() {
        let flock = vec![sheep_at(0.0, 0.0, 1.0, 0.0)];
        let m = FlockMetrics::compute(&flock, None).unwrap();
        assert!(m.shepherd_offsets.is_none());
        assert!(m.shepherd_rear_distance.is_none());
    }
}

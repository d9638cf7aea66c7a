use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Wrap an angle into [-pi, pi).
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Translational state queries shared by every agent on the field.
///
/// All derivations are pure reads of the stored position/velocity. A
/// stationary agent has heading 0 and the zero vector as its direction;
/// callers that need a unit vector must treat the zero vector as "no
/// preferred direction" rather than normalizing it themselves.
pub trait Kinematics {
    fn position(&self) -> Vector2<f64>;
    fn velocity(&self) -> Vector2<f64>;

    fn speed(&self) -> f64 {
        self.velocity().norm()
    }

    /// Heading angle in radians, measured from the +x axis.
    fn heading(&self) -> f64 {
        let v = self.velocity();
        v.y.atan2(v.x)
    }

    /// Unit travel direction, or the zero vector when stationary.
    fn direction(&self) -> Vector2<f64> {
        let v = self.velocity();
        let speed = v.norm();
        if speed > 0.0 { v / speed } else { Vector2::zeros() }
    }

    /// Bearing from self toward `other`, relative to our own heading.
    fn viewing_angle_to(&self, other: &dyn Kinematics) -> f64 {
        let offset = other.position() - self.position();
        wrap_angle(offset.y.atan2(offset.x) - self.heading())
    }

    /// Heading difference between `other` and self.
    fn alignment_with(&self, other: &dyn Kinematics) -> f64 {
        wrap_angle(other.heading() - self.heading())
    }
}

/// A flocking agent steered by social forces (the "sheep" role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheep {
    pub pos: Vector2<f64>,
    pub vel: Vector2<f64>,
}

impl Sheep {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: Vector2::new(x, y),
            vel: Vector2::zeros(),
        }
    }
}

impl Kinematics for Sheep {
    fn position(&self) -> Vector2<f64> {
        self.pos
    }

    fn velocity(&self) -> Vector2<f64> {
        self.vel
    }
}

/// A pursuing agent that drives the flock toward a goal (the "dog" role).
///
/// Carries no state beyond position and velocity; the velocity doubles as
/// the previous heading for the slow-approach crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shepherd {
    pub pos: Vector2<f64>,
    pub vel: Vector2<f64>,
}

impl Shepherd {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: Vector2::new(x, y),
            vel: Vector2::zeros(),
        }
    }
}

impl Kinematics for Shepherd {
    fn position(&self) -> Vector2<f64> {
        self.pos
    }

    fn velocity(&self) -> Vector2<f64> {
        self.vel
    }
}

/// Scatter sheep uniformly over the field, at rest.
pub fn spawn_sheep<R: Rng>(count: usize, bounds: (f64, f64), rng: &mut R) -> Vec<Sheep> {
    (0..count)
        .map(|_| Sheep::new(rng.random_range(0.0..bounds.0), rng.random_range(0.0..bounds.1)))
        .collect()
}

/// Scatter shepherds uniformly over the field, at rest.
pub fn spawn_shepherds<R: Rng>(count: usize, bounds: (f64, f64), rng: &mut R) -> Vec<Shepherd> {
    (0..count)
        .map(|_| Shepherd::new(rng.random_range(0.0..bounds.0), rng.random_range(0.0..bounds.1)))
        .collect()
}

use crate::algorithms::herding;
use crate::algorithms::social::{blend_velocity, social_forces};
use crate::metrics::FlockMetrics;
use crate::models::agents::{Sheep, Shepherd, spawn_sheep, spawn_shepherds};
use nalgebra::Vector2;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FIELD_SIZE: (f64, f64) = (250.0, 250.0);
pub const DEFAULT_NUM_SHEEP: usize = 14;
pub const DEFAULT_NUM_SHEPHERDS: usize = 1;
pub const DEFAULT_N_ATT: usize = 4;
pub const DEFAULT_N_ALI: usize = 1;
pub const DEFAULT_W_ATT: f64 = 1.5;
pub const DEFAULT_W_ALI: f64 = 1.3;
pub const DEFAULT_W_REP: f64 = 2.0;
pub const DEFAULT_D_REP: f64 = 2.0;
pub const DEFAULT_W_DOG: f64 = 1.0;
pub const DEFAULT_D_DOG: f64 = 12.0;
pub const DEFAULT_INERTIA: f64 = 0.5;
pub const DEFAULT_V_SHEEP: f64 = 1.0;
pub const DEFAULT_V_DOG: f64 = 1.5;
pub const DEFAULT_NOISE: f64 = 0.3;
pub const DEFAULT_GOAL_POS: (f64, f64) = (50.0, 50.0);
pub const DEFAULT_DT: f64 = 1.0;

/// Run-wide simulation parameters.
///
/// Built once, then passed by shared reference into every per-tick
/// computation; nothing mutates it after construction. Weight parameters
/// set to zero switch their force term off without touching the rest of
/// the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World extent; agents spawn uniformly inside it.
    pub field_size: (f64, f64),
    pub num_sheep: usize,
    pub num_shepherds: usize,

    /// Attraction sample size (clamped to the available neighbors).
    pub n_att: usize,
    /// Alignment subsample size (clamped to the attraction sample).
    pub n_ali: usize,
    pub w_att: f64,
    pub w_ali: f64,

    /// Short-range sheep-sheep repulsion weight and radius. The radius
    /// doubles as the shepherd's personal-space threshold for the
    /// slow-approach crawl.
    pub w_rep: f64,
    pub d_rep: f64,

    /// Shepherd repulsion felt by sheep inside d_dog.
    pub w_dog: f64,
    pub d_dog: f64,

    /// Weight of the previous travel direction in the velocity blend.
    pub inertia: f64,
    pub v_sheep: f64,
    pub v_dog: f64,
    /// Noise strength applied to sheep heading draws and shepherd pursuit.
    pub noise: f64,

    /// Cohesion threshold: the shepherd collects once the farthest sheep
    /// strays beyond it, and drives otherwise.
    pub f_n: f64,
    /// How far past the straggler the collect target sits.
    pub p_collect: f64,
    /// How far past the barycenter the drive target sits.
    pub p_drive: f64,
    pub goal_pos: (f64, f64),

    pub dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let n = DEFAULT_NUM_SHEEP as f64;
        Self {
            field_size: DEFAULT_FIELD_SIZE,
            num_sheep: DEFAULT_NUM_SHEEP,
            num_shepherds: DEFAULT_NUM_SHEPHERDS,
            n_att: DEFAULT_N_ATT,
            n_ali: DEFAULT_N_ALI,
            w_att: DEFAULT_W_ATT,
            w_ali: DEFAULT_W_ALI,
            w_rep: DEFAULT_W_REP,
            d_rep: DEFAULT_D_REP,
            w_dog: DEFAULT_W_DOG,
            d_dog: DEFAULT_D_DOG,
            inertia: DEFAULT_INERTIA,
            v_sheep: DEFAULT_V_SHEEP,
            v_dog: DEFAULT_V_DOG,
            noise: DEFAULT_NOISE,
            f_n: DEFAULT_D_REP * n.powf(2.0 / 3.0),
            p_collect: DEFAULT_D_REP,
            p_drive: DEFAULT_D_REP * n.sqrt(),
            goal_pos: DEFAULT_GOAL_POS,
            dt: DEFAULT_DT,
        }
    }
}

impl SimConfig {
    /// Set the flock size and re-derive the parameters that scale with it:
    /// `f_n = d_rep * n^(2/3)`, `p_drive = d_rep * sqrt(n)`,
    /// `p_collect = d_rep`.
    pub fn with_flock_size(mut self, num_sheep: usize) -> Self {
        let n = num_sheep as f64;
        self.num_sheep = num_sheep;
        self.f_n = self.d_rep * n.powf(2.0 / 3.0);
        self.p_collect = self.d_rep;
        self.p_drive = self.d_rep * n.sqrt();
        self
    }

    pub fn goal(&self) -> Vector2<f64> {
        Vector2::new(self.goal_pos.0, self.goal_pos.1)
    }
}

/// State of the field after one tick. A value object: produced once,
/// owned by the consumer, never written back into the simulation.
#[derive(Debug, Clone, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub time: f64,
    pub bounds: (f64, f64),
    pub sheep: Vec<Sheep>,
    pub shepherds: Vec<Shepherd>,
    /// Absent when the flock is empty.
    pub metrics: Option<FlockMetrics>,
}

/// Fixed-step shepherding simulation.
///
/// Each tick runs three phases against the previous tick's state: sheep
/// force evaluation, shepherd steering, sheep integration. Shepherds are
/// updated exactly once per tick, after all sheep forces are computed and
/// before any sheep has moved, so every read within a tick observes the
/// pre-tick positions.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    sheep: Vec<Sheep>,
    shepherds: Vec<Shepherd>,
    rng: SmallRng,
    tick: u64,
    time: f64,
}

impl Simulation {
    /// Spawn a fresh field from the configuration and seed. The same seed
    /// and configuration always reproduce the same trajectory.
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let sheep = spawn_sheep(config.num_sheep, config.field_size, &mut rng);
        let shepherds = spawn_shepherds(config.num_shepherds, config.field_size, &mut rng);
        Self {
            config,
            sheep,
            shepherds,
            rng,
            tick: 0,
            time: 0.0,
        }
    }

    /// Build a simulation from explicit agent placements instead of the
    /// uniform spawn. Used for scripted scenarios and tests.
    pub fn from_agents(
        config: SimConfig,
        sheep: Vec<Sheep>,
        shepherds: Vec<Shepherd>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            sheep,
            shepherds,
            rng: SmallRng::seed_from_u64(seed),
            tick: 0,
            time: 0.0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sheep(&self) -> &[Sheep] {
        &self.sheep
    }

    pub fn shepherds(&self) -> &[Shepherd] {
        &self.shepherds
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance one tick and return the resulting snapshot.
    pub fn step(&mut self) -> TickSnapshot {
        let dt = self.config.dt;
        let velocities = self.sheep_velocities();

        // Shepherds steer against the pre-move flock.
        for shepherd in &mut self.shepherds {
            herding::update_shepherd(shepherd, &self.sheep, &self.config, &mut self.rng);
        }

        for (sheep, vel) in self.sheep.iter_mut().zip(&velocities) {
            sheep.vel = *vel;
            sheep.pos += *vel * dt;
        }

        self.tick += 1;
        self.time += dt;
        self.snapshot()
    }

    /// Pull-based lazy sequence of the next `count` ticks.
    pub fn steps(&mut self, count: usize) -> impl Iterator<Item = TickSnapshot> + '_ {
        (0..count).map(move |_| self.step())
    }

    /// Snapshot of the current state without advancing time.
    pub fn snapshot(&self) -> TickSnapshot {
        let metrics = if self.sheep.is_empty() {
            None
        } else {
            FlockMetrics::compute(&self.sheep, self.shepherds.first()).ok()
        };
        TickSnapshot {
            tick: self.tick,
            time: self.time,
            bounds: self.config.field_size,
            sheep: self.sheep.clone(),
            shepherds: self.shepherds.clone(),
            metrics,
        }
    }

    /// New velocity for every sheep, evaluated against the pre-move state.
    ///
    /// Each sheep gets its own child RNG derived from the master stream,
    /// which keeps the result identical whether the pass runs serially or
    /// under the `parallel` feature.
    fn sheep_velocities(&mut self) -> Vec<Vector2<f64>> {
        let seeds: Vec<u64> = self.sheep.iter().map(|_| self.rng.next_u64()).collect();
        let flock = &self.sheep;
        let shepherds = &self.shepherds;
        let config = &self.config;

        let velocity_of = |(i, &seed): (usize, &u64)| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let forces = social_forces(i, flock, shepherds, config, &mut rng);
            blend_velocity(&flock[i], &forces, config)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            return seeds.par_iter().enumerate().map(velocity_of).collect();
        }
        #[cfg(not(feature = "parallel"))]
        {
            return seeds.iter().enumerate().map(velocity_of).collect();
        }
    }
}

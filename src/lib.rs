pub mod algorithms;
pub mod metrics;
pub mod models;
pub mod render;
pub mod sim;

pub use algorithms::herding::{SLOW_FACTOR, ShepherdMode};
pub use algorithms::social::SocialForces;
pub use metrics::{FlockMetrics, time_to_goal};
pub use models::agents::{Kinematics, Sheep, Shepherd};
pub use render::render_grid;
pub use sim::{SimConfig, Simulation, TickSnapshot};

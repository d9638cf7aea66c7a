use herdsim::{Kinematics, SimConfig, Simulation, render_grid, time_to_goal};

fn main() {
    // Reference run: 14 sheep, one shepherd, goal in the south-west corner.
    let cfg = SimConfig::default().with_flock_size(14);
    let goal = cfg.goal();
    let mut sim = Simulation::new(cfg, 10);

    let steps = 500;
    let mut last = sim.snapshot();
    for snapshot in sim.steps(steps) {
        if snapshot.tick % 50 == 0 {
            if let Some(m) = &snapshot.metrics {
                println!(
                    "tick {:4}  barycenter ({:7.2}, {:7.2})  polarization {:.3}  elongation {:.3}",
                    snapshot.tick, m.barycenter.x, m.barycenter.y, m.polarization, m.elongation
                );
            }
        }
        last = snapshot;
    }

    println!("{}", render_grid(&last, 60, 30));

    if let Some(m) = &last.metrics {
        println!(
            "after {} ticks: barycenter ({:.1}, {:.1}), {:.1} from the goal",
            last.tick,
            m.barycenter.x,
            m.barycenter.y,
            (m.barycenter - goal).norm()
        );
    }
    for (i, dog) in last.shepherds.iter().enumerate() {
        println!(
            "shepherd {}: ({:.1}, {:.1}) at speed {:.2}",
            i,
            dog.pos.x,
            dog.pos.y,
            dog.speed()
        );
    }

    // Re-run the same seed and report when the flock first reaches the goal.
    let cfg = SimConfig::default().with_flock_size(14);
    let mut sim = Simulation::new(cfg, 10);
    match time_to_goal(sim.steps(steps), goal, 40.0) {
        Some(tick) => println!("flock reached the goal region at tick {}", tick),
        None => println!("flock did not reach the goal region in {} ticks", steps),
    }
}

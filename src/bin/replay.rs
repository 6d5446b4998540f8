//! Demo CLI: reads a JSON scenario (costmap size, obstacles, a plan, a
//! starting pose) and drives `find_best_path` in a loop, logging the chosen
//! command each tick. Convenience scaffolding, not part of the core.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use local_trajectory_planner::{
    BfsDistanceFieldBuilder, BodyVelocity, CircularWorldModel, Footprint, GridCostmap, LocalTrajectoryPlanner, Pose,
};
use serde::Deserialize;

#[derive(Debug, Parser)]
#[clap(version, author, about = "Replay a local-trajectory-planner scenario from a JSON file")]
struct Cli {
    /// Path to a scenario JSON file
    scenario: PathBuf,

    /// Number of control ticks to run
    #[arg(short, long, default_value_t = 20)]
    ticks: u32,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    size_x: usize,
    size_y: usize,
    resolution: f64,
    #[serde(default)]
    obstacles: Vec<(i64, i64)>,
    plan: Vec<(f64, f64, f64)>,
    start_pose: (f64, f64, f64),
    robot_radius: f64,
    config: local_trajectory_planner::PlannerConfig,
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let text = match fs::read_to_string(&cli.scenario) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("failed to read {}: {err}", cli.scenario.display());
            std::process::exit(1);
        }
    };
    let scenario: Scenario = match serde_json::from_str(&text) {
        Ok(scenario) => scenario,
        Err(err) => {
            eprintln!("failed to parse scenario: {err}");
            std::process::exit(1);
        }
    };

    let mut costmap = GridCostmap::new(scenario.size_x, scenario.size_y, scenario.resolution, 0.0, 0.0);
    for (cx, cy) in scenario.obstacles {
        costmap.set_cost(cx, cy, local_trajectory_planner::costmap::LETHAL);
    }
    let model = CircularWorldModel::new(&costmap, Footprint::circular(scenario.robot_radius));
    let builder = BfsDistanceFieldBuilder;

    let mut planner = LocalTrajectoryPlanner::new(&costmap, &model, &model, builder, scenario.config);
    let plan = scenario.plan.into_iter().map(|(x, y, theta)| Pose::new(x, y, theta)).collect();
    planner.update_plan(plan, true);

    let (sx, sy, stheta) = scenario.start_pose;
    let mut pose = Pose::new(sx, sy, stheta);
    let mut vel = BodyVelocity::zero();

    for tick in 0..cli.ticks {
        let (traj, command) = planner.find_best_path(pose, vel);
        log::info!(
            "tick {tick}: pose=({:.2},{:.2},{:.2}) command=({:.2},{:.2},{:.2}) cost={:.3}",
            pose.x(),
            pose.y(),
            pose.theta,
            command.vx(),
            command.vy(),
            command.vtheta,
            traj.cost
        );
        vel = command;
        pose = local_trajectory_planner::geometry::step_pose(pose, vel, 0.1);
    }
}

//! Trajectory rollout and scoring (§4.3): forward-simulates one candidate
//! `(vx, vy, vtheta)` sample from the current state, accumulates the
//! multi-term cost, and marks failure modes with the negative sentinels of
//! §7.

use crate::costmap::CostmapView;
use crate::distance_field::{DistanceGrid, OBSTACLE_COST};
use crate::geometry::{step_pose, step_velocity, BodyVelocity, Pose};
use crate::limits::{AccelLimits, CostWeights, Flags, SamplingConfig};
use crate::plan::heading_diff_eval;
use crate::world_model::WorldModel;

/// `line_cost` hit a lethal/inscribed/unknown cell. Surfaced by
/// `line_cost` only; never a `Trajectory::cost` value.
pub const LINE_LETHAL: f64 = -1.0;
/// `goal_dist` or `path_dist` equals the distance field's obstacle
/// sentinel: the sampled point is behind/on an obstacle with respect to
/// the reference path or goal.
pub const IMPOSSIBLE: f64 = -2.0;
/// A trajectory that has never been scored.
pub const INITIAL: f64 = -3.0;
/// The rollout stepped off the costmap.
pub const OFF_MAP: f64 = -4.0;
/// The footprint hit an obstacle during rollout.
pub const FOOTPRINT_HIT: f64 = -5.0;

/// A scored candidate trajectory: the sample that produced it, the points
/// it visited, the final cost (negative sentinels denote failure, see
/// above), and cached sub-scores used by the sampler's ordering.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub sample: BodyVelocity,
    pub points: Vec<Pose>,
    pub cost: f64,
    pub goal_cost_traj: f64,
    pub path_dist_traj: f64,
}

impl Trajectory {
    /// An unscored placeholder, per the `INITIAL` sentinel.
    pub fn initial(sample: BodyVelocity, max_points: usize) -> Self {
        Self {
            sample,
            points: Vec::with_capacity(max_points),
            cost: INITIAL,
            goal_cost_traj: 0.0,
            path_dist_traj: 0.0,
        }
    }

    pub fn is_legal(&self) -> bool {
        self.cost >= 0.0
    }
}

/// The read-only inputs a rollout needs: the costmap and world model for
/// collision/occupancy queries, the two distance fields, the global plan
/// (needed by `simple_attractor` and heading scoring), and the active
/// weights/flags/sampling/accel configuration.
pub struct RolloutContext<'a, M: CostmapView, W: WorldModel> {
    pub costmap: &'a M,
    pub world_model: &'a W,
    pub path_map: &'a DistanceGrid,
    pub goal_map: &'a DistanceGrid,
    pub plan: &'a [Pose],
    pub weights: CostWeights,
    pub flags: Flags,
    pub sampling: SamplingConfig,
    pub accel: AccelLimits,
    pub heading_lookahead: usize,
}

/// Forward-simulate `sample` from `(start_pose, start_vel)` and score it,
/// per spec.md §4.3.
pub fn generate_trajectory<M: CostmapView, W: WorldModel>(
    ctx: &RolloutContext<M, W>,
    start_pose: Pose,
    start_vel: BodyVelocity,
    sample: BodyVelocity,
) -> Trajectory {
    let n = step_count(ctx.flags.heading_scoring, ctx.sampling, sample);
    let dt = ctx.sampling.sim_time / n as f64;

    let mut traj = Trajectory::initial(sample, n);
    let mut pose = start_pose;
    let mut vel = start_vel;

    let mut path_dist = 0.0f64;
    let mut goal_dist = 0.0f64;
    let mut occ_cost = 0.0f64;
    let mut heading_diff = 0.0f64;

    for i in 0..n {
        let Some((cx, cy)) = ctx.costmap.world_to_map(pose.x(), pose.y()) else {
            traj.cost = OFF_MAP;
            return traj;
        };

        let footprint_cost = ctx.world_model.footprint_cost(pose.x(), pose.y(), pose.theta);
        if footprint_cost < 0.0 {
            traj.cost = FOOTPRINT_HIT;
            return traj;
        }
        occ_cost = occ_cost.max(footprint_cost).max(ctx.costmap.get_cost(cx, cy) as f64);

        if ctx.flags.simple_attractor {
            if let Some(goal) = ctx.plan.last() {
                goal_dist = pose.distance_squared(goal);
            }
            // path_dist is intentionally left untouched in this mode.
        } else if !ctx.flags.heading_scoring {
            if let Some(cell) = ctx.path_map.get(cx, cy) {
                path_dist = cell.target_dist as f64;
            }
            if let Some(cell) = ctx.goal_map.get(cx, cy) {
                goal_dist = cell.target_dist as f64;
            }
        } else if i == n - 1 {
            if let Some(eval) = heading_diff_eval(ctx.plan, pose.x(), pose.y(), pose.theta, ctx.heading_lookahead) {
                heading_diff = eval.heading_diff;
                path_dist = eval.path_dist;
                goal_dist = eval.goal_dist;
            }
        }

        if path_dist == OBSTACLE_COST as f64 || goal_dist == OBSTACLE_COST as f64 {
            traj.cost = IMPOSSIBLE;
            return traj;
        }

        if ctx.weights.path_distance_max > 0.0 && path_dist <= ctx.weights.path_distance_max {
            path_dist = 0.0;
        }
        if heading_diff.abs() < 0.2 {
            heading_diff = 0.0;
        }

        traj.points.push(pose);

        vel = BodyVelocity::new(
            step_velocity(sample.vx(), vel.vx(), ctx.accel.ax, dt),
            step_velocity(sample.vy(), vel.vy(), ctx.accel.ay, dt),
            step_velocity(sample.vtheta, vel.vtheta, ctx.accel.atheta, dt),
        );
        pose = step_pose(pose, vel, dt);
    }

    traj.path_dist_traj = path_dist;
    traj.cost = if !ctx.flags.heading_scoring {
        ctx.weights.pdist_scale * path_dist + ctx.weights.gdist_scale * goal_dist + ctx.weights.occdist_scale * occ_cost
    } else {
        ctx.weights.occdist_scale * occ_cost
            + ctx.weights.pdist_scale * path_dist
            + ctx.weights.hdiff_scale * heading_diff
            + ctx.weights.gdist_scale * goal_dist
    };
    traj.goal_cost_traj = ctx.weights.gdist_scale * goal_dist;

    traj
}

fn step_count(heading_scoring: bool, sampling: SamplingConfig, sample: BodyVelocity) -> usize {
    let n = if !heading_scoring {
        (sample.translational_speed() * sampling.sim_time / sampling.sim_granularity)
            .max(sample.vtheta.abs() / sampling.angular_sim_granularity)
            .round()
    } else {
        (sampling.sim_time / sampling.sim_granularity).round()
    };
    (n as i64).max(1) as usize
}

//! The Planner Façade (§4.6): the crate's single public entry point,
//! composing the rollout, sampler, and oscillation/escape state machine
//! behind `reconfigure`/`update_plan`/`score_trajectory`/`check_trajectory`/
//! `find_best_path`/`get_local_goal`/`get_cell_costs`.

use std::sync::Mutex;

use log::{debug, info, warn};

use crate::config::normalize;
use crate::costmap::{CostmapView, INSCRIBED_INFLATED};
use crate::distance_field::{DistanceFieldBuilder, DistanceGrid, OBSTACLE_COST, UNREACHABLE};
use crate::error::PlannerError;
use crate::geometry::{BodyVelocity, Pose};
use crate::limits::PlannerConfig;
use crate::oscillation::{EscapeState, OscillationState};
use crate::plan::GlobalPlan;
use crate::sampler::{find_best_trajectory, SamplerInputs};
use crate::trajectory::{generate_trajectory, RolloutContext, Trajectory};
use crate::world_model::{FootprintProvider, WorldModel};

/// Per-cell breakdown returned by [`LocalTrajectoryPlanner::get_cell_costs`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCosts {
    pub path_cost: f64,
    pub goal_cost: f64,
    pub occ_cost: f64,
    pub total: f64,
}

/// Owns the mutable state that persists across ticks (configuration,
/// distance fields, the plan, oscillation/escape flags) and borrows its
/// external collaborators for the duration of each call.
///
/// The configuration mutex is locked once per call and the snapshot it
/// guards is cloned out before any rollout runs; every rollout in that call
/// then sees one consistent `PlannerConfig`, which satisfies §5's "a live
/// tick observes a consistent parameter set" without holding the lock
/// across the whole search (see DESIGN.md).
pub struct LocalTrajectoryPlanner<'a, M: CostmapView, W: WorldModel, F: FootprintProvider, B: DistanceFieldBuilder<M>> {
    costmap: &'a M,
    world_model: &'a W,
    footprint: &'a F,
    builder: B,
    config: Mutex<PlannerConfig>,
    path_map: DistanceGrid,
    goal_map: DistanceGrid,
    plan: GlobalPlan,
    local_goal: Option<(f64, f64)>,
    oscillation: OscillationState,
    escape: EscapeState,
}

impl<'a, M: CostmapView, W: WorldModel, F: FootprintProvider, B: DistanceFieldBuilder<M>> LocalTrajectoryPlanner<'a, M, W, F, B> {
    pub fn new(costmap: &'a M, world_model: &'a W, footprint: &'a F, builder: B, config: PlannerConfig) -> Self {
        let path_map = DistanceGrid::new(costmap.size_x(), costmap.size_y());
        let goal_map = DistanceGrid::new(costmap.size_x(), costmap.size_y());
        Self {
            costmap,
            world_model,
            footprint,
            builder,
            config: Mutex::new(config),
            path_map,
            goal_map,
            plan: GlobalPlan::new(),
            local_goal: None,
            oscillation: OscillationState::new(),
            escape: EscapeState::new(),
        }
    }

    /// Atomically replace the configuration, coercing sample counts and
    /// applying `meter_scoring` (§4.6).
    pub fn reconfigure(&self, cfg: PlannerConfig) {
        let mut guard = self.config.lock().expect("config mutex poisoned");
        *guard = normalize(cfg, self.costmap.resolution());
        debug!("reconfigured planner");
    }

    fn config_snapshot(&self) -> PlannerConfig {
        self.config.lock().expect("config mutex poisoned").clone()
    }

    /// Replace the global plan. If `recompute`, reset and repopulate both
    /// distance fields immediately (independent of `find_best_path`, which
    /// always does its own reset/rebuild each tick).
    pub fn update_plan(&mut self, plan: GlobalPlan, recompute: bool) {
        self.plan = plan;
        if let Some(goal) = self.plan.last() {
            debug!("plan updated, final goal at ({:.2}, {:.2})", goal.x(), goal.y());
        }
        if recompute {
            self.builder.reset(&mut self.path_map, self.costmap);
            self.builder.reset(&mut self.goal_map, self.costmap);
            self.builder.set_target_cells(&mut self.path_map, self.costmap, &self.plan);
            self.local_goal = self.builder.set_local_goal(&mut self.goal_map, self.costmap, &self.plan);
        }
    }

    fn rollout_ctx(&self, cfg: &PlannerConfig) -> RolloutContext<'_, M, W> {
        RolloutContext {
            costmap: self.costmap,
            world_model: self.world_model,
            path_map: &self.path_map,
            goal_map: &self.goal_map,
            plan: &self.plan,
            weights: cfg.weights,
            flags: cfg.flags,
            sampling: cfg.sampling,
            accel: cfg.accel,
            heading_lookahead: cfg.weights.heading_lookahead,
        }
    }

    /// Score one `(pose, vel, sample)` rollout without touching sampler or
    /// oscillation state.
    pub fn score_trajectory(&self, pose: Pose, vel: BodyVelocity, sample: BodyVelocity) -> f64 {
        let cfg = self.config_snapshot();
        generate_trajectory(&self.rollout_ctx(&cfg), pose, vel, sample).cost
    }

    /// `true` iff the rollout's cost is legal (§4.6).
    pub fn check_trajectory(&self, pose: Pose, vel: BodyVelocity, sample: BodyVelocity) -> bool {
        self.score_trajectory(pose, vel, sample) >= 0.0
    }

    /// Run one full find-best-path tick: reset the distance fields, mark
    /// footprint cells as `within_robot`, rebuild the fields, run the
    /// sampler, and convert the chosen trajectory into a drive command.
    pub fn find_best_path(&mut self, pose: Pose, vel: BodyVelocity) -> (Trajectory, BodyVelocity) {
        self.builder.reset(&mut self.path_map, self.costmap);
        self.builder.reset(&mut self.goal_map, self.costmap);
        for (cx, cy) in self.footprint.footprint_cells(pose, true) {
            self.path_map.mark_within_robot(cx, cy);
        }
        self.builder.set_target_cells(&mut self.path_map, self.costmap, &self.plan);
        self.local_goal = self.builder.set_local_goal(&mut self.goal_map, self.costmap, &self.plan);

        let cfg = self.config_snapshot();
        let inputs = SamplerInputs {
            costmap: self.costmap,
            world_model: self.world_model,
            path_map: &self.path_map,
            goal_map: &self.goal_map,
            plan: &self.plan,
            weights: cfg.weights,
            flags: cfg.flags,
            sampling: cfg.sampling,
            accel: cfg.accel,
            velocity: cfg.velocity,
            heading_lookahead: cfg.weights.heading_lookahead,
            backup_vel: cfg.escape.backup_vel,
            extra_y_vels: &cfg.extra_y_vels,
            oscillation_reset_dist: cfg.oscillation_reset_dist,
            escape_reset_dist: cfg.escape.escape_reset_dist,
            escape_reset_theta: cfg.escape.escape_reset_theta,
        };

        let best = find_best_trajectory(&inputs, pose, vel, &mut self.oscillation, &mut self.escape);

        let command = if best.is_legal() {
            info!("find_best_path: chose sample {:?}, cost={:.3}", best.sample, best.cost);
            best.sample
        } else {
            warn!("find_best_path: no legal trajectory, commanding zero velocity");
            BodyVelocity::zero()
        };

        (best, command)
    }

    pub fn get_local_goal(&self) -> Option<(f64, f64)> {
        self.local_goal
    }

    /// Per-cell cost breakdown (§4.6, P8): `None` if the cell is
    /// `within_robot`, its `path_dist` is the obstacle/unreachable
    /// sentinel, or its raw occupancy cost is at least `INSCRIBED_INFLATED`.
    pub fn get_cell_costs(&self, cx: i64, cy: i64) -> Option<CellCosts> {
        let path_cell = self.path_map.get(cx, cy)?;
        if path_cell.within_robot {
            return None;
        }
        if path_cell.target_dist == OBSTACLE_COST || path_cell.target_dist == UNREACHABLE {
            return None;
        }
        let raw_occ = self.costmap.get_cost(cx, cy);
        if raw_occ >= INSCRIBED_INFLATED {
            return None;
        }
        let goal_cell = self.goal_map.get(cx, cy)?;
        let cfg = self.config_snapshot();
        let path_cost = cfg.weights.pdist_scale * path_cell.target_dist as f64;
        let goal_cost = cfg.weights.gdist_scale * goal_cell.target_dist as f64;
        let occ_cost = cfg.weights.occdist_scale * raw_occ as f64;
        Some(CellCosts {
            path_cost,
            goal_cost,
            occ_cost,
            total: path_cost + goal_cost + occ_cost,
        })
    }
}

/// Check a pre-built [`crate::world_model::Footprint`] against the
/// dimension-consistency precondition the bundled reference builder relies
/// on, surfacing [`PlannerError`] rather than silently clipping lookups.
pub fn check_grid_consistency<M: CostmapView>(grid: &DistanceGrid, costmap: &M) -> Result<(), PlannerError> {
    grid.ensure_matches(costmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costmap::GridCostmap;
    use crate::distance_field::BfsDistanceFieldBuilder;
    use crate::limits::{AccelLimits, CostWeights, EscapeConfig, Flags, SamplingConfig, VelocityLimits};
    use crate::world_model::{CircularWorldModel, Footprint};

    fn default_config() -> PlannerConfig {
        PlannerConfig {
            velocity: VelocityLimits {
                min_vx: 0.0,
                max_vx: 1.0,
                min_vy: -0.5,
                max_vy: 0.5,
                min_vtheta: -1.0,
                max_vtheta: 1.0,
                min_in_place_vtheta: 0.2,
            },
            accel: AccelLimits { ax: 1.0, ay: 1.0, atheta: 1.0 },
            sampling: SamplingConfig {
                nx: 5,
                ny: 3,
                ntheta: 5,
                sim_time: 1.0,
                sim_granularity: 0.1,
                angular_sim_granularity: 0.1,
                sim_period: Some(0.1),
            },
            weights: CostWeights {
                pdist_scale: 0.6,
                gdist_scale: 0.8,
                occdist_scale: 0.01,
                hdiff_scale: 1.0,
                path_distance_max: 0.0,
                heading_lookahead: 1,
            },
            flags: Flags {
                holonomic: false,
                use_dynamic_window: false,
                heading_scoring: false,
                simple_attractor: false,
                meter_scoring: false,
            },
            escape: EscapeConfig {
                escape_reset_dist: 0.5,
                escape_reset_theta: 0.5,
                backup_vel: -0.2,
            },
            oscillation_reset_dist: 0.2,
            extra_y_vels: Vec::new(),
        }
    }

    #[test]
    fn find_best_path_on_clear_straight_plan_moves_forward() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let builder = BfsDistanceFieldBuilder;
        let mut planner = LocalTrajectoryPlanner::new(&map, &model, &model, builder, default_config());
        planner.update_plan(vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)], false);

        let (traj, command) = planner.find_best_path(Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero());
        assert!(traj.is_legal());
        assert!(command.vx() > 0.0);
    }

    #[test]
    fn get_local_goal_reflects_final_plan_pose() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let builder = BfsDistanceFieldBuilder;
        let mut planner = LocalTrajectoryPlanner::new(&map, &model, &model, builder, default_config());
        planner.update_plan(vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)], true);
        let goal = planner.get_local_goal().unwrap();
        assert!((goal.0 - 8.5).abs() < 1e-9);
    }

    #[test]
    fn get_cell_costs_none_on_within_robot_cell() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let builder = BfsDistanceFieldBuilder;
        let mut planner = LocalTrajectoryPlanner::new(&map, &model, &model, builder, default_config());
        planner.update_plan(vec![Pose::new(0.5, 0.5, 0.0)], false);
        let _ = planner.find_best_path(Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero());
        assert!(planner.get_cell_costs(0, 0).is_none());
    }

    #[test]
    fn score_and_check_trajectory_agree_on_legality() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let builder = BfsDistanceFieldBuilder;
        let mut planner = LocalTrajectoryPlanner::new(&map, &model, &model, builder, default_config());
        planner.update_plan(vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)], true);
        let sample = BodyVelocity::new(0.5, 0.0, 0.0);
        let cost = planner.score_trajectory(Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero(), sample);
        assert_eq!(cost >= 0.0, planner.check_trajectory(Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero(), sample));
    }
}

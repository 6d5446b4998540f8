//! Velocity-space sampler (§4.4): enumerates `(vx, vy, vtheta)` candidates
//! over a rectangular grid derived from the configured limits and
//! (optionally) the dynamic window, rolls each one out, and tracks the
//! best trajectory under the composite ordering described below.

use log::{debug, warn};

use crate::costmap::CostmapView;
use crate::distance_field::DistanceGrid;
use crate::geometry::{BodyVelocity, Pose};
use crate::limits::{AccelLimits, CostWeights, Flags, SamplingConfig, VelocityLimits};
use crate::oscillation::{EscapeState, OscillationState};
use crate::trajectory::{generate_trajectory, RolloutContext, Trajectory, FOOTPRINT_HIT};
use crate::world_model::WorldModel;

/// Everything the sampler needs to roll out and compare candidates.
pub struct SamplerInputs<'a, M: CostmapView, W: WorldModel> {
    pub costmap: &'a M,
    pub world_model: &'a W,
    pub path_map: &'a DistanceGrid,
    pub goal_map: &'a DistanceGrid,
    pub plan: &'a [Pose],
    pub weights: CostWeights,
    pub flags: Flags,
    pub sampling: SamplingConfig,
    pub accel: AccelLimits,
    pub velocity: VelocityLimits,
    pub heading_lookahead: usize,
    pub backup_vel: f64,
    pub extra_y_vels: &'a [f64],
    pub oscillation_reset_dist: f64,
    pub escape_reset_dist: f64,
    pub escape_reset_theta: f64,
}

/// The admissible velocity envelope for this tick, after the final-goal
/// deceleration clamp and (if enabled) the dynamic-window intersection.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    min_vx: f64,
    max_vx: f64,
    min_vy: f64,
    max_vy: f64,
    min_vtheta: f64,
    max_vtheta: f64,
}

fn compute_envelope(velocity: VelocityLimits, accel: AccelLimits, flags: Flags, sampling: SamplingConfig, current: BodyVelocity, plan: &[Pose], pose: Pose) -> Envelope {
    let mut max_vx = velocity.max_vx;
    let mut max_vy = velocity.max_vy;

    if let Some(goal) = plan.last() {
        let clamp = pose.distance(goal) / sampling.sim_time;
        max_vx = max_vx.min(clamp);
        max_vy = max_vy.min(clamp);
    }

    let mut min_vx = velocity.min_vx.min(max_vx);
    let mut min_vy = -max_vy;
    let mut min_vtheta = velocity.min_vtheta;
    let mut max_vtheta = velocity.max_vtheta;

    if flags.use_dynamic_window {
        let sim_period = sampling.sim_period.unwrap_or(sampling.sim_time);

        let lower_vx = (current.vx() - accel.ax * sim_period).max(min_vx).max(velocity.min_vx);
        max_vx = (current.vx() + accel.ax * sim_period).min(max_vx);
        min_vx = lower_vx;

        // Source ambiguity preserved verbatim (see DESIGN.md): the
        // dynamic window for the y-axis is centered on the *x* velocity,
        // not the y velocity.
        let lower_vy = (current.vx() - accel.ay * sim_period).max(min_vy);
        max_vy = (current.vx() + accel.ay * sim_period).min(max_vy);
        min_vy = lower_vy;

        max_vtheta = (current.vtheta + accel.atheta * sim_period).min(max_vtheta);
        min_vtheta = (current.vtheta - accel.atheta * sim_period).max(min_vtheta);
    } else {
        max_vx = (current.vx() + accel.ax * sampling.sim_time).min(max_vx);
        max_vtheta = (current.vtheta + accel.atheta * sampling.sim_time).min(max_vtheta);
    }

    Envelope {
        min_vx,
        max_vx,
        min_vy,
        max_vy,
        min_vtheta,
        max_vtheta,
    }
}

fn step(lo: f64, hi: f64, n: u32) -> f64 {
    if n <= 1 {
        0.0
    } else {
        (hi - lo) / (n - 1) as f64
    }
}

/// Runs one full find-best-path search and returns the chosen trajectory.
/// Also updates `oscillation`/`escape` in place, per §4.5.
#[allow(clippy::too_many_arguments)]
pub fn find_best_trajectory<M: CostmapView, W: WorldModel>(
    inputs: &SamplerInputs<M, W>,
    pose: Pose,
    current_vel: BodyVelocity,
    oscillation: &mut OscillationState,
    escape: &mut EscapeState,
) -> Trajectory {
    let rollout_ctx = RolloutContext {
        costmap: inputs.costmap,
        world_model: inputs.world_model,
        path_map: inputs.path_map,
        goal_map: inputs.goal_map,
        plan: inputs.plan,
        weights: inputs.weights,
        flags: inputs.flags,
        sampling: inputs.sampling,
        accel: inputs.accel,
        heading_lookahead: inputs.heading_lookahead,
    };

    let env = compute_envelope(inputs.velocity, inputs.accel, inputs.flags, inputs.sampling, current_vel, inputs.plan, pose);

    let dvx = step(env.min_vx, env.max_vx, inputs.sampling.nx);
    let dvy = step(env.min_vy, env.max_vy, inputs.sampling.ny);
    let dvtheta = step(env.min_vtheta, env.max_vtheta, inputs.sampling.ntheta);

    let reference = generate_trajectory(&rollout_ctx, pose, current_vel, BodyVelocity::zero());
    let reference_goal_cost = reference.goal_cost_traj;

    let max_points = (inputs.sampling.sim_time / inputs.sampling.sim_granularity).round().max(1.0) as usize + 1;
    let mut best = Trajectory::initial(BodyVelocity::zero(), max_points);

    let forward_blocked = escape.escaping;

    let roll = |sample: BodyVelocity| generate_trajectory(&rollout_ctx, pose, current_vel, sample);

    let consider = |best: &mut Trajectory, candidate: Trajectory| -> bool {
        if !candidate.is_legal() {
            return false;
        }
        if candidate.goal_cost_traj >= reference_goal_cost {
            return false;
        }
        if !best.is_legal() || candidate.cost < best.cost {
            *best = candidate;
        }
        true
    };

    // Phase 1: forward fan + rotation sweep at each forward speed.
    let mut phase1_found = false;
    for kx in 0..inputs.sampling.nx {
        let vx = env.min_vx + kx as f64 * dvx;
        if forward_blocked && vx > 0.0 {
            continue;
        }
        let straight = roll(BodyVelocity::new(vx, 0.0, 0.0));
        phase1_found |= consider(&mut best, straight);

        for ktheta in 0..inputs.sampling.ntheta.saturating_sub(1) {
            let vtheta = env.min_vtheta + ktheta as f64 * dvtheta;
            if oscillation_forbids_rotation(oscillation, vtheta) {
                continue;
            }
            let candidate = roll(BodyVelocity::new(vx, 0.0, vtheta));
            phase1_found |= consider(&mut best, candidate);
        }
    }
    if !phase1_found {
        debug!("find_best_trajectory: forward fan produced no legal candidate");
    }

    if inputs.flags.holonomic {
        // Phase 2: pure lateral strafe.
        let mut phase2_found = false;
        for ky in 0..inputs.sampling.ny {
            let vy = env.min_vy + ky as f64 * dvy;
            if vy.abs() < 0.01 {
                continue;
            }
            if oscillation_forbids_strafe(oscillation, vy) {
                continue;
            }
            let candidate = roll(BodyVelocity::new(0.0, vy, 0.0));
            phase2_found |= consider(&mut best, candidate);
        }
        for &vy in inputs.extra_y_vels {
            if vy.abs() < 0.01 || oscillation_forbids_strafe(oscillation, vy) {
                continue;
            }
            phase2_found |= consider(&mut best, roll(BodyVelocity::new(0.0, vy, 0.0)));
        }
        if !phase2_found {
            debug!("find_best_trajectory: lateral strafe produced no legal candidate");
        }

        // Phase 3: lateral combined with small forward motion.
        let half_steps = (inputs.sampling.nx / 2).max(1);
        let half_span = (env.max_vx - env.min_vx) / 2.0;
        let dvx_half = if half_steps > 1 { half_span / half_steps as f64 } else { 0.0 };
        let mut phase3_found = false;
        for kx in 0..half_steps {
            let vx = env.min_vx / 2.0 + kx as f64 * dvx_half;
            if forward_blocked && vx > 0.0 {
                continue;
            }
            for ky in 0..inputs.sampling.ny {
                let vy = env.min_vy + ky as f64 * dvy;
                if vy.abs() < 0.01 || oscillation_forbids_strafe(oscillation, vy) {
                    continue;
                }
                phase3_found |= consider(&mut best, roll(BodyVelocity::new(vx, vy, 0.0)));
            }
        }
        if !phase3_found {
            debug!("find_best_trajectory: lateral+forward sweep produced no legal candidate");
        }
    }

    // Phase 4: in-place rotation.
    let mut phase4_found = false;
    for ktheta in 0..inputs.sampling.ntheta {
        let mut vtheta = env.min_vtheta + ktheta as f64 * dvtheta;
        if oscillation_forbids_rotation(oscillation, vtheta) {
            continue;
        }
        if vtheta.abs() < inputs.velocity.min_in_place_vtheta {
            vtheta = if vtheta < 0.0 {
                -inputs.velocity.min_in_place_vtheta
            } else {
                inputs.velocity.min_in_place_vtheta
            };
        }
        let candidate = roll(BodyVelocity::new(0.0, 0.0, vtheta));
        if !candidate.is_legal() {
            continue;
        }
        // A zero-translation sample can only ever tie the reference's
        // position-derived goal_cost_traj, never beat it strictly; allow
        // ties here so in-place rotation remains selectable (see
        // DESIGN.md).
        if candidate.goal_cost_traj > reference_goal_cost {
            continue;
        }
        if vtheta.abs() <= dvtheta {
            continue;
        }
        let lexicographically_better = candidate.cost < best.cost
            || (candidate.cost == best.cost && candidate.goal_cost_traj < best.goal_cost_traj);
        let beats_best = !best.is_legal()
            || (best.sample.vy() != 0.0 && candidate.cost < best.cost && candidate.goal_cost_traj < best.goal_cost_traj)
            || lexicographically_better;
        if beats_best {
            best = candidate;
            phase4_found = true;
        }
    }
    if !phase4_found {
        debug!("find_best_trajectory: in-place rotation produced no legal candidate");
    }

    // Phase 5: reverse escape if nothing legal was found.
    if !best.is_legal() {
        warn!("find_best_trajectory: no legal forward/rotation sample, falling back to reverse escape");
        let mut backup = roll(BodyVelocity::new(inputs.backup_vel, 0.0, 0.0));
        if backup.cost == FOOTPRINT_HIT {
            backup.cost = 1.0;
        }
        best = backup;
        escape.start(pose);
    }

    oscillation.update(pose, best.sample, inputs.oscillation_reset_dist);
    escape.maybe_reset(pose, inputs.escape_reset_dist, inputs.escape_reset_theta);

    best
}

fn oscillation_forbids_rotation(state: &OscillationState, vtheta: f64) -> bool {
    (vtheta > 0.0 && state.stuck_left) || (vtheta < 0.0 && state.stuck_right)
}

fn oscillation_forbids_strafe(state: &OscillationState, vy: f64) -> bool {
    (vy > 0.0 && state.stuck_right_strafe) || (vy < 0.0 && state.stuck_left_strafe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costmap::{GridCostmap, LETHAL};
    use crate::distance_field::{BfsDistanceFieldBuilder, DistanceFieldBuilder as _};
    use crate::limits::{AccelLimits, CostWeights, VelocityLimits};
    use crate::world_model::{CircularWorldModel, Footprint};

    fn weights() -> CostWeights {
        CostWeights {
            pdist_scale: 0.6,
            gdist_scale: 0.8,
            occdist_scale: 0.01,
            hdiff_scale: 1.0,
            path_distance_max: 0.0,
            heading_lookahead: 1,
        }
    }

    fn sampling() -> SamplingConfig {
        SamplingConfig {
            nx: 5,
            ny: 3,
            ntheta: 5,
            sim_time: 1.0,
            sim_granularity: 0.1,
            angular_sim_granularity: 0.1,
            sim_period: Some(0.1),
        }
    }

    fn accel() -> AccelLimits {
        AccelLimits { ax: 1.0, ay: 1.0, atheta: 1.0 }
    }

    #[test]
    fn dynamic_window_clamps_match_worked_example() {
        let velocity = VelocityLimits {
            min_vx: 0.0,
            max_vx: 5.0,
            min_vy: -1.0,
            max_vy: 1.0,
            min_vtheta: -1.0,
            max_vtheta: 1.0,
            min_in_place_vtheta: 0.2,
        };
        let accel = AccelLimits { ax: 1.0, ay: 1.0, atheta: 1.0 };
        let flags = Flags {
            holonomic: false,
            use_dynamic_window: true,
            heading_scoring: false,
            simple_attractor: false,
            meter_scoring: false,
        };
        let sampling = SamplingConfig {
            nx: 5,
            ny: 3,
            ntheta: 5,
            sim_time: 1.0,
            sim_granularity: 0.1,
            angular_sim_granularity: 0.1,
            sim_period: Some(0.1),
        };
        let current = BodyVelocity::new(2.0, 0.0, 0.0);
        let env = compute_envelope(velocity, accel, flags, sampling, current, &[], Pose::new(0.0, 0.0, 0.0));
        assert!((env.max_vx - 2.1).abs() < 1e-9);
        assert!((env.min_vx - 1.9).abs() < 1e-9);
    }

    fn default_flags() -> Flags {
        Flags {
            holonomic: false,
            use_dynamic_window: false,
            heading_scoring: false,
            simple_attractor: false,
            meter_scoring: false,
        }
    }

    #[test]
    fn straight_clear_plan_picks_forward_motion() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let mut path_map = DistanceGrid::new(10, 10);
        let mut goal_map = DistanceGrid::new(10, 10);
        let plan = vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)];
        let builder = BfsDistanceFieldBuilder;
        builder.set_target_cells(&mut path_map, &map, &plan);
        builder.set_local_goal(&mut goal_map, &map, &plan);

        let inputs = SamplerInputs {
            costmap: &map,
            world_model: &model,
            path_map: &path_map,
            goal_map: &goal_map,
            plan: &plan,
            weights: weights(),
            flags: default_flags(),
            sampling: sampling(),
            accel: accel(),
            velocity: VelocityLimits {
                min_vx: 0.0,
                max_vx: 1.0,
                min_vy: -0.5,
                max_vy: 0.5,
                min_vtheta: -1.0,
                max_vtheta: 1.0,
                min_in_place_vtheta: 0.2,
            },
            heading_lookahead: 1,
            backup_vel: -0.2,
            extra_y_vels: &[],
            oscillation_reset_dist: 0.2,
            escape_reset_dist: 0.5,
            escape_reset_theta: 0.5,
        };

        let mut oscillation = OscillationState::new();
        let mut escape = EscapeState::new();
        let best = find_best_trajectory(&inputs, Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero(), &mut oscillation, &mut escape);
        assert!(best.is_legal());
        assert!(best.sample.vx() > 0.0);
        assert!(best.sample.vy().abs() < 1e-9);
    }

    #[test]
    fn in_place_rotation_chosen_when_misaligned_with_heading_scoring() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.2));
        let mut path_map = DistanceGrid::new(10, 10);
        let mut goal_map = DistanceGrid::new(10, 10);
        let plan = vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)];
        let builder = BfsDistanceFieldBuilder;
        builder.set_target_cells(&mut path_map, &map, &plan);
        builder.set_local_goal(&mut goal_map, &map, &plan);

        let mut flags = default_flags();
        flags.heading_scoring = true;

        let inputs = SamplerInputs {
            costmap: &map,
            world_model: &model,
            path_map: &path_map,
            goal_map: &goal_map,
            plan: &plan,
            weights: weights(),
            flags,
            sampling: sampling(),
            accel: accel(),
            velocity: VelocityLimits {
                min_vx: 0.0,
                max_vx: 1.0,
                min_vy: 0.0,
                max_vy: 0.0,
                min_vtheta: -1.0,
                max_vtheta: 1.0,
                min_in_place_vtheta: 0.2,
            },
            heading_lookahead: 1,
            backup_vel: -0.2,
            extra_y_vels: &[],
            oscillation_reset_dist: 0.2,
            escape_reset_dist: 0.5,
            escape_reset_theta: 0.5,
        };

        let mut oscillation = OscillationState::new();
        let mut escape = EscapeState::new();
        let start = Pose::new(0.5, 0.5, std::f64::consts::FRAC_PI_2);
        let best = find_best_trajectory(&inputs, start, BodyVelocity::zero(), &mut oscillation, &mut escape);
        assert!(best.is_legal());
        assert!(best.sample.vtheta.abs() >= 0.2 - 1e-9);
        assert!(best.sample.vtheta < 0.0);
    }

    #[test]
    fn obstacle_blocking_forward_forces_rotation_or_escape() {
        let mut map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        map.set_cost(2, 0, LETHAL);
        let model = CircularWorldModel::new(&map, Footprint::circular(0.3));
        let mut path_map = DistanceGrid::new(10, 10);
        let mut goal_map = DistanceGrid::new(10, 10);
        let plan = vec![Pose::new(0.5, 0.5, 0.0), Pose::new(8.5, 0.5, 0.0)];
        let builder = BfsDistanceFieldBuilder;
        builder.set_target_cells(&mut path_map, &map, &plan);
        builder.set_local_goal(&mut goal_map, &map, &plan);

        let inputs = SamplerInputs {
            costmap: &map,
            world_model: &model,
            path_map: &path_map,
            goal_map: &goal_map,
            plan: &plan,
            weights: weights(),
            flags: default_flags(),
            sampling: sampling(),
            accel: accel(),
            velocity: VelocityLimits {
                min_vx: -0.3,
                max_vx: 1.0,
                min_vy: -0.5,
                max_vy: 0.5,
                min_vtheta: -1.0,
                max_vtheta: 1.0,
                min_in_place_vtheta: 0.2,
            },
            heading_lookahead: 1,
            backup_vel: -0.2,
            extra_y_vels: &[],
            oscillation_reset_dist: 0.2,
            escape_reset_dist: 0.5,
            escape_reset_theta: 0.5,
        };

        let mut oscillation = OscillationState::new();
        let mut escape = EscapeState::new();
        let best = find_best_trajectory(&inputs, Pose::new(0.5, 0.5, 0.0), BodyVelocity::zero(), &mut oscillation, &mut escape);
        // Either an in-place rotation (vx == 0) or a reverse escape (vx < 0);
        // never a large forward sample that would drive through the obstacle.
        assert!(best.sample.vx() <= 0.0);
    }
}

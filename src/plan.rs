//! The externally-supplied global plan and the heading-scoring evaluation
//! that walks it (§4.3.1). Global planning itself is out of scope; this
//! module only consumes a finite ordered sequence of world-frame poses.

use crate::geometry::{shortest_angular_distance, Pose};

/// A finite ordered sequence of world-frame poses; index 0 is the start
/// side, the last element is the final goal. May be empty.
pub type GlobalPlan = Vec<Pose>;

/// Side effects of the heading-scoring evaluation: the heading error at the
/// look-ahead pose, and the `path_dist`/`goal_dist` it also determines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingEval {
    pub heading_diff: f64,
    pub path_dist: f64,
    pub goal_dist: f64,
}

/// Walk `plan` from the end toward the start accumulating cumulative arc
/// length, find the plan index nearest to `(x, y)`, look `look_ahead`
/// indices further along, and return the heading error there plus the
/// `path_dist`/`goal_dist` side effects described in spec.md §4.3.1.
///
/// Returns `None` for an empty plan (the caller should not reach this case
/// in practice since `heading_scoring` implies a non-empty plan, but the
/// function stays total).
pub fn heading_diff_eval(plan: &[Pose], x: f64, y: f64, theta: f64, look_ahead: usize) -> Option<HeadingEval> {
    if plan.is_empty() {
        return None;
    }
    let last = plan.len() - 1;

    // arc_length_from[i] = cumulative arc length from plan[i] to plan[last].
    let mut arc_length_from = vec![0.0f64; plan.len()];
    let mut cumulative = 0.0f64;
    for i in (0..last).rev() {
        cumulative += plan[i].distance(&plan[i + 1]);
        arc_length_from[i] = cumulative;
    }
    let plan_length = (plan.len() as f64).max(1.0);

    let current = Pose::new(x, y, theta);
    let (i_star, min_dist) = plan
        .iter()
        .enumerate()
        .map(|(i, p)| (i, current.distance(p)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .expect("plan is non-empty");

    let j = (i_star + look_ahead).min(last);
    let plan_yaw_j = plan[j].theta;
    let heading_diff = shortest_angular_distance(theta, plan_yaw_j).abs();

    let mut goal_dist = arc_length_from[j] + (last - j) as f64 / plan_length;
    if goal_dist == 0.0 {
        goal_dist = current.distance(&plan[last]);
    }

    Some(HeadingEval {
        heading_diff,
        path_dist: min_dist,
        goal_dist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_plan() -> GlobalPlan {
        (0..10).map(|i| Pose::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn nearest_index_picks_closest_pose() {
        let plan = straight_plan();
        let eval = heading_diff_eval(&plan, 3.1, 0.0, 0.0, 0).unwrap();
        assert!(eval.path_dist < 0.2);
    }

    #[test]
    fn look_ahead_extracts_yaw_further_along() {
        let mut plan = straight_plan();
        // give the last pose a distinct yaw so look-ahead is observable
        let last = plan.len() - 1;
        plan[last].theta = std::f64::consts::FRAC_PI_2;
        let eval = heading_diff_eval(&plan, 7.0, 0.0, 0.0, 5).unwrap();
        assert!((eval.heading_diff - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn goal_dist_falls_back_to_euclidean_when_zero() {
        let plan = vec![Pose::new(5.0, 5.0, 0.0)];
        let eval = heading_diff_eval(&plan, 0.0, 0.0, 0.0, 10).unwrap();
        let expected = (5.0f64 * 5.0 + 5.0 * 5.0).sqrt();
        assert!((eval.goal_dist - expected).abs() < 1e-6);
    }

    #[test]
    fn empty_plan_returns_none() {
        assert!(heading_diff_eval(&[], 0.0, 0.0, 0.0, 0).is_none());
    }
}

//! Kinematic integrator: analytic pose/velocity stepping for a nonholonomic
//! body-frame-controlled platform, plus angle-difference arithmetic used
//! throughout scoring and the oscillation state machine.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// World-frame pose: `(x, y, theta)` in meters and radians. `theta` is never
/// normalized by the integrator; callers compare angles with
/// [`shortest_angular_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector2<f64>,
    pub theta: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            theta,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn distance_squared(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm_squared()
    }

    pub fn distance(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm()
    }
}

/// Body-frame velocity: `vx`, `vy` in m/s, `vtheta` in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyVelocity {
    pub translation: Vector2<f64>,
    pub vtheta: f64,
}

impl BodyVelocity {
    pub fn new(vx: f64, vy: f64, vtheta: f64) -> Self {
        Self {
            translation: Vector2::new(vx, vy),
            vtheta,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn vx(&self) -> f64 {
        self.translation.x
    }

    pub fn vy(&self) -> f64 {
        self.translation.y
    }

    /// Magnitude of the translational component, `hypot(vx, vy)`.
    pub fn translational_speed(&self) -> f64 {
        self.translation.norm()
    }
}

/// Single-axis accel-limited approach to a target scalar velocity.
///
/// `accel` and `dt` are assumed strictly positive; the caller (the rollout
/// and the sampler's dynamic-window bound) is responsible for that.
pub fn step_velocity(target: f64, current: f64, accel: f64, dt: f64) -> f64 {
    if current < target {
        (current + accel * dt).min(target)
    } else if current > target {
        (current - accel * dt).max(target)
    } else {
        target
    }
}

/// Body-to-world pose step over `dt` given a constant body-frame velocity.
pub fn step_pose(pose: Pose, vel: BodyVelocity, dt: f64) -> Pose {
    let (sin_t, cos_t) = pose.theta.sin_cos();
    let (vx, vy) = (vel.vx(), vel.vy());
    Pose {
        position: Vector2::new(
            pose.x() + (vx * cos_t - vy * sin_t) * dt,
            pose.y() + (vx * sin_t + vy * cos_t) * dt,
        ),
        theta: pose.theta + vel.vtheta * dt,
    }
}

/// Signed shortest angular distance from `a` to `b`, in `(-pi, pi]`.
///
/// Generalizes the single-angle `[-pi, pi]` wrap used elsewhere in the
/// corpus to the signed difference of two arbitrary (possibly unwrapped)
/// angles: `shortest_angular_distance(a, a) == 0` and the magnitude never
/// exceeds `pi`.
pub fn shortest_angular_distance(a: f64, b: f64) -> f64 {
    normalize_angle(b - a)
}

/// Wrap an angle into `(-pi, pi]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_velocity_approaches_target_without_overshoot() {
        assert_eq!(step_velocity(1.0, 0.0, 0.5, 1.0), 0.5);
        assert_eq!(step_velocity(1.0, 0.9, 0.5, 1.0), 1.0);
        assert_eq!(step_velocity(-1.0, 0.0, 0.5, 1.0), -0.5);
        assert_eq!(step_velocity(-1.0, -0.9, 0.5, 1.0), -1.0);
        assert_eq!(step_velocity(0.3, 0.3, 0.5, 1.0), 0.3);
    }

    #[test]
    fn step_pose_moves_in_body_frame() {
        let p = Pose::new(0.0, 0.0, 0.0);
        let v = BodyVelocity::new(1.0, 0.0, 0.0);
        let p2 = step_pose(p, v, 1.0);
        assert!((p2.x() - 1.0).abs() < 1e-9);
        assert!((p2.y() - 0.0).abs() < 1e-9);

        let p = Pose::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let v = BodyVelocity::new(1.0, 0.0, 0.0);
        let p2 = step_pose(p, v, 1.0);
        assert!((p2.x() - 0.0).abs() < 1e-9);
        assert!((p2.y() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn step_pose_does_not_normalize_theta() {
        let p = Pose::new(0.0, 0.0, 3.0);
        let v = BodyVelocity::new(0.0, 0.0, 2.0);
        let p2 = step_pose(p, v, 1.0);
        assert!((p2.theta - 5.0).abs() < 1e-9);
    }

    #[test]
    fn shortest_angular_distance_self_is_zero() {
        for a in [-3.0, -1.0, 0.0, 1.0, 3.0, 10.0, -10.0] {
            assert!(shortest_angular_distance(a, a).abs() < 1e-9);
        }
    }

    #[test]
    fn shortest_angular_distance_bounded_by_pi() {
        let cases = [(0.0, PI), (0.0, -PI), (1.0, -1.0), (-3.0, 3.0), (0.0, 100.0)];
        for (a, b) in cases {
            assert!(shortest_angular_distance(a, b).abs() <= PI + 1e-9);
        }
    }

    #[test]
    fn shortest_angular_distance_wraps_correctly() {
        assert!((shortest_angular_distance(0.0, PI / 2.0) - PI / 2.0).abs() < 1e-9);
        assert!((shortest_angular_distance(3.0, -3.0) - (2.0 * PI - 6.0)).abs() < 1e-9);
    }
}

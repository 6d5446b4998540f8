//! Oscillation / escape state machine (§4.5): stateful flags that forbid
//! reversing a direction of rotation or strafe until the robot has
//! translated far enough, and the escape anchor that gates reverse-escape
//! recovery. Expressed as a flat record of booleans plus two anchor
//! points, per the Design Notes' "not a class hierarchy" guidance.

use crate::geometry::{shortest_angular_distance, BodyVelocity, Pose};

/// Anti-oscillation flags and translation anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OscillationState {
    pub rotating_left: bool,
    pub rotating_right: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub stuck_left: bool,
    pub stuck_right: bool,
    pub stuck_left_strafe: bool,
    pub stuck_right_strafe: bool,
    prev_x: f64,
    prev_y: f64,
}

impl OscillationState {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_flags(&mut self) {
        self.rotating_left = false;
        self.rotating_right = false;
        self.strafe_left = false;
        self.strafe_right = false;
        self.stuck_left = false;
        self.stuck_right = false;
        self.stuck_left_strafe = false;
        self.stuck_right_strafe = false;
    }

    /// Classify `chosen` against the prior state when it makes no forward
    /// progress (`vx <= 0`), then reset flags if the robot has translated
    /// past `oscillation_reset_dist` since the last anchor. The anchor
    /// itself only moves on no-forward-progress ticks, so a run of forward
    /// progress doesn't quietly erase how far the robot has drifted since
    /// it first got stuck.
    pub fn update(&mut self, pose: Pose, chosen: BodyVelocity, oscillation_reset_dist: f64) {
        if chosen.vx() <= 0.0 {
            if chosen.vtheta < 0.0 {
                if self.rotating_right {
                    self.stuck_right = true;
                }
                self.rotating_right = true;
            } else if chosen.vtheta > 0.0 {
                if self.rotating_left {
                    self.stuck_left = true;
                }
                self.rotating_left = true;
            }

            if chosen.vy() > 0.0 {
                if self.strafe_right {
                    self.stuck_right_strafe = true;
                }
                self.strafe_right = true;
            } else if chosen.vy() < 0.0 {
                if self.strafe_left {
                    self.stuck_left_strafe = true;
                }
                self.strafe_left = true;
            }
        }

        if (pose.x() - self.prev_x).hypot(pose.y() - self.prev_y) > oscillation_reset_dist {
            self.clear_flags();
        }

        if chosen.vx() <= 0.0 {
            self.prev_x = pose.x();
            self.prev_y = pose.y();
        }
    }
}

/// Escape-recovery state: whether the robot is currently backing up, and
/// the pose it started escaping from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeState {
    pub escaping: bool,
    pub escape_x: f64,
    pub escape_y: f64,
    pub escape_theta: f64,
}

impl Default for EscapeState {
    fn default() -> Self {
        Self {
            escaping: false,
            escape_x: 0.0,
            escape_y: 0.0,
            escape_theta: 0.0,
        }
    }
}

impl EscapeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin escaping from `pose`.
    pub fn start(&mut self, pose: Pose) {
        self.escaping = true;
        self.escape_x = pose.x();
        self.escape_y = pose.y();
        self.escape_theta = pose.theta;
    }

    /// Clear `escaping` once the robot has moved past `escape_reset_dist`
    /// or rotated past `escape_reset_theta` from the escape anchor (P7).
    pub fn maybe_reset(&mut self, pose: Pose, escape_reset_dist: f64, escape_reset_theta: f64) {
        if !self.escaping {
            return;
        }
        let moved = (pose.x() - self.escape_x).hypot(pose.y() - self.escape_y);
        let rotated = shortest_angular_distance(self.escape_theta, pose.theta).abs();
        if moved > escape_reset_dist || rotated > escape_reset_theta {
            self.escaping = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_left_rotation_without_translation_sets_stuck_left() {
        let mut state = OscillationState::new();
        let pose = Pose::new(0.0, 0.0, 0.0);
        let left = BodyVelocity::new(0.0, 0.0, 0.5);
        state.update(pose, left, 1.0);
        assert!(state.rotating_left);
        assert!(!state.stuck_left);
        state.update(pose, left, 1.0);
        assert!(state.stuck_left);
    }

    #[test]
    fn translating_past_reset_dist_clears_flags() {
        let mut state = OscillationState::new();
        let left = BodyVelocity::new(0.0, 0.0, 0.5);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        assert!(state.stuck_left);
        state.update(Pose::new(5.0, 0.0, 0.0), left, 1.0);
        assert!(!state.stuck_left);
        assert!(!state.rotating_left);
    }

    #[test]
    fn anchor_only_moves_on_no_forward_progress_ticks() {
        let mut state = OscillationState::new();
        let left = BodyVelocity::new(0.0, 0.0, 0.5);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        assert!(state.stuck_left);

        // forward progress ticks must not drag the anchor along with the pose
        let forward = BodyVelocity::new(0.5, 0.0, 0.0);
        state.update(Pose::new(0.3, 0.0, 0.0), forward, 1.0);
        state.update(Pose::new(0.6, 0.0, 0.0), forward, 1.0);
        assert!(state.stuck_left, "forward-progress ticks should not reset flags or move the anchor");

        // cumulative drift from the original anchor (0,0), not from the last pose, should clear flags
        state.update(Pose::new(1.2, 0.0, 0.0), left, 1.0);
        assert!(!state.stuck_left);
    }

    #[test]
    fn stuck_implies_rotating() {
        let mut state = OscillationState::new();
        let left = BodyVelocity::new(0.0, 0.0, 0.5);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        state.update(Pose::new(0.0, 0.0, 0.0), left, 1.0);
        assert!(state.stuck_left);
        assert!(state.rotating_left);
    }

    #[test]
    fn escape_resets_after_moving_past_threshold() {
        let mut escape = EscapeState::new();
        escape.start(Pose::new(0.0, 0.0, 0.0));
        assert!(escape.escaping);
        escape.maybe_reset(Pose::new(0.05, 0.0, 0.0), 0.5, 0.5);
        assert!(escape.escaping);
        escape.maybe_reset(Pose::new(1.0, 0.0, 0.0), 0.5, 0.5);
        assert!(!escape.escaping);
    }

    #[test]
    fn escape_resets_after_rotating_past_threshold() {
        let mut escape = EscapeState::new();
        escape.start(Pose::new(0.0, 0.0, 0.0));
        escape.maybe_reset(Pose::new(0.0, 0.0, 1.0), 0.5, 0.5);
        assert!(!escape.escaping);
    }
}

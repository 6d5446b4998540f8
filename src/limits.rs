//! Configuration aggregates: velocity/acceleration envelopes, the sampling
//! grid, cost-term weights, behavior flags, and the escape/oscillation
//! tunables. These compose into [`PlannerConfig`], the unit that
//! `reconfigure` replaces atomically under the planner's configuration
//! mutex.

use serde::{Deserialize, Serialize};

/// Strictly-positive per-axis acceleration limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelLimits {
    pub ax: f64,
    pub ay: f64,
    pub atheta: f64,
}

/// Per-axis velocity envelope, including the minimum magnitude used when
/// bumping an in-place rotation sample away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityLimits {
    pub min_vx: f64,
    pub max_vx: f64,
    pub min_vy: f64,
    pub max_vy: f64,
    pub min_vtheta: f64,
    pub max_vtheta: f64,
    pub min_in_place_vtheta: f64,
}

/// Sample-grid and rollout-horizon configuration. `nx`, `ny`, `ntheta` are
/// coerced to at least 1 by [`PlannerConfig::reconfigure_sampling`] /
/// `SamplingConfig::coerced`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub nx: u32,
    pub ny: u32,
    pub ntheta: u32,
    pub sim_time: f64,
    pub sim_granularity: f64,
    pub angular_sim_granularity: f64,
    pub sim_period: Option<f64>,
}

impl SamplingConfig {
    /// Returns a copy with `nx`/`ny`/`ntheta` coerced to at least 1, per
    /// spec: `reconfigure` never fails on a bad sample count.
    pub fn coerced(self) -> Self {
        Self {
            nx: self.nx.max(1),
            ny: self.ny.max(1),
            ntheta: self.ntheta.max(1),
            ..self
        }
    }
}

/// Non-negative weights for the four cost terms, plus the path-distance
/// suppression threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    pub pdist_scale: f64,
    pub gdist_scale: f64,
    pub occdist_scale: f64,
    pub hdiff_scale: f64,
    pub path_distance_max: f64,
    /// How many plan indices ahead of the nearest pose to look when
    /// extracting the heading-scoring yaw target (§4.3.1).
    pub heading_lookahead: usize,
}

impl CostWeights {
    /// Scale the three map-derived weights by the costmap resolution so
    /// cost units are meters, per `meter_scoring`.
    pub fn scaled_by_resolution(self, resolution: f64) -> Self {
        Self {
            pdist_scale: self.pdist_scale * resolution,
            gdist_scale: self.gdist_scale * resolution,
            occdist_scale: self.occdist_scale * resolution,
            ..self
        }
    }
}

/// Behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub holonomic: bool,
    pub use_dynamic_window: bool,
    pub heading_scoring: bool,
    pub simple_attractor: bool,
    pub meter_scoring: bool,
}

/// Anti-oscillation / escape tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EscapeConfig {
    pub escape_reset_dist: f64,
    pub escape_reset_theta: f64,
    pub backup_vel: f64,
}

/// The full, atomically-swapped configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub velocity: VelocityLimits,
    pub accel: AccelLimits,
    pub sampling: SamplingConfig,
    pub weights: CostWeights,
    pub flags: Flags,
    pub escape: EscapeConfig,
    pub oscillation_reset_dist: f64,
    /// Extra y-velocities to probe in the holonomic lateral sweeps, parsed
    /// from a whitespace/comma separated configuration string by
    /// [`crate::config::parse_extra_y_vels`].
    pub extra_y_vels: Vec<f64>,
}

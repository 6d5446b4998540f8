//! Caller-facing construction/configuration errors. Rollout and sampler
//! failures never appear here — they stay inside the sentinel taxonomy on
//! [`crate::trajectory::Trajectory::cost`].

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("footprint polygon has no vertices")]
    EmptyFootprint,
    #[error("distance grid is {grid_w}x{grid_h}, costmap is {map_w}x{map_h}")]
    InconsistentGridDimensions {
        grid_w: usize,
        grid_h: usize,
        map_w: usize,
        map_h: usize,
    },
}

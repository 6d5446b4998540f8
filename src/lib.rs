//! Core of a sampling-based local trajectory controller: forward-simulates
//! velocity-space candidates against path/goal distance fields and a
//! costmap, searches the admissible velocity envelope under acceleration
//! and dynamic-window constraints, and guards against oscillation with a
//! reverse-escape fallback.
//!
//! The costmap, distance-field builder, world model, and global planner are
//! external collaborators reached through the [`costmap::CostmapView`],
//! [`world_model::WorldModel`], [`world_model::FootprintProvider`], and
//! [`distance_field::DistanceFieldBuilder`] traits; this crate bundles
//! minimal reference implementations of each so it is independently
//! testable and runnable without a full navigation stack.

pub mod config;
pub mod costmap;
pub mod distance_field;
pub mod error;
pub mod geometry;
pub mod limits;
pub mod oscillation;
pub mod plan;
pub mod planner;
pub mod sampler;
pub mod trajectory;
pub mod world_model;

pub use config::parse_extra_y_vels;
pub use costmap::{CostmapView, GridCostmap};
pub use distance_field::{BfsDistanceFieldBuilder, DistanceFieldBuilder, DistanceGrid};
pub use error::PlannerError;
pub use geometry::{shortest_angular_distance, BodyVelocity, Pose};
pub use limits::{AccelLimits, CostWeights, EscapeConfig, Flags, PlannerConfig, SamplingConfig, VelocityLimits};
pub use oscillation::{EscapeState, OscillationState};
pub use plan::{GlobalPlan, HeadingEval};
pub use planner::{CellCosts, LocalTrajectoryPlanner};
pub use trajectory::Trajectory;
pub use world_model::{CircularWorldModel, Footprint, FootprintProvider, WorldModel};

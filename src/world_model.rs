//! The footprint/world-model collaborator (§4.2, §6). The core never
//! inspects polygon geometry itself — it hands the world model a pose plus
//! the precomputed inscribed/circumscribed radii and trusts the returned
//! cost sign. `line_cost` is a self-contained extension used by callers that
//! want a ray-traced cost query; it is not on the main rollout path.

use crate::costmap::{CostmapView, INSCRIBED_INFLATED, LETHAL, NO_INFORMATION};
use crate::error::PlannerError;
use crate::geometry::Pose;

/// A ground-plan polygon in the robot's body frame, used only by the
/// bundled reference world model (the core itself treats it as opaque).
#[derive(Debug, Clone)]
pub struct Footprint {
    /// Vertices in body frame, in order.
    pub vertices: Vec<(f64, f64)>,
    pub inscribed_radius: f64,
    pub circumscribed_radius: f64,
}

impl Footprint {
    pub fn circular(radius: f64) -> Self {
        Self {
            vertices: vec![(radius, 0.0), (0.0, radius), (-radius, 0.0), (0.0, -radius)],
            inscribed_radius: radius,
            circumscribed_radius: radius,
        }
    }

    /// Build from an explicit polygon, rejecting the degenerate zero-vertex
    /// case a host configuration could otherwise pass through silently.
    pub fn new(vertices: Vec<(f64, f64)>, inscribed_radius: f64, circumscribed_radius: f64) -> Result<Self, PlannerError> {
        if vertices.is_empty() {
            return Err(PlannerError::EmptyFootprint);
        }
        Ok(Self {
            vertices,
            inscribed_radius,
            circumscribed_radius,
        })
    }
}

/// Delegate for collision/cost queries against the robot's footprint
/// polygon at a world pose. A negative return means illegal/in-collision.
/// The core must never dereference world-model internals beyond this
/// single query (spec.md §4.2).
pub trait WorldModel {
    fn footprint_cost(&self, x: f64, y: f64, theta: f64) -> f64;
}

/// Provides the set of costmap cells a footprint polygon covers at a pose,
/// used by the planner façade to mark `within_robot` cells before a
/// distance-field rebuild.
pub trait FootprintProvider {
    fn footprint_cells(&self, pose: Pose, fill_interior: bool) -> Vec<(i64, i64)>;
}

/// A minimal reference world model: treats the robot as a disc of
/// `circumscribed_radius` and fails a pose if any costmap cell within that
/// radius is lethal, inscribed-inflated, unknown, or off the map.
///
/// This is deliberately conservative (a disc, not the true polygon) — it
/// exists so the crate's own tests and demo binary have a working collision
/// oracle without depending on a full polygon-intersection engine, which
/// spec.md places outside THE CORE's scope.
pub struct CircularWorldModel<'a, M: CostmapView> {
    pub costmap: &'a M,
    pub footprint: Footprint,
}

impl<'a, M: CostmapView> CircularWorldModel<'a, M> {
    pub fn new(costmap: &'a M, footprint: Footprint) -> Self {
        Self { costmap, footprint }
    }
}

impl<'a, M: CostmapView> WorldModel for CircularWorldModel<'a, M> {
    fn footprint_cost(&self, x: f64, y: f64, _theta: f64) -> f64 {
        let radius_cells = (self.footprint.circumscribed_radius / self.costmap.resolution()).ceil() as i64;
        let (cx, cy) = match self.costmap.world_to_map(x, y) {
            Some(c) => c,
            None => return -1.0,
        };

        let mut max_cost = 0.0f64;
        for dy in -radius_cells..=radius_cells {
            for dx in -radius_cells..=radius_cells {
                let dist = ((dx * dx + dy * dy) as f64).sqrt() * self.costmap.resolution();
                if dist > self.footprint.circumscribed_radius {
                    continue;
                }
                let cost = self.costmap.get_cost(cx + dx, cy + dy);
                if cost == LETHAL || cost == INSCRIBED_INFLATED || cost == NO_INFORMATION {
                    return -1.0;
                }
                max_cost = max_cost.max(cost as f64);
            }
        }
        max_cost
    }
}

impl<'a, M: CostmapView> FootprintProvider for CircularWorldModel<'a, M> {
    fn footprint_cells(&self, pose: Pose, _fill_interior: bool) -> Vec<(i64, i64)> {
        let radius_cells = (self.footprint.circumscribed_radius / self.costmap.resolution()).ceil() as i64;
        let (cx, cy) = match self.costmap.world_to_map(pose.x(), pose.y()) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let mut cells = Vec::new();
        for dy in -radius_cells..=radius_cells {
            for dx in -radius_cells..=radius_cells {
                let dist = ((dx * dx + dy * dy) as f64).sqrt() * self.costmap.resolution();
                if dist <= self.footprint.circumscribed_radius {
                    cells.push((cx + dx, cy + dy));
                }
            }
        }
        cells
    }
}

/// Maximum per-cell cost along an integer Bresenham traversal from
/// `(x0,y0)` to `(x1,y1)` (world coordinates), or `-1.0` if any traversed
/// cell is lethal, inscribed-inflated, or unknown.
///
/// Grounded on the Bresenham stepping used by the retrieved costmap
/// reference file's `raytrace`, generalized from "mark free along the ray"
/// to "return the worst cost along the ray".
pub fn line_cost<M: CostmapView>(costmap: &M, (x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> f64 {
    let (Some((mut x, mut y)), Some((x1, y1))) = (costmap.world_to_map(x0, y0), costmap.world_to_map(x1, y1)) else {
        return -1.0;
    };

    let dx = (x1 - x).abs();
    let dy = (y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut max_cost = 0.0f64;
    loop {
        let cost = costmap.get_cost(x, y);
        if cost == LETHAL || cost == INSCRIBED_INFLATED || cost == NO_INFORMATION {
            return -1.0;
        }
        max_cost = max_cost.max(cost as f64);

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
    max_cost
}

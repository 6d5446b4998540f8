//! The distance-field collaborator (§4.3, §6): two dense grids over the
//! costmap — `path_map` (distance in cells from each free cell to the
//! nearest global-plan cell) and `goal_map` (distance to the local goal
//! cell along the plan) — plus the `within_robot` flag used to exclude
//! footprint-occupied cells from scoring.
//!
//! Building these grids from a costmap and a global plan is explicitly an
//! external collaborator's job (spec.md §1); this module defines the
//! narrow `DistanceFieldBuilder` trait plus a BFS reference
//! implementation, grounded on the retrieved `path_distance_map` /
//! `goal_distance_map` pattern in the pack's `dwa_planner.rs` file.

use crate::costmap::{CostmapView, LETHAL, NO_INFORMATION};
use crate::error::PlannerError;
use crate::geometry::Pose;
use std::collections::VecDeque;

/// Sentinel marking a cell whose distance could not be computed because it
/// sits on/behind an obstacle.
pub const OBSTACLE_COST: u32 = u32::MAX;
/// Sentinel marking a cell never reached by the BFS fill (disconnected from
/// every seed cell).
pub const UNREACHABLE: u32 = u32::MAX - 1;

/// Per-cell distance-field entry. `within_robot` is only meaningful in
/// `path_map`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceCell {
    pub target_dist: u32,
    pub within_robot: bool,
}

impl Default for DistanceCell {
    fn default() -> Self {
        Self {
            target_dist: UNREACHABLE,
            within_robot: false,
        }
    }
}

/// Dense 2-D distance field, always sized to match the costmap it was
/// built from.
#[derive(Debug, Clone)]
pub struct DistanceGrid {
    pub width: usize,
    pub height: usize,
    cells: Vec<DistanceCell>,
}

impl DistanceGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![DistanceCell::default(); width * height],
        }
    }

    fn index(&self, cx: i64, cy: i64) -> Option<usize> {
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            None
        } else {
            Some(cy as usize * self.width + cx as usize)
        }
    }

    pub fn get(&self, cx: i64, cy: i64) -> Option<DistanceCell> {
        self.index(cx, cy).map(|idx| self.cells[idx])
    }

    pub fn set(&mut self, cx: i64, cy: i64, cell: DistanceCell) {
        if let Some(idx) = self.index(cx, cy) {
            self.cells[idx] = cell;
        }
    }

    pub fn mark_within_robot(&mut self, cx: i64, cy: i64) {
        if let Some(idx) = self.index(cx, cy) {
            self.cells[idx].within_robot = true;
        }
    }

    /// Check this grid's dimensions against `costmap`'s, for callers (the
    /// bundled reference builder) that need to fail loudly on a mismatch
    /// instead of silently clipping lookups.
    pub fn ensure_matches<M: CostmapView>(&self, costmap: &M) -> Result<(), PlannerError> {
        if self.width == costmap.size_x() && self.height == costmap.size_y() {
            Ok(())
        } else {
            Err(PlannerError::InconsistentGridDimensions {
                grid_w: self.width,
                grid_h: self.height,
                map_w: costmap.size_x(),
                map_h: costmap.size_y(),
            })
        }
    }

    /// Reset every cell to `target_dist = UNREACHABLE`, `within_robot =
    /// false` (P5). Resizes if the costmap dimensions changed.
    pub fn reset(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells = vec![DistanceCell::default(); width * height];
        } else {
            self.cells.fill(DistanceCell::default());
        }
    }

    /// Reset every cell's `target_dist` back to `UNREACHABLE` without
    /// touching `within_robot`, so a caller that already marked footprint
    /// cells on this grid can rebuild the distance field without losing
    /// those marks. Resizes (and clears marks) if the costmap dimensions
    /// changed.
    pub fn reset_distances(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.cells = vec![DistanceCell::default(); width * height];
        } else {
            for cell in &mut self.cells {
                cell.target_dist = UNREACHABLE;
            }
        }
    }
}

/// Builder for the two distance-field grids from a costmap and a global
/// plan. Implementations may use any fill strategy; the reference
/// implementation below uses a multi-source BFS.
pub trait DistanceFieldBuilder<M: CostmapView> {
    fn reset(&self, grid: &mut DistanceGrid, costmap: &M);
    fn set_target_cells(&self, grid: &mut DistanceGrid, costmap: &M, plan: &[Pose]);
    /// Populates `grid` with distance to a local goal chosen from `plan`
    /// (by convention, the plan's final pose) and returns that goal's
    /// world coordinates.
    fn set_local_goal(&self, grid: &mut DistanceGrid, costmap: &M, plan: &[Pose]) -> Option<(f64, f64)>;
}

/// Multi-source breadth-first fill: every plan cell (or the single local
/// goal cell) is a zero-distance seed; free cells reachable without
/// crossing a lethal/unknown cell get the seed's BFS depth; obstacle cells
/// get `OBSTACLE_COST`; unreached free cells keep `UNREACHABLE`.
pub struct BfsDistanceFieldBuilder;

impl BfsDistanceFieldBuilder {
    fn fill_from_seeds<M: CostmapView>(&self, grid: &mut DistanceGrid, costmap: &M, seeds: &[(i64, i64)]) {
        // Recompute target_dist only; within_robot marks may already have
        // been set on this grid by the caller and must survive the rebuild.
        grid.reset_distances(costmap.size_x(), costmap.size_y());

        for cy in 0..costmap.size_y() as i64 {
            for cx in 0..costmap.size_x() as i64 {
                let cost = costmap.get_cost(cx, cy);
                if cost == LETHAL || cost == NO_INFORMATION {
                    let within_robot = grid.get(cx, cy).map(|c| c.within_robot).unwrap_or(false);
                    grid.set(cx, cy, DistanceCell { target_dist: OBSTACLE_COST, within_robot });
                }
            }
        }

        let mut queue: VecDeque<(i64, i64)> = VecDeque::new();
        for &(sx, sy) in seeds {
            if let Some(cell) = grid.get(sx, sy) {
                if cell.target_dist == OBSTACLE_COST {
                    continue;
                }
            } else {
                continue;
            }
            let current = grid.get(sx, sy).unwrap();
            if current.target_dist != 0 {
                grid.set(
                    sx,
                    sy,
                    DistanceCell {
                        target_dist: 0,
                        within_robot: current.within_robot,
                    },
                );
                queue.push_back((sx, sy));
            }
        }

        const NEIGHBORS: [(i64, i64); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];

        while let Some((cx, cy)) = queue.pop_front() {
            let d = grid.get(cx, cy).unwrap().target_dist;
            for (dx, dy) in NEIGHBORS {
                let (nx, ny) = (cx + dx, cy + dy);
                let Some(neighbor) = grid.get(nx, ny) else {
                    continue;
                };
                if neighbor.target_dist == OBSTACLE_COST {
                    continue;
                }
                if neighbor.target_dist == UNREACHABLE {
                    grid.set(
                        nx,
                        ny,
                        DistanceCell {
                            target_dist: d + 1,
                            within_robot: neighbor.within_robot,
                        },
                    );
                    queue.push_back((nx, ny));
                }
            }
        }
    }
}

impl<M: CostmapView> DistanceFieldBuilder<M> for BfsDistanceFieldBuilder {
    fn reset(&self, grid: &mut DistanceGrid, costmap: &M) {
        grid.reset(costmap.size_x(), costmap.size_y());
    }

    fn set_target_cells(&self, grid: &mut DistanceGrid, costmap: &M, plan: &[Pose]) {
        let seeds: Vec<(i64, i64)> = plan
            .iter()
            .filter_map(|pose| costmap.world_to_map(pose.x(), pose.y()))
            .collect();
        self.fill_from_seeds(grid, costmap, &seeds);
    }

    fn set_local_goal(&self, grid: &mut DistanceGrid, costmap: &M, plan: &[Pose]) -> Option<(f64, f64)> {
        let goal_pose = plan.last()?;
        let seed = costmap.world_to_map(goal_pose.x(), goal_pose.y())?;
        self.fill_from_seeds(grid, costmap, &[seed]);
        Some((goal_pose.x(), goal_pose.y()))
    }
}

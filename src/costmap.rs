//! The costmap collaborator: a read-only view the core queries for per-cell
//! occupancy cost and world/cell coordinate mapping. Building, inflating and
//! maintaining the costmap is out of THE CORE's scope (spec.md §1); this
//! module defines the narrow trait the core depends on plus a small dense
//! reference grid (grounded on the retrieved `costmap`/`OccupancyGrid`
//! reference file) used by the crate's own tests and demo binary.

/// Definitely occupied; no footprint may overlap this cell.
pub const LETHAL: u8 = 254;
/// Inside the robot's inscribed radius of an obstacle; treated as occupied
/// for footprint purposes.
pub const INSCRIBED_INFLATED: u8 = 253;
/// Unknown/unmapped cell.
pub const NO_INFORMATION: u8 = 255;

/// Read-only costmap surface the core queries each tick.
pub trait CostmapView {
    fn size_x(&self) -> usize;
    fn size_y(&self) -> usize;
    fn resolution(&self) -> f64;
    fn get_cost(&self, cx: i64, cy: i64) -> u8;
    fn world_to_map(&self, x: f64, y: f64) -> Option<(i64, i64)>;
    fn map_to_world(&self, cx: i64, cy: i64) -> (f64, f64);
}

/// A dense `u8` grid costmap, axis-aligned with its own origin.
///
/// This is a reference implementation for tests/demos, not a production
/// costmap: it has no inflation, no layering, and no Bayesian updates.
#[derive(Debug, Clone)]
pub struct GridCostmap {
    size_x: usize,
    size_y: usize,
    resolution: f64,
    origin_x: f64,
    origin_y: f64,
    cells: Vec<u8>,
}

impl GridCostmap {
    pub fn new(size_x: usize, size_y: usize, resolution: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            size_x,
            size_y,
            resolution,
            origin_x,
            origin_y,
            cells: vec![0u8; size_x * size_y],
        }
    }

    fn index(&self, cx: i64, cy: i64) -> Option<usize> {
        if cx < 0 || cy < 0 || cx as usize >= self.size_x || cy as usize >= self.size_y {
            None
        } else {
            Some(cy as usize * self.size_x + cx as usize)
        }
    }

    pub fn set_cost(&mut self, cx: i64, cy: i64, cost: u8) {
        if let Some(idx) = self.index(cx, cy) {
            self.cells[idx] = cost;
        }
    }
}

impl CostmapView for GridCostmap {
    fn size_x(&self) -> usize {
        self.size_x
    }

    fn size_y(&self) -> usize {
        self.size_y
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn get_cost(&self, cx: i64, cy: i64) -> u8 {
        self.index(cx, cy).map(|idx| self.cells[idx]).unwrap_or(NO_INFORMATION)
    }

    fn world_to_map(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let local_x = x - self.origin_x;
        let local_y = y - self.origin_y;
        if local_x < 0.0 || local_y < 0.0 {
            return None;
        }
        let cx = (local_x / self.resolution) as i64;
        let cy = (local_y / self.resolution) as i64;
        if cx as usize >= self.size_x || cy as usize >= self.size_y {
            None
        } else {
            Some((cx, cy))
        }
    }

    fn map_to_world(&self, cx: i64, cy: i64) -> (f64, f64) {
        (
            self.origin_x + (cx as f64 + 0.5) * self.resolution,
            self.origin_y + (cy as f64 + 0.5) * self.resolution,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_map_round_trips_cell_center() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        let (cx, cy) = map.world_to_map(3.5, 4.5).unwrap();
        assert_eq!((cx, cy), (3, 4));
        let (wx, wy) = map.map_to_world(cx, cy);
        assert!((wx - 3.5).abs() < 1e-9);
        assert!((wy - 4.5).abs() < 1e-9);
    }

    #[test]
    fn out_of_bounds_world_to_map_is_none() {
        let map = GridCostmap::new(10, 10, 1.0, 0.0, 0.0);
        assert_eq!(map.world_to_map(-1.0, 0.0), None);
        assert_eq!(map.world_to_map(0.0, 11.0), None);
    }

    #[test]
    fn unset_cells_default_to_zero_cost() {
        let map = GridCostmap::new(4, 4, 1.0, 0.0, 0.0);
        assert_eq!(map.get_cost(0, 0), 0);
    }

    #[test]
    fn out_of_range_cost_is_no_information() {
        let map = GridCostmap::new(4, 4, 1.0, 0.0, 0.0);
        assert_eq!(map.get_cost(99, 99), NO_INFORMATION);
    }

    #[test]
    fn set_cost_then_get_cost() {
        let mut map = GridCostmap::new(4, 4, 1.0, 0.0, 0.0);
        map.set_cost(2, 0, LETHAL);
        assert_eq!(map.get_cost(2, 0), LETHAL);
    }
}

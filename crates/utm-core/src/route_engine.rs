//! Grid-based A* planner for alternative routes around restricted zones.
//!
//! The bounding box of the requested route is split into `steps × steps` cells. Nodes
//! inside any obstacle are blocked; the search moves in 8 directions at a uniform cost of
//! one step, guided by the straight-line coordinate distance to the goal.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use geo::{Coord, Geometry, Intersects, LineString, Point};

use crate::rules::DecisionConfig;
use crate::spatial::{simplify, BoundingBox};

/// Neighbour offsets: E, W, N, S, NE, NW, SE, SW. Order matters for endpoint relocation.
const DIRECTIONS: [(i64, i64); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Fixed-resolution discretization of a bounding box.
#[derive(Debug, Clone)]
pub struct PlanningGrid {
    steps: usize,
    nodes: Vec<Coord<f64>>,
    blocked: Vec<bool>,
}

impl PlanningGrid {
    /// Lay out `(steps + 1)²` nodes row by row from the south-west corner.
    pub fn build(bbox: &BoundingBox, steps: usize, obstacles: &[Geometry<f64>]) -> Self {
        let steps = steps.max(1);
        let dx = (bbox.east - bbox.west) / steps as f64;
        let dy = (bbox.north - bbox.south) / steps as f64;
        let side = steps + 1;

        let mut nodes = Vec::with_capacity(side * side);
        let mut blocked = Vec::with_capacity(side * side);
        for iy in 0..side {
            for ix in 0..side {
                let coord = Coord {
                    x: bbox.west + ix as f64 * dx,
                    y: bbox.south + iy as f64 * dy,
                };
                let point = Point::from(coord);
                blocked.push(obstacles.iter().any(|obstacle| obstacle.intersects(&point)));
                nodes.push(coord);
            }
        }

        Self {
            steps,
            nodes,
            blocked,
        }
    }

    /// Nodes per axis.
    pub fn side(&self) -> usize {
        self.steps + 1
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.side() + ix
    }

    pub fn coord(&self, idx: usize) -> Coord<f64> {
        self.nodes[idx]
    }

    pub fn is_blocked(&self, idx: usize) -> bool {
        self.blocked[idx]
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    /// Node closest to `target` by squared coordinate distance; the first minimum wins.
    pub fn nearest_node(&self, target: Coord<f64>) -> usize {
        let mut best = 0usize;
        let mut best_d = f64::INFINITY;
        for (idx, node) in self.nodes.iter().enumerate() {
            let d = (node.x - target.x).powi(2) + (node.y - target.y).powi(2);
            if d < best_d {
                best_d = d;
                best = idx;
            }
        }
        best
    }

    /// Move a blocked node to its first free neighbour. Keeps the node if none is free.
    pub fn relocate_if_blocked(&self, idx: usize) -> usize {
        if !self.is_blocked(idx) {
            return idx;
        }
        self.neighbors(idx)
            .find(|&candidate| !self.is_blocked(candidate))
            .unwrap_or(idx)
    }

    /// In-bounds neighbours in `DIRECTIONS` order, blocked or not.
    fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let side = self.side() as i64;
        let ix = (idx % self.side()) as i64;
        let iy = (idx / self.side()) as i64;
        DIRECTIONS.iter().filter_map(move |(dx, dy)| {
            let jx = ix + dx;
            let jy = iy + dy;
            if jx < 0 || jx >= side || jy < 0 || jy >= side {
                return None;
            }
            Some((jy * side + jx) as usize)
        })
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let (pa, pb) = (self.nodes[a], self.nodes[b]);
        (pa.x - pb.x).hypot(pa.y - pb.y)
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Frontier entry ordered by `f`, then by insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_score: FloatOrd,
    seq: u64,
    g_score: u32,
    idx: usize,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Grid path found by [`find_path`].
#[derive(Debug, Clone)]
pub struct GridPath {
    pub nodes: Vec<usize>,
    pub nodes_visited: usize,
}

/// A* over the grid from `start` to `goal`.
///
/// Every move costs 1 (diagonals included) while the heuristic is the Euclidean
/// coordinate distance to the goal. Blocked nodes are never entered, but a blocked
/// `start` is still expanded.
pub fn find_path(grid: &PlanningGrid, start: usize, goal: usize) -> Option<GridPath> {
    let mut g_score = vec![u32::MAX; grid.len()];
    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut seq = 0u64;
    let mut nodes_visited = 0usize;

    g_score[start] = 0;
    open_set.push(Reverse(OpenNode {
        f_score: FloatOrd(grid.distance(start, goal)),
        seq,
        g_score: 0,
        idx: start,
    }));

    while let Some(Reverse(current)) = open_set.pop() {
        if current.g_score > g_score[current.idx] {
            continue;
        }
        nodes_visited += 1;

        if current.idx == goal {
            let mut nodes = vec![goal];
            let mut cursor = goal;
            while let Some(prev) = came_from[cursor] {
                nodes.push(prev);
                cursor = prev;
            }
            nodes.reverse();
            return Some(GridPath {
                nodes,
                nodes_visited,
            });
        }

        let tentative = current.g_score + 1;
        for next in grid.neighbors(current.idx) {
            if grid.is_blocked(next) || tentative >= g_score[next] {
                continue;
            }
            came_from[next] = Some(current.idx);
            g_score[next] = tentative;
            seq += 1;
            open_set.push(Reverse(OpenNode {
                f_score: FloatOrd(tentative as f64 + grid.distance(next, goal)),
                seq,
                g_score: tentative,
                idx: next,
            }));
        }
    }

    None
}

/// Alternative route produced by the planner.
#[derive(Debug, Clone)]
pub struct PlannedRoute {
    /// Simplified route from the snapped start to the snapped end
    pub route: LineString<f64>,
    pub grid_nodes: usize,
    pub nodes_visited: usize,
    pub blocked_nodes: usize,
}

/// Plan a route across `bbox` from the first to the last point of `route`, avoiding
/// `obstacles`. Returns `None` when the goal is unreachable at the grid resolution.
pub fn plan_alternative_route(
    route: &[Coord<f64>],
    bbox: &BoundingBox,
    obstacles: &[Geometry<f64>],
    config: &DecisionConfig,
) -> Option<PlannedRoute> {
    let (first, last) = (route.first()?, route.last()?);
    let grid = PlanningGrid::build(bbox, config.grid_steps, obstacles);

    let start = grid.relocate_if_blocked(grid.nearest_node(*first));
    let goal = grid.relocate_if_blocked(grid.nearest_node(*last));

    let Some(path) = find_path(&grid, start, goal) else {
        tracing::debug!(
            "No grid path from node {} to {} ({} of {} nodes blocked)",
            start,
            goal,
            grid.blocked_count(),
            grid.len()
        );
        return None;
    };

    let mut coords: Vec<Coord<f64>> = path.nodes.iter().map(|&idx| grid.coord(idx)).collect();
    if coords.len() == 1 {
        // Start and goal snapped to one node; keep a valid two-point line.
        coords.push(coords[0]);
    }
    let line = simplify(&LineString::new(coords), config.simplify_tolerance_m);

    Some(PlannedRoute {
        grid_nodes: path.nodes.len(),
        nodes_visited: path.nodes_visited,
        blocked_nodes: grid.blocked_count(),
        route: line,
    })
}

//! A* routing over the lattice.
//!
//! `PathfindingEngine` is built from a [`GridManager`] snapshot (lattice plus
//! dead-zone border points) and answers point-to-point route queries. Moves
//! are the eight lattice offsets; points with none of those available (the
//! off-lattice dead-zone border points) fall back to any valid point within
//! one and a half grid steps.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geometry::{self, Point, PointKey};
use crate::grid::{DeadZone, GridManager};

/// Radius of the fallback neighbor search, in multiples of the larger
/// spacing.
pub const FLEXIBLE_NEIGHBOR_FACTOR: f64 = 1.5;

/// Open-set entry. Ordered so that `BinaryHeap` pops the lowest f-score,
/// and among equal f-scores the entry pushed first.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f64,
    seq: u64,
    key: PointKey,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pre-built routing view of a grid.
#[derive(Debug, Clone)]
pub struct PathfindingEngine {
    /// Lattice ∪ dead-zone border points, in lattice order.
    valid: Vec<Point>,
    valid_keys: HashSet<PointKey>,
    spacing_width: f64,
    spacing_height: f64,
    dead_zone: Option<DeadZone>,
}

impl PathfindingEngine {
    pub fn new(grid: &GridManager) -> Self {
        let valid = grid.valid_points();
        let valid_keys = valid.iter().map(|p| p.key()).collect();
        Self {
            valid,
            valid_keys,
            spacing_width: grid.spacing_width(),
            spacing_height: grid.spacing_height(),
            dead_zone: grid.dead_zone(),
        }
    }

    fn blocked(&self, p: Point) -> bool {
        self.dead_zone.is_some_and(|dz| dz.contains(p))
    }

    /// Points reachable in one move from `p`.
    ///
    /// The eight lattice offsets that exist and lie outside the dead zone;
    /// when none do, every valid point outside the dead zone within
    /// `1.5 × max(spacing)` of `p`.
    pub fn neighbors(&self, p: Point) -> Vec<Point> {
        let (sw, sh) = (self.spacing_width, self.spacing_height);
        let offsets = [
            (0.0, -sh),
            (sw, 0.0),
            (0.0, sh),
            (-sw, 0.0),
            (sw, -sh),
            (sw, sh),
            (-sw, sh),
            (-sw, -sh),
        ];
        let lattice: Vec<Point> = offsets
            .iter()
            .map(|&(dx, dy)| Point::new(p.x + dx, p.y + dy))
            .filter(|n| self.valid_keys.contains(&n.key()) && !self.blocked(*n))
            .collect();
        if !lattice.is_empty() {
            return lattice;
        }

        let radius = sw.max(sh) * FLEXIBLE_NEIGHBOR_FACTOR;
        self.valid
            .iter()
            .copied()
            .filter(|&c| {
                let d = geometry::distance(c, p);
                d > 0.0 && d <= radius && !self.blocked(c)
            })
            .collect()
    }

    /// Heuristic used by the search (Manhattan distance).
    pub fn heuristic(&self, a: Point, b: Point) -> f64 {
        geometry::manhattan(a, b)
    }

    /// Shortest route from `start` to `goal`, both included.
    ///
    /// Returns `None` if the open set runs dry before reaching `goal`.
    pub fn a_star(&self, start: Point, goal: Point) -> Option<Vec<Point>> {
        if geometry::points_equal(start, goal) {
            return Some(vec![start]);
        }

        let goal_key = goal.key();
        let mut open = BinaryHeap::new();
        let mut closed: HashSet<PointKey> = HashSet::new();
        let mut g_score: HashMap<PointKey, f64> = HashMap::new();
        let mut parent: HashMap<PointKey, PointKey> = HashMap::new();
        let mut seq = 0u64;

        g_score.insert(start.key(), 0.0);
        open.push(OpenNode {
            f: self.heuristic(start, goal),
            seq,
            key: start.key(),
        });

        while let Some(node) = open.pop() {
            if !closed.insert(node.key) {
                continue; // stale entry
            }
            if node.key == goal_key {
                return Some(reconstruct(&parent, node.key));
            }

            let current = node.key.point();
            let current_g = g_score.get(&node.key).copied().unwrap_or(0.0);

            for neighbor in self.neighbors(current) {
                let nk = neighbor.key();
                if closed.contains(&nk) {
                    continue;
                }
                let tentative = current_g + geometry::distance(current, neighbor);
                if g_score.get(&nk).is_some_and(|&g| tentative >= g) {
                    continue;
                }
                parent.insert(nk, node.key);
                g_score.insert(nk, tentative);
                seq += 1;
                open.push(OpenNode {
                    f: tentative + self.heuristic(neighbor, goal),
                    seq,
                    key: nk,
                });
            }
        }

        None
    }

    /// True if a route of at least two points connects `start` and `end`.
    pub fn path_exists(&self, start: Point, end: Point) -> bool {
        self.a_star(start, end).is_some_and(|path| path.len() >= 2)
    }
}

fn reconstruct(parent: &HashMap<PointKey, PointKey>, goal: PointKey) -> Vec<Point> {
    let mut path = vec![goal.point()];
    let mut current = goal;
    while let Some(&prev) = parent.get(&current) {
        path.push(prev.point());
        current = prev;
    }
    path.reverse();
    path
}

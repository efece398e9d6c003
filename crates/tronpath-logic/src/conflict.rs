//! Route conflict detection.
//!
//! A candidate route conflicts with an accepted one if they share a point
//! (outside the endpoint exemptions), if any two of their segments cross or
//! touch, or if two interior points come closer than the clearance distance.
//!
//! [`ConflictRule::Relaxed`] is used for interior-fill routes: the candidate's
//! start may sit on an accepted route's interior and its first segment may
//! touch the segment carrying that start.

use serde::{Deserialize, Serialize};

use crate::generator::RandomPath;
use crate::geometry::{self, Point};
use crate::grid::GridManager;

/// Minimum interior-point clearance as a fraction of the smaller spacing.
pub const CLEARANCE_FACTOR: f64 = 0.8;

/// Which endpoint exemptions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictRule {
    Strict,
    Relaxed,
}

/// First violation found between a candidate and an accepted route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conflict {
    SharedPoint {
        point: Point,
    },
    SegmentContact {
        segment: (Point, Point),
        existing: (Point, Point),
    },
    Clearance {
        point: Point,
        existing: Point,
        distance: f64,
    },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::SharedPoint { point } => write!(f, "shared point ({}, {})", point.x, point.y),
            Conflict::SegmentContact { segment, existing } => write!(
                f,
                "segment ({},{})→({},{}) touches ({},{})→({},{})",
                segment.0.x,
                segment.0.y,
                segment.1.x,
                segment.1.y,
                existing.0.x,
                existing.0.y,
                existing.1.x,
                existing.1.y
            ),
            Conflict::Clearance {
                point,
                existing,
                distance,
            } => write!(
                f,
                "({}, {}) is {:.1} from ({}, {})",
                point.x, point.y, distance, existing.x, existing.y
            ),
        }
    }
}

/// Conflict checks parameterised by the grid's clearance distance.
#[derive(Debug, Clone, Copy)]
pub struct ConflictChecker {
    min_clearance: f64,
}

impl ConflictChecker {
    pub fn new(spacing_width: f64, spacing_height: f64) -> Self {
        Self {
            min_clearance: spacing_width.min(spacing_height) * CLEARANCE_FACTOR,
        }
    }

    pub fn for_grid(grid: &GridManager) -> Self {
        Self::new(grid.spacing_width(), grid.spacing_height())
    }

    pub fn min_clearance(&self) -> f64 {
        self.min_clearance
    }

    /// True if `candidate` conflicts with any accepted route.
    pub fn conflicts(&self, candidate: &[Point], existing: &[RandomPath], rule: ConflictRule) -> bool {
        self.find_conflict(candidate, existing, rule).is_some()
    }

    /// First conflict between `candidate` and the accepted routes, if any.
    /// Routes shorter than two points never conflict.
    pub fn find_conflict(
        &self,
        candidate: &[Point],
        existing: &[RandomPath],
        rule: ConflictRule,
    ) -> Option<Conflict> {
        if candidate.len() < 2 {
            return None;
        }
        existing
            .iter()
            .filter_map(|p| p.path.as_deref())
            .filter(|route| route.len() >= 2)
            .find_map(|route| self.check_pair(candidate, route, rule))
    }

    fn check_pair(&self, new: &[Point], old: &[Point], rule: ConflictRule) -> Option<Conflict> {
        let relaxed = rule == ConflictRule::Relaxed;
        let new_last = new.len() - 1;
        let old_last = old.len() - 1;

        // 1. shared points
        for (i, &np) in new.iter().enumerate() {
            let new_end = i == 0 || i == new_last;
            for (j, &op) in old.iter().enumerate() {
                if !geometry::points_equal(np, op) {
                    continue;
                }
                let old_end = j == 0 || j == old_last;
                if relaxed && i == 0 && !old_end {
                    continue;
                }
                if !relaxed && new_end && old_end {
                    continue;
                }
                return Some(Conflict::SharedPoint { point: np });
            }
        }

        // 2. segment contact
        for (i, seg) in new.windows(2).enumerate() {
            for old_seg in old.windows(2) {
                if !geometry::segments_intersect_or_touch(seg[0], seg[1], old_seg[0], old_seg[1]) {
                    continue;
                }
                if relaxed && i == 0 && geometry::is_point_on_segment(seg[0], old_seg[0], old_seg[1]) {
                    continue;
                }
                return Some(Conflict::SegmentContact {
                    segment: (seg[0], seg[1]),
                    existing: (old_seg[0], old_seg[1]),
                });
            }
        }

        // 3. clearance between interior points
        for (i, &np) in new.iter().enumerate() {
            if i == 0 || i == new_last {
                continue;
            }
            for &op in &old[1..old_last] {
                let d = geometry::distance(np, op);
                if d > 0.0 && d < self.min_clearance {
                    return Some(Conflict::Clearance {
                        point: np,
                        existing: op,
                        distance: d,
                    });
                }
            }
        }

        None
    }
}

/// Re-run the acceptance checks over a finished set: every route against all
/// routes accepted before it, under the rule of its own phase.
///
/// Returns `(later, earlier, conflict)` triples; empty for a valid set.
pub fn validate_paths(
    checker: &ConflictChecker,
    paths: &[RandomPath],
) -> Vec<(usize, usize, Conflict)> {
    let mut violations = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        let Some(route) = path.path.as_deref() else {
            continue;
        };
        let rule = path.phase.conflict_rule();
        for (j, earlier) in paths[..i].iter().enumerate() {
            if let Some(c) = checker.find_conflict(route, std::slice::from_ref(earlier), rule) {
                violations.push((i, j, c));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Phase;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn accepted(route: Vec<Point>, phase: Phase) -> RandomPath {
        RandomPath {
            start: route[0],
            end: route[route.len() - 1],
            path: Some(route),
            phase,
        }
    }

    fn checker() -> ConflictChecker {
        ConflictChecker::new(50.0, 50.0)
    }

    #[test]
    fn test_clearance_distance() {
        assert_eq!(checker().min_clearance(), 40.0);
        assert_eq!(ConflictChecker::new(50.0, 20.0).min_clearance(), 16.0);
    }

    #[test]
    fn test_parallel_routes_ok() {
        let existing = vec![accepted(
            vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0), p(150.0, 0.0)],
            Phase::DeadZoneBorder,
        )];
        let candidate = [p(0.0, 100.0), p(50.0, 100.0), p(100.0, 100.0), p(150.0, 100.0)];
        assert_eq!(checker().find_conflict(&candidate, &existing, ConflictRule::Strict), None);
    }

    #[test]
    fn test_crossing_routes_conflict() {
        let existing = vec![accepted(
            vec![p(0.0, 0.0), p(50.0, 50.0), p(100.0, 100.0)],
            Phase::DeadZoneBorder,
        )];
        let candidate = [p(0.0, 100.0), p(50.0, 50.0), p(100.0, 0.0)];
        assert!(matches!(
            checker().find_conflict(&candidate, &existing, ConflictRule::Strict),
            Some(Conflict::SharedPoint { .. })
        ));
        // Diagonals crossing between lattice points
        let existing = vec![accepted(vec![p(0.0, 0.0), p(50.0, 50.0)], Phase::DeadZoneBorder)];
        let candidate = [p(0.0, 50.0), p(50.0, 0.0)];
        assert!(matches!(
            checker().find_conflict(&candidate, &existing, ConflictRule::Strict),
            Some(Conflict::SegmentContact { .. })
        ));
    }

    #[test]
    fn test_clearance_violation() {
        let existing = vec![accepted(
            vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0), p(150.0, 0.0)],
            Phase::DeadZoneBorder,
        )];
        // Interior points 30 apart, segments never meet
        let candidate = [p(0.0, 30.0), p(50.0, 30.0), p(100.0, 30.0), p(150.0, 30.0)];
        assert!(matches!(
            checker().find_conflict(&candidate, &existing, ConflictRule::Strict),
            Some(Conflict::Clearance { .. })
        ));
    }

    #[test]
    fn test_relaxed_start_on_existing_interior() {
        let existing = vec![accepted(
            vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0)],
            Phase::DeadZoneBorder,
        )];
        let candidate = [p(50.0, 0.0), p(50.0, 50.0), p(50.0, 100.0)];
        assert!(checker().conflicts(&candidate, &existing, ConflictRule::Strict));
        assert_eq!(checker().find_conflict(&candidate, &existing, ConflictRule::Relaxed), None);
    }

    #[test]
    fn test_relaxed_end_on_existing_interior_conflicts() {
        let existing = vec![accepted(
            vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0)],
            Phase::DeadZoneBorder,
        )];
        let candidate = [p(50.0, 100.0), p(50.0, 50.0), p(50.0, 0.0)];
        assert!(checker().conflicts(&candidate, &existing, ConflictRule::Relaxed));
    }

    #[test]
    fn test_short_routes_never_conflict() {
        let existing = vec![accepted(vec![p(0.0, 0.0), p(50.0, 0.0)], Phase::DeadZoneBorder)];
        assert!(!checker().conflicts(&[p(0.0, 0.0)], &existing, ConflictRule::Strict));
        let no_route = vec![RandomPath {
            start: p(0.0, 0.0),
            end: p(50.0, 0.0),
            path: None,
            phase: Phase::DeadZoneBorder,
        }];
        assert!(!checker().conflicts(&[p(0.0, 0.0), p(50.0, 0.0)], &no_route, ConflictRule::Strict));
    }

    #[test]
    fn test_validate_paths() {
        let good = vec![
            accepted(vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0)], Phase::DeadZoneBorder),
            accepted(vec![p(50.0, 0.0), p(50.0, 50.0), p(50.0, 100.0)], Phase::Interior),
        ];
        assert!(validate_paths(&checker(), &good).is_empty());

        let bad = vec![
            accepted(vec![p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0)], Phase::DeadZoneBorder),
            accepted(vec![p(50.0, 0.0), p(50.0, 50.0), p(50.0, 100.0)], Phase::Proximity),
        ];
        let violations = validate_paths(&checker(), &bad);
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].0, violations[0].1), (1, 0));
    }
}

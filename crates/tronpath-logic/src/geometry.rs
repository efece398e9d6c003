//! Planar geometry primitives shared by the grid, the router and the
//! conflict checks.
//!
//! Pure functions over [`Point`] values. No grid state lives here.

use serde::{Deserialize, Serialize};

/// Collinearity tolerance for [`is_point_on_segment`].
pub const COLLINEAR_EPSILON: f64 = 1e-6;

/// A coordinate pair on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Canonical hashable key for this point.
    pub fn key(&self) -> PointKey {
        PointKey::from(*self)
    }
}

/// Hashable identity of a [`Point`].
///
/// Built from the raw bit patterns of both coordinates, so two points share a
/// key exactly when they compare equal (`-0.0` is folded into `0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    x: u64,
    y: u64,
}

impl PointKey {
    pub fn point(&self) -> Point {
        Point::new(f64::from_bits(self.x), f64::from_bits(self.y))
    }
}

impl From<Point> for PointKey {
    fn from(p: Point) -> Self {
        // Adding 0.0 turns -0.0 into +0.0.
        Self {
            x: (p.x + 0.0).to_bits(),
            y: (p.y + 0.0).to_bits(),
        }
    }
}

// ── A. Distances ────────────────────────────────────────────────────────

/// Exact coordinate equality.
pub fn points_equal(a: Point, b: Point) -> bool {
    a.x == b.x && a.y == b.y
}

/// Euclidean distance.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Manhattan (taxicab) distance.
pub fn manhattan(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Closest candidate to `target` no farther than `max_distance`.
///
/// Ties keep the earliest candidate.
pub fn find_nearest_point(target: Point, candidates: &[Point], max_distance: f64) -> Option<Point> {
    let mut best: Option<(Point, f64)> = None;
    for &candidate in candidates {
        let d = distance(target, candidate);
        if d > max_distance {
            continue;
        }
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((candidate, d)),
        }
    }
    best.map(|(p, _)| p)
}

// ── B. Segments ─────────────────────────────────────────────────────────

/// True if `p` lies on the closed segment `a`–`b`.
pub fn is_point_on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
    if cross.abs() > COLLINEAR_EPSILON {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len_sq = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    dot >= 0.0 && dot <= len_sq
}

/// Counter-clockwise orientation of the triple `a`, `b`, `c`.
fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// True if segments `a1`–`a2` and `b1`–`b2` cross or touch anywhere,
/// including shared endpoints and an endpoint resting on the other segment.
pub fn segments_intersect_or_touch(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    if points_equal(a1, b1) || points_equal(a1, b2) || points_equal(a2, b1) || points_equal(a2, b2)
    {
        return true;
    }

    if is_point_on_segment(a1, b1, b2)
        || is_point_on_segment(a2, b1, b2)
        || is_point_on_segment(b1, a1, a2)
        || is_point_on_segment(b2, a1, a2)
    {
        return true;
    }

    ccw(a1, b1, b2) != ccw(a2, b1, b2) && ccw(a1, a2, b1) != ccw(a1, a2, b2)
}

// ── C. Spacing ──────────────────────────────────────────────────────────

/// All divisors of `size` strictly between 1 and `size`, ascending.
///
/// Non-integral sizes have no divisors.
pub fn size_divisors(size: f64) -> Vec<u64> {
    if !size.is_finite() || size < 1.0 || size.fract() != 0.0 {
        return Vec::new();
    }
    let n = size as u64;
    let mut divisors = Vec::new();
    let mut i = 2;
    while i * i <= n {
        if n % i == 0 {
            divisors.push(i);
            if i * i != n {
                divisors.push(n / i);
            }
        }
        i += 1;
    }
    divisors.sort_unstable();
    divisors
}

/// Snap a requested spacing to the closest divisor of `size`.
///
/// The request is returned unchanged if it already is a divisor or if `size`
/// has none. Equidistant divisors resolve to the smaller one.
pub fn snap_spacing(requested: f64, size: f64) -> f64 {
    let divisors = size_divisors(size);
    if divisors.is_empty() || divisors.iter().any(|&d| d as f64 == requested) {
        return requested;
    }
    let mut closest = divisors[0] as f64;
    for &d in &divisors[1..] {
        let d = d as f64;
        if (d - requested).abs() < (closest - requested).abs() {
            closest = d;
        }
    }
    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_distances() {
        assert_eq!(distance(p(0.0, 0.0), p(3.0, 4.0)), 5.0);
        assert_eq!(manhattan(p(0.0, 0.0), p(3.0, -4.0)), 7.0);
        assert!(points_equal(p(1.5, 2.0), p(1.5, 2.0)));
        assert!(!points_equal(p(1.5, 2.0), p(2.0, 1.5)));
    }

    #[test]
    fn test_point_key_folds_negative_zero() {
        assert_eq!(p(-0.0, 5.0).key(), p(0.0, 5.0).key());
        assert_ne!(p(1.0, 5.0).key(), p(5.0, 1.0).key());
        assert_eq!(p(12.5, 3.0).key().point(), p(12.5, 3.0));
    }

    #[test]
    fn test_point_on_segment() {
        assert!(is_point_on_segment(p(5.0, 5.0), p(0.0, 0.0), p(10.0, 10.0)));
        assert!(is_point_on_segment(p(10.0, 10.0), p(0.0, 0.0), p(10.0, 10.0)));
        assert!(!is_point_on_segment(p(11.0, 11.0), p(0.0, 0.0), p(10.0, 10.0)));
        assert!(!is_point_on_segment(p(5.0, 6.0), p(0.0, 0.0), p(10.0, 10.0)));
    }

    #[test]
    fn test_segments_cross() {
        // X shape
        assert!(segments_intersect_or_touch(
            p(0.0, 0.0),
            p(10.0, 10.0),
            p(0.0, 10.0),
            p(10.0, 0.0)
        ));
    }

    #[test]
    fn test_segments_touch_at_endpoint() {
        assert!(segments_intersect_or_touch(
            p(0.0, 0.0),
            p(5.0, 5.0),
            p(5.0, 5.0),
            p(10.0, 0.0)
        ));
        // T junction
        assert!(segments_intersect_or_touch(
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(5.0, 0.0),
            p(5.0, 5.0)
        ));
    }

    #[test]
    fn test_segments_disjoint() {
        assert!(!segments_intersect_or_touch(
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(0.0, 5.0),
            p(10.0, 5.0)
        ));
        // Collinear but separated
        assert!(!segments_intersect_or_touch(
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(6.0, 0.0),
            p(10.0, 0.0)
        ));
    }

    #[test]
    fn test_size_divisors() {
        assert_eq!(size_divisors(12.0), vec![2, 3, 4, 6]);
        assert_eq!(size_divisors(16.0), vec![2, 4, 8]);
        assert!(size_divisors(13.0).is_empty());
        assert!(size_divisors(600.5).is_empty());
        assert!(size_divisors(1.0).is_empty());
    }

    #[test]
    fn test_snap_spacing() {
        // 50 divides 600
        assert_eq!(snap_spacing(50.0, 600.0), 50.0);
        // 7 → closest divisor of 600 is 6 (|6-7| = 1 < |8-7| tie resolved low)
        assert_eq!(snap_spacing(7.0, 600.0), 6.0);
        assert_eq!(snap_spacing(45.0, 600.0), 40.0);
        // Prime dimension: nothing to snap to
        assert_eq!(snap_spacing(45.0, 601.0), 45.0);
    }

    #[test]
    fn test_snapped_spacing_is_divisor_or_request() {
        for dim in [97.0, 100.0, 360.0, 599.0, 600.0, 1024.0] {
            for requested in [3.0, 17.0, 25.0, 50.0, 64.0, 333.0] {
                let snapped = snap_spacing(requested, dim);
                let divisors = size_divisors(dim);
                if divisors.is_empty() {
                    assert_eq!(snapped, requested);
                } else {
                    assert!(snapped > 1.0 && snapped < dim);
                    assert_eq!(dim % snapped, 0.0, "{} does not divide {}", snapped, dim);
                }
            }
        }
    }

    #[test]
    fn test_find_nearest_point() {
        let candidates = [p(0.0, 0.0), p(10.0, 0.0), p(20.0, 0.0)];
        assert_eq!(find_nearest_point(p(8.0, 1.0), &candidates, 25.0), Some(p(10.0, 0.0)));
        assert_eq!(find_nearest_point(p(100.0, 100.0), &candidates, 25.0), None);
        // Tie keeps the first
        assert_eq!(find_nearest_point(p(5.0, 0.0), &candidates, 25.0), Some(p(0.0, 0.0)));
    }
}

//! Summary statistics over a generated path set.
//!
//! Everything here is read-only over the grid and the paths; the report
//! types serialize to JSON for collaborators that chart them.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::generator::RandomPath;
use crate::geometry::{self, Point, PointKey};
use crate::grid::GridManager;

/// Coverage radius as a multiple of the smaller spacing.
pub const COVERAGE_RADIUS_FACTOR: f64 = 1.5;

/// Border point usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStats {
    pub total_paths: usize,
    pub dead_zone_points_available: usize,
    pub canvas_points_available: usize,
    pub dead_zone_points_used: usize,
    pub canvas_points_used: usize,
}

/// Route lengths, in points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthStats {
    pub total_paths: usize,
    pub average_length: f64,
    pub shortest: usize,
    pub longest: usize,
    pub total_points: usize,
    pub distribution: BTreeMap<usize, usize>,
}

/// Endpoint counts per canvas zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCounts {
    pub top_left: usize,
    pub top_right: usize,
    pub bottom_left: usize,
    pub bottom_right: usize,
    pub center: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographicStats {
    pub starts: ZoneCounts,
    pub ends: ZoneCounts,
    pub average_start: (f64, f64),
    pub average_end: (f64, f64),
}

/// Efficiency buckets (direct distance over travelled distance).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfficiencyBuckets {
    /// > 0.8
    pub very_efficient: usize,
    /// 0.6 – 0.8
    pub efficient: usize,
    /// 0.4 – 0.6
    pub moderate: usize,
    /// ≤ 0.4
    pub inefficient: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyStats {
    pub average: f64,
    pub best: f64,
    pub worst: f64,
    pub buckets: EfficiencyBuckets,
}

/// All statistics in one serializable bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub basic: PathStats,
    pub lengths: LengthStats,
    pub geographic: GeographicStats,
    pub efficiency: EfficiencyStats,
    pub coverage: f64,
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn routes(paths: &[RandomPath]) -> impl Iterator<Item = &[Point]> {
    paths
        .iter()
        .filter_map(|p| p.path.as_deref())
        .filter(|r| !r.is_empty())
}

/// Border usage against the grid's current border sets.
pub fn path_stats(grid: &GridManager, paths: &[RandomPath]) -> PathStats {
    let endpoints: HashSet<PointKey> = paths
        .iter()
        .flat_map(|p| [p.start.key(), p.end.key()])
        .collect();
    let dz = grid.dead_zone_border_points();
    let canvas = grid.canvas_border_points();
    let dz_used = dz.iter().filter(|p| endpoints.contains(&p.point.key())).count();
    let canvas_used = canvas
        .iter()
        .filter(|p| endpoints.contains(&p.point.key()))
        .count();
    PathStats {
        total_paths: paths.len(),
        dead_zone_points_available: dz.len() - dz_used,
        canvas_points_available: canvas.len() - canvas_used,
        dead_zone_points_used: dz_used,
        canvas_points_used: canvas_used,
    }
}

pub fn length_stats(paths: &[RandomPath]) -> LengthStats {
    let lengths: Vec<usize> = routes(paths).map(|r| r.len()).collect();
    if lengths.is_empty() {
        return LengthStats {
            total_paths: paths.len(),
            ..Default::default()
        };
    }
    let total_points: usize = lengths.iter().sum();
    let mut distribution = BTreeMap::new();
    for &len in &lengths {
        *distribution.entry(len).or_insert(0) += 1;
    }
    LengthStats {
        total_paths: paths.len(),
        average_length: round_to(total_points as f64 / lengths.len() as f64, 2),
        shortest: lengths.iter().copied().min().unwrap_or(0),
        longest: lengths.iter().copied().max().unwrap_or(0),
        total_points,
        distribution,
    }
}

fn zone_counts(grid: &GridManager, points: impl Iterator<Item = Point>) -> ZoneCounts {
    let (w, h) = (grid.canvas_width(), grid.canvas_height());
    let mut zones = ZoneCounts::default();
    for p in points {
        let left = p.x < w / 2.0;
        let top = p.y < h / 2.0;
        let near_center = (p.x - w / 2.0).abs() < w / 4.0 && (p.y - h / 2.0).abs() < h / 4.0;
        match (near_center, left, top) {
            (true, _, _) => zones.center += 1,
            (false, true, true) => zones.top_left += 1,
            (false, false, true) => zones.top_right += 1,
            (false, true, false) => zones.bottom_left += 1,
            (false, false, false) => zones.bottom_right += 1,
        }
    }
    zones
}

fn average(points: &[Point]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|p| p.x).sum();
    let sy: f64 = points.iter().map(|p| p.y).sum();
    ((sx / n).round(), (sy / n).round())
}

pub fn geographic_stats(grid: &GridManager, paths: &[RandomPath]) -> GeographicStats {
    let starts: Vec<Point> = paths.iter().map(|p| p.start).collect();
    let ends: Vec<Point> = paths.iter().map(|p| p.end).collect();
    GeographicStats {
        starts: zone_counts(grid, starts.iter().copied()),
        ends: zone_counts(grid, ends.iter().copied()),
        average_start: average(&starts),
        average_end: average(&ends),
    }
}

/// Direct start→end distance divided by the travelled route length; 1.0 for
/// a straight route. `None` for single-point routes and closed loops.
pub fn path_efficiency(path: &RandomPath) -> Option<f64> {
    let route = path.path.as_deref()?;
    if route.len() < 2 {
        return None;
    }
    let direct = geometry::distance(path.start, path.end);
    let travelled: f64 = route.windows(2).map(|w| geometry::distance(w[0], w[1])).sum();
    (direct > 0.0 && travelled > 0.0).then(|| direct / travelled)
}

pub fn efficiency_stats(paths: &[RandomPath]) -> EfficiencyStats {
    let values: Vec<f64> = paths.iter().filter_map(path_efficiency).collect();
    if values.is_empty() {
        return EfficiencyStats::default();
    }
    let mut buckets = EfficiencyBuckets::default();
    for &e in &values {
        if e > 0.8 {
            buckets.very_efficient += 1;
        } else if e > 0.6 {
            buckets.efficient += 1;
        } else if e > 0.4 {
            buckets.moderate += 1;
        } else {
            buckets.inefficient += 1;
        }
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    EfficiencyStats {
        average: round_to(avg, 3),
        best: round_to(values.iter().copied().fold(f64::MIN, f64::max), 3),
        worst: round_to(values.iter().copied().fold(f64::MAX, f64::min), 3),
        buckets,
    }
}

/// Fraction of lattice points lying within `1.5 × min(spacing)` of some
/// route point.
pub fn space_coverage(grid: &GridManager, paths: &[RandomPath]) -> f64 {
    let lattice = grid.grid_points();
    if lattice.is_empty() {
        return 0.0;
    }
    let radius = grid.spacing_width().min(grid.spacing_height()) * COVERAGE_RADIUS_FACTOR;
    let route_points: Vec<Point> = routes(paths).flatten().copied().collect();
    let covered = lattice
        .iter()
        .filter(|&&g| route_points.iter().any(|&r| geometry::distance(r, g) <= radius))
        .count();
    covered as f64 / lattice.len() as f64
}

pub fn stats_report(grid: &GridManager, paths: &[RandomPath]) -> StatsReport {
    StatsReport {
        basic: path_stats(grid, paths),
        lengths: length_stats(paths),
        geographic: geographic_stats(grid, paths),
        efficiency: efficiency_stats(paths),
        coverage: space_coverage(grid, paths),
    }
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Human-readable multi-section report.
pub fn full_report(report: &StatsReport) -> String {
    let b = &report.basic;
    let l = &report.lengths;
    let g = &report.geographic;
    let e = &report.efficiency;
    [
        "PATH STATISTICS".to_string(),
        "===============".to_string(),
        String::new(),
        "Basic:".to_string(),
        format!("  paths created:               {}", b.total_paths),
        format!("  dead-zone points available:  {}", b.dead_zone_points_available),
        format!("  dead-zone points used:       {}", b.dead_zone_points_used),
        format!("  canvas points available:     {}", b.canvas_points_available),
        format!("  canvas points used:          {}", b.canvas_points_used),
        String::new(),
        "Lengths:".to_string(),
        format!("  average: {} points", l.average_length),
        format!("  shortest: {} points", l.shortest),
        format!("  longest: {} points", l.longest),
        format!("  total route points: {}", l.total_points),
        String::new(),
        "Geography:".to_string(),
        format!("  average start: ({}, {})", g.average_start.0, g.average_start.1),
        format!("  average end: ({}, {})", g.average_end.0, g.average_end.1),
        String::new(),
        "Efficiency:".to_string(),
        format!("  average: {}", pct(e.average)),
        format!("  best: {}", pct(e.best)),
        format!("  worst: {}", pct(e.worst)),
        format!(
            "  buckets: {} >80%, {} 60-80%, {} 40-60%, {} <=40%",
            e.buckets.very_efficient, e.buckets.efficient, e.buckets.moderate, e.buckets.inefficient
        ),
        String::new(),
        format!("Coverage: {}", pct(report.coverage)),
    ]
    .join("\n")
}

/// Side-by-side comparison of two path sets.
pub fn compare_path_sets(a: &[RandomPath], b: &[RandomPath], label_a: &str, label_b: &str) -> String {
    let la = length_stats(a);
    let lb = length_stats(b);
    let diff = lb.total_paths as f64 - la.total_paths as f64;
    let rel = diff / la.total_paths.max(1) as f64 * 100.0;
    format!(
        "{label_a}: {} paths, average length {}\n{label_b}: {} paths, average length {}\ndifference: {:+} paths ({:+.1}%), average length {:+.2}",
        la.total_paths,
        la.average_length,
        lb.total_paths,
        lb.average_length,
        diff,
        rel,
        lb.average_length - la.average_length
    )
}

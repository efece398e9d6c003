//! Lattice construction around an optional rectangular dead zone.
//!
//! [`GridManager`] snaps the requested spacing to the canvas, lays out the
//! regular lattice, drops every point inside the dead zone and then adds the
//! grid-aligned points sitting on the dead zone's edges so routes can still
//! reach it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{self, Point, PointKey};

/// Default search radius for [`GridManager::find_nearest_grid_point`].
pub const DEFAULT_NEAREST_RADIUS: f64 = 25.0;

/// Axis-aligned excluded rectangle, given by its center and full extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadZone {
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

/// Edges of a dead zone in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl DeadZone {
    pub fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Bounds {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        Bounds {
            left: self.center.x - half_w,
            right: self.center.x + half_w,
            top: self.center.y - half_h,
            bottom: self.center.y + half_h,
        }
    }

    /// Closed-rectangle containment test.
    pub fn contains(&self, p: Point) -> bool {
        let b = self.bounds();
        p.x >= b.left && p.x <= b.right && p.y >= b.top && p.y <= b.bottom
    }
}

/// A point in a generator pool, flagged once it ends an accepted route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub point: Point,
    pub used: bool,
}

impl PathPoint {
    pub fn new(point: Point) -> Self {
        Self { point, used: false }
    }
}

/// Result of [`GridManager::init_grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub spacing_width: f64,
    pub spacing_height: f64,
    pub points: Vec<Point>,
    pub dead_zone: Option<DeadZone>,
}

/// Invalid construction input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("canvas dimensions must be positive and finite, got {width}×{height}")]
    InvalidCanvas { width: f64, height: f64 },
    #[error("grid spacing must be positive and finite, got {width}×{height}")]
    InvalidSpacing { width: f64, height: f64 },
    #[error("dead zone extents must be positive and finite, got {width}×{height}")]
    InvalidDeadZone { width: f64, height: f64 },
    #[error("dead zone ({left},{top})→({right},{bottom}) extends outside the {canvas_width}×{canvas_height} canvas")]
    DeadZoneOutOfBounds {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        canvas_width: f64,
        canvas_height: f64,
    },
    #[error("dead zone covers the entire {canvas_width}×{canvas_height} canvas")]
    DeadZoneCoversCanvas { canvas_width: f64, canvas_height: f64 },
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Lattice owner. Rebuilt by every [`GridManager::init_grid`] call and
/// read-only otherwise.
#[derive(Debug, Clone)]
pub struct GridManager {
    canvas_width: f64,
    canvas_height: f64,
    spacing_width: f64,
    spacing_height: f64,
    points: Vec<Point>,
    dead_zone: Option<DeadZone>,
}

impl GridManager {
    /// Empty grid over a `canvas_width`×`canvas_height` canvas.
    pub fn new(canvas_width: f64, canvas_height: f64) -> Result<Self, GridError> {
        if !positive(canvas_width) || !positive(canvas_height) {
            return Err(GridError::InvalidCanvas {
                width: canvas_width,
                height: canvas_height,
            });
        }
        Ok(Self {
            canvas_width,
            canvas_height,
            spacing_width: 0.0,
            spacing_height: 0.0,
            points: Vec::new(),
            dead_zone: None,
        })
    }

    /// Build the lattice. On error the previous grid is left untouched.
    pub fn init_grid(
        &mut self,
        spacing_width: f64,
        spacing_height: f64,
        dead_zone: Option<DeadZone>,
    ) -> Result<GridConfig, GridError> {
        if !positive(spacing_width) || !positive(spacing_height) {
            return Err(GridError::InvalidSpacing {
                width: spacing_width,
                height: spacing_height,
            });
        }
        if let Some(dz) = &dead_zone {
            self.validate_dead_zone(dz)?;
        }

        let sw = geometry::snap_spacing(spacing_width, self.canvas_width);
        let sh = geometry::snap_spacing(spacing_height, self.canvas_height);

        let mut seen: HashSet<PointKey> = HashSet::new();
        let mut points = Vec::new();
        let (w, h) = (self.canvas_width, self.canvas_height);
        let mut add = |p: Point| {
            if p.x >= 0.0 && p.y >= 0.0 && p.x <= w && p.y <= h && seen.insert(p.key()) {
                points.push(p);
            }
        };

        let cols = (w / sw).floor() as usize + 1;
        let rows = (h / sh).floor() as usize + 1;
        for col in 0..cols {
            for row in 0..rows {
                let p = Point::new(col as f64 * sw, row as f64 * sh);
                if dead_zone.map_or(true, |dz| !dz.contains(p)) {
                    add(p);
                }
            }
        }

        if let Some(dz) = &dead_zone {
            for p in dead_zone_edge_points(dz, sw, sh) {
                add(p);
            }
        }

        self.spacing_width = sw;
        self.spacing_height = sh;
        self.points = points;
        self.dead_zone = dead_zone;

        log::info!(
            "Grid initialized: {}×{} canvas, spacing {}×{} (requested {}×{}), {} points, dead zone: {}",
            w,
            h,
            sw,
            sh,
            spacing_width,
            spacing_height,
            self.points.len(),
            if self.dead_zone.is_some() { "yes" } else { "no" }
        );

        Ok(self.config())
    }

    fn validate_dead_zone(&self, dz: &DeadZone) -> Result<(), GridError> {
        if !positive(dz.width) || !positive(dz.height) || !dz.center.x.is_finite() || !dz.center.y.is_finite() {
            return Err(GridError::InvalidDeadZone {
                width: dz.width,
                height: dz.height,
            });
        }
        let b = dz.bounds();
        if b.left < 0.0 || b.top < 0.0 || b.right > self.canvas_width || b.bottom > self.canvas_height {
            return Err(GridError::DeadZoneOutOfBounds {
                left: b.left,
                top: b.top,
                right: b.right,
                bottom: b.bottom,
                canvas_width: self.canvas_width,
                canvas_height: self.canvas_height,
            });
        }
        if b.left <= 0.0 && b.top <= 0.0 && b.right >= self.canvas_width && b.bottom >= self.canvas_height {
            return Err(GridError::DeadZoneCoversCanvas {
                canvas_width: self.canvas_width,
                canvas_height: self.canvas_height,
            });
        }
        Ok(())
    }

    /// Snapshot of the current grid.
    pub fn config(&self) -> GridConfig {
        GridConfig {
            spacing_width: self.spacing_width,
            spacing_height: self.spacing_height,
            points: self.points.clone(),
            dead_zone: self.dead_zone,
        }
    }

    pub fn is_in_dead_zone(&self, p: Point) -> bool {
        self.dead_zone.is_some_and(|dz| dz.contains(p))
    }

    /// Grid-aligned points on the dead zone's four edges, clipped to the
    /// canvas. Empty without a dead zone.
    pub fn dead_zone_border_points(&self) -> Vec<PathPoint> {
        let Some(dz) = &self.dead_zone else {
            return Vec::new();
        };
        let (w, h) = (self.canvas_width, self.canvas_height);
        let mut seen = HashSet::new();
        dead_zone_edge_points(dz, self.spacing_width, self.spacing_height)
            .into_iter()
            .filter(|p| p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h)
            .filter(|p| seen.insert(p.key()))
            .map(PathPoint::new)
            .collect()
    }

    /// Grid-aligned points on the canvas edges (left, right, top, bottom),
    /// skipping any inside the dead zone.
    pub fn canvas_border_points(&self) -> Vec<PathPoint> {
        let (w, h) = (self.canvas_width, self.canvas_height);
        let (sw, sh) = (self.spacing_width, self.spacing_height);
        if sw <= 0.0 || sh <= 0.0 {
            return Vec::new();
        }
        let ys: Vec<f64> = (0..=(h / sh).floor() as usize).map(|i| i as f64 * sh).collect();
        let xs: Vec<f64> = (0..=(w / sw).floor() as usize).map(|i| i as f64 * sw).collect();

        let candidates = ys
            .iter()
            .map(|&y| Point::new(0.0, y))
            .chain(ys.iter().map(|&y| Point::new(w, y)))
            .chain(xs.iter().map(|&x| Point::new(x, 0.0)))
            .chain(xs.iter().map(|&x| Point::new(x, h)));

        let mut seen = HashSet::new();
        candidates
            .filter(|&p| !self.is_in_dead_zone(p))
            .filter(|p| seen.insert(p.key()))
            .map(PathPoint::new)
            .collect()
    }

    /// Lattice points plus dead-zone border points not already in it.
    pub fn valid_points(&self) -> Vec<Point> {
        let mut seen: HashSet<PointKey> = self.points.iter().map(|p| p.key()).collect();
        let mut all = self.points.clone();
        for bp in self.dead_zone_border_points() {
            if seen.insert(bp.point.key()) {
                all.push(bp.point);
            }
        }
        all
    }

    /// Euclidean distance to the dead-zone rectangle. Infinite without a dead
    /// zone and for points inside it.
    pub fn distance_to_dead_zone(&self, p: Point) -> f64 {
        let Some(dz) = &self.dead_zone else {
            return f64::INFINITY;
        };
        if dz.contains(p) {
            return f64::INFINITY;
        }
        let b = dz.bounds();
        let dx = if p.x < b.left {
            b.left - p.x
        } else if p.x > b.right {
            p.x - b.right
        } else {
            0.0
        };
        let dy = if p.y < b.top {
            b.top - p.y
        } else if p.y > b.bottom {
            p.y - b.bottom
        } else {
            0.0
        };
        (dx * dx + dy * dy).sqrt()
    }

    /// Lattice points outside the dead zone, nearest first.
    pub fn points_by_proximity_to_dead_zone(&self) -> Vec<PathPoint> {
        if self.dead_zone.is_none() {
            return Vec::new();
        }
        let mut ranked: Vec<(PathPoint, f64)> = self
            .points
            .iter()
            .filter(|&&p| !self.is_in_dead_zone(p))
            .map(|&p| (PathPoint::new(p), self.distance_to_dead_zone(p)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.into_iter().map(|(p, _)| p).collect()
    }

    /// Closest lattice or dead-zone border point to a pointer position.
    pub fn find_nearest_grid_point(&self, x: f64, y: f64, max_distance: f64) -> Option<Point> {
        geometry::find_nearest_point(Point::new(x, y), &self.valid_points(), max_distance)
    }

    pub fn grid_points(&self) -> &[Point] {
        &self.points
    }

    pub fn spacing_width(&self) -> f64 {
        self.spacing_width
    }

    pub fn spacing_height(&self) -> f64 {
        self.spacing_height
    }

    pub fn dead_zone(&self) -> Option<DeadZone> {
        self.dead_zone
    }

    pub fn canvas_width(&self) -> f64 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> f64 {
        self.canvas_height
    }

    /// Resize the canvas. The lattice is only rebuilt by the next
    /// [`GridManager::init_grid`].
    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> Result<(), GridError> {
        if !positive(width) || !positive(height) {
            return Err(GridError::InvalidCanvas { width, height });
        }
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(())
    }
}

/// Grid-aligned positions on the four dead-zone edges. May contain
/// duplicates at the corners.
fn dead_zone_edge_points(dz: &DeadZone, sw: f64, sh: f64) -> Vec<Point> {
    let b = dz.bounds();
    let mut out = Vec::new();

    let first_col = (b.left / sw).ceil() as i64;
    let last_col = (b.right / sw).floor() as i64;
    for col in first_col..=last_col {
        let x = col as f64 * sw;
        out.push(Point::new(x, b.top));
        out.push(Point::new(x, b.bottom));
    }

    let first_row = (b.top / sh).ceil() as i64;
    let last_row = (b.bottom / sh).floor() as i64;
    for row in first_row..=last_row {
        let y = row as f64 * sh;
        out.push(Point::new(b.left, y));
        out.push(Point::new(b.right, y));
    }

    out
}

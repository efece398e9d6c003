//! Planner configuration.
//!
//! Collaborators describe a canvas, a requested spacing, an optional dead
//! zone and generation options in one serializable struct. The defaults are
//! the 600×600 reference layout.
//!
//! ```
//! use tronpath_logic::config::{validate_config, PlannerConfig};
//!
//! let config = PlannerConfig::default();
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::generator::{EndpointStrategy, GenerationLimits};
use crate::geometry::Point;
use crate::grid::{DeadZone, DEFAULT_NEAREST_RADIUS};

/// Dead zone as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadZoneConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<DeadZoneConfig> for DeadZone {
    fn from(c: DeadZoneConfig) -> Self {
        DeadZone::new(Point::new(c.center_x, c.center_y), c.width, c.height)
    }
}

/// Everything needed to build a grid and run generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Requested spacing; snapped to a divisor of the canvas size.
    pub spacing_width: f64,
    pub spacing_height: f64,
    pub dead_zone: Option<DeadZoneConfig>,
    /// Target route count (None = optimal count).
    pub path_count: Option<usize>,
    /// RNG seed (None = seeded from entropy).
    pub seed: Option<u64>,
    pub strategy: EndpointStrategy,
    pub limits: GenerationLimits,
    /// Pointer snapping radius for nearest-point lookups.
    pub nearest_radius: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 600.0,
            spacing_width: 50.0,
            spacing_height: 50.0,
            dead_zone: Some(DeadZoneConfig {
                center_x: 300.0,
                center_y: 300.0,
                width: 200.0,
                height: 150.0,
            }),
            path_count: None,
            seed: None,
            strategy: EndpointStrategy::Random,
            limits: GenerationLimits::default(),
            nearest_radius: DEFAULT_NEAREST_RADIUS,
        }
    }
}

/// Configuration problem found by [`validate_config`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    /// Canvas width or height not positive.
    InvalidCanvas(f64, f64),
    /// Spacing not positive.
    InvalidSpacing(f64, f64),
    /// Spacing larger than the canvas: the lattice is a single row/column.
    SpacingExceedsCanvas,
    /// Dead zone extents not positive.
    InvalidDeadZone,
    /// Dead zone reaches past the canvas edge.
    DeadZoneOutOfBounds,
    /// Dead zone leaves no canvas to route on.
    DeadZoneCoversCanvas,
    /// Explicit target of zero routes.
    ZeroPathCount,
    /// Nearest-point radius not positive.
    InvalidNearestRadius(f64),
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Validate a planner configuration, returning all issues found.
pub fn validate_config(config: &PlannerConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    let canvas_ok = positive(config.canvas_width) && positive(config.canvas_height);
    if !canvas_ok {
        issues.push(ConfigIssue::InvalidCanvas(config.canvas_width, config.canvas_height));
    }
    if !positive(config.spacing_width) || !positive(config.spacing_height) {
        issues.push(ConfigIssue::InvalidSpacing(config.spacing_width, config.spacing_height));
    } else if canvas_ok
        && (config.spacing_width > config.canvas_width || config.spacing_height > config.canvas_height)
    {
        issues.push(ConfigIssue::SpacingExceedsCanvas);
    }

    if let Some(dz) = config.dead_zone {
        if !positive(dz.width) || !positive(dz.height) {
            issues.push(ConfigIssue::InvalidDeadZone);
        } else if canvas_ok {
            let b = DeadZone::from(dz).bounds();
            if b.left < 0.0 || b.top < 0.0 || b.right > config.canvas_width || b.bottom > config.canvas_height {
                issues.push(ConfigIssue::DeadZoneOutOfBounds);
            } else if b.left <= 0.0
                && b.top <= 0.0
                && b.right >= config.canvas_width
                && b.bottom >= config.canvas_height
            {
                issues.push(ConfigIssue::DeadZoneCoversCanvas);
            }
        }
    }

    if config.path_count == Some(0) {
        issues.push(ConfigIssue::ZeroPathCount);
    }
    if !positive(config.nearest_radius) {
        issues.push(ConfigIssue::InvalidNearestRadius(config.nearest_radius));
    }

    issues
}

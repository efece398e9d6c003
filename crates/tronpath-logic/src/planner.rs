//! One-stop facade over grid, router and generator.
//!
//! `Planner` owns the [`GridManager`] and hands out everything a renderer or
//! an interactive tool needs: the lattice, point-to-point routes, bulk
//! generation and statistics.

use rand::Rng;

use crate::config::PlannerConfig;
use crate::generator::{
    EndpointStrategy, GenerationLimits, GenerationReport, RandomPath, RandomPathGenerator,
};
use crate::geometry::Point;
use crate::grid::{DeadZone, GridConfig, GridError, GridManager, DEFAULT_NEAREST_RADIUS};
use crate::pathfinding::PathfindingEngine;
use crate::stats::{self, StatsReport};

/// Lower bound of [`Planner::optimal_path_count`].
pub const MIN_OPTIMAL_PATHS: usize = 12;

pub struct Planner {
    grid: GridManager,
    engine: PathfindingEngine,
    strategy: EndpointStrategy,
    limits: GenerationLimits,
    nearest_radius: f64,
}

impl Planner {
    /// Canvas with a grid already built.
    pub fn new(
        canvas_width: f64,
        canvas_height: f64,
        spacing_width: f64,
        spacing_height: f64,
        dead_zone: Option<DeadZone>,
    ) -> Result<Self, GridError> {
        let mut grid = GridManager::new(canvas_width, canvas_height)?;
        grid.init_grid(spacing_width, spacing_height, dead_zone)?;
        let engine = PathfindingEngine::new(&grid);
        Ok(Self {
            grid,
            engine,
            strategy: EndpointStrategy::default(),
            limits: GenerationLimits::default(),
            nearest_radius: DEFAULT_NEAREST_RADIUS,
        })
    }

    pub fn from_config(config: &PlannerConfig) -> Result<Self, GridError> {
        let mut planner = Self::new(
            config.canvas_width,
            config.canvas_height,
            config.spacing_width,
            config.spacing_height,
            config.dead_zone.map(Into::into),
        )?;
        planner.strategy = config.strategy;
        planner.limits = config.limits;
        planner.nearest_radius = config.nearest_radius;
        Ok(planner)
    }

    /// Rebuild the grid; the router follows.
    pub fn init_grid(
        &mut self,
        spacing_width: f64,
        spacing_height: f64,
        dead_zone: Option<DeadZone>,
    ) -> Result<GridConfig, GridError> {
        let config = self.grid.init_grid(spacing_width, spacing_height, dead_zone)?;
        self.engine = PathfindingEngine::new(&self.grid);
        Ok(config)
    }

    pub fn grid(&self) -> &GridManager {
        &self.grid
    }

    pub fn engine(&self) -> &PathfindingEngine {
        &self.engine
    }

    /// Route between two points, `None` if unreachable.
    pub fn find_path(&self, start: Point, end: Point) -> Option<Vec<Point>> {
        self.engine.a_star(start, end)
    }

    /// Snap a pointer position to the grid using the configured radius.
    pub fn find_nearest_grid_point(&self, x: f64, y: f64) -> Option<Point> {
        self.grid.find_nearest_grid_point(x, y, self.nearest_radius)
    }

    /// Default request size: the larger border set, at least 12. The
    /// generator still caps it at the canvas border count.
    pub fn optimal_path_count(&self) -> usize {
        let canvas = self.grid.canvas_border_points().len();
        let dead_zone = self.grid.dead_zone_border_points().len();
        canvas.max(dead_zone).max(MIN_OPTIMAL_PATHS)
    }

    /// Generate routes; `target` defaults to [`Self::optimal_path_count`].
    pub fn generate_paths<R: Rng + ?Sized>(
        &self,
        target: Option<usize>,
        rng: &mut R,
    ) -> (Vec<RandomPath>, GenerationReport) {
        let target = target.unwrap_or_else(|| self.optimal_path_count());
        RandomPathGenerator::new(&self.grid)
            .with_strategy(self.strategy)
            .with_limits(self.limits)
            .generate_with_report(Some(target), rng)
    }

    pub fn stats(&self, paths: &[RandomPath]) -> StatsReport {
        stats::stats_report(&self.grid, paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn planner() -> Planner {
        Planner::from_config(&PlannerConfig::default()).unwrap()
    }

    #[test]
    fn test_optimal_count() {
        assert_eq!(planner().optimal_path_count(), 48);
        let tiny = Planner::new(100.0, 100.0, 50.0, 50.0, None).unwrap();
        // 8 canvas border points, no dead zone
        assert_eq!(tiny.optimal_path_count(), MIN_OPTIMAL_PATHS);
    }

    #[test]
    fn test_generate_default_count() {
        let planner = planner();
        let (paths, report) = planner.generate_paths(None, &mut StdRng::seed_from_u64(42));
        assert_eq!(report.target, 48);
        assert!(!paths.is_empty() && paths.len() <= 48);
        assert_eq!(planner.stats(&paths).basic.total_paths, paths.len());
    }

    #[test]
    fn test_init_grid_refreshes_router() {
        let mut planner = planner();
        let goal = Point::new(300.0, 300.0);
        assert_eq!(planner.find_path(Point::new(0.0, 0.0), goal), None);
        planner.init_grid(50.0, 50.0, None).unwrap();
        assert!(planner.find_path(Point::new(0.0, 0.0), goal).is_some());
    }

    #[test]
    fn test_nearest_point() {
        let planner = planner();
        assert_eq!(planner.find_nearest_grid_point(98.0, 103.0), Some(Point::new(100.0, 100.0)));
        assert_eq!(planner.find_nearest_grid_point(300.0, 300.0), None);
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            Planner::new(600.0, 600.0, 50.0, 50.0, Some(DeadZone::new(Point::new(0.0, 0.0), 100.0, 100.0))),
            Err(GridError::DeadZoneOutOfBounds { .. })
        ));
    }
}

//! Lattice routing around a rectangular dead zone.
//!
//! This crate builds a regular point lattice over a canvas with an excluded
//! rectangle, routes between lattice points with A*, and greedily packs as
//! many mutually non-conflicting routes as it can between the dead zone's
//! border and the canvas border. Functions take plain data and return
//! results; nothing here draws, animates or performs I/O.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geometry`] | Points, distances, segment intersection, spacing snapping |
//! | [`grid`] | Lattice construction, dead zone, border and proximity point sets |
//! | [`pathfinding`] | A* over the lattice with off-lattice border fallback |
//! | [`conflict`] | Shared-point, segment-contact and clearance checks |
//! | [`generator`] | Three-phase greedy route generation |
//! | [`stats`] | Path length, geography, efficiency and coverage statistics |
//! | [`config`] | Serializable planner configuration and validation |
//! | [`planner`] | Facade tying grid, router, generator and stats together |

pub mod config;
pub mod conflict;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod pathfinding;
pub mod planner;
pub mod stats;

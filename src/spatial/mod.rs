//! Spatial partitioning for neighbor queries

pub mod grid;

pub use grid::SpatialGrid;

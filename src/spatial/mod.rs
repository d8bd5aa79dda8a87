//! Spatial indices over page geometry.
//!
//! - [`KdTree`]: static point index for nearest-neighbour and k-NN queries
//! - [`QuadTree`]: mutable region index over rectangles for range and
//!   nearest-neighbour queries

pub mod kdtree;
pub mod neighbours;
pub mod quadtree;

pub use kdtree::KdTree;
pub use neighbours::Neighbour;
pub use quadtree::QuadTree;

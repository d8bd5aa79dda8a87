// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]
#![allow(clippy::new_without_default)]

//! # Page Geometry
//!
//! Geometric core for recovering structure from rendered document pages:
//! whitespace regions, table grids and reading order, working only from the
//! boxes of glyphs, words and images and the painted vector paths.
//!
//! ## Core Features
//!
//! - **KD-tree**: balanced 2-D point index with nearest-neighbour and
//!   tie-preserving k-nearest-neighbour queries
//! - **Region quadtree**: mutable rectangle index with insert, remove, move,
//!   range and nearest-neighbour queries
//! - **Whitespace cover**: branch-and-bound search for maximal empty
//!   rectangles around page content
//! - **Table detection**: ruling extraction, segment merging, intersection
//!   sweep, cell detection and table grouping
//!
//! Long-running passes poll a [`cancel::CancellationToken`] and every
//! tolerance is passed explicitly through [`config`].
//!
//! ## Quick Start
//!
//! ```
//! use page_geometry::config::Config;
//! use page_geometry::geometry::Rect;
//! use page_geometry::page::{PageAnalyzer, PageGeometry};
//!
//! # fn main() -> page_geometry::Result<()> {
//! let mut page = PageGeometry::new();
//! page.words = vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(90.0, 90.0, 100.0, 100.0)];
//!
//! let layout = PageAnalyzer::new(Config::default()).analyze(&page, None)?;
//! for rect in &layout.whitespace {
//!     println!("{:?}", rect);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 (<http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license (<http://opensource.org/licenses/MIT>)
//!
//! at your option.

// Error handling
pub mod error;

// Configuration and cancellation
pub mod cancel;
pub mod config;

// Geometric primitives
pub mod geometry;

// Spatial indices
pub mod spatial;

// Analysis passes
pub mod layout;
pub mod page;

// Re-exports
pub use cancel::CancellationToken;
pub use config::Config;
pub use error::{Error, Result};
pub use page::{PageAnalyzer, PageGeometry, PageLayout};

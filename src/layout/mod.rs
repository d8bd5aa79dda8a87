//! Layout analysis passes over page geometry.
//!
//! This module provides the algorithms that recover structure from raw
//! page geometry:
//! - Whitespace cover (maximal empty rectangles)
//! - Ruling line extraction and merging
//! - Table cell detection and grouping
//! - Transitive grouping of linked elements

pub mod clustering;
pub mod lines;
pub mod table_detector;
pub mod whitespace;

// Re-export main types
pub use clustering::{group_index_edges, group_indexes};
pub use lines::{extract_segments, merge_segments};
pub use table_detector::{order_tables, TableCandidate, TableExtractor};
pub use whitespace::{get_whitespaces, get_whitespaces_for_page, get_whitespaces_within};

//! Configuration for the layout analysis passes.
//!
//! Every geometric comparison takes its tolerance from an explicit
//! [`GeometryConfig`] value; there is no global mutable tolerance. The
//! per-pass settings live in [`WhitespaceConfig`] and [`TableConfig`], and
//! [`Config`] bundles all three so a whole setup can be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Rect;

/// Shared geometric tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Maximum offset (in user space units) for two coordinates to be
    /// considered equal: axis classification of segments, collinearity for
    /// merging, and segment reach when intersecting.
    pub tolerance: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryConfig {
    pub fn new() -> Self {
        Self { tolerance: 0.5 }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Whitespace cover settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitespaceConfig {
    /// Sub-rectangles must be wider than this to be explored.
    pub min_width: f64,
    /// Sub-rectangles must be taller than this to be explored.
    pub min_height: f64,
    /// Stop after this many rectangles were accepted.
    pub max_rectangle_count: usize,
    /// Fraction of overlap with obstacles still considered "empty".
    pub whitespace_fuzziness: f64,
    /// Upper bound on the candidate queue, 0 for unbounded.
    pub max_bound_queue_size: usize,
    /// Hard cap on dequeued candidates, `None` for no cap.
    pub max_iterations: Option<usize>,
}

impl Default for WhitespaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WhitespaceConfig {
    pub fn new() -> Self {
        Self {
            min_width: 5.0,
            min_height: 5.0,
            max_rectangle_count: 40,
            whitespace_fuzziness: 0.15,
            max_bound_queue_size: 0,
            max_iterations: None,
        }
    }

    /// Derive the minimum sizes from the page's glyphs: 1.25 times the most
    /// common glyph width and height. Falls back to the defaults when there
    /// are no glyphs.
    pub fn from_letters(letters: &[Rect]) -> Self {
        let mut config = Self::new();
        if let Some(w) = mode(letters.iter().map(|l| l.width())) {
            config.min_width = w * 1.25;
        }
        if let Some(h) = mode(letters.iter().map(|l| l.height())) {
            config.min_height = h * 1.25;
        }
        config
    }

    pub fn with_min_size(mut self, min_width: f64, min_height: f64) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    pub fn with_max_rectangle_count(mut self, count: usize) -> Self {
        self.max_rectangle_count = count;
        self
    }

    pub fn with_fuzziness(mut self, fuzziness: f64) -> Self {
        self.whitespace_fuzziness = fuzziness;
        self
    }

    pub fn with_max_bound_queue_size(mut self, size: usize) -> Self {
        self.max_bound_queue_size = size;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.whitespace_fuzziness) {
            return Err(Error::InvalidArgument(format!(
                "whitespace fuzziness must be in [0, 1), got {}",
                self.whitespace_fuzziness
            )));
        }
        if !(self.min_width >= 0.0 && self.min_height >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "minimum whitespace size must be non-negative, got {}x{}",
                self.min_width, self.min_height
            )));
        }
        Ok(())
    }
}

/// Table reconstruction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Every segment is lengthened by this much at both ends to close
    /// near-miss gaps at corners.
    pub extend_amount: f64,
    /// Coordinates are rounded to this many decimals.
    pub decimals: u32,
    /// Filled rectangles thinner than this fraction of the modal glyph
    /// height are read as lines.
    pub thin_rect_ratio: f64,
    /// Glyph height used when the page has no letters.
    pub fallback_glyph_size: f64,
    /// Cells whose corners are closer than this belong to the same table.
    pub corner_distance: f64,
    /// Tables with fewer cells are discarded.
    pub min_cells_in_table: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self {
            extend_amount: 1.0,
            decimals: 2,
            thin_rect_ratio: 0.7,
            fallback_glyph_size: 10.0,
            corner_distance: 1.0,
            min_cells_in_table: 1,
        }
    }

    pub fn with_extend_amount(mut self, amount: f64) -> Self {
        self.extend_amount = amount;
        self
    }

    pub fn with_corner_distance(mut self, distance: f64) -> Self {
        self.corner_distance = distance;
        self
    }

    pub fn with_min_cells_in_table(mut self, count: usize) -> Self {
        self.min_cells_in_table = count;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimals > 10 {
            return Err(Error::InvalidArgument(format!(
                "rounding precision must be at most 10 decimals, got {}",
                self.decimals
            )));
        }
        if self.extend_amount < 0.0 || self.corner_distance < 0.0 {
            return Err(Error::InvalidArgument(
                "extend amount and corner distance must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geometry: GeometryConfig,
    pub whitespace: WhitespaceConfig,
    pub table: TableConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields keep their
    /// defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.geometry.tolerance >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "tolerance must be non-negative, got {}",
                self.geometry.tolerance
            )));
        }
        self.whitespace.validate()?;
        self.table.validate()
    }
}

/// Most frequent value after rounding to one decimal, ties going to the
/// smaller value.
pub(crate) fn mode(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut keys: Vec<i64> = values
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| (v * 10.0).round() as i64)
        .collect();
    if keys.is_empty() {
        return None;
    }
    keys.sort_unstable();
    let mut best = (keys[0], 0usize);
    let mut run = (keys[0], 0usize);
    for k in keys {
        if k == run.0 {
            run.1 += 1;
        } else {
            run = (k, 1);
        }
        if run.1 > best.1 {
            best = run;
        }
    }
    Some(best.0 as f64 / 10.0)
}

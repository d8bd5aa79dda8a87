//! Page-level analysis.
//!
//! [`PageGeometry`] is the raw geometry of one rendered page: glyph, word
//! and image boxes plus painted vector paths. [`PageAnalyzer`] runs the
//! whitespace cover and table detection over it and returns a
//! [`PageLayout`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{PagePath, Rect};
use crate::layout::table_detector::{TableCandidate, TableExtractor};
use crate::layout::whitespace::{get_whitespaces_for_page, get_whitespaces_within};

/// Geometry of one page in PDF user space (y grows upward).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width, when known
    pub width: Option<f64>,
    /// Page height, when known
    pub height: Option<f64>,
    pub words: Vec<Rect>,
    pub images: Vec<Rect>,
    /// Individual glyph boxes
    pub letters: Vec<Rect>,
    pub paths: Vec<PagePath>,
}

impl PageGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The page box anchored at the origin, if the size is known.
    pub fn bounds(&self) -> Option<Rect> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(Rect::new(0.0, 0.0, w, h)),
            _ => None,
        }
    }
}

/// Result of analysing one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// Whitespace cover, in acceptance order
    pub whitespace: Vec<Rect>,
    /// Table candidates in reading order
    pub tables: Vec<TableCandidate>,
}

/// Runs every analysis pass over a page.
///
/// # Examples
///
/// ```
/// use page_geometry::config::Config;
/// use page_geometry::geometry::{PagePath, PathCommand, Rect};
/// use page_geometry::page::{PageAnalyzer, PageGeometry};
///
/// let mut page = PageGeometry::new();
/// page.words = vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(90.0, 90.0, 100.0, 100.0)];
/// page.paths = vec![PagePath::stroked(vec![PathCommand::Rectangle { x: 20.0, y: 20.0, width: 60.0, height: 30.0 }])];
///
/// let layout = PageAnalyzer::new(Config::default()).analyze(&page, None).unwrap();
/// assert_eq!(layout.tables.len(), 1);
/// assert!(!layout.whitespace.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PageAnalyzer {
    config: Config,
}

impl PageAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute the whitespace cover and table candidates of `page`.
    ///
    /// The whitespace search covers the page box when the page size is
    /// known, otherwise the extent of the words and images.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) if the
    /// configuration is out of range, [`Error::Cancelled`](crate::Error::Cancelled)
    /// if `cancel` fires.
    pub fn analyze(&self, page: &PageGeometry, cancel: Option<&CancellationToken>) -> Result<PageLayout> {
        self.config.validate()?;
        let ws_config = &self.config.whitespace;
        let whitespace = match page.bounds() {
            Some(bounds) => {
                let obstacles: Vec<Rect> = page.words.iter().chain(&page.images).copied().collect();
                get_whitespaces_within(bounds, &obstacles, ws_config, cancel)?
            },
            None => get_whitespaces_for_page(&page.words, &page.images, ws_config, cancel)?,
        };

        let extractor = TableExtractor::new(self.config.geometry, self.config.table.clone());
        let tables = extractor.get_candidates(page, cancel)?;

        log::debug!(
            "Page analysed: {} whitespace rectangles, {} tables",
            whitespace.len(),
            tables.len()
        );
        Ok(PageLayout { whitespace, tables })
    }
}

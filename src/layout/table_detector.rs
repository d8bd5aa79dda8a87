//! Table structure detection from ruling lines.
//!
//! Tables are recovered from geometry alone:
//!
//! 1. ruling segments are extracted from the page paths and merged
//!    ([`crate::layout::lines`]);
//! 2. every crossing of a horizontal and a vertical ruling is recorded,
//!    keyed by its rounded position ([`find_intersections`]);
//! 3. cells are the smallest closed loops of rulings: a top-left crossing,
//!    the crossings below it on the same vertical and right of it on the
//!    same horizontal, and a bottom-right crossing tracing back to both
//!    ([`find_cells`]);
//! 4. cells sharing corners are grouped into tables
//!    ([`group_cells_into_tables`]).
//!
//! Matching words to cells is left to the caller.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cancel::{self, CancellationToken};
use crate::config::{GeometryConfig, TableConfig};
use crate::error::{Error, Result};
use crate::geometry::{LineSegment, Point, Rect};
use crate::layout::clustering::group_index_edges;
use crate::layout::lines::{extract_segments, merge_segments, prepare_segments};
use crate::page::PageGeometry;

/// Intersection position rounded to a fixed number of decimals, usable as
/// a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey {
    pub x: i64,
    pub y: i64,
}

impl PointKey {
    pub fn new(point: Point, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self {
            x: (point.x * factor).round() as i64,
            y: (point.y * factor).round() as i64,
        }
    }
}

/// A crossing of two rulings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Point,
    /// Index of the horizontal ruling
    pub horizontal: usize,
    /// Index of the vertical ruling
    pub vertical: usize,
}

/// A group of cells forming one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCandidate {
    /// Cells ordered top to bottom, then left to right
    pub cells: Vec<Rect>,
    /// Bounding box of all cells
    pub bound: Rect,
    reading_order: i32,
}

impl TableCandidate {
    /// Build a candidate from its cells. Returns `None` for no cells.
    pub fn new(mut cells: Vec<Rect>) -> Option<Self> {
        let bound = Rect::bounding(&cells)?;
        cells.sort_by(|a, b| b.top().total_cmp(&a.top()).then(a.left().total_cmp(&b.left())));
        Some(Self {
            cells,
            bound,
            reading_order: -1,
        })
    }

    /// Position in reading order, `-1` while unassigned.
    pub fn reading_order(&self) -> i32 {
        self.reading_order
    }

    pub fn set_reading_order(&mut self, order: i32) -> Result<()> {
        if order < -1 {
            return Err(Error::InvalidArgument(format!(
                "reading order must be -1 (unassigned) or non-negative, got {}",
                order
            )));
        }
        self.reading_order = order;
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Sort tables top to bottom, then left to right, and number them in that
/// order.
pub fn order_tables(tables: &mut [TableCandidate]) {
    tables.sort_by(|a, b| {
        b.bound
            .top()
            .total_cmp(&a.bound.top())
            .then(a.bound.left().total_cmp(&b.bound.left()))
    });
    for (i, table) in tables.iter_mut().enumerate() {
        table.reading_order = i as i32;
    }
}

/// Record every crossing between `horizontals` and `verticals`.
///
/// Verticals are swept in x order; each horizontal only tests the verticals
/// within its (tolerance-widened) x extent. When two pairs of rulings cross
/// at the same rounded position the first pair found is kept.
///
/// # Examples
///
/// ```
/// use page_geometry::config::{GeometryConfig, TableConfig};
/// use page_geometry::geometry::LineSegment;
/// use page_geometry::layout::table_detector::find_intersections;
///
/// let horizontals = vec![LineSegment::horizontal(10.0, 0.0, 100.0)];
/// let verticals = vec![LineSegment::vertical(50.0, 0.0, 20.0), LineSegment::vertical(150.0, 0.0, 20.0)];
/// let crossings = find_intersections(&horizontals, &verticals, &GeometryConfig::new(), &TableConfig::new(), None).unwrap();
/// assert_eq!(crossings.len(), 1);
/// ```
pub fn find_intersections(
    horizontals: &[LineSegment],
    verticals: &[LineSegment],
    geometry: &GeometryConfig,
    config: &TableConfig,
    cancel: Option<&CancellationToken>,
) -> Result<IndexMap<PointKey, Intersection>> {
    let tolerance = geometry.tolerance;
    let mut by_x: Vec<usize> = (0..verticals.len()).collect();
    by_x.sort_by(|&a, &b| verticals[a].position().total_cmp(&verticals[b].position()));
    let xs: Vec<f64> = by_x.iter().map(|&i| verticals[i].position()).collect();

    let mut intersections = IndexMap::new();
    for (h_idx, h) in horizontals.iter().enumerate() {
        cancel::check(cancel)?;
        let lo = xs.partition_point(|&x| x < h.start_coord() - tolerance);
        let hi = xs.partition_point(|&x| x <= h.end_coord() + tolerance);
        for &v_idx in &by_x[lo..hi] {
            if let Some(point) = h.intersection_point(&verticals[v_idx], tolerance) {
                let key = PointKey::new(point, config.decimals);
                intersections.entry(key).or_insert(Intersection {
                    point,
                    horizontal: h_idx,
                    vertical: v_idx,
                });
            }
        }
    }
    log::trace!(
        "{} intersections between {} horizontal and {} vertical rulings",
        intersections.len(),
        horizontals.len(),
        verticals.len()
    );
    Ok(intersections)
}

/// Detect cells formed by the rulings.
///
/// Crossings are visited top to bottom, left to right; each may anchor one
/// cell as its top-left corner, the smallest closed loop starting there.
pub fn find_cells(
    horizontals: &[LineSegment],
    verticals: &[LineSegment],
    geometry: &GeometryConfig,
    config: &TableConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Rect>> {
    let intersections = find_intersections(horizontals, verticals, geometry, config, cancel)?;

    let mut keys: Vec<PointKey> = intersections.keys().copied().collect();
    keys.sort_by(|a, b| b.y.cmp(&a.y).then(a.x.cmp(&b.x)));

    // Columns keep the top-to-bottom order, rows left-to-right.
    let mut columns: HashMap<i64, Vec<PointKey>> = HashMap::new();
    let mut rows: HashMap<i64, Vec<PointKey>> = HashMap::new();
    for key in &keys {
        columns.entry(key.x).or_default().push(*key);
        rows.entry(key.y).or_default().push(*key);
    }

    let grid = Grid {
        intersections: &intersections,
        columns,
        rows,
    };

    let mut cells = Vec::new();
    for key in &keys {
        cancel::check(cancel)?;
        if let Some(cell) = grid.cell_at(key) {
            cells.push(cell);
        }
    }
    log::debug!("Found {} cells from {} intersections", cells.len(), keys.len());
    Ok(cells)
}

struct Grid<'a> {
    intersections: &'a IndexMap<PointKey, Intersection>,
    columns: HashMap<i64, Vec<PointKey>>,
    rows: HashMap<i64, Vec<PointKey>>,
}

impl Grid<'_> {
    /// Smallest cell with `top_left` as its top-left corner.
    fn cell_at(&self, top_left: &PointKey) -> Option<Rect> {
        let anchor = self.intersections.get(top_left)?;
        let column = self.columns.get(&top_left.x)?;
        let row = self.rows.get(&top_left.y)?;

        let below = column
            .iter()
            .filter(|k| k.y < top_left.y)
            .filter_map(|k| self.intersections.get(k).map(|p| (k, p)))
            .filter(|(_, p)| p.vertical == anchor.vertical);
        let right: Vec<(&PointKey, &Intersection)> = row
            .iter()
            .filter(|k| k.x > top_left.x)
            .filter_map(|k| self.intersections.get(k).map(|p| (k, p)))
            .filter(|(_, p)| p.horizontal == anchor.horizontal)
            .collect();

        for (bottom_key, bottom_left) in below {
            for &(right_key, top_right) in &right {
                let corner = PointKey {
                    x: right_key.x,
                    y: bottom_key.y,
                };
                let Some(bottom_right) = self.intersections.get(&corner) else {
                    continue;
                };
                if bottom_right.horizontal == bottom_left.horizontal && bottom_right.vertical == top_right.vertical {
                    return Some(Rect::new(
                        anchor.point.x,
                        bottom_left.point.y,
                        top_right.point.x,
                        anchor.point.y,
                    ));
                }
            }
        }
        None
    }
}

/// Group cells whose corners lie within `corner_distance` of each other.
///
/// Groups with fewer than `min_cells_in_table` cells are dropped.
pub fn group_cells_into_tables(cells: &[Rect], config: &TableConfig) -> Vec<TableCandidate> {
    let reach = config.corner_distance;
    let mut edges = vec![Vec::new(); cells.len()];
    for i in 0..cells.len() {
        let near_i = cells[i].inflate(reach);
        for j in (i + 1)..cells.len() {
            if near_i.intersects(&cells[j]) && share_corner(&cells[i], &cells[j], reach) {
                edges[i].push(j);
            }
        }
    }

    let groups = group_index_edges(&edges);
    let total = groups.len();
    let tables: Vec<TableCandidate> = groups
        .into_iter()
        .filter(|g| g.len() >= config.min_cells_in_table)
        .filter_map(|g| TableCandidate::new(g.into_iter().map(|i| cells[i]).collect()))
        .collect();
    if tables.len() < total {
        log::debug!("Dropped {} cell groups below {} cells", total - tables.len(), config.min_cells_in_table);
    }
    tables
}

fn share_corner(a: &Rect, b: &Rect, reach: f64) -> bool {
    a.corners()
        .iter()
        .any(|ca| b.corners().iter().any(|cb| ca.distance(cb) <= reach))
}

/// Runs the full table pipeline over a page.
#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
    geometry: GeometryConfig,
    config: TableConfig,
}

impl TableExtractor {
    pub fn new(geometry: GeometryConfig, config: TableConfig) -> Self {
        Self { geometry, config }
    }

    /// Table candidates drawn by the page's paths, in reading order.
    pub fn get_candidates(
        &self,
        page: &PageGeometry,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<TableCandidate>> {
        let segments = extract_segments(&page.paths, &page.letters, &self.geometry, &self.config);
        self.candidates_from_prepared(&segments, cancel)
    }

    /// Table candidates drawn by raw segments, e.g. rulings obtained
    /// elsewhere. Segments are snapped, extended and rounded first.
    pub fn get_candidates_from_segments(
        &self,
        segments: &[LineSegment],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<TableCandidate>> {
        let prepared = prepare_segments(segments.iter().copied(), &self.geometry, &self.config);
        self.candidates_from_prepared(&prepared, cancel)
    }

    fn candidates_from_prepared(
        &self,
        segments: &[LineSegment],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<TableCandidate>> {
        let merged = merge_segments(segments, self.geometry.tolerance)?;
        let (horizontals, verticals): (Vec<LineSegment>, Vec<LineSegment>) =
            merged.into_iter().partition(|s| s.is_horizontal());

        let cells = find_cells(&horizontals, &verticals, &self.geometry, &self.config, cancel)?;
        let mut tables = group_cells_into_tables(&cells, &self.config);
        order_tables(&mut tables);
        log::debug!("{} table candidates from {} cells", tables.len(), cells.len());
        Ok(tables)
    }
}

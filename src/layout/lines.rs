//! Ruling lines: extraction from painted paths and merging.
//!
//! Tables are drawn with stroked lines, thin filled rectangles or a mix of
//! both, usually with small gaps and jitter at the corners. Extraction turns
//! all of these into axis-aligned [`LineSegment`]s, lengthened slightly so
//! near-miss corners meet, and rounded so jittered duplicates coincide.
//! Merging then joins collinear pieces into single long rulings.

use crate::config::{mode, GeometryConfig, TableConfig};
use crate::error::{Error, Result};
use crate::geometry::{LineSegment, PagePath, Point, Rect};
use crate::layout::clustering::group_index_edges;

/// Extract ruling segments from a page's paths.
///
/// Paths containing curves are skipped entirely. Filled paths made only of
/// thin rectangles (thinner than `thin_rect_ratio` times the modal glyph
/// height of `letters`) contribute their centerlines; every other path
/// contributes its axis-aligned edges. Diagonal edges are dropped.
///
/// # Examples
///
/// ```
/// use page_geometry::config::{GeometryConfig, TableConfig};
/// use page_geometry::geometry::{LineSegment, PagePath, PathCommand, Point};
/// use page_geometry::layout::lines::extract_segments;
///
/// let rule = PagePath::filled(vec![PathCommand::Rectangle { x: 0.0, y: 99.5, width: 100.0, height: 1.0 }]);
/// let diagonal = PagePath::line(Point::new(0.0, 0.0), Point::new(50.0, 50.0));
///
/// let segments = extract_segments(&[rule, diagonal], &[], &GeometryConfig::new(), &TableConfig::new());
/// assert_eq!(segments, vec![LineSegment::horizontal(100.0, -1.0, 101.0)]);
/// ```
pub fn extract_segments(
    paths: &[PagePath],
    letters: &[Rect],
    geometry: &GeometryConfig,
    config: &TableConfig,
) -> Vec<LineSegment> {
    let glyph_height = mode(letters.iter().map(|l| l.height())).unwrap_or(config.fallback_glyph_size);
    let thin_limit = glyph_height * config.thin_rect_ratio;

    let mut raw = Vec::new();
    let mut curved = 0;
    for path in paths {
        if path.has_curves() {
            curved += 1;
            continue;
        }
        if path.filled {
            let rects = path.rectangles(geometry.tolerance);
            let centerlines: Vec<LineSegment> = rects.iter().filter_map(|r| centerline(r, thin_limit)).collect();
            if !rects.is_empty() && centerlines.len() == rects.len() {
                raw.extend(centerlines);
                continue;
            }
        }
        raw.extend(path.line_segments());
    }

    let segments = prepare_segments(raw, geometry, config);
    log::debug!(
        "Extracted {} ruling segments from {} paths ({} curved paths skipped)",
        segments.len(),
        paths.len(),
        curved
    );
    segments
}

/// Snap, extend and round raw segments. Diagonal and degenerate segments
/// are dropped.
pub fn prepare_segments(
    raw: impl IntoIterator<Item = LineSegment>,
    geometry: &GeometryConfig,
    config: &TableConfig,
) -> Vec<LineSegment> {
    raw.into_iter()
        .filter_map(|s| s.normalized(geometry.tolerance))
        .map(|s| s.extend(config.extend_amount).round(config.decimals))
        .filter(|s| s.is_horizontal() || s.is_vertical())
        .collect()
}

/// Centerline of a rectangle thinner than `limit`, along its long side.
fn centerline(rect: &Rect, limit: f64) -> Option<LineSegment> {
    let mid = rect.centroid();
    if rect.height() <= rect.width() && rect.height() < limit {
        Some(LineSegment::new(Point::new(rect.left(), mid.y), Point::new(rect.right(), mid.y)))
    } else if rect.width() < rect.height() && rect.width() < limit {
        Some(LineSegment::new(Point::new(mid.x, rect.bottom()), Point::new(mid.x, rect.top())))
    } else {
        None
    }
}

/// Merge collinear segments that touch or overlap.
///
/// Segments on the same axis whose positions differ by at most `tolerance`
/// and whose extents meet are joined, transitively, until no further merge
/// is possible. The merged segment spans the union of its members' extents
/// at their mean position. Non axis-aligned input is ignored.
///
/// Returns horizontals (bottom to top, then left to right) followed by
/// verticals (left to right, then bottom to top).
///
/// # Errors
///
/// [`Error::InternalConsistency`] if a merged segment came out shorter than
/// one of the segments it absorbed.
pub fn merge_segments(segments: &[LineSegment], tolerance: f64) -> Result<Vec<LineSegment>> {
    let mut horizontals: Vec<LineSegment> = segments.iter().filter(|s| s.is_horizontal()).copied().collect();
    let mut verticals: Vec<LineSegment> = segments.iter().filter(|s| s.is_vertical()).copied().collect();

    let before = horizontals.len() + verticals.len();
    if before < segments.len() {
        log::warn!("Ignoring {} segments that are not axis-aligned", segments.len() - before);
    }

    horizontals = merge_until_stable(horizontals, tolerance)?;
    verticals = merge_until_stable(verticals, tolerance)?;
    log::debug!("Merged {} segments into {}", before, horizontals.len() + verticals.len());

    horizontals.extend(verticals);
    Ok(horizontals)
}

fn merge_until_stable(mut segments: Vec<LineSegment>, tolerance: f64) -> Result<Vec<LineSegment>> {
    loop {
        let count = segments.len();
        segments = merge_pass(segments, tolerance)?;
        if segments.len() == count {
            return Ok(segments);
        }
    }
}

/// One round of merging over segments that all share an axis.
fn merge_pass(mut segments: Vec<LineSegment>, tolerance: f64) -> Result<Vec<LineSegment>> {
    segments.sort_by(|a, b| {
        a.position()
            .total_cmp(&b.position())
            .then(a.start_coord().total_cmp(&b.start_coord()))
    });

    let mut edges = vec![Vec::new(); segments.len()];
    for i in 0..segments.len() {
        for j in (i + 1)..segments.len() {
            if segments[j].position() - segments[i].position() > tolerance {
                break;
            }
            if segments[i].is_mergeable_with(&segments[j], tolerance) {
                edges[i].push(j);
            }
        }
    }

    let mut merged = Vec::new();
    for group in group_index_edges(&edges) {
        let members: Vec<&LineSegment> = group.iter().map(|&i| &segments[i]).collect();
        let segment = merge_group(&members);
        if let Some(longer) = members.iter().find(|m| m.length() > segment.length()) {
            return Err(Error::InternalConsistency(format!(
                "merged segment {:?} is shorter than absorbed segment {:?}",
                segment, longer
            )));
        }
        merged.push(segment);
    }
    Ok(merged)
}

fn merge_group(members: &[&LineSegment]) -> LineSegment {
    let first = members[0];
    if members.len() == 1 {
        return *first;
    }
    let position = members.iter().map(|m| m.position()).sum::<f64>() / members.len() as f64;
    let start = members.iter().map(|m| m.start_coord()).fold(f64::INFINITY, f64::min);
    let end = members.iter().map(|m| m.end_coord()).fold(f64::NEG_INFINITY, f64::max);
    if first.is_vertical() {
        LineSegment::vertical(position, start, end)
    } else {
        LineSegment::horizontal(position, start, end)
    }
}

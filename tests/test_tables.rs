//! Integration tests for table reconstruction
//!
//! Covers the full path from painted page paths to ordered table
//! candidates, plus merge properties.

use page_geometry::config::{Config, GeometryConfig, TableConfig};
use page_geometry::geometry::{LineSegment, PagePath, PathCommand, Point, Rect};
use page_geometry::layout::lines::merge_segments;
use page_geometry::layout::table_detector::TableExtractor;
use page_geometry::page::{PageAnalyzer, PageGeometry};
use proptest::prelude::*;

fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> PagePath {
    PagePath::line(Point::new(x0, y0), Point::new(x1, y1))
}

#[test]
fn test_single_rectangle_round_trip() {
    let mut page = PageGeometry::new();
    page.paths = vec![
        // The rectangle, drawn as four separate strokes with small gaps
        line(100.0, 500.0, 299.6, 500.0),
        line(100.0, 400.0, 300.0, 400.0),
        line(100.0, 400.4, 100.0, 500.0),
        line(300.0, 400.0, 300.0, 499.5),
        // Noise: a lone rule, a diagonal and a curve elsewhere
        line(50.0, 100.0, 550.0, 100.0),
        line(10.0, 10.0, 60.0, 60.0),
        PagePath::stroked(vec![
            PathCommand::MoveTo { x: 400.0, y: 300.0 },
            PathCommand::CurveTo {
                x1: 450.0,
                y1: 350.0,
                x2: 500.0,
                y2: 250.0,
                x3: 550.0,
                y3: 300.0,
            },
        ]),
    ];

    let extractor = TableExtractor::new(GeometryConfig::new(), TableConfig::new());
    let tables = extractor.get_candidates(&page, None).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].cells, vec![Rect::new(100.0, 400.0, 300.0, 500.0)]);
    assert_eq!(tables[0].bound, Rect::new(100.0, 400.0, 300.0, 500.0));
    assert_eq!(tables[0].reading_order(), 0);
}

/// A `rows` x `cols` ruled grid drawn with thin filled rectangles.
fn filled_grid(left: f64, top: f64, rows: usize, cols: usize, cell_w: f64, cell_h: f64) -> Vec<PagePath> {
    let width = cols as f64 * cell_w;
    let height = rows as f64 * cell_h;
    let mut paths = Vec::new();
    for r in 0..=rows {
        let y = top - r as f64 * cell_h;
        paths.push(PagePath::filled(vec![PathCommand::Rectangle {
            x: left,
            y: y - 0.25,
            width,
            height: 0.5,
        }]));
    }
    for c in 0..=cols {
        let x = left + c as f64 * cell_w;
        paths.push(PagePath::filled(vec![PathCommand::Rectangle {
            x: x - 0.25,
            y: top - height,
            width: 0.5,
            height,
        }]));
    }
    paths
}

#[test]
fn test_two_tables_in_reading_order() {
    let mut page = PageGeometry::new();
    page.width = Some(612.0);
    page.height = Some(792.0);
    page.letters = vec![Rect::new(0.0, 0.0, 5.0, 9.0); 4];
    page.paths = filled_grid(300.0, 700.0, 2, 2, 100.0, 20.0);
    page.paths.extend(filled_grid(50.0, 700.0, 3, 4, 50.0, 20.0));
    page.paths.extend(filled_grid(50.0, 400.0, 1, 1, 200.0, 50.0));

    let layout = PageAnalyzer::new(Config::default()).analyze(&page, None).unwrap();
    let tables = layout.tables;
    assert_eq!(tables.len(), 3);

    assert_eq!(tables[0].bound, Rect::new(50.0, 640.0, 250.0, 700.0));
    assert_eq!(tables[0].cell_count(), 12);
    assert_eq!(tables[1].bound, Rect::new(300.0, 660.0, 500.0, 700.0));
    assert_eq!(tables[1].cell_count(), 4);
    assert_eq!(tables[2].cell_count(), 1);
    let orders: Vec<i32> = tables.iter().map(|t| t.reading_order()).collect();
    assert_eq!(orders, vec![0, 1, 2]);

    // Cells run top to bottom, then left to right.
    assert_eq!(tables[0].cells[0], Rect::new(50.0, 680.0, 100.0, 700.0));
    assert_eq!(tables[0].cells[3], Rect::new(200.0, 680.0, 250.0, 700.0));
}

#[test]
fn test_min_cells_drops_small_groups() {
    let config = TableConfig::new().with_min_cells_in_table(2);
    let extractor = TableExtractor::new(GeometryConfig::new(), config);
    let mut page = PageGeometry::new();
    page.paths = filled_grid(50.0, 400.0, 1, 1, 200.0, 50.0);
    page.paths.extend(filled_grid(300.0, 700.0, 2, 2, 100.0, 20.0));
    let tables = extractor.get_candidates(&page, None).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].cell_count(), 4);
}

#[test]
fn test_layout_serialises() {
    let mut page = PageGeometry::new();
    page.paths = filled_grid(0.0, 100.0, 1, 1, 100.0, 100.0);
    let layout = PageAnalyzer::new(Config::default()).analyze(&page, None).unwrap();
    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["tables"][0]["bound"]["right"], 100.0);
    assert_eq!(json["tables"][0]["reading_order"], 0);
}

fn collinear_strategy() -> impl Strategy<Value = Vec<LineSegment>> {
    prop::collection::vec((0i32..300, 1i32..60, 0i32..3, any::<bool>()), 1..40).prop_map(|pieces| {
        pieces
            .into_iter()
            .map(|(start, len, jitter, vertical)| {
                let position = 100.0 + jitter as f64 * 0.2;
                let (a, b) = (start as f64, (start + len) as f64);
                if vertical {
                    LineSegment::vertical(position, a, b)
                } else {
                    LineSegment::horizontal(position, a, b)
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn merge_is_idempotent(segments in collinear_strategy()) {
        let once = merge_segments(&segments, 0.5).unwrap();
        let twice = merge_segments(&once, 0.5).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_never_shortens(segments in collinear_strategy()) {
        let merged = merge_segments(&segments, 0.5).unwrap();
        for s in &segments {
            let covering = merged.iter().any(|m| {
                m.is_horizontal() == s.is_horizontal()
                    && m.start_coord() <= s.start_coord()
                    && m.end_coord() >= s.end_coord()
            });
            prop_assert!(covering);
        }
        prop_assert!(merged.len() <= segments.len());
    }
}

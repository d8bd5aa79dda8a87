//! Loading pages and configurations from disk

use std::fs;

use page_geometry::config::Config;
use page_geometry::geometry::{PagePath, Point, Rect};
use page_geometry::{Error, PageAnalyzer, PageGeometry};
use tempfile::tempdir;

fn boxed_page() -> PageGeometry {
    let mut page = PageGeometry::new();
    page.width = Some(200.0);
    page.height = Some(100.0);
    page.words = vec![Rect::new(10.0, 40.0, 60.0, 50.0), Rect::new(140.0, 40.0, 190.0, 50.0)];
    page.paths = vec![
        PagePath::line(Point::new(0.0, 0.0), Point::new(200.0, 0.0)),
        PagePath::line(Point::new(0.0, 100.0), Point::new(200.0, 100.0)),
        PagePath::line(Point::new(0.0, 0.0), Point::new(0.0, 100.0)),
        PagePath::line(Point::new(200.0, 0.0), Point::new(200.0, 100.0)),
    ];
    page
}

#[test]
fn test_page_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("page.json");
    let page = boxed_page();
    fs::write(&path, serde_json::to_string_pretty(&page).unwrap()).unwrap();

    let loaded = PageGeometry::from_file(&path).unwrap();
    assert_eq!(loaded, page);

    let layout = PageAnalyzer::new(Config::default()).analyze(&loaded, None).unwrap();
    assert_eq!(layout.tables.len(), 1);
    assert_eq!(layout.tables[0].bound, Rect::new(0.0, 0.0, 200.0, 100.0));
    for rect in &layout.whitespace {
        assert!(page.words.iter().all(|w| !rect.overlaps(w)));
    }
}

#[test]
fn test_config_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "whitespace": { "max_rectangle_count": 5 } }"#).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.whitespace.max_rectangle_count, 5);
    assert_eq!(config.table, Config::default().table);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = PageGeometry::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_malformed_json_is_json_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"words\": [").unwrap();
    assert!(matches!(PageGeometry::from_file(&path), Err(Error::Json(_))));
    assert!(matches!(Config::from_file(&path), Err(Error::Json(_))));
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "whitespace": { "whitespace_fuzziness": 1.5 } }"#).unwrap();
    assert!(matches!(Config::from_file(&path), Err(Error::InvalidArgument(_))));
}

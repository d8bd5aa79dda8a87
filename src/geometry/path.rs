//! Vector paths painted on a page.
//!
//! A [`PagePath`] is the flattened operator list of one painted path (the
//! `m`, `l`, `c`, `re` and `h` operators of a content stream) together with
//! how it was painted. Table reconstruction only ever looks at straight,
//! axis-aligned pieces of these paths.

use serde::{Deserialize, Serialize};

use super::{LineSegment, Orientation, Point, Rect};

/// One path construction operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    /// Begin a new subpath (m operator)
    MoveTo { x: f64, y: f64 },
    /// Straight line to a point (l operator)
    LineTo { x: f64, y: f64 },
    /// Cubic Bezier curve (c, v, y operators)
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    },
    /// Complete rectangular subpath (re operator)
    Rectangle { x: f64, y: f64, width: f64, height: f64 },
    /// Close the current subpath (h operator)
    ClosePath,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePath {
    pub commands: Vec<PathCommand>,
    #[serde(default)]
    pub filled: bool,
    #[serde(default = "default_stroked")]
    pub stroked: bool,
}

fn default_stroked() -> bool {
    true
}

impl PagePath {
    /// A stroked path built from `commands`.
    pub fn stroked(commands: Vec<PathCommand>) -> Self {
        Self {
            commands,
            filled: false,
            stroked: true,
        }
    }

    /// A filled, unstroked path built from `commands`.
    pub fn filled(commands: Vec<PathCommand>) -> Self {
        Self {
            commands,
            filled: true,
            stroked: false,
        }
    }

    /// A single stroked line.
    pub fn line(from: Point, to: Point) -> Self {
        Self::stroked(vec![
            PathCommand::MoveTo { x: from.x, y: from.y },
            PathCommand::LineTo { x: to.x, y: to.y },
        ])
    }

    pub fn has_curves(&self) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, PathCommand::CurveTo { .. }))
    }

    /// All straight pieces of the path, including the implicit closing line
    /// of closed subpaths and the four edges of `re` rectangles.
    pub fn line_segments(&self) -> Vec<LineSegment> {
        let mut segments = Vec::new();
        for subpath in self.subpaths() {
            for pair in subpath.windows(2) {
                segments.push(LineSegment::new(pair[0], pair[1]));
            }
        }
        segments
    }

    /// Rectangles described by the path: `re` operators, and closed
    /// four-corner subpaths whose edges are axis-aligned within `tolerance`.
    pub fn rectangles(&self, tolerance: f64) -> Vec<Rect> {
        self.subpaths()
            .into_iter()
            .filter_map(|vertices| polygon_to_rect(&vertices, tolerance))
            .collect()
    }

    /// Split the operator list into vertex chains. Closed subpaths repeat
    /// their first vertex at the end.
    fn subpaths(&self) -> Vec<Vec<Point>> {
        let mut subpaths = Vec::new();
        let mut current: Vec<Point> = Vec::new();

        for command in &self.commands {
            match *command {
                PathCommand::MoveTo { x, y } => {
                    if current.len() > 1 {
                        subpaths.push(std::mem::take(&mut current));
                    }
                    current = vec![Point::new(x, y)];
                },
                PathCommand::LineTo { x, y } => {
                    current.push(Point::new(x, y));
                },
                PathCommand::CurveTo { x3, y3, .. } => {
                    // Curves break the chain; only straight pieces are kept.
                    if current.len() > 1 {
                        subpaths.push(std::mem::take(&mut current));
                    }
                    current = vec![Point::new(x3, y3)];
                },
                PathCommand::Rectangle { x, y, width, height } => {
                    if current.len() > 1 {
                        subpaths.push(std::mem::take(&mut current));
                    }
                    let bl = Point::new(x, y);
                    subpaths.push(vec![
                        bl,
                        Point::new(x + width, y),
                        Point::new(x + width, y + height),
                        Point::new(x, y + height),
                        bl,
                    ]);
                    current = vec![bl];
                },
                PathCommand::ClosePath => {
                    if let Some(&first) = current.first() {
                        if current.len() > 1 && current.last() != Some(&first) {
                            current.push(first);
                        }
                        if current.len() > 1 {
                            subpaths.push(std::mem::take(&mut current));
                        }
                        current = vec![first];
                    }
                },
            }
        }
        if current.len() > 1 {
            subpaths.push(current);
        }
        subpaths
    }
}

fn polygon_to_rect(vertices: &[Point], tolerance: f64) -> Option<Rect> {
    // Closed: 5 vertices with the last repeating the first.
    if vertices.len() != 5 || vertices[0] != vertices[4] {
        return None;
    }
    let mut horizontal = 0;
    let mut vertical = 0;
    for pair in vertices.windows(2) {
        match LineSegment::new(pair[0], pair[1]).orientation(tolerance) {
            Orientation::Horizontal => horizontal += 1,
            Orientation::Vertical => vertical += 1,
            Orientation::Other => return None,
        }
    }
    if horizontal != 2 || vertical != 2 {
        return None;
    }
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &vertices[..4] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x, max_y))
}

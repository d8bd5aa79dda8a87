//! Axis-aligned line segments ("rulings") used by table reconstruction.

use serde::{Deserialize, Serialize};

use super::{round_to, Point, Rect};

/// Orientation of a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
    /// Diagonal or degenerate (zero length) segment
    Other,
}

/// A line segment between two points.
///
/// Segments coming out of [`LineSegment::normalized`] are axis-aligned with
/// `start` at the low end (left for horizontals, bottom for verticals).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Horizontal segment at `y` spanning `x0..x1`.
    pub fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self::new(Point::new(x0.min(x1), y), Point::new(x0.max(x1), y))
    }

    /// Vertical segment at `x` spanning `y0..y1`.
    pub fn vertical(x: f64, y0: f64, y1: f64) -> Self {
        Self::new(Point::new(x, y0.min(y1)), Point::new(x, y0.max(y1)))
    }

    /// Classify the segment, treating an offset of at most `tolerance`
    /// across the axis as straight.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::{LineSegment, Orientation, Point};
    ///
    /// let s = LineSegment::new(Point::new(0.0, 10.0), Point::new(50.0, 10.2));
    /// assert_eq!(s.orientation(0.5), Orientation::Horizontal);
    /// assert_eq!(s.orientation(0.1), Orientation::Other);
    /// ```
    pub fn orientation(&self, tolerance: f64) -> Orientation {
        let dx = (self.end.x - self.start.x).abs();
        let dy = (self.end.y - self.start.y).abs();
        if dx <= tolerance && dy <= tolerance {
            Orientation::Other
        } else if dy <= tolerance {
            Orientation::Horizontal
        } else if dx <= tolerance {
            Orientation::Vertical
        } else {
            Orientation::Other
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y && self.start.x != self.end.x
    }

    pub fn is_vertical(&self) -> bool {
        self.start.x == self.end.x && self.start.y != self.end.y
    }

    /// Snap the segment onto its axis and order its endpoints.
    ///
    /// Returns `None` for diagonal or degenerate segments.
    pub fn normalized(&self, tolerance: f64) -> Option<LineSegment> {
        match self.orientation(tolerance) {
            Orientation::Horizontal => {
                let y = (self.start.y + self.end.y) / 2.0;
                Some(LineSegment::horizontal(y, self.start.x, self.end.x))
            },
            Orientation::Vertical => {
                let x = (self.start.x + self.end.x) / 2.0;
                Some(LineSegment::vertical(x, self.start.y, self.end.y))
            },
            Orientation::Other => None,
        }
    }

    /// Coordinate across the axis: `y` for horizontals, `x` for verticals.
    pub fn position(&self) -> f64 {
        if self.is_vertical() {
            self.start.x
        } else {
            self.start.y
        }
    }

    /// Low end along the axis.
    pub fn start_coord(&self) -> f64 {
        if self.is_vertical() {
            self.start.y.min(self.end.y)
        } else {
            self.start.x.min(self.end.x)
        }
    }

    /// High end along the axis.
    pub fn end_coord(&self) -> f64 {
        if self.is_vertical() {
            self.start.y.max(self.end.y)
        } else {
            self.start.x.max(self.end.x)
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Lengthen an axis-aligned segment by `amount` at both ends.
    pub fn extend(&self, amount: f64) -> LineSegment {
        if self.is_vertical() {
            LineSegment::vertical(self.start.x, self.start_coord() - amount, self.end_coord() + amount)
        } else if self.is_horizontal() {
            LineSegment::horizontal(self.start.y, self.start_coord() - amount, self.end_coord() + amount)
        } else {
            *self
        }
    }

    /// Round both endpoints to `decimals` decimal places.
    pub fn round(&self, decimals: u32) -> LineSegment {
        LineSegment::new(
            Point::new(round_to(self.start.x, decimals), round_to(self.start.y, decimals)),
            Point::new(round_to(self.end.x, decimals), round_to(self.end.y, decimals)),
        )
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    /// True if both segments lie on the same axis line (within `tolerance`)
    /// and their extents touch or overlap.
    pub fn is_mergeable_with(&self, other: &LineSegment, tolerance: f64) -> bool {
        let same_axis = (self.is_horizontal() && other.is_horizontal())
            || (self.is_vertical() && other.is_vertical());
        same_axis
            && (self.position() - other.position()).abs() <= tolerance
            && self.start_coord() <= other.end_coord() + tolerance
            && other.start_coord() <= self.end_coord() + tolerance
    }

    /// Crossing point of a horizontal and a vertical segment, allowing each
    /// to fall short of the other by up to `tolerance`.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::{LineSegment, Point};
    ///
    /// let h = LineSegment::horizontal(10.0, 0.0, 100.0);
    /// let v = LineSegment::vertical(50.0, 10.5, 80.0);
    /// assert_eq!(h.intersection_point(&v, 1.0), Some(Point::new(50.0, 10.0)));
    /// assert_eq!(h.intersection_point(&v, 0.1), None);
    /// ```
    pub fn intersection_point(&self, other: &LineSegment, tolerance: f64) -> Option<Point> {
        let (h, v) = if self.is_horizontal() && other.is_vertical() {
            (self, other)
        } else if self.is_vertical() && other.is_horizontal() {
            (other, self)
        } else {
            return None;
        };
        let x = v.position();
        let y = h.position();
        let within_h = x >= h.start_coord() - tolerance && x <= h.end_coord() + tolerance;
        let within_v = y >= v.start_coord() - tolerance && y <= v.end_coord() + tolerance;
        (within_h && within_v).then(|| Point::new(x, y))
    }
}

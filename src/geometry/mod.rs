//! Geometric primitives for layout analysis.
//!
//! This module provides the basic geometric types and operations used by the
//! spatial indices and the layout analysis passes. Coordinates are PDF user
//! space: `y` grows upward, so a rectangle's `top` is never below its
//! `bottom`.

pub mod path;
pub mod segment;

pub use path::{PagePath, PathCommand};
pub use segment::{LineSegment, Orientation};

use serde::{Deserialize, Serialize};

/// A 2D point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        euclidean_distance(self, other)
    }
}

/// An axis-aligned rectangle in document space.
///
/// A `Rect` is always normalised: `left <= right` and `bottom <= top`.
/// The constructors swap coordinates as needed, so every rectangle handed to
/// the spatial indices is already in normalised form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectRepr", into = "RectRepr")]
pub struct Rect {
    left: f64,
    bottom: f64,
    right: f64,
    top: f64,
}

#[derive(Serialize, Deserialize)]
struct RectRepr {
    left: f64,
    bottom: f64,
    right: f64,
    top: f64,
}

impl From<RectRepr> for Rect {
    fn from(r: RectRepr) -> Self {
        Rect::new(r.left, r.bottom, r.right, r.top)
    }
}

impl From<Rect> for RectRepr {
    fn from(r: Rect) -> Self {
        RectRepr {
            left: r.left,
            bottom: r.bottom,
            right: r.right,
            top: r.top,
        }
    }
}

impl Rect {
    /// Create a normalised rectangle from its four edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::Rect;
    ///
    /// let rect = Rect::new(100.0, 50.0, 0.0, 0.0);
    /// assert_eq!(rect.left(), 0.0);
    /// assert_eq!(rect.right(), 100.0);
    /// assert_eq!(rect.bottom(), 0.0);
    /// assert_eq!(rect.top(), 50.0);
    /// ```
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// Create a rectangle spanning two corner points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Smallest rectangle enclosing every rectangle in `rects`, or `None`
    /// when the iterator is empty.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        let mut it = rects.into_iter();
        let first = *it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f64 {
        self.right
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Compute the area of the rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.area(), 5000.0);
    /// ```
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when the rectangle encloses a positive area.
    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    /// Get the center point of the rectangle.
    pub fn centroid(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.bottom + self.top) / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right, self.top)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left, self.bottom)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right, self.bottom)
    }

    /// The four corners, clockwise from top-left.
    pub fn corners(&self) -> [Point; 4] {
        [self.top_left(), self.top_right(), self.bottom_right(), self.bottom_left()]
    }

    /// Check whether `other` lies inside this rectangle.
    ///
    /// With `include_border` the test is closed (shared edges count as
    /// inside), otherwise `other` must lie strictly within the interior.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::Rect;
    ///
    /// let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
    /// let inner = Rect::new(0.0, 2.0, 5.0, 5.0);
    /// assert!(outer.contains(&inner, true));
    /// assert!(!outer.contains(&inner, false));
    /// ```
    pub fn contains(&self, other: &Rect, include_border: bool) -> bool {
        if include_border {
            other.left >= self.left
                && other.right <= self.right
                && other.bottom >= self.bottom
                && other.top <= self.top
        } else {
            other.left > self.left
                && other.right < self.right
                && other.bottom > self.bottom
                && other.top < self.top
        }
    }

    /// Check if this rectangle contains a point.
    pub fn contains_point(&self, p: &Point, include_border: bool) -> bool {
        if include_border {
            p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
        } else {
            p.x > self.left && p.x < self.right && p.y > self.bottom && p.y < self.top
        }
    }

    /// Check if this rectangle intersects another. Touching edges count as
    /// an intersection.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let r2 = Rect::new(100.0, 50.0, 150.0, 150.0);
    /// let r3 = Rect::new(200.0, 200.0, 300.0, 300.0);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.left > other.right
            || other.left > self.right
            || self.top < other.bottom
            || other.top < self.bottom)
    }

    /// Check if the interiors of the two rectangles overlap, i.e. their
    /// intersection has a positive area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }

    /// The intersection of two rectangles, possibly degenerate (zero width
    /// or height) when they only touch.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::new(
            self.left.max(other.left),
            self.bottom.max(other.bottom),
            self.right.min(other.right),
            self.top.min(other.top),
        ))
    }

    /// Area of the intersection, zero when the rectangles are disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }

    /// Compute the union of this rectangle with another.
    ///
    /// Returns the smallest rectangle that contains both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.bottom.min(other.bottom),
            self.right.max(other.right),
            self.top.max(other.top),
        )
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f64) -> Rect {
        Rect::new(
            self.left - amount,
            self.bottom - amount,
            self.right + amount,
            self.top + amount,
        )
    }

    /// Euclidean distance from `p` to the closest point of the rectangle;
    /// zero when `p` lies inside or on the border.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_geometry::geometry::{Point, Rect};
    ///
    /// let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
    /// assert_eq!(rect.distance_to_point(&Point::new(5.0, 5.0)), 0.0);
    /// assert_eq!(rect.distance_to_point(&Point::new(13.0, 14.0)), 5.0);
    /// ```
    pub fn distance_to_point(&self, p: &Point) -> f64 {
        let dx = (self.left - p.x).max(0.0).max(p.x - self.right);
        let dy = (self.bottom - p.y).max(0.0).max(p.y - self.top);
        dx.hypot(dy)
    }
}

/// Compute the Euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use page_geometry::geometry::{Point, euclidean_distance};
///
/// let p1 = Point::new(0.0, 0.0);
/// let p2 = Point::new(3.0, 4.0);
///
/// assert_eq!(euclidean_distance(&p1, &p2), 5.0);
/// ```
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

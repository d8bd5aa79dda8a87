//! Static 2-D KD-tree for nearest-neighbour queries.
//!
//! The tree is built once from a set of elements and a projection of each
//! element onto a [`Point`]. Nodes live in an arena holding exactly one node
//! per element, linked by explicit child ids. Even depths split on X, odd
//! depths on Y.
//!
//! Queries that start from an element of the tree skip every element equal
//! to it, so "nearest other word" needs no removal or copy of the tree.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::geometry::{euclidean_distance, Point};

use super::neighbours::{Neighbour, NeighbourQueue};

#[derive(Debug, Clone, Copy)]
struct KdNode {
    /// Original insertion index of the element held by this node
    index: usize,
    /// Coordinate of the element on this node's split axis
    split: f64,
    depth: usize,
    left: Option<usize>,
    right: Option<usize>,
}

impl KdNode {
    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn splits_on_x(&self) -> bool {
        self.depth % 2 == 0
    }
}

/// A balanced KD-tree over elements of type `T`.
///
/// # Examples
///
/// ```
/// use page_geometry::geometry::Point;
/// use page_geometry::spatial::KdTree;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(0.0, 10.0),
///     Point::new(10.0, 10.0),
///     Point::new(5.0, 5.0),
/// ];
/// let tree = KdTree::new(points, |p: &Point| *p).unwrap();
///
/// let nearest = tree.nearest_neighbour(&Point::new(5.0, 5.0)).unwrap();
/// assert!((nearest.distance - 50f64.sqrt()).abs() < 1e-9);
/// assert_ne!(nearest.index, 4);
/// ```
pub struct KdTree<T, P> {
    elements: Vec<T>,
    points: Vec<Point>,
    nodes: Vec<KdNode>,
    point_fn: P,
}

impl<T, P> KdTree<T, P>
where
    P: Fn(&T) -> Point,
{
    /// Build a tree from `elements`, locating each with `point_fn`.
    ///
    /// Fails with [`Error::InvalidArgument`] when `elements` is empty.
    pub fn new(elements: Vec<T>, point_fn: P) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot build a KD-tree from an empty element set".to_string(),
            ));
        }
        let points: Vec<Point> = elements.iter().map(&point_fn).collect();
        let mut tree = Self {
            nodes: Vec::with_capacity(elements.len()),
            elements,
            points,
            point_fn,
        };
        let mut indices: Vec<usize> = (0..tree.elements.len()).collect();
        tree.build(&mut indices, 0);
        debug_assert_eq!(tree.nodes.len(), tree.elements.len());
        log::trace!("Built KD-tree over {} elements, depth {}", tree.len(), tree.depth());
        Ok(tree)
    }

    /// Recursively build the subtree for `indices`, returning its node id.
    fn build(&mut self, indices: &mut [usize], depth: usize) -> Option<usize> {
        let axis_x = depth % 2 == 0;
        match indices.len() {
            0 => None,
            1 => Some(self.push_node(indices[0], depth)),
            2 => {
                if self.compare_on_axis(indices[0], indices[1], axis_x) == Ordering::Greater {
                    indices.swap(0, 1);
                }
                let id = self.push_node(indices[1], depth);
                let left = self.push_node(indices[0], depth + 1);
                self.nodes[id].left = Some(left);
                Some(id)
            },
            len => {
                let median = len / 2;
                let points = &self.points;
                indices.select_nth_unstable_by(median, |&a, &b| {
                    compare_points(&points[a], &points[b], a, b, axis_x)
                });
                let id = self.push_node(indices[median], depth);
                let (lower, rest) = indices.split_at_mut(median);
                let left = self.build(lower, depth + 1);
                let right = self.build(&mut rest[1..], depth + 1);
                self.nodes[id].left = left;
                self.nodes[id].right = right;
                Some(id)
            },
        }
    }

    fn push_node(&mut self, index: usize, depth: usize) -> usize {
        let p = self.points[index];
        self.nodes.push(KdNode {
            index,
            split: if depth % 2 == 0 { p.x } else { p.y },
            depth,
            left: None,
            right: None,
        });
        self.nodes.len() - 1
    }

    fn compare_on_axis(&self, a: usize, b: usize, axis_x: bool) -> Ordering {
        compare_points(&self.points[a], &self.points[b], a, b, axis_x)
    }

    /// Number of elements in the tree.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always `false`: empty trees cannot be built.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Depth of the deepest node (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Number of leaf nodes.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Element at its original insertion `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Elements with their original insertion indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.elements.iter().enumerate()
    }

    /// Nearest element to an arbitrary query point (nothing excluded).
    pub fn nearest_neighbour_to_point(&self, point: Point) -> Option<Neighbour<'_, T>> {
        self.nearest_by(point, &|_| false, &euclidean_distance)
    }

    /// The `k` elements nearest to an arbitrary query point.
    pub fn k_nearest_to_point(&self, point: Point, k: usize) -> Vec<Neighbour<'_, T>> {
        self.k_nearest_by(point, k, &|_| false, &euclidean_distance)
    }

    fn nearest_by<D>(&self, query: Point, exclude: &dyn Fn(usize) -> bool, distance: &D) -> Option<Neighbour<'_, T>>
    where
        D: Fn(&Point, &Point) -> f64,
    {
        let mut best: Option<(usize, f64)> = None;
        self.search_nearest(0, &query, exclude, distance, &mut best);
        best.map(|(index, distance)| self.neighbour(index, distance))
    }

    fn search_nearest<D>(
        &self,
        node_id: usize,
        query: &Point,
        exclude: &dyn Fn(usize) -> bool,
        distance: &D,
        best: &mut Option<(usize, f64)>,
    ) where
        D: Fn(&Point, &Point) -> f64,
    {
        let node = self.nodes[node_id];

        if !exclude(node.index) {
            let d = distance(&self.points[node.index], query);
            let better = match *best {
                None => !d.is_nan(),
                Some((best_index, best_distance)) => {
                    d < best_distance || (d == best_distance && node.index < best_index)
                },
            };
            if better {
                *best = Some((node.index, d));
            }
        }

        let point_value = if node.splits_on_x() { query.x } else { query.y };
        let (near, far) = if point_value < node.split {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search_nearest(near, query, exclude, distance, best);
        }
        if let Some(far) = far {
            let reachable = best.map_or(true, |(_, d)| (point_value - node.split).abs() <= d);
            if reachable {
                self.search_nearest(far, query, exclude, distance, best);
            }
        }
    }

    fn k_nearest_by<D>(
        &self,
        query: Point,
        k: usize,
        exclude: &dyn Fn(usize) -> bool,
        distance: &D,
    ) -> Vec<Neighbour<'_, T>>
    where
        D: Fn(&Point, &Point) -> f64,
    {
        if k == 0 {
            return Vec::new();
        }
        let mut queue = NeighbourQueue::new(k);
        self.search_k_nearest(0, &query, exclude, distance, &mut queue);
        queue
            .into_sorted()
            .into_iter()
            .map(|(index, d)| self.neighbour(index, d))
            .collect()
    }

    fn search_k_nearest<D>(
        &self,
        node_id: usize,
        query: &Point,
        exclude: &dyn Fn(usize) -> bool,
        distance: &D,
        queue: &mut NeighbourQueue,
    ) where
        D: Fn(&Point, &Point) -> f64,
    {
        let node = self.nodes[node_id];

        if !exclude(node.index) {
            queue.push(distance(&self.points[node.index], query), node.index);
        }

        let point_value = if node.splits_on_x() { query.x } else { query.y };
        let (near, far) = if point_value < node.split {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search_k_nearest(near, query, exclude, distance, queue);
        }
        if let Some(far) = far {
            // Equality keeps the branch: it may hold ties for the k-th place.
            let reachable = !queue.is_full()
                || queue
                    .worst_distance()
                    .map_or(true, |worst| (point_value - node.split).abs() <= worst);
            if reachable {
                self.search_k_nearest(far, query, exclude, distance, queue);
            }
        }
    }

    fn neighbour(&self, index: usize, distance: f64) -> Neighbour<'_, T> {
        Neighbour {
            element: &self.elements[index],
            index,
            distance,
        }
    }
}

impl<T, P> KdTree<T, P>
where
    T: PartialEq,
    P: Fn(&T) -> Point,
{
    /// Nearest element to `pivot` using Euclidean distance, skipping every
    /// element equal to `pivot`.
    ///
    /// Returns `None` when no element other than the pivot exists.
    pub fn nearest_neighbour(&self, pivot: &T) -> Option<Neighbour<'_, T>> {
        self.nearest_neighbour_by(pivot, euclidean_distance)
    }

    /// Nearest element to `pivot` under a caller supplied distance.
    ///
    /// The distance must never be smaller than the separation along a
    /// single axis (true for Euclidean, Manhattan and Chebyshev distances),
    /// otherwise pruning may skip the true nearest element.
    pub fn nearest_neighbour_by<D>(&self, pivot: &T, distance: D) -> Option<Neighbour<'_, T>>
    where
        D: Fn(&Point, &Point) -> f64,
    {
        let query = (self.point_fn)(pivot);
        self.nearest_by(query, &|i| self.elements[i] == *pivot, &distance)
    }

    /// The `k` elements nearest to `pivot`, nearest first, skipping
    /// elements equal to `pivot`.
    ///
    /// Elements tied with the k-th distance are all returned, so the result
    /// can be longer than `k`. `k == 0` yields an empty result.
    pub fn k_nearest_neighbours(&self, pivot: &T, k: usize) -> Vec<Neighbour<'_, T>> {
        self.k_nearest_neighbours_by(pivot, k, euclidean_distance)
    }

    /// [`k_nearest_neighbours`](Self::k_nearest_neighbours) under a caller
    /// supplied distance (see [`nearest_neighbour_by`](Self::nearest_neighbour_by)).
    pub fn k_nearest_neighbours_by<D>(&self, pivot: &T, k: usize, distance: D) -> Vec<Neighbour<'_, T>>
    where
        D: Fn(&Point, &Point) -> f64,
    {
        let query = (self.point_fn)(pivot);
        self.k_nearest_by(query, k, &|i| self.elements[i] == *pivot, &distance)
    }
}

impl<T: std::fmt::Debug, P> std::fmt::Debug for KdTree<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.elements.len())
            .field("elements", &self.elements)
            .finish()
    }
}

/// Order two points along an axis; the other axis and then the insertion
/// index break ties so builds are deterministic.
fn compare_points(a: &Point, b: &Point, ia: usize, ib: usize, axis_x: bool) -> Ordering {
    let (a1, a2, b1, b2) = if axis_x { (a.x, a.y, b.x, b.y) } else { (a.y, a.x, b.y, b.x) };
    a1.total_cmp(&b1).then(a2.total_cmp(&b2)).then(ia.cmp(&ib))
}

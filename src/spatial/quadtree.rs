//! Dynamic region quadtree over rectangles.
//!
//! Objects are indexed by the rectangle a projection function assigns to
//! them. Each node holds at most [`MAX_OBJECTS_PER_NODE`] objects of its own
//! before it splits into four equal quadrants; an object always lives in the
//! smallest node whose region fully contains it. Objects straddling a split
//! line stay in the node above.
//!
//! Nodes and objects live in flat arenas. Every object records the id of its
//! owning node, which makes removal O(1) to locate, and a node collapses its
//! children again once all four are empty leaves.
//!
//! The root is the only node allowed to keep objects that fall outside its
//! region; queries always examine them, so results stay exact for
//! out-of-bounds input.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};

/// Direct objects a node may hold before it subdivides.
pub const MAX_OBJECTS_PER_NODE: usize = 2;

/// Depth at which nodes stop splitting even without an explicit limit, so
/// stacks of identical zero-size objects cannot subdivide forever.
pub const DEPTH_CEILING: usize = 48;

const ROOT: usize = 0;

type NodeId = usize;
type ObjectId = usize;

#[derive(Debug, Clone)]
struct Node {
    bounds: Rect,
    parent: Option<NodeId>,
    /// Top-left, top-right, bottom-left, bottom-right
    children: Option<[NodeId; 4]>,
    objects: Vec<ObjectId>,
    depth: usize,
}

impl Node {
    fn new(bounds: Rect, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            bounds,
            parent,
            children: None,
            objects: Vec::new(),
            depth,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    rect: Rect,
    owner: NodeId,
}

/// A region quadtree of `T`, located by `rect_fn`.
///
/// # Examples
///
/// ```
/// use page_geometry::geometry::{Point, Rect};
/// use page_geometry::spatial::QuadTree;
///
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// struct Word(u32);
///
/// let boxes = [Rect::new(1.0, 1.0, 4.0, 2.0), Rect::new(50.0, 50.0, 60.0, 55.0)];
/// let mut tree = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), move |w: &Word| boxes[w.0 as usize]);
/// tree.insert(Word(0));
/// tree.insert(Word(1));
///
/// let hits = tree.objects_intersecting(&Rect::new(0.0, 0.0, 10.0, 10.0));
/// assert_eq!(hits, vec![&Word(0)]);
///
/// let (nearest, distance) = tree.nearest_neighbour(Point::new(55.0, 40.0)).unwrap();
/// assert_eq!(*nearest, Word(1));
/// assert_eq!(distance, 10.0);
/// ```
pub struct QuadTree<T, F> {
    nodes: Vec<Node>,
    free_nodes: Vec<NodeId>,
    entries: Vec<Option<Entry<T>>>,
    free_entries: Vec<ObjectId>,
    lookup: HashMap<T, ObjectId>,
    rect_fn: F,
    max_depth: Option<usize>,
}

impl<T, F> QuadTree<T, F>
where
    T: Clone + Eq + Hash,
    F: Fn(&T) -> Rect,
{
    /// Create an empty tree covering `bounds`.
    pub fn new(bounds: Rect, rect_fn: F) -> Self {
        Self {
            nodes: vec![Node::new(bounds, None, 0)],
            free_nodes: Vec::new(),
            entries: Vec::new(),
            free_entries: Vec::new(),
            lookup: HashMap::new(),
            rect_fn,
            max_depth: None,
        }
    }

    /// Create an empty tree whose nodes never subdivide below `max_depth`.
    ///
    /// `-1` means unlimited (up to [`DEPTH_CEILING`]); anything below `-1`
    /// is rejected with [`Error::InvalidArgument`].
    pub fn with_max_depth(bounds: Rect, rect_fn: F, max_depth: i32) -> Result<Self> {
        let mut tree = Self::new(bounds, rect_fn);
        tree.max_depth = match max_depth {
            -1 => None,
            d if d < -1 => {
                return Err(Error::InvalidArgument(format!(
                    "quadtree depth limit must be -1 (unlimited) or non-negative, got {}",
                    d
                )))
            },
            d => Some(d as usize),
        };
        Ok(tree)
    }

    /// Region covered by the root.
    pub fn bounds(&self) -> Rect {
        self.nodes[ROOT].bounds
    }

    /// Number of objects stored.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.lookup.contains_key(item)
    }

    /// Cached rectangle of a stored object.
    pub fn rect_of(&self, item: &T) -> Option<Rect> {
        let id = *self.lookup.get(item)?;
        self.entries[id].as_ref().map(|e| e.rect)
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }

    /// Depth of the deepest live node.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            max = max.max(node.depth);
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        max
    }

    /// Every stored object, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().flatten().map(|e| &e.item)
    }

    /// Remove every object and collapse the tree to its root.
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.nodes = vec![Node::new(bounds, None, 0)];
        self.free_nodes.clear();
        self.entries.clear();
        self.free_entries.clear();
        self.lookup.clear();
    }

    /// Insert `item`. Returns `false` if an equal item is already stored.
    pub fn insert(&mut self, item: T) -> bool {
        if self.lookup.contains_key(&item) {
            return false;
        }
        let rect = (self.rect_fn)(&item);
        let entry = Entry {
            item: item.clone(),
            rect,
            owner: ROOT,
        };
        let id = match self.free_entries.pop() {
            Some(id) => {
                self.entries[id] = Some(entry);
                id
            },
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            },
        };
        self.lookup.insert(item, id);
        self.insert_from(ROOT, id);
        true
    }

    /// Remove `item`. Returns `false` if it was not stored.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(id) = self.lookup.remove(item) else {
            return false;
        };
        let Some(entry) = self.entries[id].take() else {
            return false;
        };
        self.free_entries.push(id);
        self.detach(entry.owner, id);
        self.clean_upwards(entry.owner);
        true
    }

    /// Replace `old` with `new`, relocating it for the rectangle of `new`.
    ///
    /// The object ascends from its current node to the nearest ancestor
    /// that contains its new rectangle and is re-inserted from there.
    /// Returns `false` if `old` is not stored or `new` already is.
    pub fn move_item(&mut self, old: &T, new: T) -> bool {
        if new != *old && self.lookup.contains_key(&new) {
            return false;
        }
        let Some(id) = self.lookup.remove(old) else {
            return false;
        };
        let rect = (self.rect_fn)(&new);
        if let Some(entry) = self.entries[id].as_mut() {
            entry.item = new.clone();
            entry.rect = rect;
        }
        self.lookup.insert(new, id);
        self.relocate(id);
        true
    }

    /// Objects whose rectangle intersects `search` (touching counts).
    pub fn objects_intersecting(&self, search: &Rect) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_matching(ROOT, search, &mut out, &|node_bounds| search.contains(node_bounds, true), &|r| {
            r.intersects(search)
        });
        out
    }

    /// Objects whose rectangle lies inside `search`. With `include_border`
    /// objects sharing an edge with `search` count as inside.
    pub fn objects_contained_in(&self, search: &Rect, include_border: bool) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_matching(
            ROOT,
            search,
            &mut out,
            &|node_bounds| search.contains(node_bounds, include_border),
            &|r| search.contains(r, include_border),
        );
        out
    }

    /// Object whose rectangle is closest to `point`, with that distance
    /// (zero when the point lies inside the rectangle).
    pub fn nearest_neighbour(&self, point: Point) -> Option<(&T, f64)> {
        let mut best: Option<(ObjectId, f64)> = None;
        self.search_nearest(ROOT, &point, &mut best);
        best.and_then(|(id, d)| self.entries[id].as_ref().map(|e| (&e.item, d)))
    }

    fn entry_rect(&self, id: ObjectId) -> Rect {
        self.entries[id].as_ref().map(|e| e.rect).unwrap_or(self.nodes[ROOT].bounds)
    }

    /// Route object `id` down from `start`, subdividing full leaves.
    fn insert_from(&mut self, start: NodeId, id: ObjectId) {
        let rect = self.entry_rect(id);
        let mut node_id = start;
        loop {
            let node = &self.nodes[node_id];
            // Only the root keeps objects it does not contain.
            if node.parent.is_some() && !node.bounds.contains(&rect, true) {
                debug_assert!(false, "object routed into a node that does not contain it");
                self.attach(node_id, id);
                return;
            }
            let at_depth_limit =
                node.depth >= DEPTH_CEILING || self.max_depth.is_some_and(|max| node.depth >= max);
            if node.children.is_none() && (node.objects.len() < MAX_OBJECTS_PER_NODE || at_depth_limit) {
                self.attach(node_id, id);
                return;
            }
            if node.children.is_none() {
                self.subdivide(node_id);
            }
            match self.destination(node_id, &rect) {
                Some(child) => node_id = child,
                None => {
                    self.attach(node_id, id);
                    return;
                },
            }
        }
    }

    /// Split a leaf into four quadrants and push down the objects that fit
    /// entirely inside one of them.
    fn subdivide(&mut self, node_id: NodeId) {
        let (bounds, depth) = {
            let node = &self.nodes[node_id];
            (node.bounds, node.depth)
        };
        let mid = bounds.centroid();
        let quadrants = [
            Rect::new(bounds.left(), mid.y, mid.x, bounds.top()),
            Rect::new(mid.x, mid.y, bounds.right(), bounds.top()),
            Rect::new(bounds.left(), bounds.bottom(), mid.x, mid.y),
            Rect::new(mid.x, bounds.bottom(), bounds.right(), mid.y),
        ];
        log::trace!("Subdividing quadtree node {} at depth {}", node_id, depth);
        let children = quadrants.map(|q| self.alloc_node(Node::new(q, Some(node_id), depth + 1)));
        self.nodes[node_id].children = Some(children);

        let held = std::mem::take(&mut self.nodes[node_id].objects);
        for id in held {
            let rect = self.entry_rect(id);
            match self.destination(node_id, &rect) {
                Some(child) => self.attach(child, id),
                None => self.attach(node_id, id),
            }
        }
    }

    /// Child of `node_id` that fully contains `rect`, if any.
    fn destination(&self, node_id: NodeId, rect: &Rect) -> Option<NodeId> {
        let children = self.nodes[node_id].children?;
        children
            .into_iter()
            .find(|&c| self.nodes[c].bounds.contains(rect, true))
    }

    fn alloc_node(&mut self, node: Node) -> NodeId {
        match self.free_nodes.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            },
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            },
        }
    }

    fn attach(&mut self, node_id: NodeId, id: ObjectId) {
        self.nodes[node_id].objects.push(id);
        if let Some(entry) = self.entries[id].as_mut() {
            entry.owner = node_id;
        }
    }

    fn detach(&mut self, node_id: NodeId, id: ObjectId) {
        let objects = &mut self.nodes[node_id].objects;
        if let Some(pos) = objects.iter().position(|&o| o == id) {
            objects.swap_remove(pos);
        }
    }

    fn is_empty_leaf(&self, node_id: NodeId) -> bool {
        let node = &self.nodes[node_id];
        node.children.is_none() && node.objects.is_empty()
    }

    /// Collapse children that are all empty leaves, walking toward the root
    /// while nodes are left empty.
    fn clean_upwards(&mut self, start: NodeId) {
        let mut current = Some(start);
        while let Some(node_id) = current {
            if let Some(children) = self.nodes[node_id].children {
                if !children.iter().all(|&c| self.is_empty_leaf(c)) {
                    return;
                }
                self.nodes[node_id].children = None;
                self.free_nodes.extend(children);
            }
            if !self.nodes[node_id].objects.is_empty() {
                return;
            }
            current = self.nodes[node_id].parent;
        }
    }

    fn relocate(&mut self, id: ObjectId) {
        let rect = self.entry_rect(id);
        let owner = match self.entries[id].as_ref() {
            Some(entry) => entry.owner,
            None => return,
        };

        let mut target = owner;
        while !self.nodes[target].bounds.contains(&rect, true) {
            match self.nodes[target].parent {
                Some(parent) => target = parent,
                None => break,
            }
        }

        if target == owner && self.destination(owner, &rect).is_none() {
            return;
        }
        self.detach(owner, id);
        self.insert_from(target, id);
        let new_owner = self.entries[id].as_ref().map_or(owner, |e| e.owner);
        if new_owner != owner {
            self.clean_upwards(owner);
        }
    }

    fn collect_matching<'a>(
        &'a self,
        node_id: NodeId,
        search: &Rect,
        out: &mut Vec<&'a T>,
        covers_node: &dyn Fn(&Rect) -> bool,
        matches: &dyn Fn(&Rect) -> bool,
    ) {
        let node = &self.nodes[node_id];
        if node.parent.is_some() && covers_node(&node.bounds) {
            self.collect_all(node_id, out);
            return;
        }
        for &id in &node.objects {
            if let Some(entry) = self.entries[id].as_ref() {
                if matches(&entry.rect) {
                    out.push(&entry.item);
                }
            }
        }
        if let Some(children) = node.children {
            for child in children {
                if self.nodes[child].bounds.intersects(search) {
                    self.collect_matching(child, search, out, covers_node, matches);
                }
            }
        }
    }

    fn collect_all<'a>(&'a self, node_id: NodeId, out: &mut Vec<&'a T>) {
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.extend(node.objects.iter().filter_map(|&o| self.entries[o].as_ref().map(|e| &e.item)));
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
    }

    fn search_nearest(&self, node_id: NodeId, point: &Point, best: &mut Option<(ObjectId, f64)>) {
        let node = &self.nodes[node_id];
        if node.parent.is_some() {
            if let Some((_, best_distance)) = *best {
                if node.bounds.distance_to_point(point) > best_distance {
                    return;
                }
            }
        }

        for &id in &node.objects {
            if let Some(entry) = self.entries[id].as_ref() {
                let d = entry.rect.distance_to_point(point);
                if best.map_or(true, |(_, bd)| d < bd) {
                    *best = Some((id, d));
                }
            }
        }

        if let Some(children) = node.children {
            // The quadrant containing the point has distance 0 and goes first.
            let mut ordered = children.map(|c| (self.nodes[c].bounds.distance_to_point(point), c));
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (_, child) in ordered {
                self.search_nearest(child, point, best);
            }
        }
    }
}

impl<T: std::fmt::Debug, F> std::fmt::Debug for QuadTree<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.nodes[ROOT].bounds)
            .field("len", &self.lookup.len())
            .field("nodes", &(self.nodes.len() - self.free_nodes.len()))
            .finish()
    }
}

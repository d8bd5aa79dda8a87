//! Integration tests for the region quadtree
//!
//! Range queries and mutations are checked against a plain list model.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use page_geometry::geometry::{Point, Rect};
use page_geometry::spatial::QuadTree;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Boxed {
    id: usize,
    rect: Rect,
}

impl PartialEq for Boxed {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Boxed {}

impl Hash for Boxed {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

type Tree = QuadTree<Boxed, fn(&Boxed) -> Rect>;

fn new_tree() -> Tree {
    QuadTree::new(Rect::new(0.0, 0.0, 400.0, 400.0), |b: &Boxed| b.rect)
}

fn sorted_ids<'a>(items: impl IntoIterator<Item = &'a Boxed>) -> Vec<usize> {
    let mut ids: Vec<usize> = items.into_iter().map(|b| b.id).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn test_insert_remove_contains() {
    let mut tree = new_tree();
    let items: Vec<Boxed> = (0..30)
        .map(|i| {
            let x = (i * 13 % 390) as f64;
            let y = (i * 29 % 390) as f64;
            Boxed {
                id: i,
                rect: Rect::new(x, y, x + 8.0, y + 4.0),
            }
        })
        .collect();
    for item in &items {
        assert!(tree.insert(*item));
        assert!(tree.contains(item));
    }
    assert_eq!(tree.len(), 30);
    assert_eq!(sorted_ids(tree.iter()), (0..30).collect::<Vec<_>>());

    for item in items.iter().step_by(2) {
        assert!(tree.remove(item));
        assert!(!tree.contains(item));
    }
    assert_eq!(tree.len(), 15);
}

#[test]
fn test_move_preserves_count_and_position() {
    let mut tree = new_tree();
    for i in 0..12 {
        let x = (i * 30) as f64;
        tree.insert(Boxed {
            id: i,
            rect: Rect::new(x, 10.0, x + 5.0, 15.0),
        });
    }
    let moved = Boxed {
        id: 4,
        rect: Rect::new(300.0, 300.0, 310.0, 310.0),
    };
    let old = Boxed {
        id: 4,
        rect: Rect::new(0.0, 0.0, 0.0, 0.0),
    };
    assert!(tree.move_item(&old, moved));
    assert_eq!(tree.len(), 12);
    assert_eq!(sorted_ids(tree.objects_intersecting(&Rect::new(295.0, 295.0, 315.0, 315.0))), vec![4]);
    assert!(tree.objects_intersecting(&Rect::new(119.0, 9.0, 126.0, 16.0)).is_empty());
}

#[test]
fn test_nearest_neighbour_with_out_of_bounds_objects() {
    let mut tree = new_tree();
    tree.insert(Boxed {
        id: 1,
        rect: Rect::new(10.0, 10.0, 20.0, 20.0),
    });
    tree.insert(Boxed {
        id: 2,
        rect: Rect::new(500.0, 500.0, 510.0, 510.0),
    });
    let (nearest, distance) = tree.nearest_neighbour(Point::new(505.0, 490.0)).unwrap();
    assert_eq!(nearest.id, 2);
    assert_eq!(distance, 10.0);
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-40i32..440, -40i32..440, 0i32..80, 0i32..80)
        .prop_map(|(x, y, w, h)| Rect::new(x as f64, y as f64, (x + w) as f64, (y + h) as f64))
}

#[derive(Debug, Clone)]
enum Op {
    Insert(Rect),
    Remove(usize),
    Move(usize, Rect),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => rect_strategy().prop_map(Op::Insert),
        1 => any::<usize>().prop_map(Op::Remove),
        1 => (any::<usize>(), rect_strategy()).prop_map(|(i, r)| Op::Move(i, r)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn range_queries_match_brute_force(
        rects in prop::collection::vec(rect_strategy(), 0..120),
        query in rect_strategy(),
    ) {
        let mut tree = new_tree();
        let items: Vec<Boxed> = rects.iter().enumerate().map(|(id, &rect)| Boxed { id, rect }).collect();
        for item in &items {
            tree.insert(*item);
        }

        let expected = sorted_ids(items.iter().filter(|b| b.rect.intersects(&query)));
        prop_assert_eq!(sorted_ids(tree.objects_intersecting(&query)), expected);

        for include_border in [true, false] {
            let expected = sorted_ids(items.iter().filter(|b| query.contains(&b.rect, include_border)));
            prop_assert_eq!(sorted_ids(tree.objects_contained_in(&query, include_border)), expected);
        }
    }

    #[test]
    fn nearest_matches_brute_force(
        rects in prop::collection::vec(rect_strategy(), 1..80),
        qx in -50i32..450,
        qy in -50i32..450,
    ) {
        let mut tree = new_tree();
        for (id, &rect) in rects.iter().enumerate() {
            tree.insert(Boxed { id, rect });
        }
        let query = Point::new(qx as f64, qy as f64);
        let expected = rects
            .iter()
            .map(|r| r.distance_to_point(&query))
            .min_by(|a, b| a.total_cmp(b));
        prop_assert_eq!(tree.nearest_neighbour(query).map(|(_, d)| d), expected);
    }

    #[test]
    fn mutations_match_model(ops in prop::collection::vec(op_strategy(), 1..150)) {
        let mut tree = new_tree();
        let mut model: HashMap<usize, Rect> = HashMap::new();
        let mut next_id = 0usize;

        for op in ops {
            match op {
                Op::Insert(rect) => {
                    let inserted = tree.insert(Boxed { id: next_id, rect });
                    prop_assert!(inserted);
                    model.insert(next_id, rect);
                    next_id += 1;
                },
                Op::Remove(pick) => {
                    if next_id == 0 {
                        continue;
                    }
                    let id = pick % next_id;
                    let key = Boxed { id, rect: Rect::new(0.0, 0.0, 0.0, 0.0) };
                    prop_assert_eq!(tree.remove(&key), model.remove(&id).is_some());
                    prop_assert!(!tree.contains(&key));
                },
                Op::Move(pick, rect) => {
                    if next_id == 0 {
                        continue;
                    }
                    let id = pick % next_id;
                    let old = Boxed { id, rect: Rect::new(0.0, 0.0, 0.0, 0.0) };
                    let present = model.contains_key(&id);
                    prop_assert_eq!(tree.move_item(&old, Boxed { id, rect }), present);
                    if present {
                        model.insert(id, rect);
                    }
                },
            }
            prop_assert_eq!(tree.len(), model.len());
        }

        let everything = Rect::new(-1000.0, -1000.0, 1000.0, 1000.0);
        let mut expected: Vec<usize> = model.keys().copied().collect();
        expected.sort_unstable();
        prop_assert_eq!(sorted_ids(tree.objects_intersecting(&everything)), expected);
        for (id, rect) in &model {
            prop_assert_eq!(tree.rect_of(&Boxed { id: *id, rect: *rect }), Some(*rect));
        }
    }
}

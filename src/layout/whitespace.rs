//! Whitespace cover: maximal empty rectangles on a page.
//!
//! A branch-and-bound search over candidate rectangles. The search starts
//! from the page bound and repeatedly takes the best remaining candidate
//! (taller and larger first). A candidate that still overlaps an obstacle is
//! split around the obstacle nearest its centre into up to four smaller
//! candidates; one that is empty enough is accepted, provided it touches the
//! page border or a rectangle accepted earlier. The first rectangle accepted
//! is exempt, so a page framed on all sides still gets its interior.
//!
//! Accepted rectangles become obstacles themselves, so later results never
//! overlap them beyond the fuzziness allowance.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use ordered_float::OrderedFloat;

use crate::cancel::{self, CancellationToken};
use crate::config::WhitespaceConfig;
use crate::error::Result;
use crate::geometry::Rect;
use crate::spatial::QuadTree;

/// Quality of a candidate. Favours tall rectangles, which separate columns.
fn quality(bound: &Rect) -> f64 {
    bound.area() * bound.height() / 4.0
}

/// Obstacle stored in the page index, identified by insertion order.
#[derive(Debug, Clone, Copy)]
struct Obstacle {
    id: usize,
    rect: Rect,
}

impl PartialEq for Obstacle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Obstacle {}

impl Hash for Obstacle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

type ObstacleIndex = QuadTree<Obstacle, fn(&Obstacle) -> Rect>;

fn obstacle_rect(obstacle: &Obstacle) -> Rect {
    obstacle.rect
}

/// A candidate rectangle with the obstacles known to overlap it.
#[derive(Debug, Clone)]
struct QueueEntry {
    bound: Rect,
    obstacles: Vec<Rect>,
}

impl QueueEntry {
    fn new(bound: Rect, obstacles: Vec<Rect>) -> Self {
        Self { bound, obstacles }
    }

    fn quality(&self) -> f64 {
        quality(&self.bound)
    }

    /// Whether the candidate is empty, allowing each page obstacle to cover
    /// at most `fuzziness` of the smaller of the two areas, and all of them
    /// together less than `fuzziness` of the candidate.
    fn is_empty_enough(&self, page_obstacles: &ObstacleIndex, fuzziness: f64) -> bool {
        if self.obstacles.is_empty() {
            return true;
        }
        let mut sum = 0.0;
        for obstacle in page_obstacles.objects_intersecting(&self.bound) {
            if !obstacle.rect.overlaps(&self.bound) {
                continue;
            }
            let overlap = self.bound.intersection_area(&obstacle.rect);
            if overlap > obstacle.rect.area().min(self.bound.area()) * fuzziness {
                return false;
            }
            sum += overlap;
        }
        sum < self.bound.area() * fuzziness
    }

    /// Obstacle whose centroid lies closest to the candidate's centroid.
    fn pivot(&self) -> Option<Rect> {
        let centre = self.bound.centroid();
        let mut best: Option<(Rect, f64)> = None;
        for obstacle in &self.obstacles {
            let d = obstacle.centroid().distance(&centre);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((*obstacle, d));
            }
        }
        best.map(|(r, _)| r)
    }
}

/// Candidate queue ordered by quality, ties served first-in first-out.
///
/// With a non-zero capacity, a full queue evicts its worst entry for a
/// better newcomer and otherwise drops the newcomer.
#[derive(Debug)]
struct CandidateQueue {
    entries: BTreeMap<(OrderedFloat<f64>, Reverse<u64>), QueueEntry>,
    next_seq: u64,
    capacity: usize,
}

impl CandidateQueue {
    fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
            capacity,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn push(&mut self, entry: QueueEntry) {
        let key = (OrderedFloat(entry.quality()), Reverse(self.next_seq));
        self.next_seq += 1;
        if self.capacity > 0 && self.entries.len() >= self.capacity {
            let better = self.entries.first_key_value().is_some_and(|(worst, _)| key > *worst);
            if !better {
                log::trace!("Candidate queue full, dropping {:?}", entry.bound);
                return;
            }
            self.entries.pop_first();
        }
        self.entries.insert(key, entry);
    }

    fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_last().map(|(_, entry)| entry)
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut QueueEntry> {
        self.entries.values_mut()
    }
}

/// True if the rectangles touch. Accepted rectangles may overlap within the
/// fuzziness allowance, so any closed intersection counts, not only a
/// shared edge.
fn is_adjacent(a: &Rect, b: &Rect) -> bool {
    a.intersects(b)
}

fn touches_border(rect: &Rect, page: &Rect) -> bool {
    rect.left() == page.left()
        || rect.right() == page.right()
        || rect.bottom() == page.bottom()
        || rect.top() == page.top()
}

/// Compute the whitespace cover of a set of obstacles.
///
/// The search area is the union of the obstacles. Zero-area and duplicate
/// obstacles are ignored; with no obstacles left the result is empty.
///
/// # Arguments
///
/// * `obstacles` - Bounding boxes of page content (words, images, ...)
/// * `config` - Size thresholds, result count and fuzziness
/// * `cancel` - Optional token polled once per examined candidate
///
/// # Returns
///
/// Accepted rectangles in acceptance order, at most
/// `config.max_rectangle_count` of them.
///
/// # Examples
///
/// ```
/// use page_geometry::config::WhitespaceConfig;
/// use page_geometry::geometry::Rect;
/// use page_geometry::layout::whitespace::get_whitespaces;
///
/// let words = vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(90.0, 90.0, 100.0, 100.0)];
/// let cover = get_whitespaces(&words, &WhitespaceConfig::new(), None).unwrap();
/// assert_eq!(cover[0], Rect::new(10.0, 0.0, 90.0, 100.0));
/// ```
pub fn get_whitespaces(
    obstacles: &[Rect],
    config: &WhitespaceConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Rect>> {
    let obstacles = clean_obstacles(obstacles);
    match Rect::bounding(&obstacles) {
        Some(bound) => search(bound, obstacles, config, cancel),
        None => Ok(Vec::new()),
    }
}

/// Compute the whitespace cover inside an explicit page bound, e.g. the
/// page's media box, instead of the union of the obstacles.
///
/// Obstacles are clipped to `bound`; those falling outside are ignored.
pub fn get_whitespaces_within(
    bound: Rect,
    obstacles: &[Rect],
    config: &WhitespaceConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Rect>> {
    let clipped: Vec<Rect> = obstacles.iter().filter_map(|o| o.intersection(&bound)).collect();
    let obstacles = clean_obstacles(&clipped);
    if obstacles.is_empty() || !bound.has_area() {
        return Ok(Vec::new());
    }
    search(bound, obstacles, config, cancel)
}

/// Whitespace cover of a page's words and images.
pub fn get_whitespaces_for_page(
    words: &[Rect],
    images: &[Rect],
    config: &WhitespaceConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Rect>> {
    let obstacles: Vec<Rect> = words.iter().chain(images).copied().collect();
    get_whitespaces(&obstacles, config, cancel)
}

fn clean_obstacles(obstacles: &[Rect]) -> Vec<Rect> {
    let mut seen = std::collections::HashSet::new();
    obstacles
        .iter()
        .filter(|r| r.has_area())
        .filter(|r| {
            seen.insert([
                r.left().to_bits(),
                r.bottom().to_bits(),
                r.right().to_bits(),
                r.top().to_bits(),
            ])
        })
        .copied()
        .collect()
}

fn search(
    bound: Rect,
    obstacles: Vec<Rect>,
    config: &WhitespaceConfig,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Rect>> {
    let mut selected: Vec<Rect> = Vec::new();
    if config.max_rectangle_count == 0 {
        return Ok(selected);
    }

    let mut index: ObstacleIndex = QuadTree::new(bound, obstacle_rect);
    for (id, rect) in obstacles.iter().enumerate() {
        index.insert(Obstacle { id, rect: *rect });
    }
    let mut next_id = obstacles.len();

    let mut queue = CandidateQueue::new(config.max_bound_queue_size);
    let mut holds: Vec<QueueEntry> = Vec::new();
    queue.push(QueueEntry::new(bound, obstacles));

    let mut iterations = 0usize;
    while let Some(current) = queue.pop() {
        cancel::check(cancel)?;
        iterations += 1;
        if config.max_iterations.is_some_and(|max| iterations > max) {
            log::debug!("Whitespace search stopped after {} candidates", iterations - 1);
            break;
        }

        if current.is_empty_enough(&index, config.whitespace_fuzziness) {
            if selected.iter().any(|s| s.contains(&current.bound, true)) {
                continue;
            }
            // The first accepted rectangle may lie anywhere.
            if !selected.is_empty()
                && !touches_border(&current.bound, &bound)
                && !selected.iter().any(|s| is_adjacent(s, &current.bound))
            {
                holds.push(current);
                continue;
            }

            let accepted = current.bound;
            log::trace!("Accepted whitespace {:?}", accepted);
            selected.push(accepted);
            if selected.len() >= config.max_rectangle_count {
                break;
            }

            index.insert(Obstacle {
                id: next_id,
                rect: accepted,
            });
            next_id += 1;

            for hold in holds.drain(..) {
                queue.push(hold);
            }
            for entry in queue.entries_mut() {
                if entry.bound.overlaps(&accepted) {
                    entry.obstacles.push(accepted);
                }
            }
            continue;
        }

        let Some(pivot) = current.pivot() else {
            continue;
        };
        let b = current.bound;
        let mut splits = Vec::with_capacity(4);
        if b.right() > pivot.right() {
            splits.push(Rect::new(pivot.right(), b.bottom(), b.right(), b.top()));
        }
        if b.left() < pivot.left() {
            splits.push(Rect::new(b.left(), b.bottom(), pivot.left(), b.top()));
        }
        if b.bottom() < pivot.bottom() {
            splits.push(Rect::new(b.left(), b.bottom(), b.right(), pivot.bottom()));
        }
        if b.top() > pivot.top() {
            splits.push(Rect::new(b.left(), pivot.top(), b.right(), b.top()));
        }

        for split in splits {
            if split.width() > config.min_width && split.height() > config.min_height {
                let overlapping = current.obstacles.iter().filter(|o| o.overlaps(&split)).copied().collect();
                queue.push(QueueEntry::new(split, overlapping));
            }
        }
    }

    log::debug!(
        "Whitespace search: {} rectangles after {} candidates ({} queued, {} held)",
        selected.len(),
        iterations,
        queue.len(),
        holds.len()
    );
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn two_corner_words() -> Vec<Rect> {
        vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(90.0, 90.0, 100.0, 100.0)]
    }

    #[test]
    fn test_empty_input() {
        let cover = get_whitespaces(&[], &WhitespaceConfig::new(), None).unwrap();
        assert!(cover.is_empty());
    }

    #[test]
    fn test_zero_area_obstacles_ignored() {
        let obstacles = vec![Rect::new(0.0, 0.0, 10.0, 0.0), Rect::new(5.0, 5.0, 5.0, 50.0)];
        assert!(get_whitespaces(&obstacles, &WhitespaceConfig::new(), None).unwrap().is_empty());
    }

    #[test]
    fn test_single_obstacle_covers_its_bound() {
        let obstacles = vec![Rect::new(0.0, 0.0, 50.0, 50.0)];
        assert!(get_whitespaces(&obstacles, &WhitespaceConfig::new(), None).unwrap().is_empty());
    }

    #[test]
    fn test_two_corner_words() {
        let cover = get_whitespaces(&two_corner_words(), &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(cover.len(), 3);
        assert_eq!(cover[0], Rect::new(10.0, 0.0, 90.0, 100.0));
        assert!(cover.contains(&Rect::new(90.0, 0.0, 100.0, 90.0)));
        assert!(cover.contains(&Rect::new(0.0, 10.0, 10.0, 100.0)));
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let mut obstacles = two_corner_words();
        obstacles.extend(two_corner_words());
        let cover = get_whitespaces(&obstacles, &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(cover.len(), 3);
    }

    #[test]
    fn test_max_rectangle_count() {
        let config = WhitespaceConfig::new().with_max_rectangle_count(1);
        let cover = get_whitespaces(&two_corner_words(), &config, None).unwrap();
        assert_eq!(cover, vec![Rect::new(10.0, 0.0, 90.0, 100.0)]);

        let none = WhitespaceConfig::new().with_max_rectangle_count(0);
        assert!(get_whitespaces(&two_corner_words(), &none, None).unwrap().is_empty());
    }

    #[test]
    fn test_min_size_filters_thin_gaps() {
        let config = WhitespaceConfig::new().with_min_size(20.0, 20.0);
        let cover = get_whitespaces(&two_corner_words(), &config, None).unwrap();
        assert_eq!(cover, vec![Rect::new(10.0, 0.0, 90.0, 100.0)]);
    }

    #[test]
    fn test_iteration_cap() {
        let config = WhitespaceConfig::new().with_max_iterations(Some(1));
        let cover = get_whitespaces(&two_corner_words(), &config, None).unwrap();
        assert!(cover.is_empty());
    }

    #[test]
    fn test_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let err = get_whitespaces(&two_corner_words(), &WhitespaceConfig::new(), Some(&token)).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_within_explicit_bound() {
        let page = Rect::new(0.0, 0.0, 200.0, 100.0);
        let words = vec![Rect::new(90.0, 0.0, 110.0, 100.0), Rect::new(300.0, 0.0, 310.0, 10.0)];
        let cover = get_whitespaces_within(page, &words, &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(cover.len(), 2);
        assert!(cover.contains(&Rect::new(110.0, 0.0, 200.0, 100.0)));
        assert!(cover.contains(&Rect::new(0.0, 0.0, 90.0, 100.0)));
    }

    #[test]
    fn test_for_page_combines_words_and_images() {
        let words = vec![Rect::new(0.0, 0.0, 10.0, 10.0)];
        let images = vec![Rect::new(90.0, 90.0, 100.0, 100.0)];
        let cover = get_whitespaces_for_page(&words, &images, &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(cover.len(), 3);
    }

    #[test]
    fn test_is_empty_enough_fuzziness() {
        let mut index: ObstacleIndex = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), obstacle_rect);
        let small = Rect::new(0.0, 0.0, 10.0, 1.0);
        index.insert(Obstacle { id: 0, rect: small });
        let entry = QueueEntry::new(Rect::new(0.0, 0.0, 100.0, 100.0), vec![small]);
        // The obstacle lies entirely inside: its full area counts against it.
        assert!(!entry.is_empty_enough(&index, 0.15));

        let sliver = Rect::new(0.0, 0.0, 100.0, 0.5);
        let entry = QueueEntry::new(Rect::new(0.0, 0.4, 100.0, 100.0), vec![sliver]);
        let mut index: ObstacleIndex = QuadTree::new(Rect::new(0.0, 0.0, 100.0, 100.0), obstacle_rect);
        index.insert(Obstacle { id: 0, rect: sliver });
        // Overlap 10 vs allowance min(50, 9960) * 0.5 = 25, total 10 < 4980.
        assert!(entry.is_empty_enough(&index, 0.5));
        assert!(!entry.is_empty_enough(&index, 0.1));
    }

    #[test]
    fn test_pivot_nearest_centroid() {
        let entry = QueueEntry::new(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(45.0, 45.0, 60.0, 60.0)],
        );
        assert_eq!(entry.pivot(), Some(Rect::new(45.0, 45.0, 60.0, 60.0)));
        assert_eq!(QueueEntry::new(Rect::new(0.0, 0.0, 1.0, 1.0), vec![]).pivot(), None);
    }

    #[test]
    fn test_queue_order_and_fifo_ties() {
        let mut queue = CandidateQueue::new(0);
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 10.0, 10.0), vec![]));
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 10.0, 20.0), vec![]));
        queue.push(QueueEntry::new(Rect::new(5.0, 5.0, 15.0, 15.0), vec![]));
        assert_eq!(queue.pop().unwrap().bound, Rect::new(0.0, 0.0, 10.0, 20.0));
        assert_eq!(queue.pop().unwrap().bound, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(queue.pop().unwrap().bound, Rect::new(5.0, 5.0, 15.0, 15.0));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_bounded_queue_evicts_worst() {
        let mut queue = CandidateQueue::new(2);
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 10.0, 10.0), vec![]));
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 20.0, 20.0), vec![]));
        // Worse than everything queued: dropped.
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 1.0, 1.0), vec![]));
        assert_eq!(queue.len(), 2);
        // Better than the worst: evicts the 10x10 entry.
        queue.push(QueueEntry::new(Rect::new(0.0, 0.0, 30.0, 30.0), vec![]));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().unwrap().bound, Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(queue.pop().unwrap().bound, Rect::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_adjacency() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(is_adjacent(&a, &Rect::new(10.0, 5.0, 20.0, 20.0)));
        assert!(is_adjacent(&a, &Rect::new(2.0, 10.0, 4.0, 12.0)));
        assert!(!is_adjacent(&a, &Rect::new(11.0, 0.0, 20.0, 10.0)));
        // Overlap without a shared edge still touches.
        assert!(is_adjacent(&a, &Rect::new(9.0, 3.0, 30.0, 12.0)));
    }

    #[test]
    fn test_framed_page_interior_accepted() {
        let frame = vec![
            Rect::new(0.0, 0.0, 10.0, 100.0),
            Rect::new(90.0, 0.0, 100.0, 100.0),
            Rect::new(10.0, 0.0, 90.0, 10.0),
            Rect::new(10.0, 90.0, 90.0, 100.0),
        ];
        let cover = get_whitespaces(&frame, &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(cover, vec![Rect::new(10.0, 10.0, 90.0, 90.0)]);
    }

    #[test]
    fn test_held_candidate_accepted_after_neighbour() {
        // Page bound is (20, 20, 100, 80). The column (60, 30, 70, 70) is
        // empty but touches neither the border nor the first accepted
        // rectangle, so it waits until (70, 60, 100, 80) is accepted beside it.
        let obstacles = vec![
            Rect::new(70.0, 20.0, 100.0, 60.0),
            Rect::new(50.0, 30.0, 60.0, 80.0),
            Rect::new(60.0, 20.0, 100.0, 30.0),
            Rect::new(20.0, 70.0, 70.0, 80.0),
        ];
        let cover = get_whitespaces(&obstacles, &WhitespaceConfig::new(), None).unwrap();
        assert_eq!(
            cover,
            vec![
                Rect::new(20.0, 20.0, 50.0, 70.0),
                Rect::new(70.0, 60.0, 100.0, 80.0),
                Rect::new(60.0, 30.0, 70.0, 70.0),
                Rect::new(50.0, 20.0, 60.0, 30.0),
            ]
        );

        let page = Rect::new(20.0, 20.0, 100.0, 80.0);
        assert!(!touches_border(&cover[2], &page));
        assert!(!is_adjacent(&cover[0], &cover[2]));
        assert!(is_adjacent(&cover[1], &cover[2]));
    }
}

//! Query results and the bounded candidate queue used by k-NN searches.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

/// One neighbour returned by a spatial query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour<'a, T> {
    /// The element found
    pub element: &'a T,
    /// Position of the element in the sequence the index was built from
    pub index: usize,
    /// Distance from the query
    pub distance: f64,
}

/// Candidate set capped at `k` entries, keyed by distance.
///
/// Entries tied with the current k-th distance are never dropped, so the
/// queue may hold more than `k` entries when several candidates are
/// equidistant. A whole distance bucket is evicted only once the buckets in
/// front of it already hold `k` entries.
#[derive(Debug)]
pub(crate) struct NeighbourQueue {
    k: usize,
    len: usize,
    buckets: BTreeMap<OrderedFloat<f64>, Vec<usize>>,
}

impl NeighbourQueue {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            len: 0,
            buckets: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.k
    }

    /// Largest distance currently kept.
    pub fn worst_distance(&self) -> Option<f64> {
        self.buckets.keys().next_back().map(|d| d.0)
    }

    /// Offer a candidate. Returns `false` if it was rejected outright.
    pub fn push(&mut self, distance: f64, index: usize) -> bool {
        if self.k == 0 || distance.is_nan() {
            return false;
        }
        if self.is_full() && self.worst_distance().is_some_and(|worst| distance > worst) {
            return false;
        }
        self.buckets.entry(OrderedFloat(distance)).or_default().push(index);
        self.len += 1;

        while let Some((_, last)) = self.buckets.iter().next_back() {
            let last_len = last.len();
            if self.len - last_len >= self.k {
                self.buckets.pop_last();
                self.len -= last_len;
            } else {
                break;
            }
        }
        true
    }

    /// Drain into `(index, distance)` pairs, nearest first, ties by index.
    pub fn into_sorted(self) -> Vec<(usize, f64)> {
        let mut out = Vec::with_capacity(self.len);
        for (distance, mut indices) in self.buckets {
            indices.sort_unstable();
            out.extend(indices.into_iter().map(|i| (i, distance.0)));
        }
        out
    }
}

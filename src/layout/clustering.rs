//! Transitive grouping of indexed elements.
//!
//! Line merging and table grouping both reduce to the same question: given
//! pairwise "belongs with" links between elements, which connected groups do
//! they form? These helpers answer it with a disjoint-set forest, so chains
//! (`a -> b -> c`) and cycles (`a -> b -> a`) collapse into one group and
//! every index ends up in exactly one group.

/// Disjoint-set forest with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] { (ra, rb) } else { (rb, ra) };
        self.parent[small] = big;
        self.size[big] += self.size[small];
    }

    /// Groups ordered by their smallest member, members ascending.
    fn into_groups(mut self) -> Vec<Vec<usize>> {
        let len = self.parent.len();
        let mut slot_of_root = vec![usize::MAX; len];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..len {
            let root = self.find(i);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = groups.len();
                groups.push(Vec::new());
            }
            groups[slot_of_root[root]].push(i);
        }
        groups
    }
}

/// Group indexes linked by a single "merge with" pointer each.
///
/// `links[i]` is the index element `i` should be merged with, or `None`.
/// Links pointing outside the slice are ignored.
///
/// # Examples
///
/// ```
/// use page_geometry::layout::clustering::group_indexes;
///
/// // 0 -> 2, 2 -> 4 form a chain; 1 and 3 form a cycle.
/// let groups = group_indexes(&[Some(2), Some(3), Some(4), Some(1), None]);
/// assert_eq!(groups, vec![vec![0, 2, 4], vec![1, 3]]);
/// ```
pub fn group_indexes(links: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut set = DisjointSet::new(links.len());
    for (i, link) in links.iter().enumerate() {
        match *link {
            Some(j) if j < links.len() => set.union(i, j),
            Some(j) => log::warn!("Ignoring out-of-range link {} -> {}", i, j),
            None => {},
        }
    }
    set.into_groups()
}

/// Group indexes linked by adjacency lists.
///
/// `edges[i]` lists every index element `i` should be merged with.
/// Links pointing outside the slice are ignored.
///
/// # Examples
///
/// ```
/// use page_geometry::layout::clustering::group_index_edges;
///
/// let groups = group_index_edges(&[vec![1, 2], vec![], vec![], vec![]]);
/// assert_eq!(groups, vec![vec![0, 1, 2], vec![3]]);
/// ```
pub fn group_index_edges(edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut set = DisjointSet::new(edges.len());
    for (i, targets) in edges.iter().enumerate() {
        for &j in targets {
            if j < edges.len() {
                set.union(i, j);
            } else {
                log::warn!("Ignoring out-of-range link {} -> {}", i, j);
            }
        }
    }
    set.into_groups()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(group_indexes(&[]).is_empty());
        assert!(group_index_edges(&[]).is_empty());
    }

    #[test]
    fn test_no_links_gives_singletons() {
        let groups = group_indexes(&[None, None, None]);
        assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_self_link() {
        let groups = group_indexes(&[Some(0), None]);
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_long_chain() {
        let links: Vec<Option<usize>> = (0..100).map(|i| if i < 99 { Some(i + 1) } else { None }).collect();
        let groups = group_indexes(&links);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_cycle() {
        let groups = group_indexes(&[Some(1), Some(2), Some(0)]);
        assert_eq!(groups, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_out_of_range_link_ignored() {
        let groups = group_indexes(&[Some(7), None]);
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_every_index_exactly_once() {
        let edges = vec![vec![3], vec![4], vec![], vec![0, 5], vec![], vec![], vec![1]];
        let groups = group_index_edges(&edges);
        let mut all: Vec<usize> = groups.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..7).collect::<Vec<_>>());
        assert_eq!(groups, vec![vec![0, 3, 5], vec![1, 4, 6], vec![2]]);
    }
}

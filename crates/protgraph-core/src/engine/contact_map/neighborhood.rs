use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

static EMPTY: BTreeSet<usize> = BTreeSet::new();

type Row = Vec<((usize, usize), BTreeSet<usize>)>;

/// Non-empty common neighbourhoods of `i` with every later position.
fn common_row(adjacency: &[BTreeSet<usize>], i: usize) -> Row {
    ((i + 1)..adjacency.len())
        .filter_map(|j| {
            let common: BTreeSet<usize> = adjacency[i]
                .intersection(&adjacency[j])
                .copied()
                .filter(|&k| k != i && k != j)
                .collect();
            (!common.is_empty()).then_some(((i, j), common))
        })
        .collect()
}

/// Common neighbours of every unordered residue pair, keyed by `(min, max)`.
///
/// Only non-empty sets are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonNeighborhoods {
    sets: BTreeMap<(usize, usize), BTreeSet<usize>>,
}

impl CommonNeighborhoods {
    /// Computes every common neighbourhood from 1-based adjacency sets.
    ///
    /// `adjacency[p]` holds the positions in contact with `p`; index 0 is unused.
    /// Worst case is O(L³) for L positions, which dominates contact-map construction.
    pub fn compute(adjacency: &[BTreeSet<usize>]) -> Self {
        let positions: Vec<usize> = (1..adjacency.len())
            .filter(|&i| !adjacency[i].is_empty())
            .collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = positions.iter();

        #[cfg(feature = "parallel")]
        let iterator = positions.par_iter();

        // Each worker owns the rows of one `i`, so writes never overlap.
        let rows: Vec<Row> = iterator.map(|&i| common_row(adjacency, i)).collect();

        Self::from_rows(rows)
    }

    fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            sets: rows.into_iter().flatten().collect(),
        }
    }

    pub fn get(&self, i: usize, j: usize) -> &BTreeSet<usize> {
        self.sets.get(&key(i, j)).unwrap_or(&EMPTY)
    }

    pub fn insert(&mut self, i: usize, j: usize, neighbor: usize) -> bool {
        self.sets.entry(key(i, j)).or_default().insert(neighbor)
    }

    /// Number of pairs with at least one common neighbour.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &BTreeSet<usize>)> {
        self.sets.iter().map(|(&pair, set)| (pair, set))
    }
}

fn key(i: usize, j: usize) -> (usize, usize) {
    (i.min(j), i.max(j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(length: usize, contacts: &[(usize, usize)]) -> Vec<BTreeSet<usize>> {
        let mut adjacency = vec![BTreeSet::new(); length + 1];
        for &(i, j) in contacts {
            adjacency[i].insert(j);
            adjacency[j].insert(i);
        }
        adjacency
    }

    #[test]
    fn triangle_gives_each_pair_the_third_vertex() {
        let cns = CommonNeighborhoods::compute(&adjacency(4, &[(1, 2), (2, 3), (1, 3)]));
        assert_eq!(cns.get(1, 2), &BTreeSet::from([3]));
        assert_eq!(cns.get(3, 1), &BTreeSet::from([2]));
        assert_eq!(cns.get(2, 3), &BTreeSet::from([1]));
        assert!(cns.get(1, 4).is_empty());
        assert_eq!(cns.len(), 3);
    }

    #[test]
    fn non_contact_pairs_can_share_neighbors() {
        let cns = CommonNeighborhoods::compute(&adjacency(5, &[(1, 3), (3, 5), (1, 4), (4, 5)]));
        assert_eq!(cns.get(1, 5), &BTreeSet::from([3, 4]));
        assert_eq!(cns.get(3, 4), &BTreeSet::from([1, 5]));
    }

    #[test]
    fn insert_normalizes_pair_order() {
        let mut cns = CommonNeighborhoods::default();
        assert!(cns.insert(5, 2, 3));
        assert!(!cns.insert(2, 5, 3));
        assert_eq!(cns.get(2, 5), &BTreeSet::from([3]));
    }

    #[test]
    fn row_by_row_scan_matches_compute() {
        let contacts: Vec<(usize, usize)> = (1..=12)
            .flat_map(|i| ((i + 1)..=12).map(move |j| (i, j)))
            .filter(|&(i, j)| (i * 7 + j * 3) % 5 < 2)
            .collect();
        let adjacency = adjacency(12, &contacts);
        let sequential =
            CommonNeighborhoods::from_rows((1..adjacency.len()).map(|i| common_row(&adjacency, i)));
        assert_eq!(CommonNeighborhoods::compute(&adjacency), sequential);
        assert!(!sequential.is_empty());
    }
}

use super::labeled::{ContactGraph, GraphError, GraphMetadata};
use crate::core::models::residue::{ResidueType, SecondaryStructure};
use itertools::Itertools;
use rand::Rng;
use rand::seq::index;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A residue of the full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueNode {
    pub serial: usize,
    pub residue_type: ResidueType,
    pub secondary_structure: Option<SecondaryStructure>,
    /// False for positions with no coordinates (or no atoms of the contact type).
    pub observed: bool,
}

impl ResidueNode {
    pub fn observed(
        serial: usize,
        residue_type: ResidueType,
        secondary_structure: Option<SecondaryStructure>,
    ) -> Self {
        Self {
            serial,
            residue_type,
            secondary_structure,
            observed: true,
        }
    }

    pub fn unobserved(serial: usize, residue_type: ResidueType) -> Self {
        Self {
            serial,
            residue_type,
            secondary_structure: None,
            observed: false,
        }
    }

    /// Observed and of a standard amino-acid type.
    pub fn is_observed_standard(&self) -> bool {
        self.observed && self.residue_type.is_standard()
    }
}

/// A residue-level contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueEdge {
    pub weight: f64,
    /// Number of atom contacts collapsed into this edge.
    pub atom_weight: usize,
    /// Shortest atom-atom distance among those contacts.
    pub distance: Option<f64>,
}

impl ResidueEdge {
    pub fn with_weight(weight: f64) -> Self {
        Self {
            weight,
            ..Self::default()
        }
    }
}

impl Default for ResidueEdge {
    fn default() -> Self {
        Self {
            weight: 1.0,
            atom_weight: 0,
            distance: None,
        }
    }
}

/// Residue interaction graph.
pub type ResidueGraph = ContactGraph<ResidueNode, ResidueEdge>;

impl ResidueGraph {
    /// An edge-less graph with one node per sequence position. Standard residues
    /// are marked observed, `'X'` placeholders are not.
    pub fn from_sequence(metadata: GraphMetadata) -> Self {
        let letters: Vec<char> = metadata.sequence().chars().collect();
        let mut graph = Self::new(metadata);
        for (index, letter) in letters.into_iter().enumerate() {
            let residue_type = ResidueType::from_one_letter(letter);
            let node = if residue_type.is_standard() {
                ResidueNode::observed(index + 1, residue_type, None)
            } else {
                ResidueNode::unobserved(index + 1, residue_type)
            };
            graph.add_node(index + 1, node);
        }
        graph
    }

    pub fn observed_len(&self) -> usize {
        self.nodes().filter(|(_, node)| node.observed).count()
    }

    pub fn full_len(&self) -> usize {
        self.metadata().full_len()
    }

    pub fn contact_range(i: usize, j: usize) -> usize {
        i.abs_diff(j)
    }

    /// Sum of contact ranges divided by observed length times edge count.
    pub fn contact_order(&self) -> f64 {
        let denominator = self.observed_len() * self.edge_count();
        if denominator == 0 {
            return 0.0;
        }
        let range_sum: usize = self
            .edges()
            .map(|((i, j), _)| Self::contact_range(i, j))
            .sum();
        range_sum as f64 / denominator as f64
    }

    pub fn neighborhood(&self, serial: usize) -> BTreeSet<usize> {
        self.neighbors(serial)
    }

    /// Neighbours of neighbours, excluding `serial` itself.
    pub fn second_shell(&self, serial: usize) -> BTreeSet<usize> {
        self.neighbors(serial)
            .into_iter()
            .flat_map(|nb| self.neighbors(nb))
            .filter(|&nb2| nb2 != serial)
            .collect()
    }

    pub fn common_neighborhood(&self, i: usize, j: usize) -> BTreeSet<usize> {
        let j_neighbors = self.neighbors(j);
        self.neighbors(i)
            .into_iter()
            .filter(|k| j_neighbors.contains(k))
            .collect()
    }

    /// Non-zero common-neighbourhood sizes over every node pair (`i < j` when
    /// undirected, `i != j` when directed), whether or not the pair is an edge.
    pub fn all_common_neighborhood_sizes(&self) -> BTreeMap<(usize, usize), usize> {
        let neighborhoods: BTreeMap<usize, BTreeSet<usize>> = self
            .nodes()
            .map(|(serial, _)| (serial, self.neighbors(serial)))
            .collect();
        let directed = self.is_directed();

        let mut sizes = BTreeMap::new();
        for ((&i, i_nbs), (&j, j_nbs)) in neighborhoods
            .iter()
            .cartesian_product(neighborhoods.iter())
        {
            if i == j || (!directed && i > j) {
                continue;
            }
            let size = i_nbs.intersection(j_nbs).count();
            if size > 0 {
                sizes.insert((i, j), size);
            }
        }
        sizes
    }

    pub fn filter_by_min_weight(&self, min_weight: f64) -> Self {
        self.filter_edges(|_, edge| edge.weight >= min_weight)
    }

    /// Keeps edges with weight at least `cutoff`, setting their weight to 1.
    pub fn discretize_by_weight_cutoff(&self, cutoff: f64) -> Self {
        let mut graph = self.filter_by_min_weight(cutoff);
        graph.set_all_weights(1.0);
        graph
    }

    /// Keeps the `top` heaviest edges (ties broken by ascending `(i, j)`), setting
    /// their weight to 1.
    pub fn discretize_by_num_contacts(&self, top: usize) -> Self {
        let kept: BTreeSet<(usize, usize)> = self
            .edges()
            .sorted_by(|(ka, a), (kb, b)| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(Ordering::Equal)
                    .then(ka.cmp(kb))
            })
            .take(top)
            .map(|(key, _)| key)
            .collect();
        let mut graph = self.filter_edges(|key, _| kept.contains(&key));
        graph.set_all_weights(1.0);
        graph
    }

    /// True if some edge weight lies strictly between 0 and 1.
    pub fn has_weighted_edges(&self) -> bool {
        self.edges()
            .any(|(_, edge)| edge.weight > 0.0 && edge.weight < 1.0)
    }

    pub fn restrict_to_min_range(&self, min_range: usize) -> Self {
        self.filter_edges(|(i, j), _| Self::contact_range(i, j) >= min_range)
    }

    pub fn restrict_to_max_range(&self, max_range: usize) -> Self {
        self.filter_edges(|(i, j), _| Self::contact_range(i, j) <= max_range)
    }

    /// Every non-edge among positions `1..=L`, with default edge payloads.
    pub fn complement(&self) -> Self {
        let mut graph = self.without_edges();
        let length = self.full_len();
        for (i, j) in (1..=length).cartesian_product(1..=length) {
            let candidate = if self.is_directed() { i != j } else { i < j };
            if candidate && !self.contains_edge(i, j) && self.has_endpoints(i, j) {
                graph.insert_edge_unchecked((i, j), ResidueEdge::default());
            }
        }
        graph
    }

    /// A graph holding `floor(fraction * edge_count)` edges sampled without replacement.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidFraction`] unless `0 <= fraction <= 1`.
    pub fn random_subset<R: Rng + ?Sized>(
        &self,
        fraction: f64,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(GraphError::InvalidFraction(fraction));
        }
        let edges: Vec<((usize, usize), &ResidueEdge)> = self.edges().collect();
        let amount = (edges.len() as f64 * fraction).floor() as usize;
        let mut graph = self.without_edges();
        for picked in index::sample(rng, edges.len(), amount) {
            let (key, edge) = edges[picked];
            graph.insert_edge_unchecked(key, *edge);
        }
        Ok(graph)
    }

    /// This graph plus `floor(fraction * edge_count)` random new edges between
    /// observed residues.
    ///
    /// Fewer edges are added if the graph runs out of free observed pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidFraction`] for negative or non-finite fractions.
    pub fn random_noise<R: Rng + ?Sized>(
        &self,
        fraction: f64,
        rng: &mut R,
    ) -> Result<Self, GraphError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(GraphError::InvalidFraction(fraction));
        }
        let amount = (self.edge_count() as f64 * fraction).floor() as usize;
        let observed: Vec<usize> = self
            .nodes()
            .filter(|(_, node)| node.observed)
            .map(|(serial, _)| serial)
            .collect();
        let free: Vec<(usize, usize)> = observed
            .iter()
            .cartesian_product(observed.iter())
            .map(|(&i, &j)| (i, j))
            .filter(|&(i, j)| {
                let candidate = if self.is_directed() { i != j } else { i < j };
                candidate && !self.contains_edge(i, j)
            })
            .collect();

        let mut graph = self.clone();
        for picked in index::sample(rng, free.len(), amount.min(free.len())) {
            graph.insert_edge_unchecked(free[picked], ResidueEdge::default());
        }
        Ok(graph)
    }

    pub(crate) fn set_all_weights(&mut self, weight: f64) {
        let keys: Vec<(usize, usize)> = self.edges().map(|(key, _)| key).collect();
        for (i, j) in keys {
            if let Some(edge) = self.edge_mut(i, j) {
                edge.weight = weight;
            }
        }
    }

    fn has_endpoints(&self, i: usize, j: usize) -> bool {
        self.contains_node(i) && self.contains_node(j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn metadata(sequence: &str, contact_type: &str) -> GraphMetadata {
        GraphMetadata::new(sequence, contact_type, 8.0).with_structure("1abc", "A")
    }

    fn graph_with(sequence: &str, edges: &[(usize, usize, f64)]) -> ResidueGraph {
        let mut graph = ResidueGraph::from_sequence(metadata(sequence, "Ca"));
        for &(i, j, w) in edges {
            graph.add_edge(i, j, ResidueEdge::with_weight(w)).unwrap();
        }
        graph
    }

    fn keys(graph: &ResidueGraph) -> Vec<(usize, usize)> {
        graph.edges().map(|(key, _)| key).collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn from_sequence_marks_placeholders_unobserved() {
            let graph = ResidueGraph::from_sequence(metadata("GXAX", "Ca"));
            assert_eq!(graph.node_count(), 4);
            assert_eq!(graph.observed_len(), 2);
            assert_eq!(graph.full_len(), 4);
            let node = graph.node(2).unwrap();
            assert!(!node.observed);
            assert_eq!(node.residue_type, ResidueType::Unknown);
            assert!(graph.node(3).unwrap().is_observed_standard());
        }
    }

    mod measures {
        use super::*;

        #[test]
        fn contact_order_averages_range_over_observed_length() {
            let graph = graph_with("AAAAA", &[(1, 3, 1.0), (2, 5, 1.0)]);
            // (2 + 3) / (5 * 2)
            assert!((graph.contact_order() - 0.5).abs() < 1e-12);
        }

        #[test]
        fn contact_order_of_empty_graph_is_zero() {
            assert_eq!(graph_with("AAA", &[]).contact_order(), 0.0);
        }

        #[test]
        fn neighborhoods_and_second_shell() {
            let graph = graph_with("AAAAA", &[(1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
            assert_eq!(graph.neighborhood(2), BTreeSet::from([1, 3]));
            assert_eq!(graph.second_shell(2), BTreeSet::from([4]));
            assert_eq!(graph.second_shell(1), BTreeSet::from([3]));
            assert_eq!(graph.common_neighborhood(1, 3), BTreeSet::from([2]));
        }

        #[test]
        fn all_common_neighborhood_sizes_match_direct_definition() {
            let graph = graph_with(
                "AAAAAA",
                &[(1, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0), (3, 4, 1.0), (2, 4, 1.0), (5, 6, 1.0)],
            );
            let sizes = graph.all_common_neighborhood_sizes();
            for i in 1..=6 {
                for j in (i + 1)..=6 {
                    let expected = (1..=6)
                        .filter(|&k| k != i && k != j)
                        .filter(|&k| graph.contains_edge(i, k) && graph.contains_edge(j, k))
                        .count();
                    assert_eq!(sizes.get(&(i, j)).copied().unwrap_or(0), expected);
                }
            }
            assert!(sizes.values().all(|&size| size > 0));
            assert_eq!(sizes.get(&(1, 4)), Some(&2));
        }

        #[test]
        fn directed_common_neighborhood_sizes_cover_both_orders() {
            let mut graph = ResidueGraph::from_sequence(metadata("AAA", "BB/SC"));
            graph.add_edge(1, 2, ResidueEdge::default()).unwrap();
            graph.add_edge(3, 2, ResidueEdge::default()).unwrap();
            let sizes = graph.all_common_neighborhood_sizes();
            assert_eq!(sizes.get(&(1, 3)), Some(&1));
            assert_eq!(sizes.get(&(3, 1)), Some(&1));
            assert_eq!(sizes.len(), 2);
        }
    }

    mod weights {
        use super::*;

        #[test]
        fn filter_and_discretize_by_weight() {
            let graph = graph_with("AAAA", &[(1, 2, 0.2), (2, 3, 0.6), (3, 4, 0.9)]);
            assert!(graph.has_weighted_edges());

            let filtered = graph.filter_by_min_weight(0.6);
            assert_eq!(keys(&filtered), vec![(2, 3), (3, 4)]);
            assert_eq!(filtered.edge(2, 3).unwrap().weight, 0.6);

            let discrete = graph.discretize_by_weight_cutoff(0.6);
            assert_eq!(keys(&discrete), vec![(2, 3), (3, 4)]);
            assert!(discrete.edges().all(|(_, e)| e.weight == 1.0));
            assert!(!discrete.has_weighted_edges());
        }

        #[test]
        fn discretize_by_num_contacts_breaks_ties_by_position() {
            let graph = graph_with("AAAAA", &[(1, 2, 0.5), (3, 4, 0.9), (2, 5, 0.5), (1, 5, 0.1)]);
            let top = graph.discretize_by_num_contacts(2);
            assert_eq!(keys(&top), vec![(1, 2), (3, 4)]);
            assert!(top.edges().all(|(_, e)| e.weight == 1.0));
            assert_eq!(graph.discretize_by_num_contacts(10).edge_count(), 4);
        }
    }

    mod ranges {
        use super::*;

        #[test]
        fn restrict_by_sequence_separation() {
            let graph = graph_with("AAAAAA", &[(1, 2, 1.0), (1, 4, 1.0), (2, 6, 1.0)]);
            assert_eq!(keys(&graph.restrict_to_min_range(3)), vec![(1, 4), (2, 6)]);
            assert_eq!(keys(&graph.restrict_to_max_range(3)), vec![(1, 2), (1, 4)]);
        }

        #[test]
        fn complement_covers_all_missing_pairs() {
            let graph = graph_with("AAAA", &[(1, 2, 1.0), (3, 4, 1.0)]);
            let complement = graph.complement();
            assert_eq!(complement.edge_count(), 6 - 2);
            assert!(!complement.contains_edge(1, 2));
            assert!(complement.contains_edge(1, 3));

            let mut directed = ResidueGraph::from_sequence(metadata("AAA", "BB/SC"));
            directed.add_edge(1, 2, ResidueEdge::default()).unwrap();
            assert_eq!(directed.complement().edge_count(), 6 - 1);
        }
    }

    mod sampling {
        use super::*;

        #[test]
        fn random_subset_takes_floor_of_fraction() {
            let edges: Vec<(usize, usize, f64)> = (1..10).map(|i| (i, i + 1, 1.0)).collect();
            let graph = graph_with(&"A".repeat(10), &edges);
            let mut rng = StdRng::seed_from_u64(42);
            let subset = graph.random_subset(0.5, &mut rng).unwrap();
            assert_eq!(subset.edge_count(), 4);
            assert!(subset.edges().all(|((i, j), _)| graph.contains_edge(i, j)));
            assert_eq!(subset.node_count(), graph.node_count());
        }

        #[test]
        fn random_subset_is_reproducible_with_same_seed() {
            let edges: Vec<(usize, usize, f64)> = (1..20).map(|i| (i, i + 1, 1.0)).collect();
            let graph = graph_with(&"A".repeat(20), &edges);
            let a = graph.random_subset(0.3, &mut StdRng::seed_from_u64(7)).unwrap();
            let b = graph.random_subset(0.3, &mut StdRng::seed_from_u64(7)).unwrap();
            assert_eq!(keys(&a), keys(&b));
        }

        #[test]
        fn random_noise_adds_edges_between_observed_residues_only() {
            let graph = graph_with("AAXAAA", &[(1, 2, 1.0), (4, 5, 1.0), (5, 6, 1.0), (1, 6, 1.0)]);
            let mut rng = StdRng::seed_from_u64(3);
            let noisy = graph.random_noise(0.5, &mut rng).unwrap();
            assert_eq!(noisy.edge_count(), 6);
            assert!(graph.edges().all(|((i, j), _)| noisy.contains_edge(i, j)));
            assert!(noisy.neighbors(3).is_empty());
        }

        #[test]
        fn rejects_invalid_fractions() {
            let graph = graph_with("AA", &[(1, 2, 1.0)]);
            let mut rng = StdRng::seed_from_u64(0);
            assert_eq!(
                graph.random_subset(1.5, &mut rng),
                Err(GraphError::InvalidFraction(1.5))
            );
            assert_eq!(
                graph.random_noise(-0.1, &mut rng),
                Err(GraphError::InvalidFraction(-0.1))
            );
        }
    }
}

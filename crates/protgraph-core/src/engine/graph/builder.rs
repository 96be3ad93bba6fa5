use super::labeled::{GraphError, GraphMetadata};
use super::residue::{ResidueEdge, ResidueGraph};

/// Accumulates residue contacts into a fresh graph.
///
/// Consumers that grow a graph edge by edge (consensus building, file parsing)
/// go through this builder instead of mutating a shared graph.
#[derive(Debug, Clone)]
pub struct ResidueGraphBuilder {
    graph: ResidueGraph,
}

impl ResidueGraphBuilder {
    /// Starts from one node per sequence position and no edges.
    pub fn new(metadata: GraphMetadata) -> Self {
        Self {
            graph: ResidueGraph::from_sequence(metadata),
        }
    }

    /// Starts from a copy of an existing graph, edges included.
    pub fn from_graph(graph: &ResidueGraph) -> Self {
        Self {
            graph: graph.clone(),
        }
    }

    /// Adds an unweighted contact. Returns whether the contact was new.
    pub fn add_contact(&mut self, i: usize, j: usize) -> Result<bool, GraphError> {
        self.graph.add_edge(i, j, ResidueEdge::default())
    }

    pub fn add_weighted_contact(&mut self, i: usize, j: usize, weight: f64) -> Result<bool, GraphError> {
        self.graph.add_edge(i, j, ResidueEdge::with_weight(weight))
    }

    pub fn add_edge(&mut self, i: usize, j: usize, edge: ResidueEdge) -> Result<bool, GraphError> {
        self.graph.add_edge(i, j, edge)
    }

    pub fn contact_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn build(self) -> ResidueGraph {
        self.graph
    }
}

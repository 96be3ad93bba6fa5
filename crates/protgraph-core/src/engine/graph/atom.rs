use super::labeled::{ContactGraph, GraphError};
use super::residue::{ResidueEdge, ResidueGraph, ResidueNode};
use crate::core::models::residue::ResidueType;
use std::collections::BTreeMap;
use tracing::debug;

/// An atom together with a copy of its parent residue's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomNode {
    pub serial: usize,
    pub name: String,
    pub residue: ResidueNode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtomEdge {
    pub distance: f64,
}

/// Atom interaction graph.
pub type AtomGraph = ContactGraph<AtomNode, AtomEdge>;

impl AtomGraph {
    pub fn add_atom(&mut self, node: AtomNode) -> bool {
        self.add_node(node.serial, node)
    }

    /// Nodes and edges of both graphs in a new graph; inputs are left untouched.
    ///
    /// Atoms and edges already present are not duplicated, so the union of a graph
    /// with any of its subgraphs equals the graph itself. Differing contact types are
    /// joined with `+`.
    ///
    /// # Errors
    ///
    /// Fails if the graphs belong to different chains, use different cutoffs or
    /// differ in directedness.
    pub fn union(&self, other: &AtomGraph) -> Result<AtomGraph, GraphError> {
        self.metadata().check_compatible(other.metadata())?;

        let mut merged = self.clone();
        let mut parts: Vec<&str> = self.metadata().contact_type().split('+').collect();
        for part in other.metadata().contact_type().split('+') {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }
        merged
            .metadata_mut()
            .set_contact_type_unchecked(parts.join("+"));

        for (serial, node) in other.nodes() {
            if !merged.contains_node(serial) {
                merged.add_node(serial, node.clone());
            }
        }
        for (key, edge) in other.edges() {
            if !merged.contains_edge(key.0, key.1) {
                merged.insert_edge_unchecked(key, *edge);
            }
        }
        Ok(merged)
    }

    /// Collapses atom contacts into residue contacts.
    ///
    /// Each residue pair with at least one atom contact gets a single edge of
    /// weight 1, whose atom weight counts the atom contacts and whose distance is
    /// the shortest of them. Contacts within one residue are dropped. Sequence
    /// positions with no atom in this graph become unobserved nodes.
    pub fn collapse(&self) -> ResidueGraph {
        let mut residues: BTreeMap<usize, ResidueNode> = BTreeMap::new();
        for (_, atom) in self.nodes() {
            residues.entry(atom.residue.serial).or_insert(atom.residue);
        }

        let mut graph = ResidueGraph::new(self.metadata().clone());
        for serial in 1..=self.metadata().full_len() {
            if !residues.contains_key(&serial) {
                let letter = self.metadata().residue_letter(serial).unwrap_or('X');
                graph.add_node(
                    serial,
                    ResidueNode::unobserved(serial, ResidueType::from_one_letter(letter)),
                );
            }
        }
        for (serial, node) in residues {
            graph.add_node(serial, node);
        }

        let mut intra_residue = 0usize;
        for ((a, b), edge) in self.edges() {
            let (Some(first), Some(second)) = (self.node(a), self.node(b)) else {
                continue;
            };
            let (i, j) = (first.residue.serial, second.residue.serial);
            if i == j {
                intra_residue += 1;
                continue;
            }
            match graph.edge_mut(i, j) {
                Some(existing) => {
                    existing.atom_weight += 1;
                    existing.distance = Some(
                        existing
                            .distance
                            .map_or(edge.distance, |d| d.min(edge.distance)),
                    );
                }
                None => graph.insert_edge_unchecked(
                    (i, j),
                    ResidueEdge {
                        weight: 1.0,
                        atom_weight: 1,
                        distance: Some(edge.distance),
                    },
                ),
            }
        }

        debug!(
            atom_edges = self.edge_count(),
            residue_edges = graph.edge_count(),
            intra_residue,
            "Atom graph collapsed."
        );
        graph
    }
}

use crate::core::models::chain::ProteinChain;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Cutoffs closer than this are considered equal when graphs are combined.
pub const CUTOFF_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} does not exist in the graph")]
    UnknownNode(usize),
    #[error("Residue {0} cannot be in contact with itself")]
    SelfContact(usize),
    #[error("Graphs disagree on {field}: '{left}' vs '{right}'")]
    MetadataMismatch {
        field: &'static str,
        left: String,
        right: String,
    },
    #[error("Cannot combine a directed graph with an undirected one")]
    DirectionMismatch,
    #[error("Changing the contact type to '{0}' would change the graph's directedness")]
    DirectednessChange(String),
    #[error("Graphs have different full lengths ({left} vs {right})")]
    SequenceLengthMismatch { left: usize, right: usize },
    #[error("Fraction must lie in [0, 1] (got {0})")]
    InvalidFraction(f64),
}

/// Provenance shared by atom and residue graphs.
///
/// Directedness is derived from the contact type when it is set: a crossed type
/// (`X/Y`) gives a directed graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphMetadata {
    sequence: String,
    pub structure_id: String,
    pub chain_code: String,
    pub pdb_chain_code: String,
    pub model: usize,
    /// Structures a modelled chain was built from, if any.
    pub parents: Vec<String>,
    contact_type: String,
    pub cutoff: f64,
    directed: bool,
}

impl GraphMetadata {
    pub fn new(sequence: &str, contact_type: &str, cutoff: f64) -> Self {
        Self {
            sequence: sequence.to_ascii_uppercase(),
            structure_id: String::new(),
            chain_code: String::new(),
            pdb_chain_code: String::new(),
            model: 1,
            parents: Vec::new(),
            contact_type: contact_type.to_string(),
            cutoff,
            directed: contact_type.contains('/'),
        }
    }

    /// Metadata carrying the identity of a chain.
    pub fn for_chain(chain: &ProteinChain, contact_type: &str, cutoff: f64) -> Self {
        Self {
            structure_id: chain.structure_id.clone(),
            chain_code: chain.chain_code.clone(),
            pdb_chain_code: chain.pdb_chain_code.clone(),
            model: chain.model,
            ..Self::new(chain.sequence(), contact_type, cutoff)
        }
    }

    pub fn with_structure(mut self, structure_id: &str, chain_code: &str) -> Self {
        self.structure_id = structure_id.to_string();
        self.chain_code = chain_code.to_string();
        self.pdb_chain_code = chain_code.to_string();
        self
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn full_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn contact_type(&self) -> &str {
        &self.contact_type
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// One-letter code at a 1-based position.
    pub fn residue_letter(&self, serial: usize) -> Option<char> {
        serial
            .checked_sub(1)
            .and_then(|index| self.sequence.as_bytes().get(index))
            .map(|&b| b as char)
    }

    /// Callers must keep directedness unchanged.
    pub(crate) fn set_contact_type_unchecked(&mut self, contact_type: String) {
        self.contact_type = contact_type;
    }

    pub(crate) fn cutoff_matches(&self, other: &Self) -> bool {
        (self.cutoff - other.cutoff).abs() < CUTOFF_TOLERANCE
    }

    /// Checks that two graphs describe the same chain under compatible settings.
    pub(crate) fn check_compatible(&self, other: &Self) -> Result<(), GraphError> {
        let mismatch = |field, left: &str, right: &str| GraphError::MetadataMismatch {
            field,
            left: left.to_string(),
            right: right.to_string(),
        };
        if self.sequence != other.sequence {
            return Err(mismatch("sequence", &self.sequence, &other.sequence));
        }
        if self.structure_id != other.structure_id {
            return Err(mismatch("structure id", &self.structure_id, &other.structure_id));
        }
        if self.chain_code != other.chain_code {
            return Err(mismatch("chain code", &self.chain_code, &other.chain_code));
        }
        if !self.cutoff_matches(other) {
            return Err(mismatch(
                "cutoff",
                &self.cutoff.to_string(),
                &other.cutoff.to_string(),
            ));
        }
        if self.directed != other.directed {
            return Err(GraphError::DirectionMismatch);
        }
        Ok(())
    }
}

/// A labeled contact graph with node payload `N` and edge payload `E`.
///
/// Nodes are keyed by serial. Undirected edges are stored once under `(min, max)`;
/// directed edges keep their orientation. All iteration is in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactGraph<N, E> {
    metadata: GraphMetadata,
    nodes: BTreeMap<usize, N>,
    edges: BTreeMap<(usize, usize), E>,
    successors: BTreeMap<usize, BTreeSet<usize>>,
    predecessors: BTreeMap<usize, BTreeSet<usize>>,
}

impl<N, E> ContactGraph<N, E> {
    pub fn new(metadata: GraphMetadata) -> Self {
        Self {
            metadata,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn is_directed(&self) -> bool {
        self.metadata.directed
    }

    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.metadata.cutoff = cutoff;
    }

    pub fn set_structure(&mut self, structure_id: &str, chain_code: &str, model: usize) {
        self.metadata.structure_id = structure_id.to_string();
        self.metadata.chain_code = chain_code.to_string();
        self.metadata.model = model;
    }

    pub fn set_pdb_chain_code(&mut self, pdb_chain_code: &str) {
        self.metadata.pdb_chain_code = pdb_chain_code.to_string();
    }

    /// Replaces the contact type. Edge keys depend on directedness, so a type that
    /// would flip it is rejected.
    pub fn set_contact_type(&mut self, contact_type: &str) -> Result<(), GraphError> {
        if contact_type.contains('/') != self.metadata.directed {
            return Err(GraphError::DirectednessChange(contact_type.to_string()));
        }
        self.metadata.contact_type = contact_type.to_string();
        Ok(())
    }

    /// Adds a node; returns `false` and keeps the existing payload if the serial is taken.
    pub fn add_node(&mut self, serial: usize, node: N) -> bool {
        if self.nodes.contains_key(&serial) {
            return false;
        }
        self.nodes.insert(serial, node);
        true
    }

    pub fn node(&self, serial: usize) -> Option<&N> {
        self.nodes.get(&serial)
    }

    pub fn node_mut(&mut self, serial: usize) -> Option<&mut N> {
        self.nodes.get_mut(&serial)
    }

    pub fn contains_node(&self, serial: usize) -> bool {
        self.nodes.contains_key(&serial)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (usize, &N)> {
        self.nodes.iter().map(|(&serial, node)| (serial, node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Returns `Ok(false)` if the edge already exists; its payload is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint is missing and
    /// [`GraphError::SelfContact`] if `i == j`.
    pub fn add_edge(&mut self, i: usize, j: usize, edge: E) -> Result<bool, GraphError> {
        if i == j {
            return Err(GraphError::SelfContact(i));
        }
        for serial in [i, j] {
            if !self.nodes.contains_key(&serial) {
                return Err(GraphError::UnknownNode(serial));
            }
        }
        let key = self.key(i, j);
        if self.edges.contains_key(&key) {
            return Ok(false);
        }
        self.edges.insert(key, edge);
        self.successors.entry(key.0).or_default().insert(key.1);
        if self.metadata.directed {
            self.predecessors.entry(key.1).or_default().insert(key.0);
        } else {
            self.successors.entry(key.1).or_default().insert(key.0);
        }
        Ok(true)
    }

    pub fn edge(&self, i: usize, j: usize) -> Option<&E> {
        self.edges.get(&self.key(i, j))
    }

    pub fn edge_mut(&mut self, i: usize, j: usize) -> Option<&mut E> {
        let key = self.key(i, j);
        self.edges.get_mut(&key)
    }

    pub fn contains_edge(&self, i: usize, j: usize) -> bool {
        self.edges.contains_key(&self.key(i, j))
    }

    pub fn remove_edge(&mut self, i: usize, j: usize) -> Option<E> {
        let key = self.key(i, j);
        let removed = self.edges.remove(&key)?;
        if let Some(set) = self.successors.get_mut(&key.0) {
            set.remove(&key.1);
        }
        let reverse = if self.metadata.directed {
            &mut self.predecessors
        } else {
            &mut self.successors
        };
        if let Some(set) = reverse.get_mut(&key.1) {
            set.remove(&key.0);
        }
        Some(removed)
    }

    /// Edges in ascending `(i, j)` order.
    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), &E)> {
        self.edges.iter().map(|(&key, edge)| (key, edge))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Adjacent nodes in ascending order. For directed graphs this includes both
    /// successors and predecessors.
    pub fn neighbors(&self, serial: usize) -> BTreeSet<usize> {
        let mut all = self.successors.get(&serial).cloned().unwrap_or_default();
        if let Some(preds) = self.predecessors.get(&serial) {
            all.extend(preds.iter().copied());
        }
        all
    }

    /// Targets of edges leaving `serial`; the same as [`Self::neighbors`] when undirected.
    pub fn successors(&self, serial: usize) -> BTreeSet<usize> {
        self.successors.get(&serial).cloned().unwrap_or_default()
    }

    /// Sources of edges entering `serial`; the same as [`Self::neighbors`] when undirected.
    pub fn predecessors(&self, serial: usize) -> BTreeSet<usize> {
        if self.metadata.directed {
            self.predecessors.get(&serial).cloned().unwrap_or_default()
        } else {
            self.successors(serial)
        }
    }

    /// A graph with the same metadata and nodes but no edges.
    pub fn without_edges(&self) -> Self
    where
        N: Clone,
    {
        Self {
            metadata: self.metadata.clone(),
            nodes: self.nodes.clone(),
            edges: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
        }
    }

    /// A copy keeping only the edges accepted by `keep`.
    pub fn filter_edges<F>(&self, mut keep: F) -> Self
    where
        N: Clone,
        E: Clone,
        F: FnMut((usize, usize), &E) -> bool,
    {
        let mut filtered = self.without_edges();
        for (key, edge) in self.edges() {
            if keep(key, edge) {
                filtered.insert_edge_unchecked(key, edge.clone());
            }
        }
        filtered
    }

    pub(crate) fn insert_edge_unchecked(&mut self, key: (usize, usize), edge: E) {
        let key = self.key(key.0, key.1);
        if self.edges.insert(key, edge).is_none() {
            self.successors.entry(key.0).or_default().insert(key.1);
            if self.metadata.directed {
                self.predecessors.entry(key.1).or_default().insert(key.0);
            } else {
                self.successors.entry(key.1).or_default().insert(key.0);
            }
        }
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut GraphMetadata {
        &mut self.metadata
    }

    fn key(&self, i: usize, j: usize) -> (usize, usize) {
        if self.metadata.directed || i <= j {
            (i, j)
        } else {
            (j, i)
        }
    }
}

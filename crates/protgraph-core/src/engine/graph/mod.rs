//! # Interaction Graphs
//!
//! A single generic [`labeled::ContactGraph`] carries node and edge payloads,
//! provenance metadata and ascending adjacency. The atom interaction graph (AIG)
//! and residue interaction graph (RIG) are two instantiations of it:
//!
//! - [`atom::AtomGraph`] - atoms as nodes, each holding a copy of its parent
//!   residue; edges carry the atom-atom distance. Supports union and collapse.
//! - [`residue::ResidueGraph`] - residues as nodes; edges carry a weight, the
//!   number of underlying atom contacts and the shortest atom distance.
//!
//! Directedness is fixed by the contact type: crossed types (`X/Y`) produce
//! directed graphs, and every binary operation checks that both operands agree.
//! Operations that derive a graph from others return a new value.

pub mod atom;
pub mod builder;
pub mod eval;
pub mod labeled;
pub mod residue;

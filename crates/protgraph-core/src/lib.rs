//! # protgraph Core Library
//!
//! Spatial contact detection and interaction-graph analysis for protein structures.
//!
//! Given the atoms of a protein chain and a logical contact type (C-alpha, C-beta,
//! backbone, side chain, all atoms, or a crossed combination such as `BB/SC`), the
//! library finds every atom pair within a distance cutoff through a uniform spatial
//! grid, builds an atom interaction graph (AIG), collapses it into a residue
//! interaction graph (RIG), and offers dense contact-map analytics and multi-template
//! consensus building on top of those graphs.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ProteinChain`, residues,
//!   atoms), the contact-type dictionary, the spatial grid and graph file I/O.
//!
//! - **[`engine`]: The Logic Core.** The generic labeled graph with its atom and
//!   residue instantiations, prediction evaluation, the `ContactMap` with its
//!   common-neighbourhood cache, the `GraphAverager`, configuration and errors.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures: building a residue
//!   graph for a chain, and building a consensus graph for a target sequence from
//!   aligned templates.

pub mod core;
pub mod engine;
pub mod workflows;

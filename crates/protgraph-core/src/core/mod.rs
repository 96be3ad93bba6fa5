//! # Core Module
//!
//! Fundamental building blocks shared by every analysis in protgraph.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Atoms, residues and protein chains
//! - **Atom Selection** ([`contact_types`]) - The contact-type dictionary and selector parsing
//! - **Spatial Indexing** ([`spatial`]) - Grid-based neighbour search within a distance cutoff
//! - **File I/O** ([`io`]) - Residue graph edge-list files and tab-separated reports
//! - **Identifiers** ([`utils`]) - Residue code tables
//!
//! Everything here is free of hidden global state: dictionaries are constructed
//! explicitly and passed to the components that need them.

pub mod contact_types;
pub mod io;
pub mod models;
pub mod spatial;
pub mod utils;

//! # Core Models Module
//!
//! Data structures describing a single protein chain as handed over by a structure
//! parser: the full sequence (with placeholders for unobserved or non-standard
//! residues), the observed residues, and their atoms with coordinates.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom with serial, name, parent residue and position
//! - [`residue`] - Residue types, secondary-structure tags and the residue record
//! - [`chain`] - `ProteinChain`, the arena owning residues and atoms
//! - [`ids`] - Stable arena keys for atoms and residues
//!
//! ## Usage
//!
//! ```ignore
//! use protgraph::core::models::chain::ProteinChain;
//! use protgraph::core::models::residue::ResidueType;
//!
//! let mut chain = ProteinChain::new("1abc", "A", "GAV");
//! chain.add_residue(1, ResidueType::Glycine, None)?;
//! chain.add_atom(1, 1, "CA", Point3::new(0.0, 0.0, 0.0))?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;

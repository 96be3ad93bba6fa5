use super::ids::ResidueId;
use nalgebra::Point3;

/// An atom of a protein chain.
///
/// Atoms are immutable once the chain is assembled. The parent residue is a
/// back-reference only; ownership lies with the [`ProteinChain`](super::chain::ProteinChain)
/// arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom serial number from the source structure.
    pub serial: usize,
    /// The atom name (e.g., "CA", "CB", "OG1").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.trim().to_string(),
            residue_id,
            position,
        }
    }

    pub fn distance_to(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }
}

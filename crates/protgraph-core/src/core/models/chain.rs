use super::atom::Atom;
use super::ids::{AtomId, ResidueId};
use super::residue::{Residue, ResidueType, SecondaryStructure};
use crate::core::contact_types::registry::ContactTypeRegistry;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Residue serial {serial} is outside the sequence (length {length})")]
    SerialOutOfRange { serial: usize, length: usize },
    #[error("Residue serial {0} was added twice")]
    DuplicateResidue(usize),
    #[error("Residue serial {0} does not exist in this chain")]
    UnknownResidue(usize),
    #[error("Atom serial {0} was added twice")]
    DuplicateAtom(usize),
}

/// A single protein chain: the full sequence plus its observed residues and atoms.
///
/// The sequence covers every position of the chain, with `'X'` placeholders for
/// unobserved or non-standard residues. Residues are keyed by their 1-based
/// position in that sequence; positions without a residue record are unobserved.
#[derive(Debug, Clone, Default)]
pub struct ProteinChain {
    /// Identifier of the parent structure (e.g., a PDB code).
    pub structure_id: String,
    /// Internal chain identifier.
    pub chain_code: String,
    /// Author-assigned chain identifier, if it differs from `chain_code`.
    pub pdb_chain_code: String,
    /// Model number within the structure.
    pub model: usize,
    sequence: String,
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    residue_serial_map: BTreeMap<usize, ResidueId>,
    atom_serial_map: HashMap<usize, AtomId>,
}

impl ProteinChain {
    pub fn new(structure_id: &str, chain_code: &str, sequence: &str) -> Self {
        Self {
            structure_id: structure_id.to_string(),
            chain_code: chain_code.to_string(),
            pdb_chain_code: chain_code.to_string(),
            model: 1,
            sequence: sequence.to_ascii_uppercase(),
            ..Default::default()
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn full_length(&self) -> usize {
        self.sequence.len()
    }

    /// Adds an observed residue at a 1-based sequence position.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::SerialOutOfRange`] for positions outside the sequence
    /// and [`ChainError::DuplicateResidue`] if the position is already occupied.
    pub fn add_residue(
        &mut self,
        serial: usize,
        residue_type: ResidueType,
        secondary_structure: Option<SecondaryStructure>,
    ) -> Result<ResidueId, ChainError> {
        if serial == 0 || serial > self.sequence.len() {
            return Err(ChainError::SerialOutOfRange {
                serial,
                length: self.sequence.len(),
            });
        }
        if self.residue_serial_map.contains_key(&serial) {
            return Err(ChainError::DuplicateResidue(serial));
        }
        let id = self
            .residues
            .insert(Residue::new(serial, residue_type, secondary_structure));
        self.residue_serial_map.insert(serial, id);
        Ok(id)
    }

    /// Adds an atom to an existing residue.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownResidue`] if no residue occupies `residue_serial`
    /// and [`ChainError::DuplicateAtom`] if `atom_serial` is already taken.
    pub fn add_atom(
        &mut self,
        residue_serial: usize,
        atom_serial: usize,
        name: &str,
        position: Point3<f64>,
    ) -> Result<AtomId, ChainError> {
        let residue_id = self
            .residue_serial_map
            .get(&residue_serial)
            .copied()
            .ok_or(ChainError::UnknownResidue(residue_serial))?;
        if self.atom_serial_map.contains_key(&atom_serial) {
            return Err(ChainError::DuplicateAtom(atom_serial));
        }
        let atom = Atom::new(atom_serial, name, residue_id, position);
        let atom_name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.atom_serial_map.insert(atom_serial, atom_id);
        if let Some(residue) = self.residues.get_mut(residue_id) {
            residue.add_atom(&atom_name, atom_id);
        }
        Ok(atom_id)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    /// Residues in ascending serial order.
    pub fn residues_iter(&self) -> impl Iterator<Item = &Residue> {
        self.residue_serial_map
            .values()
            .filter_map(|&id| self.residues.get(id))
    }

    pub fn find_residue_by_serial(&self, serial: usize) -> Option<ResidueId> {
        self.residue_serial_map.get(&serial).copied()
    }

    pub fn find_atom_by_serial(&self, serial: usize) -> Option<AtomId> {
        self.atom_serial_map.get(&serial).copied()
    }

    pub fn observed_serials(&self) -> impl Iterator<Item = usize> + '_ {
        self.residue_serial_map.keys().copied()
    }

    pub fn is_observed(&self, serial: usize) -> bool {
        self.residue_serial_map.contains_key(&serial)
    }

    /// Returns the atoms selected by a single (non-crossed) contact type, in
    /// ascending atom-serial order. Non-standard residues never contribute atoms.
    pub fn atoms_for_contact_type(
        &self,
        registry: &ContactTypeRegistry,
        contact_type: &str,
    ) -> Vec<AtomId> {
        let mut selected: Vec<(usize, AtomId)> = self
            .residues_iter()
            .filter(|residue| residue.residue_type.is_standard())
            .flat_map(|residue| {
                registry
                    .atoms_for(contact_type, residue.residue_type.three_letter())
                    .iter()
                    .filter_map(move |name| residue.get_atom_id_by_name(name))
            })
            .filter_map(|id| self.atoms.get(id).map(|atom| (atom.serial, id)))
            .collect();
        selected.sort_unstable_by_key(|&(serial, _)| serial);
        selected.dedup_by_key(|&mut (serial, _)| serial);
        selected.into_iter().map(|(_, id)| id).collect()
    }
}

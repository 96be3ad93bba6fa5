use super::ids::AtomId;
use crate::core::utils::identifiers::{
    UNKNOWN_ONE_LETTER, UNKNOWN_THREE_LETTER, one_letter_code, three_letter_code,
};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ResidueType {
    // --- Aliphatic, Nonpolar ---
    Alanine,
    Glycine,
    Isoleucine,
    Leucine,
    Proline,
    Valine,

    // --- Aromatic ---
    Phenylalanine,
    Tryptophan,
    Tyrosine,

    // --- Polar, Uncharged ---
    Asparagine,
    Cysteine,
    Glutamine,
    Serine,
    Threonine,
    Methionine,

    // --- Charged ---
    Arginine,
    Lysine,
    AsparticAcid,
    GlutamicAcid,
    Histidine,

    /// Unobserved or non-standard residue ("XXX" / 'X').
    #[default]
    Unknown,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unrecognized residue code: '{0}'")]
pub struct ParseResidueTypeError(pub String);

impl ResidueType {
    pub fn three_letter(&self) -> &'static str {
        match self {
            ResidueType::Alanine => "ALA",
            ResidueType::Glycine => "GLY",
            ResidueType::Isoleucine => "ILE",
            ResidueType::Leucine => "LEU",
            ResidueType::Proline => "PRO",
            ResidueType::Valine => "VAL",
            ResidueType::Phenylalanine => "PHE",
            ResidueType::Tryptophan => "TRP",
            ResidueType::Tyrosine => "TYR",
            ResidueType::Asparagine => "ASN",
            ResidueType::Cysteine => "CYS",
            ResidueType::Glutamine => "GLN",
            ResidueType::Serine => "SER",
            ResidueType::Threonine => "THR",
            ResidueType::Methionine => "MET",
            ResidueType::Arginine => "ARG",
            ResidueType::Lysine => "LYS",
            ResidueType::AsparticAcid => "ASP",
            ResidueType::GlutamicAcid => "GLU",
            ResidueType::Histidine => "HIS",
            ResidueType::Unknown => UNKNOWN_THREE_LETTER,
        }
    }

    pub fn one_letter(&self) -> char {
        one_letter_code(self.three_letter()).unwrap_or(UNKNOWN_ONE_LETTER)
    }

    /// Maps a one-letter sequence code to a residue type. Anything that is not
    /// one of the twenty standard codes becomes [`ResidueType::Unknown`].
    pub fn from_one_letter(code: char) -> Self {
        three_letter_code(code)
            .and_then(|three| three.parse().ok())
            .unwrap_or(ResidueType::Unknown)
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, ResidueType::Unknown)
    }
}

impl FromStr for ResidueType {
    type Err = ParseResidueTypeError;

    /// Parses a three-letter residue code (case-insensitive). Common protonation
    /// variants of histidine are folded into [`ResidueType::Histidine`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALA" => Ok(ResidueType::Alanine),
            "GLY" => Ok(ResidueType::Glycine),
            "ILE" => Ok(ResidueType::Isoleucine),
            "LEU" => Ok(ResidueType::Leucine),
            "PRO" => Ok(ResidueType::Proline),
            "VAL" => Ok(ResidueType::Valine),
            "PHE" => Ok(ResidueType::Phenylalanine),
            "TRP" => Ok(ResidueType::Tryptophan),
            "TYR" => Ok(ResidueType::Tyrosine),
            "ASN" => Ok(ResidueType::Asparagine),
            "CYS" => Ok(ResidueType::Cysteine),
            "GLN" => Ok(ResidueType::Glutamine),
            "SER" => Ok(ResidueType::Serine),
            "THR" => Ok(ResidueType::Threonine),
            "MET" => Ok(ResidueType::Methionine),
            "ARG" => Ok(ResidueType::Arginine),
            "LYS" => Ok(ResidueType::Lysine),
            "ASP" => Ok(ResidueType::AsparticAcid),
            "GLU" => Ok(ResidueType::GlutamicAcid),
            "HIS" | "HSE" | "HSD" | "HSP" => Ok(ResidueType::Histidine),
            "XXX" => Ok(ResidueType::Unknown),
            _ => Err(ParseResidueTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for ResidueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.three_letter())
    }
}

/// Secondary-structure assignment of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryStructure {
    Helix,
    Strand,
    Turn,
    Coil,
}

impl SecondaryStructure {
    pub fn code(&self) -> char {
        match self {
            SecondaryStructure::Helix => 'H',
            SecondaryStructure::Strand => 'S',
            SecondaryStructure::Turn => 'T',
            SecondaryStructure::Coil => 'O',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'H' => Some(SecondaryStructure::Helix),
            'S' | 'E' => Some(SecondaryStructure::Strand),
            'T' => Some(SecondaryStructure::Turn),
            'O' | 'C' => Some(SecondaryStructure::Coil),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub serial: usize,                                // Position in the full sequence (1-based)
    pub residue_type: ResidueType,                    // Amino acid type
    pub secondary_structure: Option<SecondaryStructure>, // Optional DSSP-style tag
    pub(crate) atoms: Vec<AtomId>,                    // Atoms belonging to this residue
    atom_name_map: HashMap<String, AtomId>,           // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        serial: usize,
        residue_type: ResidueType,
        secondary_structure: Option<SecondaryStructure>,
    ) -> Self {
        Self {
            serial,
            residue_type,
            secondary_structure,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map.insert(atom_name.to_string(), atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

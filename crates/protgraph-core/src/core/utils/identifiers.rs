use phf::{Map, phf_map};

/// One-letter code used for unobserved or non-standard residues in full sequences.
pub const UNKNOWN_ONE_LETTER: char = 'X';
/// Three-letter code used for unobserved or non-standard residues.
pub const UNKNOWN_THREE_LETTER: &str = "XXX";

static ONE_TO_THREE: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
    'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
    'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
    'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
};

pub fn three_letter_code(one_letter: char) -> Option<&'static str> {
    ONE_TO_THREE
        .get(&one_letter.to_ascii_uppercase())
        .copied()
}

pub fn one_letter_code(three_letter: &str) -> Option<char> {
    THREE_TO_ONE
        .get(three_letter.trim().to_ascii_uppercase().as_str())
        .copied()
}

pub fn is_standard_one_letter(code: char) -> bool {
    ONE_TO_THREE.contains_key(&code.to_ascii_uppercase())
}

/// All twenty standard three-letter codes, in alphabetical order.
pub fn standard_three_letter_codes() -> Vec<&'static str> {
    let mut codes: Vec<&'static str> = THREE_TO_ONE.keys().copied().collect();
    codes.sort_unstable();
    codes
}

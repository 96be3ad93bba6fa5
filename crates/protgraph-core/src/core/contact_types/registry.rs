use super::selector::ContactSelector;
use crate::core::models::residue::ResidueType;
use crate::core::utils::identifiers::standard_three_letter_codes;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

const STANDARD_CONTACT_TYPES: &str = include_str!("../../../data/contact_types.toml");

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ContactTypeDefinition {
    multi_atom: bool,
    #[serde(default)]
    default: Vec<String>,
    #[serde(default)]
    residues: HashMap<String, Vec<String>>,
    #[serde(default)]
    include: Vec<String>,
}

/// A resolved contact type: for every standard residue, the atom names it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactType {
    name: String,
    multi_atom: bool,
    res2atoms: BTreeMap<String, Vec<String>>,
}

impl ContactType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_multi_atom(&self) -> bool {
        self.multi_atom
    }

    pub fn atoms(&self, residue_three_letter: &str) -> &[String] {
        self.res2atoms
            .get(residue_three_letter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_valid_atom(&self, residue_three_letter: &str, atom_name: &str) -> bool {
        self.atoms(residue_three_letter)
            .iter()
            .any(|name| name == atom_name)
    }
}

/// The contact-type dictionary.
///
/// Constructed once (from the bundled definitions or a TOML file) and passed by
/// reference to everything that selects atoms. It is never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct ContactTypeRegistry {
    types: BTreeMap<String, ContactType>,
}

impl ContactTypeRegistry {
    pub fn load(path: &Path) -> Result<Self, ContactTypeLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ContactTypeLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.to_string_lossy())
    }

    /// The contact types shipped with the library: `Ca`, `Cb`, `Cg`, `BB`, `SC`, `ALL`.
    pub fn standard() -> Result<Self, ContactTypeLoadError> {
        Self::from_toml(STANDARD_CONTACT_TYPES, "<bundled contact_types.toml>")
    }

    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ContactTypeLoadError> {
        let definitions: BTreeMap<String, ContactTypeDefinition> =
            toml::from_str(content).map_err(|e| ContactTypeLoadError::Toml {
                path: origin.to_string(),
                source: e,
            })?;

        let invalid = |name: &str, reason: String| ContactTypeLoadError::InvalidDefinition {
            name: name.to_string(),
            reason,
        };

        let standard_codes = standard_three_letter_codes();
        let mut types = BTreeMap::new();
        for (name, definition) in &definitions {
            if name.is_empty() || name.contains(['+', '/']) || name.contains(char::is_whitespace) {
                return Err(invalid(name, "name must not contain '+', '/' or spaces".into()));
            }
            for residue in definition.residues.keys() {
                if residue.parse::<ResidueType>().map_or(true, |ty| !ty.is_standard()) {
                    return Err(invalid(name, format!("unknown residue '{residue}'")));
                }
            }

            let mut res2atoms = BTreeMap::new();
            for &code in &standard_codes {
                let mut atoms: Vec<String> = definition
                    .residues
                    .get(code)
                    .unwrap_or(&definition.default)
                    .clone();
                for included in &definition.include {
                    let source = definitions
                        .get(included)
                        .ok_or_else(|| invalid(name, format!("includes unknown type '{included}'")))?;
                    if !source.include.is_empty() {
                        return Err(invalid(
                            name,
                            format!("included type '{included}' has includes of its own"),
                        ));
                    }
                    atoms.extend(source.residues.get(code).unwrap_or(&source.default).iter().cloned());
                }
                let mut seen = BTreeSet::new();
                atoms.retain(|atom| seen.insert(atom.clone()));
                if !definition.multi_atom && atoms.len() > 1 {
                    return Err(invalid(
                        name,
                        format!("single-atom type selects {} atoms for {code}", atoms.len()),
                    ));
                }
                res2atoms.insert(code.to_string(), atoms);
            }

            types.insert(
                name.clone(),
                ContactType {
                    name: name.clone(),
                    multi_atom: definition.multi_atom,
                    res2atoms,
                },
            );
        }
        Ok(Self { types })
    }

    pub fn get(&self, name: &str) -> Option<&ContactType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn single_atom_types(&self) -> BTreeSet<&str> {
        self.types
            .values()
            .filter(|ct| !ct.multi_atom)
            .map(|ct| ct.name.as_str())
            .collect()
    }

    pub fn multi_atom_types(&self) -> BTreeSet<&str> {
        self.types
            .values()
            .filter(|ct| ct.multi_atom)
            .map(|ct| ct.name.as_str())
            .collect()
    }

    /// Atom names selected by `contact_type` for a residue; empty if either is unknown.
    pub fn atoms_for(&self, contact_type: &str, residue_three_letter: &str) -> &[String] {
        self.types
            .get(contact_type)
            .map(|ct| ct.atoms(residue_three_letter))
            .unwrap_or(&[])
    }

    /// True if any two types named by the selector share an atom for some residue.
    pub fn is_overlapping(&self, selector: &ContactSelector) -> bool {
        let names: Vec<&str> = selector.type_names().collect();
        for (i, first) in names.iter().enumerate() {
            for second in &names[i + 1..] {
                let (Some(a), Some(b)) = (self.get(first), self.get(second)) else {
                    continue;
                };
                let shares_atom = a.res2atoms.iter().any(|(code, atoms)| {
                    atoms.iter().any(|atom| b.is_valid_atom(code, atom))
                });
                if shares_atom {
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Debug, Error)]
pub enum ContactTypeLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid definition of contact type '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn selector(registry: &ContactTypeRegistry, s: &str) -> ContactSelector {
        ContactSelector::parse(registry, s).unwrap()
    }

    mod standard_registry {
        use super::*;

        #[test]
        fn contains_expected_types_with_arity() {
            let registry = ContactTypeRegistry::standard().unwrap();
            let names: Vec<&str> = registry.names().collect();
            assert_eq!(names, vec!["ALL", "BB", "Ca", "Cb", "Cg", "SC"]);
            assert_eq!(
                registry.single_atom_types(),
                BTreeSet::from(["Ca", "Cb", "Cg"])
            );
            assert_eq!(
                registry.multi_atom_types(),
                BTreeSet::from(["ALL", "BB", "SC"])
            );
        }

        #[test]
        fn per_residue_overrides_take_precedence() {
            let registry = ContactTypeRegistry::standard().unwrap();
            assert_eq!(registry.atoms_for("Cb", "ALA"), &["CB".to_string()]);
            assert_eq!(registry.atoms_for("Cb", "GLY"), &["CA".to_string()]);
            assert!(registry.atoms_for("SC", "GLY").is_empty());
            assert!(registry.atoms_for("Cg", "ALA").is_empty());
            assert_eq!(registry.atoms_for("Cg", "THR"), &["OG1".to_string()]);
        }

        #[test]
        fn include_merges_atoms_without_duplicates() {
            let registry = ContactTypeRegistry::standard().unwrap();
            let all_ser = registry.atoms_for("ALL", "SER");
            assert_eq!(all_ser, &["N", "CA", "C", "O", "CB", "OG"].map(String::from));
            assert_eq!(registry.atoms_for("ALL", "GLY").len(), 4);
        }

        #[test]
        fn unknown_type_or_residue_yields_no_atoms() {
            let registry = ContactTypeRegistry::standard().unwrap();
            assert!(registry.atoms_for("Cz", "ALA").is_empty());
            assert!(registry.atoms_for("Ca", "XXX").is_empty());
            assert!(registry.get("Ca").unwrap().is_valid_atom("ALA", "CA"));
            assert!(!registry.get("Ca").unwrap().is_valid_atom("ALA", "CB"));
        }

        #[test]
        fn overlap_detection_matches_shared_atoms() {
            let registry = ContactTypeRegistry::standard().unwrap();
            assert!(!registry.is_overlapping(&selector(&registry, "BB/SC")));
            assert!(!registry.is_overlapping(&selector(&registry, "Ca")));
            assert!(registry.is_overlapping(&selector(&registry, "ALL/BB")));
            assert!(registry.is_overlapping(&selector(&registry, "Ca/BB")));
            // Glycine's Cb is its CA.
            assert!(registry.is_overlapping(&selector(&registry, "Ca/Cb")));
            assert!(!registry.is_overlapping(&selector(&registry, "Ca/Cg")));
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn load_reads_custom_definitions_from_file() {
            let dir = tempdir().unwrap();
            let file_path = dir.path().join("types.toml");
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                r#"
                [N]
                multi_atom = false
                default = ["N"]

                [Polar]
                multi_atom = true
                default = []
                residues = {{ SER = ["OG"], THR = ["OG1"] }}
                "#
            )
            .unwrap();

            let registry = ContactTypeRegistry::load(&file_path).unwrap();
            assert_eq!(registry.atoms_for("N", "TRP"), &["N".to_string()]);
            assert_eq!(registry.atoms_for("Polar", "THR"), &["OG1".to_string()]);
            assert!(registry.atoms_for("Polar", "ALA").is_empty());
        }

        #[test]
        fn load_reports_missing_file() {
            let dir = tempdir().unwrap();
            let result = ContactTypeRegistry::load(&dir.path().join("missing.toml"));
            assert!(matches!(result, Err(ContactTypeLoadError::Io { .. })));
        }

        #[test]
        fn malformed_toml_is_rejected() {
            let result = ContactTypeRegistry::from_toml("[Ca\nmulti_atom = false", "inline");
            assert!(matches!(result, Err(ContactTypeLoadError::Toml { .. })));
        }

        #[test]
        fn unknown_fields_are_rejected() {
            let result = ContactTypeRegistry::from_toml(
                "[Ca]\nmulti_atom = false\ndefault = [\"CA\"]\ncolour = \"red\"\n",
                "inline",
            );
            assert!(matches!(result, Err(ContactTypeLoadError::Toml { .. })));
        }

        #[test]
        fn single_atom_type_with_two_atoms_is_invalid() {
            let result = ContactTypeRegistry::from_toml(
                "[Bad]\nmulti_atom = false\ndefault = [\"CA\", \"CB\"]\n",
                "inline",
            );
            assert!(matches!(
                result,
                Err(ContactTypeLoadError::InvalidDefinition { ref name, .. }) if name == "Bad"
            ));
        }

        #[test]
        fn reserved_characters_in_names_are_invalid() {
            let result = ContactTypeRegistry::from_toml(
                "[\"A/B\"]\nmulti_atom = true\ndefault = [\"CA\"]\n",
                "inline",
            );
            assert!(matches!(
                result,
                Err(ContactTypeLoadError::InvalidDefinition { .. })
            ));
        }

        #[test]
        fn unknown_residue_override_and_include_are_invalid() {
            let bad_residue = ContactTypeRegistry::from_toml(
                "[X]\nmulti_atom = true\nresidues = { FOO = [\"CA\"] }\n",
                "inline",
            );
            assert!(matches!(
                bad_residue,
                Err(ContactTypeLoadError::InvalidDefinition { .. })
            ));

            let bad_include = ContactTypeRegistry::from_toml(
                "[X]\nmulti_atom = true\ninclude = [\"Nope\"]\n",
                "inline",
            );
            assert!(matches!(
                bad_include,
                Err(ContactTypeLoadError::InvalidDefinition { .. })
            ));
        }
    }
}

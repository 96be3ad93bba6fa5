use super::registry::ContactTypeRegistry;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactTypeError {
    #[error("Contact type string is empty")]
    Empty,
    #[error("Contact type '{0}' has an empty '+' component")]
    EmptyPart(String),
    #[error("Malformed crossed contact type '{0}': expected exactly one '/' between two types")]
    MalformedCrossed(String),
    #[error("Unknown contact type '{0}'")]
    UnknownType(String),
    #[error("Contact type '{0}' mixes crossed and non-crossed components")]
    MixedDirectionality(String),
    #[error("Contact type '{0}' is overlapping; directed graphs are unsupported for it")]
    DirectedOverlapping(String),
}

/// One `+`-separated component of a contact-type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContactPart {
    Single(String),
    Crossed { i: String, j: String },
}

impl ContactPart {
    /// Contact type used for the first endpoint of an edge.
    pub fn i_type(&self) -> &str {
        match self {
            ContactPart::Single(name) => name,
            ContactPart::Crossed { i, .. } => i,
        }
    }

    /// Contact type used for the second endpoint of an edge.
    pub fn j_type(&self) -> &str {
        match self {
            ContactPart::Single(name) => name,
            ContactPart::Crossed { j, .. } => j,
        }
    }

    pub fn is_crossed(&self) -> bool {
        matches!(self, ContactPart::Crossed { .. })
    }
}

impl fmt::Display for ContactPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactPart::Single(name) => f.write_str(name),
            ContactPart::Crossed { i, j } => write!(f, "{i}/{j}"),
        }
    }
}

/// A validated contact-type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactSelector {
    raw: String,
    parts: Vec<ContactPart>,
}

impl ContactSelector {
    /// Parses and validates a contact-type string against the dictionary.
    ///
    /// # Errors
    ///
    /// Returns a [`ContactTypeError`] for empty strings or components, malformed
    /// crossed syntax, type names missing from `registry`, and selectors mixing
    /// crossed with non-crossed components.
    pub fn parse(registry: &ContactTypeRegistry, s: &str) -> Result<Self, ContactTypeError> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ContactTypeError::Empty);
        }

        let mut parts = Vec::new();
        for component in raw.split('+') {
            let component = component.trim();
            if component.is_empty() {
                return Err(ContactTypeError::EmptyPart(raw.to_string()));
            }
            let sides: Vec<&str> = component.split('/').map(str::trim).collect();
            let part = match sides.as_slice() {
                [single] => ContactPart::Single(single.to_string()),
                [i, j] if !i.is_empty() && !j.is_empty() => ContactPart::Crossed {
                    i: i.to_string(),
                    j: j.to_string(),
                },
                _ => return Err(ContactTypeError::MalformedCrossed(component.to_string())),
            };
            for name in [part.i_type(), part.j_type()] {
                if !registry.contains(name) {
                    return Err(ContactTypeError::UnknownType(name.to_string()));
                }
            }
            parts.push(part);
        }

        let crossed = parts.iter().filter(|p| p.is_crossed()).count();
        if crossed != 0 && crossed != parts.len() {
            return Err(ContactTypeError::MixedDirectionality(raw.to_string()));
        }

        let raw = parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        Ok(Self { raw, parts })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[ContactPart] {
        &self.parts
    }

    /// Crossed selectors produce directed graphs.
    pub fn is_crossed(&self) -> bool {
        self.parts.iter().any(ContactPart::is_crossed)
    }

    /// Every type name mentioned, in order of appearance (crossed parts contribute both sides).
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().flat_map(|part| match part {
            ContactPart::Single(name) => vec![name.as_str()],
            ContactPart::Crossed { i, j } => vec![i.as_str(), j.as_str()],
        })
    }
}

impl fmt::Display for ContactSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

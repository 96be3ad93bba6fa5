use std::collections::BTreeMap;
use thiserror::Error;

/// Gap symbol in aligned rows.
pub const GAP: char = '-';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("An alignment needs at least one sequence")]
    Empty,
    #[error("Tag '{0}' appears more than once in the alignment")]
    DuplicateTag(String),
    #[error("Row '{tag}' has {found} columns, expected {expected}")]
    RowLengthMismatch {
        tag: String,
        expected: usize,
        found: usize,
    },
    #[error("Sequence '{0}' contains gaps but an ungapped sequence was expected")]
    UnexpectedGap(String),
}

/// Column-indexed access to a multiple sequence alignment.
///
/// Columns are 0-based; sequence positions are 1-based residue serials. A `None`
/// mapping means the position falls on a gap (or outside the row).
pub trait SequenceAlignment {
    fn contains_tag(&self, tag: &str) -> bool;

    fn num_sequences(&self) -> usize;

    /// Number of columns.
    fn length(&self) -> usize;

    /// Sequence position aligned at `column` in row `tag`.
    fn al2seq(&self, tag: &str, column: usize) -> Option<usize>;

    /// Column holding sequence position `position` of row `tag`.
    fn seq2al(&self, tag: &str, position: usize) -> Option<usize>;

    /// The row with its gaps removed.
    fn ungapped_sequence(&self, tag: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AlignedRow {
    gapped: String,
    column_to_position: Vec<Option<usize>>,
    position_to_column: Vec<usize>,
}

impl AlignedRow {
    fn new(gapped: String) -> Self {
        let mut column_to_position = Vec::with_capacity(gapped.len());
        let mut position_to_column = Vec::new();
        for (column, symbol) in gapped.chars().enumerate() {
            if symbol == GAP {
                column_to_position.push(None);
            } else {
                position_to_column.push(column);
                column_to_position.push(Some(position_to_column.len()));
            }
        }
        Self {
            gapped,
            column_to_position,
            position_to_column,
        }
    }

    fn ungapped(&self) -> String {
        self.gapped.chars().filter(|&c| c != GAP).collect()
    }
}

/// An in-memory alignment of tagged rows of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipleAlignment {
    rows: BTreeMap<String, AlignedRow>,
    length: usize,
}

impl MultipleAlignment {
    /// Builds an alignment from `(tag, gapped sequence)` rows.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if there are no rows, a tag repeats or the rows
    /// differ in length.
    pub fn new<T, S>(rows: impl IntoIterator<Item = (T, S)>) -> Result<Self, AlignmentError>
    where
        T: Into<String>,
        S: AsRef<str>,
    {
        let mut aligned = BTreeMap::new();
        let mut length = None;
        for (tag, gapped) in rows {
            let tag = tag.into();
            let gapped = gapped.as_ref().trim().to_ascii_uppercase();
            let found = gapped.chars().count();
            match length {
                None => length = Some(found),
                Some(expected) if expected != found => {
                    return Err(AlignmentError::RowLengthMismatch {
                        tag,
                        expected,
                        found,
                    });
                }
                Some(_) => {}
            }
            if aligned.contains_key(&tag) {
                return Err(AlignmentError::DuplicateTag(tag));
            }
            aligned.insert(tag, AlignedRow::new(gapped));
        }
        let length = length.ok_or(AlignmentError::Empty)?;
        Ok(Self {
            rows: aligned,
            length,
        })
    }

    /// The trivial alignment of ungapped sequences of equal length, where column
    /// `c` holds position `c + 1` of every row.
    pub fn identity<T, S>(rows: impl IntoIterator<Item = (T, S)>) -> Result<Self, AlignmentError>
    where
        T: Into<String>,
        S: AsRef<str>,
    {
        let rows: Vec<(String, String)> = rows
            .into_iter()
            .map(|(tag, sequence)| (tag.into(), sequence.as_ref().to_string()))
            .collect();
        if let Some((tag, _)) = rows.iter().find(|(_, sequence)| sequence.contains(GAP)) {
            return Err(AlignmentError::UnexpectedGap(tag.clone()));
        }
        Self::new(rows)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn aligned_sequence(&self, tag: &str) -> Option<&str> {
        self.rows.get(tag).map(|row| row.gapped.as_str())
    }
}

impl SequenceAlignment for MultipleAlignment {
    fn contains_tag(&self, tag: &str) -> bool {
        self.rows.contains_key(tag)
    }

    fn num_sequences(&self) -> usize {
        self.rows.len()
    }

    fn length(&self) -> usize {
        self.length
    }

    fn al2seq(&self, tag: &str, column: usize) -> Option<usize> {
        self.rows
            .get(tag)
            .and_then(|row| row.column_to_position.get(column).copied().flatten())
    }

    fn seq2al(&self, tag: &str, position: usize) -> Option<usize> {
        let row = self.rows.get(tag)?;
        position
            .checked_sub(1)
            .and_then(|index| row.position_to_column.get(index).copied())
    }

    fn ungapped_sequence(&self, tag: &str) -> Option<String> {
        self.rows.get(tag).map(AlignedRow::ungapped)
    }
}

use super::neighborhood::CommonNeighborhoods;
use super::state::ContactState;
use crate::core::models::residue::ResidueType;
use crate::engine::graph::residue::ResidueGraph;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContactMapError {
    #[error("Position {position} is outside the contact map (length {length})")]
    PositionOutOfRange { position: usize, length: usize },
    #[error("Cell ({i}, {j}) is skipped and cannot hold a contact")]
    SkippedCell { i: usize, j: usize },
    #[error("Contact maps have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// Which side of a sequence-separation threshold common neighbours must lie on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Neighbours at least the threshold away from both endpoints.
    Above,
    /// Neighbours at most the threshold away from both endpoints.
    Below,
}

/// How [`ContactMap::assert_contact`] refreshes the common-neighbour cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborhoodUpdate {
    /// Scans only residues within `|i - j|` of either endpoint. Exact as long as
    /// every contact already in the map has a sequence separation of at most `|i - j|`,
    /// which holds when contacts are asserted in order of increasing range.
    Window,
    /// Scans every residue. Always exact.
    FullScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactMapStats {
    pub contacts: usize,
    pub non_contacts: usize,
    pub skipped: usize,
}

#[derive(Debug, PartialEq, Eq)]
struct Layout {
    sequence: String,
    /// Indexed by 1-based position; index 0 is unused.
    observed_standard: Vec<bool>,
}

/// Dense residue-by-residue contact matrix with a cache of common neighbours.
///
/// Positions are 1-based and cover the full sequence. Cells whose residues are
/// not both observed standard residues are [`ContactState::Skipped`].
///
/// Cloning shares the residue layout and the neighbour cache; derived maps
/// (`add`, `subtract`, `reachable`, `cut_to_below_range`, `blank_copy`) share the
/// layout but compute a fresh cache.
#[derive(Debug, Clone)]
pub struct ContactMap {
    layout: Arc<Layout>,
    cells: Vec<ContactState>,
    neighborhoods: Arc<CommonNeighborhoods>,
}

impl ContactMap {
    /// Builds a map for `sequence` with the given observed positions and contacts.
    ///
    /// Contacts may be listed one-sided or in both orientations.
    ///
    /// # Errors
    ///
    /// Returns [`ContactMapError::PositionOutOfRange`] for positions outside the
    /// sequence and [`ContactMapError::SkippedCell`] for contacts touching an
    /// unobserved or non-standard residue (or a residue with itself).
    pub fn new(
        sequence: &str,
        observed: impl IntoIterator<Item = usize>,
        contacts: &[(usize, usize)],
    ) -> Result<Self, ContactMapError> {
        let sequence = sequence.to_ascii_uppercase();
        let length = sequence.len();
        let mut observed_standard = vec![false; length + 1];
        for position in observed {
            if position == 0 || position > length {
                return Err(ContactMapError::PositionOutOfRange { position, length });
            }
            let letter = sequence.as_bytes()[position - 1] as char;
            observed_standard[position] = ResidueType::from_one_letter(letter).is_standard();
        }

        let mut map = Self::blank(Arc::new(Layout {
            sequence,
            observed_standard,
        }));
        for &(i, j) in contacts {
            map.check_position(i)?;
            map.check_position(j)?;
            if map.state_unchecked(i, j).is_skipped() || i == j {
                return Err(ContactMapError::SkippedCell { i, j });
            }
            map.set(i, j, ContactState::Contact);
        }
        map.recompute_neighborhoods();
        Ok(map)
    }

    /// Builds a map from a residue graph's observed standard nodes and its edges.
    /// Edges touching other nodes are ignored.
    pub fn from_graph(graph: &ResidueGraph) -> Self {
        let length = graph.full_len();
        let mut observed_standard = vec![false; length + 1];
        for (serial, node) in graph.nodes() {
            if serial >= 1 && serial <= length {
                observed_standard[serial] = node.is_observed_standard();
            }
        }

        let mut map = Self::blank(Arc::new(Layout {
            sequence: graph.metadata().sequence().to_string(),
            observed_standard,
        }));
        let mut ignored = 0usize;
        for ((i, j), _) in graph.edges() {
            let usable = i != j
                && map.check_position(i).is_ok()
                && map.check_position(j).is_ok()
                && !map.state_unchecked(i, j).is_skipped();
            if usable {
                map.set(i, j, ContactState::Contact);
            } else {
                ignored += 1;
            }
        }
        if ignored > 0 {
            debug!(ignored, "Edges on skipped cells left out of the contact map.");
        }
        map.recompute_neighborhoods();
        map
    }

    pub fn len(&self) -> usize {
        self.layout.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sequence(&self) -> &str {
        &self.layout.sequence
    }

    pub fn is_observed_standard(&self, position: usize) -> bool {
        self.layout
            .observed_standard
            .get(position)
            .copied()
            .unwrap_or(false)
    }

    pub fn state(&self, i: usize, j: usize) -> Option<ContactState> {
        (self.check_position(i).is_ok() && self.check_position(j).is_ok())
            .then(|| self.state_unchecked(i, j))
    }

    pub fn is_contact(&self, i: usize, j: usize) -> bool {
        self.state(i, j).is_some_and(ContactState::is_contact)
    }

    /// Contacts as unordered pairs `(i, j)` with `i < j`, ascending.
    pub fn contacts(&self) -> Vec<(usize, usize)> {
        self.upper_cells()
            .filter(|&(i, j)| self.state_unchecked(i, j).is_contact())
            .collect()
    }

    pub fn num_contacts(&self) -> usize {
        self.upper_cells()
            .filter(|&(i, j)| self.state_unchecked(i, j).is_contact())
            .count()
    }

    pub fn has_no_contacts(&self) -> bool {
        !self
            .upper_cells()
            .any(|(i, j)| self.state_unchecked(i, j).is_contact())
    }

    pub fn num_observed_standard(&self) -> usize {
        self.layout.observed_standard.iter().filter(|&&o| o).count()
    }

    /// `L(L-1)/2` for a map of length `L`.
    pub fn total_cells(&self) -> usize {
        let length = self.len();
        length * length.saturating_sub(1) / 2
    }

    /// Cells between observed standard residues.
    pub fn effective_cells(&self) -> usize {
        let n = self.num_observed_standard();
        n * n.saturating_sub(1) / 2
    }

    /// Cell counts over the band `j - i >= max(1, diagonal)`.
    pub fn stats(&self, diagonal: usize) -> ContactMapStats {
        let mut stats = ContactMapStats::default();
        for (i, j) in self.cells_from_diagonal(diagonal) {
            match self.state_unchecked(i, j) {
                ContactState::Contact => stats.contacts += 1,
                ContactState::NonContact => stats.non_contacts += 1,
                ContactState::Skipped => stats.skipped += 1,
            }
        }
        stats
    }

    pub fn common_neighbors(&self, i: usize, j: usize) -> &BTreeSet<usize> {
        self.neighborhoods.get(i, j)
    }

    /// Common neighbours of `(i, j)` restricted by distance from both endpoints.
    ///
    /// The threshold defaults to `|j - i|`.
    pub fn common_neighbors_in_band(
        &self,
        i: usize,
        j: usize,
        diagonal: Option<usize>,
        band: Band,
    ) -> BTreeSet<usize> {
        let threshold = diagonal.unwrap_or(i.abs_diff(j));
        self.common_neighbors(i, j)
            .iter()
            .copied()
            .filter(|&k| {
                let (di, dj) = (k.abs_diff(i), k.abs_diff(j));
                match band {
                    Band::Above => di >= threshold && dj >= threshold,
                    Band::Below => di <= threshold && dj <= threshold,
                }
            })
            .collect()
    }

    /// For `n == 0`, whether the pair has no common neighbour; otherwise whether it
    /// has at least `n`.
    pub fn has_n_common_neighbors(&self, i: usize, j: usize, n: usize) -> bool {
        let size = self.common_neighbors(i, j).len();
        if n == 0 { size == 0 } else { size >= n }
    }

    /// Contacts with `j - i >= max(1, diagonal)` satisfying [`Self::has_n_common_neighbors`].
    pub fn count_contacts_with_n_common_neighbors(&self, n: usize, diagonal: usize) -> usize {
        self.cells_from_diagonal(diagonal)
            .filter(|&(i, j)| {
                self.state_unchecked(i, j).is_contact() && self.has_n_common_neighbors(i, j, n)
            })
            .count()
    }

    /// Sets `(i, j)` to a contact in place and updates the neighbour cache.
    ///
    /// Returns `Ok(false)` if the cell already held a contact.
    ///
    /// # Errors
    ///
    /// Fails for positions outside the map, for skipped cells and for `i == j`.
    pub fn assert_contact(
        &mut self,
        i: usize,
        j: usize,
        update: NeighborhoodUpdate,
    ) -> Result<bool, ContactMapError> {
        self.check_position(i)?;
        self.check_position(j)?;
        if i == j || self.state_unchecked(i, j).is_skipped() {
            return Err(ContactMapError::SkippedCell { i, j });
        }
        if self.state_unchecked(i, j).is_contact() {
            return Ok(false);
        }
        self.set(i, j, ContactState::Contact);

        let length = self.len();
        let range = |center: usize| -> (usize, usize) {
            match update {
                NeighborhoodUpdate::FullScan => (1, length),
                NeighborhoodUpdate::Window => {
                    let d = i.abs_diff(j);
                    (center.saturating_sub(d).max(1), (center + d).min(length))
                }
            }
        };

        // The new contact makes `i` a common neighbour of (j, k) for every k
        // already touching `i`, and `j` one of (i, k) for every k touching `j`.
        let mut additions = Vec::new();
        for (endpoint, other) in [(i, j), (j, i)] {
            let (from, to) = range(endpoint);
            for k in from..=to {
                if k != i && k != j && self.state_unchecked(endpoint, k).is_contact() {
                    additions.push((other, k, endpoint));
                }
            }
        }
        let neighborhoods = Arc::make_mut(&mut self.neighborhoods);
        for (a, b, neighbor) in additions {
            neighborhoods.insert(a, b, neighbor);
        }
        Ok(true)
    }

    /// Contacts of either map.
    pub fn add(&self, other: &ContactMap) -> Result<ContactMap, ContactMapError> {
        self.check_same_length(other)?;
        Ok(self.derive(|i, j| self.is_contact(i, j) || other.is_contact(i, j)))
    }

    /// Contacts of `self` that are not contacts of `other`.
    pub fn subtract(&self, other: &ContactMap) -> Result<ContactMap, ContactMapError> {
        self.check_same_length(other)?;
        Ok(self.derive(|i, j| self.is_contact(i, j) && !other.is_contact(i, j)))
    }

    /// Contacts of `self` whose endpoints share at least one common neighbour in `other`.
    pub fn reachable(&self, other: &ContactMap) -> Result<ContactMap, ContactMapError> {
        self.check_same_length(other)?;
        Ok(self.derive(|i, j| self.is_contact(i, j) && other.has_n_common_neighbors(i, j, 1)))
    }

    /// Contacts with sequence separation below `diagonal`.
    pub fn cut_to_below_range(&self, diagonal: usize) -> ContactMap {
        self.derive(|i, j| self.is_contact(i, j) && j - i < diagonal)
    }

    /// Same layout, no contacts.
    pub fn blank_copy(&self) -> ContactMap {
        Self::blank(Arc::clone(&self.layout))
    }

    /// Whether both maps agree on contact versus non-contact at every cell `i < j`.
    pub fn has_same_contacts(&self, other: &ContactMap) -> bool {
        self.len() == other.len()
            && self
                .upper_cells()
                .all(|(i, j)| self.is_contact(i, j) == other.is_contact(i, j))
    }

    pub fn shares_layout_with(&self, other: &ContactMap) -> bool {
        Arc::ptr_eq(&self.layout, &other.layout)
    }

    pub fn shares_neighborhoods_with(&self, other: &ContactMap) -> bool {
        Arc::ptr_eq(&self.neighborhoods, &other.neighborhoods)
    }

    /// Every pair `(i, j)` with `i < j` and its common neighbours, for pairs that have any.
    pub fn neighborhoods(&self) -> &CommonNeighborhoods {
        &self.neighborhoods
    }

    fn blank(layout: Arc<Layout>) -> Self {
        let length = layout.sequence.len();
        let mut cells = vec![ContactState::NonContact; length * length];
        for i in 1..=length {
            for j in 1..=length {
                if !layout.observed_standard[i] || !layout.observed_standard[j] {
                    cells[(i - 1) * length + (j - 1)] = ContactState::Skipped;
                }
            }
        }
        Self {
            layout,
            cells,
            neighborhoods: Arc::new(CommonNeighborhoods::default()),
        }
    }

    fn derive<F>(&self, keep: F) -> ContactMap
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut derived = self.blank_copy();
        let kept: Vec<(usize, usize)> = self.upper_cells().filter(|&(i, j)| keep(i, j)).collect();
        for (i, j) in kept {
            if !derived.state_unchecked(i, j).is_skipped() {
                derived.set(i, j, ContactState::Contact);
            }
        }
        derived.recompute_neighborhoods();
        derived
    }

    fn recompute_neighborhoods(&mut self) {
        let length = self.len();
        let mut adjacency = vec![BTreeSet::new(); length + 1];
        for (i, j) in self.contacts() {
            adjacency[i].insert(j);
            adjacency[j].insert(i);
        }
        self.neighborhoods = Arc::new(CommonNeighborhoods::compute(&adjacency));
    }

    fn upper_cells(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let length = self.len();
        (1..=length).flat_map(move |i| ((i + 1)..=length).map(move |j| (i, j)))
    }

    fn cells_from_diagonal(&self, diagonal: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let length = self.len();
        (diagonal.max(1)..length).flat_map(move |d| (1..=(length - d)).map(move |i| (i, i + d)))
    }

    fn check_same_length(&self, other: &ContactMap) -> Result<(), ContactMapError> {
        if self.len() != other.len() {
            return Err(ContactMapError::LengthMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(())
    }

    fn check_position(&self, position: usize) -> Result<(), ContactMapError> {
        if position == 0 || position > self.len() {
            return Err(ContactMapError::PositionOutOfRange {
                position,
                length: self.len(),
            });
        }
        Ok(())
    }

    fn state_unchecked(&self, i: usize, j: usize) -> ContactState {
        self.cells[(i - 1) * self.len() + (j - 1)]
    }

    fn set(&mut self, i: usize, j: usize, state: ContactState) {
        let length = self.len();
        self.cells[(i - 1) * length + (j - 1)] = state;
        self.cells[(j - 1) * length + (i - 1)] = state;
    }
}

use super::labeled::GraphError;
use super::residue::ResidueGraph;

/// Confusion counts and derived rates of a predicted graph against a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEval {
    pub title: String,
    pub predicted: usize,
    pub original: usize,
    /// Number of contact-map cells under consideration.
    pub cm_total: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
    pub sensitivity: f64,
    pub specificity: f64,
    /// Precision: TP / (TP + FP).
    pub accuracy: f64,
    /// TP / original.
    pub coverage: f64,
}

impl PredictionEval {
    pub fn new(
        true_positives: usize,
        false_positives: usize,
        true_negatives: usize,
        false_negatives: usize,
        predicted: usize,
        original: usize,
        cm_total: usize,
    ) -> Self {
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };
        let nothing_predicted = true_positives + false_positives == 0;
        let (accuracy, coverage) = match (nothing_predicted, original == 0) {
            (true, true) => (1.0, 1.0),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => (
                ratio(true_positives, true_positives + false_positives),
                ratio(true_positives, original),
            ),
        };
        Self {
            title: String::new(),
            predicted,
            original,
            cm_total,
            true_positives,
            false_positives,
            true_negatives,
            false_negatives,
            sensitivity: ratio(true_positives, true_positives + false_negatives),
            specificity: ratio(true_negatives, true_negatives + false_positives),
            accuracy,
            coverage,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
}

/// Edge-set comparison of two graphs over the same sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphComparison {
    /// Edges of `self` also present in `other`, with `self`'s payloads.
    pub common: ResidueGraph,
    pub only_self: ResidueGraph,
    pub only_other: ResidueGraph,
}

impl ResidueGraph {
    /// Evaluates this graph as a prediction of `original`, counting only edges
    /// whose sequence separation is at least `min_seq_sep`.
    ///
    /// # Errors
    ///
    /// The graphs must have the same full length and directedness.
    pub fn evaluate_prediction(
        &self,
        original: &ResidueGraph,
        min_seq_sep: usize,
    ) -> Result<PredictionEval, GraphError> {
        self.check_comparable(original)?;
        let in_range = |i: usize, j: usize| ResidueGraph::contact_range(i, j) >= min_seq_sep;

        let mut predicted = 0;
        let mut true_positives = 0;
        for ((i, j), _) in self.edges().filter(|&((i, j), _)| in_range(i, j)) {
            predicted += 1;
            if original.contains_edge(i, j) {
                true_positives += 1;
            }
        }
        let false_positives = predicted - true_positives;

        let mut original_count = 0;
        let mut false_negatives = 0;
        for ((i, j), _) in original.edges().filter(|&((i, j), _)| in_range(i, j)) {
            original_count += 1;
            if !self.contains_edge(i, j) {
                false_negatives += 1;
            }
        }

        let length = original.full_len();
        let mut cm_total = (length + 1).saturating_sub(min_seq_sep) * length.saturating_sub(min_seq_sep);
        if !original.is_directed() {
            cm_total /= 2;
        }
        let true_negatives = cm_total
            .saturating_sub(true_positives)
            .saturating_sub(false_positives)
            .saturating_sub(false_negatives);

        Ok(PredictionEval::new(
            true_positives,
            false_positives,
            true_negatives,
            false_negatives,
            predicted,
            original_count,
            cm_total,
        ))
    }

    /// Splits the edges of both graphs into common and exclusive parts.
    ///
    /// # Errors
    ///
    /// The graphs must have the same full length and directedness.
    pub fn compare(&self, other: &ResidueGraph) -> Result<GraphComparison, GraphError> {
        self.check_comparable(other)?;
        Ok(GraphComparison {
            common: self.filter_edges(|(i, j), _| other.contains_edge(i, j)),
            only_self: self.filter_edges(|(i, j), _| !other.contains_edge(i, j)),
            only_other: other.filter_edges(|(i, j), _| !self.contains_edge(i, j)),
        })
    }

    pub fn common_edge_count(&self, other: &ResidueGraph) -> Result<usize, GraphError> {
        self.check_comparable(other)?;
        Ok(self
            .edges()
            .filter(|&((i, j), _)| other.contains_edge(i, j))
            .count())
    }

    fn check_comparable(&self, other: &ResidueGraph) -> Result<(), GraphError> {
        if self.full_len() != other.full_len() {
            return Err(GraphError::SequenceLengthMismatch {
                left: self.full_len(),
                right: other.full_len(),
            });
        }
        if self.is_directed() != other.is_directed() {
            return Err(GraphError::DirectionMismatch);
        }
        Ok(())
    }
}

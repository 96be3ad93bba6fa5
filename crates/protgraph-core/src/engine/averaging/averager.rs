use super::alignment::{AlignmentError, MultipleAlignment, SequenceAlignment};
use crate::engine::graph::builder::ResidueGraphBuilder;
use crate::engine::graph::labeled::{GraphError, GraphMetadata};
use crate::engine::graph::residue::ResidueGraph;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Slack applied before rounding `templates × threshold` up, so that products
/// such as `10 × 0.3` do not land just above an integer.
const VOTE_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AveragingError {
    #[error("At least one template graph is required")]
    NoTemplates,
    #[error("Alignment does not contain a sequence tagged '{0}'")]
    MissingTag(String),
    #[error("Alignment holds {sequences} sequences but {templates} templates were given (expected sequences - 1)")]
    TemplateCountMismatch { templates: usize, sequences: usize },
    #[error("Sequence of template graph '{0}' does not match its row in the alignment")]
    TemplateSequenceMismatch(String),
    #[error("Target sequence does not match the target row '{0}' of the alignment")]
    TargetSequenceMismatch(String),
    #[error("Template '{tag}' has a different {field} than the other templates")]
    InconsistentTemplate { tag: String, field: &'static str },
    #[error("Consensus threshold must lie in (0, 1] (got {0})")]
    InvalidThreshold(f64),
    #[error("Alignment error: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },
    #[error("Graph error: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },
}

/// The templates that contain one alignment-column contact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vote {
    pub count: usize,
    /// Templates whose rows are not gaps at either column, so that they could
    /// have voted. Never smaller than `count`.
    pub potential: usize,
    pub voters: BTreeSet<String>,
}

impl Vote {
    /// Fraction of the templates able to make the contact that do make it.
    pub fn gap_aware_fraction(&self) -> f64 {
        if self.potential == 0 {
            0.0
        } else {
            self.count as f64 / self.potential as f64
        }
    }
}

/// Builds consensus residue graphs for a target sequence by letting aligned
/// template graphs vote on every alignment-column contact.
///
/// Votes are counted once on construction and kept as a sparse table keyed by
/// 0-based column pairs. For undirected contact types keys are `(min, max)`.
#[derive(Debug, Clone)]
pub struct GraphAverager<A> {
    alignment: A,
    templates: BTreeMap<String, ResidueGraph>,
    target_tag: String,
    target: GraphMetadata,
    votes: BTreeMap<(usize, usize), Vote>,
}

impl<A: SequenceAlignment + Sync> GraphAverager<A> {
    /// Checks the alignment against the templates and counts votes.
    ///
    /// # Arguments
    ///
    /// * `alignment` - An alignment holding the target row and one row per template.
    /// * `templates` - Template graphs keyed by their alignment tag.
    /// * `target_tag` - Tag of the target row.
    /// * `target_sequence` - The ungapped target sequence.
    ///
    /// # Errors
    ///
    /// Returns [`AveragingError`] if a tag is missing, the number of templates is
    /// not one less than the number of rows, a row disagrees with its sequence, or
    /// the templates disagree on contact type, cutoff or directedness.
    pub fn new(
        alignment: A,
        templates: BTreeMap<String, ResidueGraph>,
        target_tag: &str,
        target_sequence: &str,
    ) -> Result<Self, AveragingError> {
        let first = templates.values().next().ok_or(AveragingError::NoTemplates)?;
        let target = GraphMetadata::new(
            target_sequence,
            first.metadata().contact_type(),
            first.metadata().cutoff,
        );

        check_sequences(&alignment, &templates, target_tag, target.sequence())?;
        if templates.len() + 1 != alignment.num_sequences() {
            return Err(AveragingError::TemplateCountMismatch {
                templates: templates.len(),
                sequences: alignment.num_sequences(),
            });
        }
        check_template_settings(&templates)?;

        let votes = count_votes(&alignment, &templates, target.is_directed());
        Ok(Self {
            alignment,
            templates,
            target_tag: target_tag.to_string(),
            target,
            votes,
        })
    }

    pub fn num_templates(&self) -> usize {
        self.templates.len()
    }

    pub fn template_tags(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn alignment(&self) -> &A {
        &self.alignment
    }

    /// The sparse vote table, ascending by column pair.
    pub fn votes(&self) -> &BTreeMap<(usize, usize), Vote> {
        &self.votes
    }

    /// Smallest vote count accepted at `threshold`: `ceil(templates × threshold)`.
    pub fn min_votes(&self, threshold: f64) -> Result<usize, AveragingError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(AveragingError::InvalidThreshold(threshold));
        }
        let scaled = self.templates.len() as f64 * threshold - VOTE_EPSILON;
        Ok((scaled.ceil() as usize).max(1))
    }

    /// A fresh target graph holding every contact with enough votes whose ends
    /// are not gaps in the target row.
    pub fn consensus(&self, threshold: f64) -> Result<ResidueGraph, AveragingError> {
        let builder = ResidueGraphBuilder::new(self.target.clone());
        self.accept_into(builder, threshold)
    }

    /// Like [`Self::consensus`] but starts from the edges of `base`, which must be
    /// a graph of the target sequence with the templates' contact type, cutoff
    /// and directedness. `base` itself is left untouched.
    pub fn consensus_onto(
        &self,
        base: &ResidueGraph,
        threshold: f64,
    ) -> Result<ResidueGraph, AveragingError> {
        if base.metadata().sequence() != self.target.sequence() {
            return Err(AveragingError::TargetSequenceMismatch(self.target_tag.clone()));
        }
        if base.is_directed() != self.target.is_directed() {
            return Err(GraphError::DirectionMismatch.into());
        }
        let metadata = base.metadata();
        if metadata.contact_type() != self.target.contact_type() {
            return Err(GraphError::MetadataMismatch {
                field: "contact type",
                left: self.target.contact_type().to_string(),
                right: metadata.contact_type().to_string(),
            }
            .into());
        }
        if !metadata.cutoff_matches(&self.target) {
            return Err(GraphError::MetadataMismatch {
                field: "cutoff",
                left: self.target.cutoff.to_string(),
                right: metadata.cutoff.to_string(),
            }
            .into());
        }
        self.accept_into(ResidueGraphBuilder::from_graph(base), threshold)
    }

    /// Votes of the column pairs that map onto target residues, keyed by the
    /// target residue pair, ascending.
    pub fn target_votes(&self) -> BTreeMap<(usize, usize), &Vote> {
        self.votes
            .iter()
            .filter_map(|(&(i, j), vote)| Some((self.target_pair(i, j)?, vote)))
            .collect()
    }

    /// A target graph with one edge per voted contact, weighted by the fraction
    /// of templates that voted for it.
    pub fn average_graph(&self) -> Result<ResidueGraph, AveragingError> {
        let mut builder = ResidueGraphBuilder::new(self.target.clone());
        let templates = self.templates.len() as f64;
        for ((ti, tj), vote) in self.target_votes() {
            builder.add_weighted_contact(ti, tj, vote.count as f64 / templates)?;
        }
        Ok(builder.build())
    }

    /// The `top` most-voted contacts of the average graph, with unit weights.
    pub fn top_contacts(&self, top: usize) -> Result<ResidueGraph, AveragingError> {
        Ok(self.average_graph()?.discretize_by_num_contacts(top))
    }

    /// Sum of the votes received by the contacts of one template.
    ///
    /// Returns `None` if `tag` is not a template. The score can be divided by the
    /// alignment length and by the number of templates.
    pub fn consensus_score(
        &self,
        tag: &str,
        normalize_by_length: bool,
        normalize_by_templates: bool,
    ) -> Option<f64> {
        let graph = self.templates.get(tag)?;
        let directed = self.target.is_directed();
        let mut score = 0.0;
        for ((i, j), _) in graph.edges() {
            let count = column_key(&self.alignment, tag, i, j, directed)
                .and_then(|key| self.votes.get(&key))
                .map_or(0, |vote| vote.count);
            score += count as f64;
        }
        if normalize_by_length && self.alignment.length() > 0 {
            score /= self.alignment.length() as f64;
        }
        if normalize_by_templates {
            score /= self.templates.len() as f64;
        }
        Some(score)
    }

    /// Sum of the fully normalized consensus scores of all templates.
    pub fn ensemble_consensus_score(&self) -> f64 {
        self.templates
            .keys()
            .filter_map(|tag| self.consensus_score(tag, true, true))
            .sum()
    }

    /// Drops templates whose normalized consensus score is below `min_score` and
    /// recounts votes. The alignment keeps the rows of dropped templates.
    ///
    /// # Errors
    ///
    /// Returns [`AveragingError::NoTemplates`] if no template survives.
    pub fn filter_by_consensus_score(self, min_score: f64) -> Result<Self, AveragingError> {
        let keep: BTreeSet<String> = self
            .templates
            .keys()
            .filter(|tag| {
                self.consensus_score(tag, true, true)
                    .is_some_and(|score| score >= min_score)
            })
            .cloned()
            .collect();
        let Self {
            alignment,
            mut templates,
            target_tag,
            target,
            ..
        } = self;
        templates.retain(|tag, _| keep.contains(tag));
        if templates.is_empty() {
            return Err(AveragingError::NoTemplates);
        }
        debug!(
            kept = templates.len(),
            min_score, "Filtered templates by consensus score."
        );
        let votes = count_votes(&alignment, &templates, target.is_directed());
        Ok(Self {
            alignment,
            templates,
            target_tag,
            target,
            votes,
        })
    }

    /// Edge counts of the templates, ascending.
    pub fn template_contact_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.templates.values().map(|g| g.edge_count()).collect();
        counts.sort_unstable();
        counts
    }

    pub fn avg_num_contacts(&self) -> f64 {
        let total: usize = self.templates.values().map(|g| g.edge_count()).sum();
        total as f64 / self.templates.len() as f64
    }

    /// Upper median of the template edge counts.
    pub fn median_num_contacts(&self) -> usize {
        let counts = self.template_contact_counts();
        counts.get(counts.len() / 2).copied().unwrap_or(0)
    }

    /// Template edge count at quantile `t`, clamped to `[0, 1]`. The index into
    /// the ascending counts is `round(t × templates)`, capped at the last one.
    pub fn quantile_num_contacts(&self, t: f64) -> usize {
        let counts = self.template_contact_counts();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let index = ((t * counts.len() as f64).round() as usize).min(counts.len().saturating_sub(1));
        counts.get(index).copied().unwrap_or(0)
    }

    pub fn min_num_contacts(&self) -> usize {
        self.templates.values().map(|g| g.edge_count()).min().unwrap_or(0)
    }

    pub fn max_num_contacts(&self) -> usize {
        self.templates.values().map(|g| g.edge_count()).max().unwrap_or(0)
    }

    /// How often each parent structure is named by the templates, most frequent
    /// first, ties by name.
    pub fn parent_frequencies(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for graph in self.templates.values() {
            for parent in &graph.metadata().parents {
                *counts.entry(parent.as_str()).or_default() += 1;
            }
        }
        let mut frequencies: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(parent, count)| (parent.to_string(), count))
            .collect();
        frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        frequencies
    }

    /// Number of contacts of `first` that `second` also has at the aligned positions.
    pub fn pairwise_overlap(&self, first: &str, second: &str) -> Option<usize> {
        let left = self.templates.get(first)?;
        let right = self.templates.get(second)?;
        let shared = left
            .edges()
            .filter_map(|((i, j), _)| {
                let ci = self.alignment.seq2al(first, i)?;
                let cj = self.alignment.seq2al(first, j)?;
                Some((
                    self.alignment.al2seq(second, ci)?,
                    self.alignment.al2seq(second, cj)?,
                ))
            })
            .filter(|&(i, j)| right.contains_edge(i, j))
            .count();
        Some(shared)
    }

    /// Sum of [`Self::pairwise_overlap`] over all unordered template pairs.
    pub fn sum_of_pairs_overlap(&self) -> usize {
        let tags: Vec<&String> = self.templates.keys().collect();
        let mut sum = 0;
        for (index, first) in tags.iter().enumerate() {
            for second in &tags[index + 1..] {
                sum += self.pairwise_overlap(first, second).unwrap_or(0);
            }
        }
        sum
    }

    fn accept_into(
        &self,
        mut builder: ResidueGraphBuilder,
        threshold: f64,
    ) -> Result<ResidueGraph, AveragingError> {
        let min_votes = self.min_votes(threshold)?;
        for (&(i, j), vote) in &self.votes {
            if vote.count < min_votes {
                continue;
            }
            if let Some((ti, tj)) = self.target_pair(i, j) {
                builder.add_contact(ti, tj)?;
            }
        }
        Ok(builder.build())
    }

    fn target_pair(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        Some((
            self.alignment.al2seq(&self.target_tag, i)?,
            self.alignment.al2seq(&self.target_tag, j)?,
        ))
    }
}

impl GraphAverager<MultipleAlignment> {
    /// Averages templates that share the target's length using the trivial
    /// gap-free alignment.
    pub fn with_identity_alignment(
        target_tag: &str,
        target_sequence: &str,
        templates: BTreeMap<String, ResidueGraph>,
    ) -> Result<Self, AveragingError> {
        let rows = std::iter::once((target_tag.to_string(), target_sequence.to_string())).chain(
            templates
                .iter()
                .map(|(tag, graph)| (tag.clone(), graph.metadata().sequence().to_string())),
        );
        let alignment = MultipleAlignment::identity(rows)?;
        Self::new(alignment, templates, target_tag, target_sequence)
    }
}

fn check_sequences<A: SequenceAlignment>(
    alignment: &A,
    templates: &BTreeMap<String, ResidueGraph>,
    target_tag: &str,
    target_sequence: &str,
) -> Result<(), AveragingError> {
    if !alignment.contains_tag(target_tag) {
        return Err(AveragingError::MissingTag(target_tag.to_string()));
    }
    if let Some(tag) = templates.keys().find(|tag| !alignment.contains_tag(tag)) {
        return Err(AveragingError::MissingTag(tag.clone()));
    }
    for (tag, graph) in templates {
        let row = alignment.ungapped_sequence(tag).unwrap_or_default();
        if !row.eq_ignore_ascii_case(graph.metadata().sequence()) {
            return Err(AveragingError::TemplateSequenceMismatch(tag.clone()));
        }
    }
    let target_row = alignment.ungapped_sequence(target_tag).unwrap_or_default();
    if !target_row.eq_ignore_ascii_case(target_sequence) {
        return Err(AveragingError::TargetSequenceMismatch(target_tag.to_string()));
    }
    Ok(())
}

fn check_template_settings(templates: &BTreeMap<String, ResidueGraph>) -> Result<(), AveragingError> {
    let mut iter = templates.iter();
    let Some((_, first)) = iter.next() else {
        return Err(AveragingError::NoTemplates);
    };
    let reference = first.metadata();
    for (tag, graph) in iter {
        let metadata = graph.metadata();
        let field = if metadata.contact_type() != reference.contact_type() {
            Some("contact type")
        } else if !metadata.cutoff_matches(reference) {
            Some("cutoff")
        } else if metadata.is_directed() != reference.is_directed() {
            Some("directedness")
        } else {
            None
        };
        if let Some(field) = field {
            return Err(AveragingError::InconsistentTemplate {
                tag: tag.clone(),
                field,
            });
        }
    }
    Ok(())
}

/// Column pair of the contact `(i, j)` of template `tag`.
fn column_key<A: SequenceAlignment>(
    alignment: &A,
    tag: &str,
    i: usize,
    j: usize,
    directed: bool,
) -> Option<(usize, usize)> {
    let ci = alignment.seq2al(tag, i)?;
    let cj = alignment.seq2al(tag, j)?;
    Some(if directed { (ci, cj) } else { (ci.min(cj), ci.max(cj)) })
}

/// Column pairs of every contact of one template.
fn ballot<A: SequenceAlignment>(
    alignment: &A,
    tag: &str,
    graph: &ResidueGraph,
    directed: bool,
) -> Vec<(usize, usize)> {
    graph
        .edges()
        .filter_map(|((i, j), _)| column_key(alignment, tag, i, j, directed))
        .collect()
}

/// Merges ballots into the vote table and counts, for every voted column pair,
/// the templates with residues at both columns.
fn tally<'t, A: SequenceAlignment>(
    alignment: &A,
    templates: &BTreeMap<String, ResidueGraph>,
    ballots: impl IntoIterator<Item = (&'t String, Vec<(usize, usize)>)>,
) -> BTreeMap<(usize, usize), Vote> {
    let mut votes: BTreeMap<(usize, usize), Vote> = BTreeMap::new();
    for (tag, keys) in ballots {
        for key in keys {
            let vote = votes.entry(key).or_default();
            if vote.voters.insert(tag.clone()) {
                vote.count += 1;
            }
        }
    }
    for (&(ci, cj), vote) in votes.iter_mut() {
        vote.potential = templates
            .keys()
            .filter(|tag| {
                alignment.al2seq(tag, ci).is_some() && alignment.al2seq(tag, cj).is_some()
            })
            .count();
    }
    votes
}

/// Maps each template contact to its column pair and tallies the voters.
///
/// Every row maps positions to columns injectively, so a template votes at most
/// once per column pair.
fn count_votes<A: SequenceAlignment + Sync>(
    alignment: &A,
    templates: &BTreeMap<String, ResidueGraph>,
    directed: bool,
) -> BTreeMap<(usize, usize), Vote> {
    #[cfg(not(feature = "parallel"))]
    let iterator = templates.iter();

    #[cfg(feature = "parallel")]
    let iterator = templates.par_iter();

    let ballots: Vec<(&String, Vec<(usize, usize)>)> = iterator
        .map(|(tag, graph)| (tag, ballot(alignment, tag, graph, directed)))
        .collect();

    let votes = tally(alignment, templates, ballots);
    debug!(
        templates = templates.len(),
        voted_pairs = votes.len(),
        "Counted consensus votes."
    );
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn rig(sequence: &str, contact_type: &str, edges: &[(usize, usize)]) -> ResidueGraph {
        let mut builder = ResidueGraphBuilder::new(GraphMetadata::new(sequence, contact_type, 8.0));
        for &(i, j) in edges {
            builder.add_contact(i, j).unwrap();
        }
        builder.build()
    }

    fn templates(entries: Vec<(&str, ResidueGraph)>) -> BTreeMap<String, ResidueGraph> {
        entries
            .into_iter()
            .map(|(tag, graph)| (tag.to_string(), graph))
            .collect()
    }

    fn edges(graph: &ResidueGraph) -> Vec<(usize, usize)> {
        graph.edges().map(|(key, _)| key).collect()
    }

    fn two_template_averager() -> GraphAverager<MultipleAlignment> {
        let set = templates(vec![
            ("t1", rig("ACDEF", "Ca", &[(1, 3), (2, 4), (3, 5)])),
            ("t2", rig("ACDEF", "Ca", &[(1, 3)])),
        ]);
        GraphAverager::with_identity_alignment("target", "ACDEF", set).unwrap()
    }

    /// Target "AC-DE" against t1 "ACGDE" and t2 "ACG-E".
    fn gapped_averager() -> GraphAverager<MultipleAlignment> {
        let alignment =
            MultipleAlignment::new([("target", "AC-DE"), ("t1", "ACGDE"), ("t2", "ACG-E")])
                .unwrap();
        let set = templates(vec![
            ("t1", rig("ACGDE", "Ca", &[(1, 3), (1, 4), (2, 5)])),
            ("t2", rig("ACGE", "Ca", &[(1, 3), (1, 4)])),
        ]);
        GraphAverager::new(alignment, set, "target", "ACDE").unwrap()
    }

    /// Vote table recomputed by scanning every column pair against every template.
    fn scan_column_pairs<A: SequenceAlignment>(
        averager: &GraphAverager<A>,
    ) -> BTreeMap<(usize, usize), (usize, usize)> {
        let length = averager.alignment.length();
        let mut table = BTreeMap::new();
        for ci in 0..length {
            for cj in (ci + 1)..length {
                let mut count = 0;
                let mut potential = 0;
                for (tag, graph) in &averager.templates {
                    let (Some(i), Some(j)) = (
                        averager.alignment.al2seq(tag, ci),
                        averager.alignment.al2seq(tag, cj),
                    ) else {
                        continue;
                    };
                    potential += 1;
                    if graph.contains_edge(i, j) {
                        count += 1;
                    }
                }
                if count > 0 {
                    table.insert((ci, cj), (count, potential));
                }
            }
        }
        table
    }

    fn counts_and_potentials<A>(averager: &GraphAverager<A>) -> BTreeMap<(usize, usize), (usize, usize)> {
        averager
            .votes
            .iter()
            .map(|(&key, vote)| (key, (vote.count, vote.potential)))
            .collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn missing_target_tag_is_rejected() {
            let alignment = MultipleAlignment::new([("t1", "ACD"), ("t2", "ACD")]).unwrap();
            let set = templates(vec![("t1", rig("ACD", "Ca", &[]))]);
            let result = GraphAverager::new(alignment, set, "target", "ACD");
            assert_eq!(result.err(), Some(AveragingError::MissingTag("target".to_string())));
        }

        #[test]
        fn missing_template_tag_is_rejected() {
            let alignment = MultipleAlignment::new([("target", "ACD"), ("t1", "ACD")]).unwrap();
            let set = templates(vec![("t9", rig("ACD", "Ca", &[]))]);
            let result = GraphAverager::new(alignment, set, "target", "ACD");
            assert_eq!(result.err(), Some(AveragingError::MissingTag("t9".to_string())));
        }

        #[test]
        fn extra_alignment_rows_are_rejected() {
            let alignment =
                MultipleAlignment::new([("target", "ACD"), ("t1", "ACD"), ("t2", "ACD")]).unwrap();
            let set = templates(vec![("t1", rig("ACD", "Ca", &[]))]);
            let result = GraphAverager::new(alignment, set, "target", "ACD");
            assert_eq!(
                result.err(),
                Some(AveragingError::TemplateCountMismatch {
                    templates: 1,
                    sequences: 3
                })
            );
        }

        #[test]
        fn template_sequence_must_match_its_row() {
            let alignment = MultipleAlignment::new([("target", "ACD"), ("t1", "ACE")]).unwrap();
            let set = templates(vec![("t1", rig("ACD", "Ca", &[]))]);
            let result = GraphAverager::new(alignment, set, "target", "ACD");
            assert_eq!(
                result.err(),
                Some(AveragingError::TemplateSequenceMismatch("t1".to_string()))
            );
        }

        #[test]
        fn target_sequence_must_match_its_row() {
            let alignment = MultipleAlignment::new([("target", "ACD"), ("t1", "ACD")]).unwrap();
            let set = templates(vec![("t1", rig("ACD", "Ca", &[]))]);
            let result = GraphAverager::new(alignment, set, "target", "ACE");
            assert_eq!(
                result.err(),
                Some(AveragingError::TargetSequenceMismatch("target".to_string()))
            );
        }

        #[test]
        fn empty_template_set_is_rejected() {
            let alignment = MultipleAlignment::new([("target", "ACD")]).unwrap();
            let result = GraphAverager::new(alignment, BTreeMap::new(), "target", "ACD");
            assert_eq!(result.err(), Some(AveragingError::NoTemplates));
        }

        #[test]
        fn templates_must_share_contact_type() {
            let set = templates(vec![
                ("t1", rig("ACD", "Ca", &[])),
                ("t2", rig("ACD", "Cb", &[])),
            ]);
            let result = GraphAverager::with_identity_alignment("target", "ACD", set);
            assert_eq!(
                result.err(),
                Some(AveragingError::InconsistentTemplate {
                    tag: "t2".to_string(),
                    field: "contact type"
                })
            );
        }

        #[test]
        fn templates_must_share_cutoff() {
            let mut other = rig("ACD", "Ca", &[]);
            other.set_cutoff(6.0);
            let set = templates(vec![("t1", rig("ACD", "Ca", &[])), ("t2", other)]);
            let result = GraphAverager::with_identity_alignment("target", "ACD", set);
            assert!(matches!(
                result,
                Err(AveragingError::InconsistentTemplate { field: "cutoff", .. })
            ));
        }

        #[test]
        fn identity_alignment_needs_equal_lengths() {
            let set = templates(vec![("t1", rig("ACDE", "Ca", &[]))]);
            let result = GraphAverager::with_identity_alignment("target", "ACD", set);
            assert!(matches!(result, Err(AveragingError::Alignment { .. })));
        }
    }

    mod voting {
        use super::*;

        #[test]
        fn votes_are_sparse_and_keyed_by_column() {
            let averager = two_template_averager();
            let votes = averager.votes();
            assert_eq!(votes.len(), 3);
            assert_eq!(votes[&(0, 2)].count, 2);
            assert_eq!(
                votes[&(0, 2)].voters,
                BTreeSet::from(["t1".to_string(), "t2".to_string()])
            );
            assert_eq!(votes[&(1, 3)].count, 1);
            assert_eq!(votes[&(2, 4)].count, 1);
        }

        #[test]
        fn min_votes_rounds_up() {
            let averager = two_template_averager();
            assert_eq!(averager.min_votes(0.5), Ok(1));
            assert_eq!(averager.min_votes(0.51), Ok(2));
            assert_eq!(averager.min_votes(1.0), Ok(2));
            assert_eq!(averager.min_votes(0.1), Ok(1));
        }

        #[test]
        fn min_votes_tolerates_float_products() {
            let set: BTreeMap<String, ResidueGraph> = (0..10)
                .map(|n| (format!("t{n}"), rig("ACD", "Ca", &[])))
                .collect();
            let averager = GraphAverager::with_identity_alignment("target", "ACD", set).unwrap();
            assert_eq!(averager.min_votes(0.3), Ok(3));
        }

        #[test]
        fn thresholds_outside_unit_interval_are_rejected() {
            let averager = two_template_averager();
            for threshold in [0.0, -0.5, 1.5, f64::NAN] {
                assert!(matches!(
                    averager.consensus(threshold),
                    Err(AveragingError::InvalidThreshold(_))
                ));
            }
        }

        #[test]
        fn potential_votes_skip_templates_with_gaps() {
            let averager = gapped_averager();
            let votes = averager.votes();
            assert_eq!(votes[&(0, 2)].potential, 2);
            // Column 3 is a gap in t2.
            assert_eq!(votes[&(0, 3)].potential, 1);
            assert_eq!(votes[&(0, 4)].potential, 2);
            assert_eq!(votes[&(1, 4)].potential, 2);

            assert_eq!(votes[&(0, 3)].gap_aware_fraction(), 1.0);
            assert_eq!(votes[&(0, 4)].gap_aware_fraction(), 0.5);
        }

        #[test]
        fn gapped_votes_match_column_pair_scan() {
            let averager = gapped_averager();
            assert_eq!(counts_and_potentials(&averager), scan_column_pairs(&averager));
        }

        #[test]
        fn random_votes_match_column_pair_scan() {
            let mut rng = StdRng::seed_from_u64(7);
            let sequence = "A".repeat(20);
            let set: BTreeMap<String, ResidueGraph> = (0..6)
                .map(|n| {
                    let contacts: Vec<(usize, usize)> = (0..25)
                        .map(|_| (rng.random_range(1..=10), rng.random_range(11..=20)))
                        .collect();
                    (format!("t{n}"), rig(&sequence, "Ca", &contacts))
                })
                .collect();
            let averager = GraphAverager::with_identity_alignment("target", &sequence, set).unwrap();
            assert_eq!(counts_and_potentials(&averager), scan_column_pairs(&averager));
        }

        #[test]
        fn sequential_tally_matches_counted_votes() {
            let averager = gapped_averager();
            let ballots = averager
                .templates
                .iter()
                .map(|(tag, graph)| (tag, ballot(&averager.alignment, tag, graph, false)));
            let sequential = tally(&averager.alignment, &averager.templates, ballots);
            assert_eq!(&sequential, averager.votes());
        }

        #[test]
        fn directed_votes_keep_orientation() {
            let set = templates(vec![
                ("t1", rig("ACDEF", "Ca/Cb", &[(3, 1)])),
                ("t2", rig("ACDEF", "Ca/Cb", &[(1, 3)])),
            ]);
            let averager = GraphAverager::with_identity_alignment("target", "ACDEF", set).unwrap();
            assert_eq!(averager.votes().len(), 2);
            assert!(averager.consensus(1.0).unwrap().edge_count() == 0);

            let consensus = averager.consensus(0.5).unwrap();
            assert!(consensus.is_directed());
            assert_eq!(edges(&consensus), vec![(1, 3), (3, 1)]);
        }
    }

    mod consensus {
        use super::*;

        #[test]
        fn two_identical_templates_give_every_contact() {
            let contacts = [(1, 3), (2, 4), (3, 5)];
            let set = templates(vec![
                ("t1", rig("ACDEF", "Ca", &contacts)),
                ("t2", rig("ACDEF", "Ca", &contacts)),
            ]);
            let averager = GraphAverager::with_identity_alignment("target", "ACDEF", set).unwrap();
            let consensus = averager.consensus(0.5).unwrap();
            assert_eq!(edges(&consensus), contacts.to_vec());
            assert_eq!(consensus.metadata().contact_type(), "Ca");
            assert_eq!(consensus.metadata().cutoff, 8.0);
            assert_eq!(consensus.metadata().sequence(), "ACDEF");
        }

        #[test]
        fn threshold_selects_by_vote_count() {
            let averager = two_template_averager();
            assert_eq!(edges(&averager.consensus(0.5).unwrap()), vec![(1, 3), (2, 4), (3, 5)]);
            assert_eq!(edges(&averager.consensus(1.0).unwrap()), vec![(1, 3)]);
        }

        #[test]
        fn gaps_in_the_target_are_skipped() {
            let averager = gapped_averager();
            assert_eq!(averager.votes()[&(0, 2)].count, 2);
            assert_eq!(averager.votes()[&(0, 3)].count, 1);
            assert_eq!(averager.votes()[&(0, 4)].count, 1);
            assert_eq!(averager.votes()[&(1, 4)].count, 1);

            // The only unanimous contact lands on the target gap.
            assert_eq!(averager.consensus(1.0).unwrap().edge_count(), 0);
            assert_eq!(
                edges(&averager.consensus(0.5).unwrap()),
                vec![(1, 3), (1, 4), (2, 4)]
            );
        }

        #[test]
        fn consensus_onto_adds_without_touching_the_base() {
            let averager = two_template_averager();
            let mut builder = ResidueGraphBuilder::new(GraphMetadata::new("ACDEF", "Ca", 8.0));
            builder.add_contact(1, 5).unwrap();
            let base = builder.build();

            let merged = averager.consensus_onto(&base, 1.0).unwrap();
            assert_eq!(edges(&merged), vec![(1, 3), (1, 5)]);
            assert_eq!(edges(&base), vec![(1, 5)]);

            let again = averager.consensus_onto(&merged, 1.0).unwrap();
            assert_eq!(edges(&again), edges(&merged));
        }

        #[test]
        fn consensus_onto_rejects_other_contact_definitions() {
            let set = templates(vec![("t1", rig("ACDEF", "Ca", &[(1, 3)]))]);
            let averager = GraphAverager::with_identity_alignment("target", "ACDEF", set).unwrap();

            let mut builder = ResidueGraphBuilder::new(GraphMetadata::new("ACDEF", "ALL", 4.5));
            builder.add_contact(2, 5).unwrap();
            let other_type = builder.build();
            assert!(matches!(
                averager.consensus_onto(&other_type, 0.5),
                Err(AveragingError::Graph {
                    source: GraphError::MetadataMismatch {
                        field: "contact type",
                        ..
                    }
                })
            ));

            let mut other_cutoff = rig("ACDEF", "Ca", &[(2, 5)]);
            other_cutoff.set_cutoff(4.5);
            assert!(matches!(
                averager.consensus_onto(&other_cutoff, 0.5),
                Err(AveragingError::Graph {
                    source: GraphError::MetadataMismatch { field: "cutoff", .. }
                })
            ));

            let mut close_cutoff = rig("ACDEF", "Ca", &[(2, 5)]);
            close_cutoff.set_cutoff(8.0 + 1e-9);
            let merged = averager.consensus_onto(&close_cutoff, 0.5).unwrap();
            assert_eq!(edges(&merged), vec![(1, 3), (2, 5)]);
        }

        #[test]
        fn consensus_onto_rejects_foreign_graphs() {
            let averager = two_template_averager();
            let other = rig("ACDEG", "Ca", &[]);
            assert!(matches!(
                averager.consensus_onto(&other, 0.5),
                Err(AveragingError::TargetSequenceMismatch(_))
            ));
        }

        #[test]
        fn raising_the_threshold_never_adds_edges() {
            let mut rng = StdRng::seed_from_u64(41);
            let sequence = "A".repeat(30);
            let set: BTreeMap<String, ResidueGraph> = (0..5)
                .map(|n| {
                    let contacts: Vec<(usize, usize)> = (0..40)
                        .map(|_| (rng.random_range(1..=15), rng.random_range(16..=30)))
                        .collect();
                    (format!("t{n}"), rig(&sequence, "Ca", &contacts))
                })
                .collect();
            let averager =
                GraphAverager::with_identity_alignment("target", &sequence, set.clone()).unwrap();

            let low = averager.consensus(0.3).unwrap();
            let high = averager.consensus(0.7).unwrap();
            assert!(high.edge_count() <= low.edge_count());
            assert!(edges(&high).iter().all(|&(i, j)| low.contains_edge(i, j)));

            let min_votes = averager.min_votes(0.7).unwrap();
            for i in 1..=30 {
                for j in (i + 1)..=30 {
                    let votes = set.values().filter(|g| g.contains_edge(i, j)).count();
                    assert_eq!(high.contains_edge(i, j), votes >= min_votes, "pair ({i}, {j})");
                }
            }
        }
    }

    mod average {
        use super::*;

        #[test]
        fn weights_are_vote_fractions() {
            let averager = two_template_averager();
            let average = averager.average_graph().unwrap();
            assert_eq!(average.edge_count(), 3);
            assert_eq!(average.edge(1, 3).unwrap().weight, 1.0);
            assert_eq!(average.edge(2, 4).unwrap().weight, 0.5);
            assert!(average.has_weighted_edges());
        }

        #[test]
        fn top_contacts_prefers_heavier_edges() {
            let averager = two_template_averager();
            let top = averager.top_contacts(2).unwrap();
            assert_eq!(edges(&top), vec![(1, 3), (2, 4)]);
            assert!(top.edges().all(|(_, edge)| edge.weight == 1.0));
        }
    }

    mod scores {
        use super::*;

        #[test]
        fn consensus_score_sums_votes_of_own_contacts() {
            let averager = two_template_averager();
            assert_eq!(averager.consensus_score("t1", false, false), Some(4.0));
            assert_eq!(averager.consensus_score("t1", true, false), Some(0.8));
            assert_eq!(averager.consensus_score("t1", true, true), Some(0.4));
            assert_eq!(averager.consensus_score("t2", true, true), Some(0.2));
            assert_eq!(averager.consensus_score("nope", true, true), None);
        }

        #[test]
        fn ensemble_score_sums_template_scores() {
            let averager = two_template_averager();
            assert!((averager.ensemble_consensus_score() - 0.6).abs() < 1e-12);
        }

        #[test]
        fn filtering_recounts_votes() {
            let averager = two_template_averager().filter_by_consensus_score(0.3).unwrap();
            assert_eq!(averager.num_templates(), 1);
            assert_eq!(averager.template_tags().collect::<Vec<_>>(), vec!["t1"]);
            assert!(averager.votes().values().all(|vote| vote.count == 1));
            assert_eq!(averager.consensus(1.0).unwrap().edge_count(), 3);
        }

        #[test]
        fn filtering_everything_is_an_error() {
            let result = two_template_averager().filter_by_consensus_score(10.0);
            assert_eq!(result.err(), Some(AveragingError::NoTemplates));
        }

        #[test]
        fn pairwise_overlap_follows_the_alignment() {
            let averager = gapped_averager();
            // Only (1, 3) survives the mapping; column 3 is a gap in t2.
            assert_eq!(averager.pairwise_overlap("t1", "t2"), Some(1));
            assert_eq!(averager.pairwise_overlap("t2", "t1"), Some(1));
            assert_eq!(averager.sum_of_pairs_overlap(), 1);
            assert_eq!(averager.pairwise_overlap("t1", "x"), None);
        }
    }

    mod statistics {
        use super::*;

        fn counted_averager() -> GraphAverager<MultipleAlignment> {
            let sequence = "ACDEFGHIK";
            let set = templates(vec![
                ("t1", rig(sequence, "Ca", &[(1, 5)])),
                ("t2", rig(sequence, "Ca", &[(1, 5), (2, 6), (3, 7)])),
                ("t3", rig(sequence, "Ca", &[(1, 5), (2, 6), (3, 7), (4, 8)])),
                (
                    "t4",
                    rig(
                        sequence,
                        "Ca",
                        &[(1, 5), (2, 6), (3, 7), (4, 8), (5, 9), (1, 9)],
                    ),
                ),
            ]);
            GraphAverager::with_identity_alignment("target", sequence, set).unwrap()
        }

        #[test]
        fn contact_counts_summarize_templates() {
            let averager = counted_averager();
            assert_eq!(averager.template_contact_counts(), vec![1, 3, 4, 6]);
            assert_eq!(averager.avg_num_contacts(), 3.5);
            assert_eq!(averager.median_num_contacts(), 4);
            assert_eq!(averager.min_num_contacts(), 1);
            assert_eq!(averager.max_num_contacts(), 6);
        }

        #[test]
        fn quantiles_clamp_to_the_template_range() {
            let averager = counted_averager();
            assert_eq!(averager.quantile_num_contacts(0.25), 3);
            assert_eq!(averager.quantile_num_contacts(0.5), 4);
            assert_eq!(averager.quantile_num_contacts(1.0), 6);
            assert_eq!(averager.quantile_num_contacts(-1.0), 1);
            assert_eq!(averager.quantile_num_contacts(7.0), 6);
        }

        #[test]
        fn parent_frequencies_are_sorted_by_count() {
            let with_parents = |parents: &[&str]| {
                let metadata =
                    GraphMetadata::new("ACD", "Ca", 8.0).with_parents(parents.iter().copied());
                ResidueGraphBuilder::new(metadata).build()
            };
            let set = templates(vec![
                ("t1", with_parents(&["2xyzB", "1abcA"])),
                ("t2", with_parents(&["1abcA"])),
                ("t3", with_parents(&[])),
            ]);
            let averager = GraphAverager::with_identity_alignment("target", "ACD", set).unwrap();
            assert_eq!(
                averager.parent_frequencies(),
                vec![("1abcA".to_string(), 2), ("2xyzB".to_string(), 1)]
            );
        }

        #[test]
        fn target_votes_are_keyed_by_target_residues() {
            let averager = gapped_averager();
            let keys: Vec<(usize, usize)> = averager.target_votes().into_keys().collect();
            // Column 2 is the target gap; columns 3 and 4 are residues 3 and 4.
            assert_eq!(keys, vec![(1, 3), (1, 4), (2, 4)]);
        }
    }
}

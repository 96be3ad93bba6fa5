use crate::engine::averaging::alignment::SequenceAlignment;
use crate::engine::averaging::averager::GraphAverager;
use crate::engine::config::ConsensusConfig;
use crate::engine::error::EngineError;
use crate::engine::graph::residue::ResidueGraph;
use crate::engine::progress::{Phase, ProgressReporter};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Builds the consensus residue graph of a target sequence from aligned templates.
///
/// # Arguments
///
/// * `alignment` - Alignment of the target and every template.
/// * `templates` - Template residue graphs keyed by alignment tag.
/// * `target_tag` - Tag of the target row in the alignment.
/// * `target_sequence` - The ungapped target sequence.
/// * `config` - Consensus settings.
/// * `reporter` - Receives phase events.
///
/// # Return
///
/// A new graph of the target sequence holding every contact whose vote count
/// reaches `ceil(templates × threshold)`.
///
/// # Errors
///
/// Returns [`EngineError::Averaging`] if the alignment and templates are
/// inconsistent or the threshold is out of range.
#[instrument(skip_all, name = "consensus_workflow")]
pub fn run<A: SequenceAlignment + Sync>(
    alignment: A,
    templates: BTreeMap<String, ResidueGraph>,
    target_tag: &str,
    target_sequence: &str,
    config: &ConsensusConfig,
    reporter: &ProgressReporter,
) -> Result<ResidueGraph, EngineError> {
    info!(
        num_templates = templates.len(),
        target = target_tag,
        "Counting template votes."
    );
    let averager = reporter.phase(Phase::VoteCounting, || {
        GraphAverager::new(alignment, templates, target_tag, target_sequence)
    })?;

    let graph = reporter.phase(Phase::Consensus, || averager.consensus(config.threshold))?;
    info!(
        threshold = config.threshold,
        min_votes = averager.min_votes(config.threshold)?,
        voted_pairs = averager.votes().len(),
        num_edges = graph.edge_count(),
        "Consensus graph built."
    );

    Ok(graph)
}

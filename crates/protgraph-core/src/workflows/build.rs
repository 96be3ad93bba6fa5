use crate::core::contact_types::registry::ContactTypeRegistry;
use crate::core::contact_types::selector::{ContactSelector, ContactTypeError};
use crate::core::models::chain::ProteinChain;
use crate::engine::config::GraphConfig;
use crate::engine::error::EngineError;
use crate::engine::graph::atom::AtomGraph;
use crate::engine::graph::residue::ResidueGraph;
use crate::engine::progress::{Phase, ProgressReporter};
use crate::engine::tasks;
use tracing::{info, instrument};

/// Builds the atom interaction graph of a chain for every part of `selector`.
///
/// Parts are searched independently and merged; the merged graph carries the
/// full selector as its contact type.
///
/// # Errors
///
/// Returns [`EngineError`] if the cutoff is invalid, a coordinate is not finite
/// or the per-part graphs cannot be merged.
#[instrument(skip_all, name = "atom_graph_workflow")]
pub fn atom_graph(
    chain: &ProteinChain,
    registry: &ContactTypeRegistry,
    selector: &ContactSelector,
    cutoff: f64,
    reporter: &ProgressReporter,
) -> Result<AtomGraph, EngineError> {
    info!(
        contact_type = selector.as_str(),
        cutoff,
        num_parts = selector.parts().len(),
        "Building atom interaction graph."
    );

    reporter.phase(Phase::AtomContacts, || -> Result<AtomGraph, EngineError> {
        let mut merged: Option<AtomGraph> = None;
        for part in selector.parts() {
            let graph = tasks::atom_contacts::run(chain, registry, part, cutoff, reporter)?;
            merged = Some(match merged {
                None => graph,
                Some(previous) => previous.union(&graph)?,
            });
        }
        let mut graph = merged.ok_or_else(|| {
            EngineError::Internal(format!("Contact type '{}' has no parts", selector.as_str()))
        })?;
        graph.set_contact_type(selector.as_str())?;
        Ok(graph)
    })
}

/// Builds the residue interaction graph of a chain.
///
/// The contact type is parsed against `registry`, the atom graph is built and
/// collapsed, and the result is stamped with the contact type and cutoff.
///
/// # Errors
///
/// Returns [`EngineError::ContactType`] for invalid contact types, including
/// crossed types whose sides share atoms, before any search is done.
#[instrument(skip_all, name = "residue_graph_workflow")]
pub fn residue_graph(
    chain: &ProteinChain,
    registry: &ContactTypeRegistry,
    config: &GraphConfig,
    reporter: &ProgressReporter,
) -> Result<ResidueGraph, EngineError> {
    let selector = ContactSelector::parse(registry, &config.contact_type)?;
    if selector.is_crossed() && registry.is_overlapping(&selector) {
        return Err(ContactTypeError::DirectedOverlapping(selector.as_str().to_string()).into());
    }

    let atoms = atom_graph(chain, registry, &selector, config.cutoff, reporter)?;

    reporter.phase(Phase::Collapse, || -> Result<ResidueGraph, EngineError> {
        let mut graph = atoms.collapse();
        graph.set_contact_type(selector.as_str())?;
        graph.set_cutoff(config.cutoff);
        info!(
            num_residues = graph.observed_len(),
            num_edges = graph.edge_count(),
            "Residue graph collapsed."
        );
        Ok(graph)
    })
}

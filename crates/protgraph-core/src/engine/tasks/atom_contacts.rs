use crate::core::contact_types::registry::ContactTypeRegistry;
use crate::core::contact_types::selector::ContactPart;
use crate::core::models::chain::ProteinChain;
use crate::core::spatial::grid::SpatialGrid;
use crate::engine::error::EngineError;
use crate::engine::graph::atom::{AtomEdge, AtomGraph, AtomNode};
use crate::engine::graph::labeled::GraphMetadata;
use crate::engine::graph::residue::ResidueNode;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use tracing::{debug, info, instrument};

/// Atoms of one contact type, in ascending serial order, with their positions.
struct Selection {
    nodes: Vec<AtomNode>,
    points: Vec<Point3<f64>>,
}

fn select_atoms(
    chain: &ProteinChain,
    registry: &ContactTypeRegistry,
    contact_type: &str,
) -> Result<Selection, EngineError> {
    let ids = chain.atoms_for_contact_type(registry, contact_type);
    let mut nodes = Vec::with_capacity(ids.len());
    let mut points = Vec::with_capacity(ids.len());
    for id in ids {
        let atom = chain
            .atom(id)
            .ok_or_else(|| EngineError::Internal(format!("Atom {id:?} vanished from chain")))?;
        let residue = chain.residue(atom.residue_id).ok_or_else(|| {
            EngineError::Internal(format!("Atom {} has no parent residue", atom.serial))
        })?;
        nodes.push(AtomNode {
            serial: atom.serial,
            name: atom.name.clone(),
            residue: ResidueNode::observed(
                residue.serial,
                residue.residue_type,
                residue.secondary_structure,
            ),
        });
        points.push(atom.position);
    }
    Ok(Selection { nodes, points })
}

/// Builds the atom interaction graph of a single contact-type part.
///
/// Every selected atom becomes a node, contacting or not. A plain part yields
/// undirected edges between atoms of its type. A crossed part `X/Y` yields
/// directed edges from `X` atoms to `Y` atoms; an atom selected by both sides
/// never contacts itself, and a pair found twice is added once.
///
/// # Errors
///
/// Returns [`EngineError::Grid`] for an invalid cutoff or non-finite coordinates.
#[instrument(skip_all, name = "atom_contacts_task")]
pub fn run(
    chain: &ProteinChain,
    registry: &ContactTypeRegistry,
    part: &ContactPart,
    cutoff: f64,
    reporter: &ProgressReporter,
) -> Result<AtomGraph, EngineError> {
    let grid = SpatialGrid::new(cutoff)?;
    let label = part.to_string();
    info!(contact_type = %label, cutoff, "Searching atom contacts.");

    let mut graph = AtomGraph::new(GraphMetadata::for_chain(chain, &label, cutoff));

    let contacts: Vec<(usize, usize, f64)> = match part {
        ContactPart::Single(name) => {
            let selection = select_atoms(chain, registry, name)?;
            let pairs = grid.within_cutoff(grid.pairs(&selection.points)?);
            let contacts: Vec<(usize, usize, f64)> = pairs
                .iter()
                .map(|p| {
                    (
                        selection.nodes[p.i].serial,
                        selection.nodes[p.j].serial,
                        p.distance,
                    )
                })
                .collect();
            for node in selection.nodes {
                graph.add_atom(node);
            }
            contacts
        }
        ContactPart::Crossed { i, j } => {
            let first = select_atoms(chain, registry, i)?;
            let second = select_atoms(chain, registry, j)?;
            let pairs = grid.within_cutoff(grid.crossed_pairs(&first.points, &second.points)?);
            let contacts: Vec<(usize, usize, f64)> = pairs
                .iter()
                .map(|p| {
                    (
                        first.nodes[p.i].serial,
                        second.nodes[p.j].serial,
                        p.distance,
                    )
                })
                .filter(|&(a, b, _)| a != b)
                .collect();
            for node in first.nodes.into_iter().chain(second.nodes) {
                graph.add_atom(node);
            }
            contacts
        }
    };

    reporter.report(Progress::PartStart {
        part: label.clone(),
        candidate_pairs: contacts.len() as u64,
    });
    let mut duplicates = 0usize;
    for (a, b, distance) in contacts {
        if !graph.add_edge(a, b, AtomEdge { distance })? {
            duplicates += 1;
        }
        reporter.report(Progress::PairProcessed);
    }
    reporter.report(Progress::PartFinish {
        part: label,
        contacts: graph.edge_count(),
    });

    if duplicates > 0 {
        debug!(duplicates, "Skipped atom pairs found more than once.");
    }
    info!(
        num_atoms = graph.node_count(),
        num_contacts = graph.edge_count(),
        "Atom contact search complete."
    );
    Ok(graph)
}

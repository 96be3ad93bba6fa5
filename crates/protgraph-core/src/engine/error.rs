use thiserror::Error;

use super::averaging::alignment::AlignmentError;
use super::averaging::averager::AveragingError;
use super::config::ConfigError;
use super::contact_map::map::ContactMapError;
use super::graph::labeled::GraphError;
use crate::core::contact_types::registry::ContactTypeLoadError;
use crate::core::contact_types::selector::ContactTypeError;
use crate::core::io::report::ReportError;
use crate::core::io::rig_file::RigFileError;
use crate::core::models::chain::ChainError;
use crate::core::spatial::grid::GridError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid contact type: {source}")]
    ContactType {
        #[from]
        source: ContactTypeError,
    },

    #[error("Contact type dictionary could not be loaded: {source}")]
    ContactTypeLoad {
        #[from]
        source: ContactTypeLoadError,
    },

    #[error("Spatial search failed: {source}")]
    Grid {
        #[from]
        source: GridError,
    },

    #[error("Inconsistent chain: {source}")]
    Chain {
        #[from]
        source: ChainError,
    },

    #[error("Graph operation failed: {source}")]
    Graph {
        #[from]
        source: GraphError,
    },

    #[error("Contact map operation failed: {source}")]
    ContactMap {
        #[from]
        source: ContactMapError,
    },

    #[error("Invalid alignment: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Graph averaging failed: {source}")]
    Averaging {
        #[from]
        source: AveragingError,
    },

    #[error("Graph file error: {source}")]
    RigFile {
        #[from]
        source: RigFileError,
    },

    #[error("Report error: {source}")]
    Report {
        #[from]
        source: ReportError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

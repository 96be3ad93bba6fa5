use crate::core::io::traits::GraphFile;
use crate::engine::graph::builder::ResidueGraphBuilder;
use crate::engine::graph::labeled::{GraphError, GraphMetadata};
use crate::engine::graph::residue::{ResidueEdge, ResidueGraph};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// The only graph file version this reader accepts and the one it writes.
pub const GRAPH_FILE_VERSION: &str = "1.0";

const FORMAT_TAGS: [&str; 3] = ["AGLAPPE", "CMVIEW", "OWL"];
const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Error)]
pub enum RigFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not a graph file: the first line must be a #CMVIEW, #OWL or #AGLAPPE header")]
    NotAGraphFile,
    #[error("Unsupported graph file version '{found}' (supported: {})", GRAPH_FILE_VERSION)]
    UnsupportedVersion { found: String },
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: RigParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(&'static str),
    #[error("Residue serial {serial} on line {line} exceeds the sequence length {length}")]
    SerialOutOfRange {
        line: usize,
        serial: usize,
        length: usize,
    },
    #[error("Invalid contact on line {line}: {source}")]
    Graph { line: usize, source: GraphError },
}

#[derive(Debug, Error)]
pub enum RigParseErrorKind {
    #[error("Expected 'i j [weight]' (got '{0}')")]
    InvalidEdgeLine(String),
    #[error("Invalid residue serial '{0}'")]
    InvalidSerial(String),
    #[error("Invalid weight '{0}'")]
    InvalidWeight(String),
    #[error("Invalid {field} value '{value}'")]
    InvalidHeaderValue { field: &'static str, value: String },
}

/// A parsed `i j [weight]` line.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeLine {
    line: usize,
    i: usize,
    j: usize,
    weight: f64,
}

#[derive(Debug, Default)]
struct Header {
    sequence: Option<String>,
    structure_id: String,
    pdb_chain_code: String,
    chain_code: String,
    model: Option<usize>,
    contact_type: String,
    cutoff: f64,
}

/// The CMView residue-graph edge-list format.
///
/// ```text
/// #CMVIEW GRAPH FILE ver: 1.0
/// #SEQUENCE: MKVL...
/// #PDB: 1abc
/// #PDB CHAIN CODE: A
/// #CHAIN: A
/// #MODEL: 1
/// #CT: Ca
/// #CUTOFF: 8.0
/// 1	5	 1.000
/// ```
///
/// Edges are written ascending with the edge weight in the third column.
pub struct RigFile;

impl GraphFile for RigFile {
    type Graph = ResidueGraph;
    type Error = RigFileError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Graph, Self::Error> {
        let mut header = Header::default();
        let mut edges = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_no = line_num + 1;
            let trimmed = line.trim();

            if line_no == 1 {
                check_format_line(trimmed)?;
                continue;
            }
            if let Some(record) = trimmed.strip_prefix('#') {
                parse_header_record(record, line_no, &mut header)?;
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            edges.push(parse_edge_line(trimmed, line_no)?);
        }

        let sequence = header
            .sequence
            .take()
            .ok_or(RigFileError::MissingRecord("#SEQUENCE"))?;
        let mut metadata = GraphMetadata::new(&sequence, &header.contact_type, header.cutoff)
            .with_structure(&header.structure_id, &header.chain_code);
        metadata.pdb_chain_code = header.pdb_chain_code;
        if let Some(model) = header.model {
            metadata.model = model;
        }
        build_graph(metadata, &edges)
    }

    fn write_to(graph: &Self::Graph, writer: &mut impl Write) -> Result<(), Self::Error> {
        let metadata = graph.metadata();
        writeln!(writer, "#CMVIEW GRAPH FILE ver: {}", GRAPH_FILE_VERSION)?;
        writeln!(writer, "#SEQUENCE: {}", metadata.sequence())?;
        writeln!(writer, "#PDB: {}", metadata.structure_id)?;
        writeln!(writer, "#PDB CHAIN CODE: {}", metadata.pdb_chain_code)?;
        writeln!(writer, "#CHAIN: {}", metadata.chain_code)?;
        writeln!(writer, "#MODEL: {}", metadata.model)?;
        writeln!(writer, "#CT: {}", metadata.contact_type())?;
        writeln!(writer, "#CUTOFF: {}", format_cutoff(metadata.cutoff))?;
        for ((i, j), edge) in graph.edges() {
            writeln!(writer, "{}\t{}\t{:6.3}", i, j, edge.weight)?;
        }
        Ok(())
    }
}

impl RigFile {
    /// Reads a bare `i j [weight]` list without a header.
    ///
    /// The sequence is unknown, so it is filled with `X` up to the largest serial
    /// and every node is unobserved. Blank lines and `#` comments are skipped.
    pub fn read_simple(reader: &mut impl BufRead) -> Result<ResidueGraph, RigFileError> {
        let mut edges = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            edges.push(parse_edge_line(trimmed, line_num + 1)?);
        }
        let length = edges.iter().map(|e| e.i.max(e.j)).max().unwrap_or(0);
        let sequence = "X".repeat(length);
        build_graph(GraphMetadata::new(&sequence, "", 0.0), &edges)
    }
}

fn check_format_line(line: &str) -> Result<(), RigFileError> {
    let tagged = line
        .strip_prefix('#')
        .is_some_and(|rest| FORMAT_TAGS.iter().any(|tag| rest.starts_with(tag)));
    let version = line
        .split_once("ver:")
        .and_then(|(_, rest)| rest.split_whitespace().next());
    match (tagged, version) {
        (true, Some(GRAPH_FILE_VERSION)) => Ok(()),
        (true, Some(found)) => Err(RigFileError::UnsupportedVersion {
            found: found.to_string(),
        }),
        _ => Err(RigFileError::NotAGraphFile),
    }
}

fn parse_header_record(record: &str, line: usize, header: &mut Header) -> Result<(), RigFileError> {
    let Some((key, value)) = record.split_once(':') else {
        return Ok(());
    };
    let value = value.trim();
    let invalid = |field: &'static str| RigFileError::Parse {
        line,
        kind: RigParseErrorKind::InvalidHeaderValue {
            field,
            value: value.to_string(),
        },
    };
    match key.trim() {
        "SEQUENCE" if !value.is_empty() => header.sequence = Some(value.to_string()),
        "PDB" => header.structure_id = value.to_string(),
        "PDB CHAIN CODE" => header.pdb_chain_code = value.to_string(),
        "CHAIN" => header.chain_code = value.to_string(),
        "MODEL" => header.model = Some(value.parse().map_err(|_| invalid("#MODEL"))?),
        "CT" => header.contact_type = value.to_string(),
        "CUTOFF" => header.cutoff = value.parse().map_err(|_| invalid("#CUTOFF"))?,
        _ => {}
    }
    Ok(())
}

fn parse_edge_line(line: &str, line_no: usize) -> Result<EdgeLine, RigFileError> {
    let parse_error = |kind| RigFileError::Parse {
        line: line_no,
        kind,
    };
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (i, j, weight) = match fields.as_slice() {
        [i, j] => (*i, *j, None),
        [i, j, w] => (*i, *j, Some(*w)),
        _ => {
            return Err(parse_error(RigParseErrorKind::InvalidEdgeLine(
                line.to_string(),
            )));
        }
    };
    let serial = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| parse_error(RigParseErrorKind::InvalidSerial(s.to_string())))
    };
    let weight = match weight {
        Some(w) => w
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| parse_error(RigParseErrorKind::InvalidWeight(w.to_string())))?,
        None => DEFAULT_WEIGHT,
    };
    Ok(EdgeLine {
        line: line_no,
        i: serial(i)?,
        j: serial(j)?,
        weight,
    })
}

fn build_graph(metadata: GraphMetadata, edges: &[EdgeLine]) -> Result<ResidueGraph, RigFileError> {
    let length = metadata.full_len();
    let mut builder = ResidueGraphBuilder::new(metadata);
    for edge in edges {
        if let Some(&serial) = [edge.i, edge.j].iter().find(|&&s| s > length) {
            return Err(RigFileError::SerialOutOfRange {
                line: edge.line,
                serial,
                length,
            });
        }
        builder
            .add_edge(edge.i, edge.j, ResidueEdge::with_weight(edge.weight))
            .map_err(|source| RigFileError::Graph {
                line: edge.line,
                source,
            })?;
    }
    Ok(builder.build())
}

/// Cutoffs are always written with a decimal point, e.g. `8.0`.
fn format_cutoff(cutoff: f64) -> String {
    if cutoff.fract() == 0.0 {
        format!("{:.1}", cutoff)
    } else {
        cutoff.to_string()
    }
}

use crate::engine::averaging::alignment::SequenceAlignment;
use crate::engine::averaging::averager::GraphAverager;
use crate::engine::graph::eval::PredictionEval;
use crate::engine::graph::residue::ResidueGraph;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV writing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct EvaluationRow<'a> {
    title: &'a str,
    orig: usize,
    pred: usize,
    #[serde(rename = "TP")]
    true_positives: usize,
    #[serde(rename = "TN")]
    true_negatives: usize,
    #[serde(rename = "FP")]
    false_positives: usize,
    #[serde(rename = "FN")]
    false_negatives: usize,
    #[serde(rename = "Sens")]
    sensitivity: String,
    #[serde(rename = "Spec")]
    specificity: String,
    #[serde(rename = "Acc")]
    accuracy: String,
    #[serde(rename = "Cov")]
    coverage: String,
}

impl<'a> From<&'a PredictionEval> for EvaluationRow<'a> {
    fn from(eval: &'a PredictionEval) -> Self {
        Self {
            title: &eval.title,
            orig: eval.original,
            pred: eval.predicted,
            true_positives: eval.true_positives,
            true_negatives: eval.true_negatives,
            false_positives: eval.false_positives,
            false_negatives: eval.false_negatives,
            sensitivity: format!("{:.2}", eval.sensitivity),
            specificity: format!("{:.2}", eval.specificity),
            accuracy: format!("{:.2}", eval.accuracy),
            coverage: format!("{:.2}", eval.coverage),
        }
    }
}

#[derive(Serialize)]
struct EdgeRow {
    i: usize,
    j: usize,
    weight: String,
    atom_weight: usize,
    distance: String,
}

fn tab_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

/// Writes one tab-separated row per evaluation, rates rounded to two decimals.
///
/// # Errors
///
/// Returns [`ReportError`] if a row cannot be serialized or written.
pub fn write_evaluation_table<'a, W: Write>(
    rows: impl IntoIterator<Item = &'a PredictionEval>,
    writer: W,
) -> Result<(), ReportError> {
    let mut csv = tab_writer(writer);
    for eval in rows {
        csv.serialize(EvaluationRow::from(eval))?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the edges of a residue graph in ascending order. Edges without a
/// recorded distance get an empty `distance` cell.
pub fn write_edge_table<W: Write>(graph: &ResidueGraph, writer: W) -> Result<(), ReportError> {
    let mut csv = tab_writer(writer);
    for ((i, j), edge) in graph.edges() {
        csv.serialize(EdgeRow {
            i,
            j,
            weight: format!("{:.3}", edge.weight),
            atom_weight: edge.atom_weight,
            distance: edge.distance.map(|d| format!("{:.3}", d)).unwrap_or_default(),
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the average graph of `averager` with one `0`/`1` column per template
/// marking whether it voted for the contact. Rows are ascending by residue pair.
pub fn write_voter_table<A, W>(averager: &GraphAverager<A>, writer: W) -> Result<(), ReportError>
where
    A: SequenceAlignment + Sync,
    W: Write,
{
    let tags: Vec<&str> = averager.template_tags().collect();
    let templates = tags.len() as f64;
    let mut csv = tab_writer(writer);

    let mut header = vec!["i", "j", "weight"];
    header.extend(&tags);
    csv.write_record(&header)?;

    for ((i, j), vote) in averager.target_votes() {
        let mut record = vec![
            i.to_string(),
            j.to_string(),
            format!("{:.3}", vote.count as f64 / templates),
        ];
        record.extend(
            tags.iter()
                .map(|&tag| u8::from(vote.voters.contains(tag)).to_string()),
        );
        csv.write_record(&record)?;
    }
    csv.flush()?;
    Ok(())
}

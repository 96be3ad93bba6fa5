//! # Graph Averaging
//!
//! Builds a consensus residue graph for a target sequence from several template
//! graphs and a multiple alignment holding the target and every template.
//!
//! - [`alignment`] - The [`alignment::SequenceAlignment`] access trait and an
//!   in-memory [`alignment::MultipleAlignment`]
//! - [`averager`] - [`averager::GraphAverager`]: vote counting, consensus and
//!   average graphs, and template consensus scores
//!
//! Each template votes for the alignment-column pair of every contact it has.
//! A column pair enters the consensus when its vote count reaches
//! `ceil(templates × threshold)` and neither column is a gap in the target row.

pub mod alignment;
pub mod averager;

//! Provides input/output for residue interaction graphs and analysis reports.
//!
//! Graph files share a trait-based interface so that every format offers the same
//! reader/writer and path-based entry points. Reports are tab-separated tables
//! meant for spreadsheets and downstream scripts.

pub mod report;
pub mod rig_file;
pub mod traits;

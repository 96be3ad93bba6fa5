//! # Workflows Module
//!
//! High-level entry points that tie the core models and the engine together.
//!
//! ## Architecture
//!
//! - **Graph Building** ([`build`]) - From a chain and a contact type to an atom or
//!   residue interaction graph
//! - **Consensus** ([`consensus`]) - From aligned template graphs to a consensus
//!   graph for a target sequence
//!
//! Every workflow validates its inputs before computing anything, reports phase
//! boundaries through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and returns [`EngineError`](crate::engine::error::EngineError) on failure.

pub mod build;
pub mod consensus;

//! # Engine Module
//!
//! The analysis engine of protgraph: interaction graphs, contact maps and
//! consensus building, together with the configuration, error and progress
//! plumbing shared by the workflows.
//!
//! ## Architecture
//!
//! - **Graphs** ([`graph`]) - The generic labeled graph, atom and residue graphs,
//!   collapsing and prediction evaluation
//! - **Contact Maps** ([`contact_map`]) - Dense residue contact maps with a
//!   common-neighbour cache
//! - **Graph Averaging** ([`averaging`]) - Alignment-driven consensus of template graphs
//! - **Tasks** ([`tasks`]) - Spatial atom-contact search for one contact-type part
//! - **Configuration** ([`config`]) - Graph and consensus settings, with TOML loading
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - [`error::EngineError`], aggregating every failure
//!
//! ## Key Capabilities
//!
//! - **Parallel computation** of the grid scan, the common-neighbour cache and
//!   vote counting behind the `parallel` feature, with identical results either way
//! - **Value semantics** for every graph and contact-map combination
//! - **Typed failures** for inconsistent inputs instead of silent coercion

pub mod averaging;
pub mod config;
pub mod contact_map;
pub mod error;
pub mod graph;
pub mod progress;
pub mod tasks;

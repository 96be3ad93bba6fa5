//! Computational units run by the workflows.
//!
//! Each task performs one well-defined step, reports progress through the
//! caller's reporter and returns a new value without touching its inputs.

pub mod atom_contacts;

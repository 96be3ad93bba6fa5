//! # Contact Maps
//!
//! A dense, full-length view of residue contacts with a derived cache of common
//! neighbours for every residue pair.
//!
//! - [`state`] - The three-valued cell state (contact, non-contact, skipped)
//! - [`neighborhood`] - The common-neighbour cache and its (optionally parallel) computation
//! - [`map`] - [`map::ContactMap`] itself: queries, incremental updates and set algebra
//!
//! The cache is always derivable from the matrix. It is built eagerly on
//! construction and after every set-algebra operation; the only in-place change,
//! [`map::ContactMap::assert_contact`], patches the entries that the new contact can
//! affect.

pub mod map;
pub mod neighborhood;
pub mod state;

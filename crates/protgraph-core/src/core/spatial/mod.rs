//! # Spatial Module
//!
//! Near-linear neighbour search for 3-D points.
//!
//! The [`grid::SpatialGrid`] buckets points into cubic cells whose edge equals the
//! distance cutoff, so any two points within the cutoff sit in the same or in
//! adjacent cells. Only those cell pairs are examined, which avoids evaluating
//! all O(n²) distances for compact structures such as proteins.

pub mod grid;

use itertools::{Itertools, iproduct};
use nalgebra::Point3;
use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Coordinates are bucketed in hundredths of an Angstrom.
const SCALE: f64 = 100.0;

type CellKey = (i64, i64, i64);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Distance cutoff must be a finite positive number (got {0})")]
    InvalidCutoff(f64),
    #[error("Point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// A point pair found in the same or adjacent grid cells.
///
/// `distance` may exceed the cutoff; use [`SpatialGrid::within_cutoff`] to filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
}

/// Uniform grid with cell edge equal to the distance cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialGrid {
    cutoff: f64,
    cell_size: i64,
}

impl SpatialGrid {
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCutoff`] for zero, negative or non-finite cutoffs.
    pub fn new(cutoff: f64) -> Result<Self, GridError> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(GridError::InvalidCutoff(cutoff));
        }
        // Rounded up so that two points within the cutoff can never land in cells
        // two apart after flooring to integer coordinates.
        let cell_size = ((cutoff * SCALE).ceil() as i64).max(1);
        Ok(Self { cutoff, cell_size })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Candidate pairs `i < j` among a single point set.
    ///
    /// Every pair within the cutoff is guaranteed to be present. Output is sorted
    /// ascending by `(i, j)` and independent of thread scheduling.
    pub fn pairs(&self, points: &[Point3<f64>]) -> Result<Vec<CandidatePair>, GridError> {
        let cells = self.bucket(points, 0)?;
        let keys: Vec<&CellKey> = cells.keys().collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = keys.iter();

        #[cfg(feature = "parallel")]
        let iterator = keys.par_iter();

        let per_cell: Vec<Vec<CandidatePair>> = iterator
            .map(|&key| {
                let mut found = Vec::new();
                let members = &cells[key];
                for neighbor_key in neighbor_keys(key) {
                    // Each unordered cell pair is handled from its smaller key.
                    if neighbor_key < *key {
                        continue;
                    }
                    if neighbor_key == *key {
                        for (&p, &q) in members.iter().tuple_combinations() {
                            found.push(candidate(points, points, p.min(q), p.max(q)));
                        }
                    } else if let Some(others) = cells.get(&neighbor_key) {
                        for (&p, &q) in iproduct!(members.iter(), others.iter()) {
                            found.push(candidate(points, points, p.min(q), p.max(q)));
                        }
                    }
                }
                found
            })
            .collect();

        Ok(sorted(per_cell))
    }

    /// Candidate ordered pairs `(i, j)` with `i` indexing `i_points` and `j`
    /// indexing `j_points`. Used for crossed contact types.
    pub fn crossed_pairs(
        &self,
        i_points: &[Point3<f64>],
        j_points: &[Point3<f64>],
    ) -> Result<Vec<CandidatePair>, GridError> {
        let i_cells = self.bucket(i_points, 0)?;
        let j_cells = self.bucket(j_points, i_points.len())?;
        let keys: Vec<&CellKey> = i_cells.keys().collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = keys.iter();

        #[cfg(feature = "parallel")]
        let iterator = keys.par_iter();

        let per_cell: Vec<Vec<CandidatePair>> = iterator
            .map(|&key| {
                let mut found = Vec::new();
                let members = &i_cells[key];
                for neighbor_key in neighbor_keys(key) {
                    if let Some(others) = j_cells.get(&neighbor_key) {
                        for (&p, &q) in iproduct!(members.iter(), others.iter()) {
                            found.push(candidate(i_points, j_points, p, q));
                        }
                    }
                }
                found
            })
            .collect();

        Ok(sorted(per_cell))
    }

    /// Keeps only candidates at or below the cutoff.
    pub fn within_cutoff(&self, candidates: Vec<CandidatePair>) -> Vec<CandidatePair> {
        candidates
            .into_iter()
            .filter(|pair| pair.distance <= self.cutoff)
            .collect()
    }

    fn cell_of(&self, point: &Point3<f64>) -> CellKey {
        let index = |coord: f64| ((coord * SCALE).floor() as i64).div_euclid(self.cell_size);
        (index(point.x), index(point.y), index(point.z))
    }

    fn bucket(
        &self,
        points: &[Point3<f64>],
        index_offset: usize,
    ) -> Result<BTreeMap<CellKey, Vec<usize>>, GridError> {
        let mut cells: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
        for (index, point) in points.iter().enumerate() {
            if !point.coords.iter().all(|c| c.is_finite()) {
                return Err(GridError::NonFiniteCoordinate {
                    index: index + index_offset,
                });
            }
            cells.entry(self.cell_of(point)).or_default().push(index);
        }
        Ok(cells)
    }
}

fn neighbor_keys(key: &CellKey) -> impl Iterator<Item = CellKey> + '_ {
    iproduct!(-1..=1i64, -1..=1i64, -1..=1i64)
        .map(move |(dx, dy, dz)| (key.0 + dx, key.1 + dy, key.2 + dz))
}

fn candidate(
    i_points: &[Point3<f64>],
    j_points: &[Point3<f64>],
    i: usize,
    j: usize,
) -> CandidatePair {
    CandidatePair {
        i,
        j,
        distance: nalgebra::distance(&i_points[i], &j_points[j]),
    }
}

fn sorted(per_cell: Vec<Vec<CandidatePair>>) -> Vec<CandidatePair> {
    let mut all: Vec<CandidatePair> = per_cell.into_iter().flatten().collect();
    all.sort_unstable_by_key(|pair| (pair.i, pair.j));
    all
}

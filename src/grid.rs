//! Reshapes a flat frame into a regular 2D concentration lattice.
//!
//! A frame only reshapes when it covers the whole `size × size` lattice with
//! exactly one receptor per cell. Partial or duplicated frames are rejected
//! as they are; nothing is filled in or dropped.

use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;

use crate::frames::Sample;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("expected {expected} distinct {axis} values, found {found}")]
    AxisLength {
        axis: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("expected {expected} samples, found {found}")]
    SampleCount { expected: usize, found: usize },
    #[error("more than one sample at x={x}, y={y}")]
    DuplicateCell { x: f64, y: f64 },
}

/// Concentrations on a regular lattice. `values` is row-major with rows
/// following ascending `y` and columns ascending `x`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcentrationGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: Vec<f64>,
}

fn distinct_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

fn by_row(a: &Sample, b: &Sample) -> Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

impl ConcentrationGrid {
    /// Builds the lattice from one frame's samples, sorted by `(y, x)`.
    ///
    /// # Errors
    ///
    /// Returns a [`GridError`] when the frame does not cover exactly
    /// `size × size` distinct cells.
    pub fn from_samples(samples: &[Sample], size: usize) -> Result<Self, GridError> {
        let x = distinct_sorted(samples.iter().map(|s| s.x));
        let y = distinct_sorted(samples.iter().map(|s| s.y));

        if x.len() != size {
            return Err(GridError::AxisLength {
                axis: "x",
                expected: size,
                found: x.len(),
            });
        }
        if y.len() != size {
            return Err(GridError::AxisLength {
                axis: "y",
                expected: size,
                found: y.len(),
            });
        }

        let mut sorted: Vec<&Sample> = samples.iter().collect();
        sorted.sort_by(|a, b| by_row(a, b));

        if let Some(pair) = sorted.windows(2).find(|w| by_row(w[0], w[1]) == Ordering::Equal) {
            return Err(GridError::DuplicateCell {
                x: pair[0].x,
                y: pair[0].y,
            });
        }
        if sorted.len() != size * size {
            return Err(GridError::SampleCount {
                expected: size * size,
                found: sorted.len(),
            });
        }

        Ok(ConcentrationGrid {
            x,
            y,
            values: sorted.iter().map(|s| s.concentration).collect(),
        })
    }

    pub fn size(&self) -> usize {
        self.x.len()
    }

    /// Values along row `i` (one y coordinate), or `None` past the last row.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.y.len() {
            return None;
        }
        let n = self.size();
        self.values.get(i * n..(i + 1) * n)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size().max(1))
    }

    /// Concentration at lattice cell (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.y.len() || col >= self.x.len() {
            return None;
        }
        self.values.get(row * self.size() + col).copied()
    }
}

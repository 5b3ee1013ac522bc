//! Data structure representing clusters of four neighboring tracer particles.
//!
//! Every cluster consists of a left, right, top and bottom particle around a
//! nominal seed point. The deformation of the cluster over time approximates
//! the local deformation gradient of the flow map without the need for a mesh.
// Move unit test into own file
#[cfg(test)]
#[path = "./particles_test.rs"]
mod particles_test;

use crate::errors::*;
use ndarray::{s, concatenate, Array2, ArrayView2, ArrayViewMut2, Axis};

/// Positions of `N` clusters of four neighboring particles.
///
/// The positions are stored packed in one array of shape `(4 * N, 2)`. The
/// first `N` rows are the left neighbors, followed by the right, top and
/// bottom neighbors. Deltas and centroid are computed from the current
/// positions on every access, so they can never go out of sync.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighboringParticles {
    positions: Array2<f64>,
    initial_delta_right_left: Array2<f64>,
    initial_delta_top_bottom: Array2<f64>,
    initial_centroid: Array2<f64>,
}

impl NeighboringParticles {
    /// Builds clusters from four arrays of shape `(N, 2)`.
    pub fn new<'a>(
        left: ArrayView2<'a, f64>,
        right: ArrayView2<'a, f64>,
        top: ArrayView2<'a, f64>,
        bottom: ArrayView2<'a, f64>,
    ) -> Result<NeighboringParticles> {
        let shape = left.dim();

        for (name, block) in [("right", &right), ("top", &top), ("bottom", &bottom)] {
            if block.dim() != shape {
                bail!(ErrorKind::InvalidParticles(format!(
                    "'{}' has shape {:?}, but 'left' has shape {:?}",
                    name,
                    block.dim(),
                    shape
                )));
            }
        }

        let positions = concatenate(Axis(0), &[left, right, top, bottom])
            .chain_err(|| "Cannot pack neighboring particles.")?;

        NeighboringParticles::from_packed(positions)
    }

    /// Builds clusters from a packed array of shape `(4 * N, 2)` in the order
    /// left, right, top, bottom.
    pub fn from_packed(positions: Array2<f64>) -> Result<NeighboringParticles> {
        let (rows, cols) = positions.dim();

        if cols != 2 {
            bail!(ErrorKind::InvalidParticles(format!(
                "positions must have shape (4*N, 2), got ({}, {})",
                rows, cols
            )));
        }

        if rows == 0 {
            bail!(ErrorKind::InvalidParticles(
                "at least one cluster is required".to_string()
            ));
        }

        if rows % 4 != 0 {
            bail!(ErrorKind::InvalidParticles(format!(
                "number of positions ({}) must be a multiple of 4",
                rows
            )));
        }

        let mut particles = NeighboringParticles {
            positions,
            initial_delta_right_left: Array2::zeros((0, 2)),
            initial_delta_top_bottom: Array2::zeros((0, 2)),
            initial_centroid: Array2::zeros((0, 2)),
        };

        particles.initial_delta_right_left = particles.delta_right_left();
        particles.initial_delta_top_bottom = particles.delta_top_bottom();
        particles.initial_centroid = particles.centroid();

        Ok(particles)
    }

    /// Number of clusters `N`.
    pub fn len(&self) -> usize {
        self.positions.nrows() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn block(&self, i: usize) -> ArrayView2<f64> {
        let n = self.len();
        self.positions.slice(s![i * n..(i + 1) * n, ..])
    }

    pub fn left(&self) -> ArrayView2<f64> {
        self.block(0)
    }

    pub fn right(&self) -> ArrayView2<f64> {
        self.block(1)
    }

    pub fn top(&self) -> ArrayView2<f64> {
        self.block(2)
    }

    pub fn bottom(&self) -> ArrayView2<f64> {
        self.block(3)
    }

    /// All positions, packed as `(4 * N, 2)`.
    pub fn positions(&self) -> ArrayView2<f64> {
        self.positions.view()
    }

    /// Mutable view on the packed positions. A view cannot change the shape,
    /// so the number of clusters stays fixed.
    pub fn positions_mut(&mut self) -> ArrayViewMut2<f64> {
        self.positions.view_mut()
    }

    pub fn delta_right_left(&self) -> Array2<f64> {
        &self.right() - &self.left()
    }

    pub fn delta_top_bottom(&self) -> Array2<f64> {
        &self.top() - &self.bottom()
    }

    /// Mean position of the four neighbors of every cluster.
    pub fn centroid(&self) -> Array2<f64> {
        let mut c = &self.left() + &self.right();
        c += &self.top();
        c += &self.bottom();
        c /= 4.;
        c
    }

    pub fn initial_delta_right_left(&self) -> ArrayView2<f64> {
        self.initial_delta_right_left.view()
    }

    pub fn initial_delta_top_bottom(&self) -> ArrayView2<f64> {
        self.initial_delta_top_bottom.view()
    }

    pub fn initial_centroid(&self) -> ArrayView2<f64> {
        self.initial_centroid.view()
    }
}

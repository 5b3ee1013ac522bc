use super::{source_points, InterpolationStrategy};
use crate::errors::*;
use ndarray::{Array2, ArrayView2};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Assigns every query point the velocity of the closest source point.
///
/// Defined everywhere and fast, but the resulting field is piecewise constant.
pub struct NearestNeighborInterpolator {
    tree: RTree<IndexedPoint>,
    velocities: Array2<f64>,
}

impl NearestNeighborInterpolator {
    pub fn new(coordinates: ArrayView2<f64>, velocities: ArrayView2<f64>) -> Result<Self> {
        let points = source_points(coordinates, velocities)?;

        let indexed = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new(p, i))
            .collect();

        Ok(NearestNeighborInterpolator {
            tree: RTree::bulk_load(indexed),
            velocities: velocities.to_owned(),
        })
    }
}

impl InterpolationStrategy for NearestNeighborInterpolator {
    fn interpolate(&self, points: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::from_elem((points.nrows(), 2), f64::NAN);

        for (p, mut o) in points.outer_iter().zip(out.outer_iter_mut()) {
            if !(p[0].is_finite() && p[1].is_finite()) {
                continue;
            }

            if let Some(nearest) = self.tree.nearest_neighbor(&[p[0], p[1]]) {
                o.assign(&self.velocities.row(nearest.data));
            }
        }

        out
    }
}

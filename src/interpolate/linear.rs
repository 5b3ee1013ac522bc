use super::triangulation::Triangulation;
use super::{source_points, InterpolationStrategy};
use crate::errors::*;
use ndarray::{Array2, ArrayView2};

/// Piecewise linear interpolation on the Delaunay triangulation of the
/// source points.
///
/// Cheaper than the cubic strategy, but the gradient of the field jumps across
/// triangle edges. Query points outside the convex hull yield NaN.
pub struct LinearInterpolator {
    tri: Triangulation,
    velocities: Array2<f64>,
}

impl LinearInterpolator {
    pub fn new(coordinates: ArrayView2<f64>, velocities: ArrayView2<f64>) -> Result<Self> {
        let points = source_points(coordinates, velocities)?;

        Ok(LinearInterpolator {
            tri: Triangulation::new(points),
            velocities: velocities.to_owned(),
        })
    }
}

impl InterpolationStrategy for LinearInterpolator {
    fn interpolate(&self, points: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::from_elem((points.nrows(), 2), f64::NAN);

        for (p, mut o) in points.outer_iter().zip(out.outer_iter_mut()) {
            if let Some((t, b)) = self.tri.find_triangle([p[0], p[1]]) {
                let vertices = self.tri.triangles()[t];
                for c in 0..2 {
                    o[c] = (0..3)
                        .map(|k| b[k] * self.velocities[[vertices[k], c]])
                        .sum();
                }
            }
        }

        out
    }
}

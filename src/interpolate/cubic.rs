//! Piecewise cubic, C1 smooth interpolation after Clough and Tocher.
//!
//! Every Delaunay triangle is split into three sub-triangles at its centroid,
//! on each of which the surface is a cubic Bernstein-Bezier polynomial. The
//! values of the Bezier net follow from the data values and the gradients at
//! the vertices. The gradients are not part of the data; they are estimated
//! by minimizing the curvature of the surface along the triangulation edges
//! (G. Nielson, "A method for interpolating scattered data based upon a
//! minimum norm network", Math. Comp. 40, 1983).

use super::triangulation::Triangulation;
use super::{source_points, InterpolationStrategy};
use crate::errors::*;
use log::debug;
use ndarray::{Array2, ArrayView2};

const GRADIENT_MAX_ITERATIONS: usize = 400;
const GRADIENT_TOLERANCE: f64 = 1e-6;

/// Clough-Tocher interpolation of both velocity components.
///
/// Smooth and accurate for smoothly varying fields, but the most expensive
/// strategy to build and to evaluate. Query points outside the convex hull
/// yield NaN.
pub struct CubicInterpolator {
    tri: Triangulation,
    /// data values per velocity component
    values: [Vec<f64>; 2],
    /// estimated gradients per velocity component and source point
    gradients: [Vec<[f64; 2]>; 2],
    /// per triangle and edge, direction of the cross-boundary derivative
    edge_weights: Vec<[f64; 3]>,
}

impl CubicInterpolator {
    pub fn new(coordinates: ArrayView2<f64>, velocities: ArrayView2<f64>) -> Result<Self> {
        let points = source_points(coordinates, velocities)?;
        let tri = Triangulation::new(points);
        let adjacency = tri.vertex_neighbors();

        let values = [velocities.column(0).to_vec(), velocities.column(1).to_vec()];
        let gradients = [
            estimate_gradients(tri.points(), &adjacency, &values[0]),
            estimate_gradients(tri.points(), &adjacency, &values[1]),
        ];

        let edge_weights = (0..tri.num_triangles())
            .map(|t| edge_weights(&tri, t))
            .collect();

        Ok(CubicInterpolator {
            tri,
            values,
            gradients,
            edge_weights,
        })
    }

    fn evaluate(&self, t: usize, b: [f64; 3], component: usize) -> f64 {
        let [i1, i2, i3] = self.tri.triangles()[t];
        let f = &self.values[component];
        let df = &self.gradients[component];

        clough_tocher(
            self.tri.vertices(t),
            [f[i1], f[i2], f[i3]],
            [df[i1], df[i2], df[i3]],
            self.edge_weights[t],
            b,
        )
    }
}

impl InterpolationStrategy for CubicInterpolator {
    fn interpolate(&self, points: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::from_elem((points.nrows(), 2), f64::NAN);

        for (p, mut o) in points.outer_iter().zip(out.outer_iter_mut()) {
            if let Some((t, b)) = self.tri.find_triangle([p[0], p[1]]) {
                o[0] = self.evaluate(t, b, 0);
                o[1] = self.evaluate(t, b, 1);
            }
        }

        out
    }
}

fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Estimates the gradient at every point by Gauss-Seidel iteration on the
/// minimum norm network. For each edge `i -> j` the cubic along the edge is
/// fixed by the values and the directional derivatives at both ends; the
/// gradient at `i` minimizes the summed squared second derivative of these
/// cubics, with the gradients at the neighbors held fixed.
fn estimate_gradients(
    points: &[[f64; 2]],
    adjacency: &[Vec<usize>],
    values: &[f64],
) -> Vec<[f64; 2]> {
    let mut grad = vec![[0.; 2]; points.len()];

    for iteration in 0..GRADIENT_MAX_ITERATIONS {
        let mut max_change = 0f64;

        for i in 0..points.len() {
            // symmetric 2x2 system q * g = s
            let mut q = [0.; 3];
            let mut s = [0.; 2];

            for &j in &adjacency[i] {
                let e = sub(points[j], points[i]);
                let l2 = dot(e, e);
                let l3 = l2 * l2.sqrt();

                let r = (6. * (values[j] - values[i]) - 2. * dot(grad[j], e)) / l3;

                q[0] += 4. * e[0] * e[0] / l3;
                q[1] += 4. * e[0] * e[1] / l3;
                q[2] += 4. * e[1] * e[1] / l3;
                s[0] += r * e[0];
                s[1] += r * e[1];
            }

            let det = q[0] * q[2] - q[1] * q[1];
            if det == 0. || !det.is_finite() {
                continue;
            }

            let g = [
                (q[2] * s[0] - q[1] * s[1]) / det,
                (q[0] * s[1] - q[1] * s[0]) / det,
            ];

            let change = (g[0] - grad[i][0]).abs().max((g[1] - grad[i][1]).abs());
            max_change = max_change.max(change);
            grad[i] = g;
        }

        if max_change < GRADIENT_TOLERANCE {
            return grad;
        }

        if iteration + 1 == GRADIENT_MAX_ITERATIONS {
            debug!(
                "Gradient estimation did not converge after {} iterations (change {}).",
                GRADIENT_MAX_ITERATIONS, max_change
            );
        }
    }

    grad
}

/// Chooses the cross-boundary derivative direction of every edge of triangle
/// `t` as the line between the centroids of `t` and its neighbor. Both
/// triangles agree on that direction, which makes the surface C1 across the
/// edge, and the choice is invariant under affine transformations. Hull edges
/// use the direction towards the centroid of `t`.
fn edge_weights(tri: &Triangulation, t: usize) -> [f64; 3] {
    let mut g = [-0.5; 3];

    for (k, neighbor) in tri.neighbors(t).iter().enumerate() {
        let n = match neighbor {
            Some(n) => *n,
            None => continue,
        };

        let v = tri.vertices(n);
        let centroid = [
            (v[0][0] + v[1][0] + v[2][0]) / 3.,
            (v[0][1] + v[1][1] + v[2][1]) / 3.,
        ];
        let c = tri.barycentric(t, centroid);

        g[k] = match k {
            0 => (2. * c[2] + c[1] - 1.) / (2. - 3. * c[2] - 3. * c[1]),
            1 => (2. * c[0] + c[2] - 1.) / (2. - 3. * c[0] - 3. * c[2]),
            _ => (2. * c[1] + c[0] - 1.) / (2. - 3. * c[1] - 3. * c[0]),
        };
    }

    g
}

/// Evaluates the Clough-Tocher element of one triangle at barycentric
/// coordinates `b`.
///
/// The Bezier ordinates `cIJKL` are indexed by the powers of the barycentric
/// coordinates of the three vertices and the centroid.
#[allow(clippy::many_single_char_names)]
fn clough_tocher(
    vertices: [[f64; 2]; 3],
    f: [f64; 3],
    df: [[f64; 2]; 3],
    g: [f64; 3],
    b: [f64; 3],
) -> f64 {
    let e12 = sub(vertices[1], vertices[0]);
    let e23 = sub(vertices[2], vertices[1]);
    let e31 = sub(vertices[0], vertices[2]);

    // derivatives along the edges, leaving each vertex
    let df12 = dot(df[0], e12);
    let df21 = -dot(df[1], e12);
    let df23 = dot(df[1], e23);
    let df32 = -dot(df[2], e23);
    let df31 = dot(df[2], e31);
    let df13 = -dot(df[0], e31);

    let c3000 = f[0];
    let c2100 = (df12 + 3. * c3000) / 3.;
    let c2010 = (df13 + 3. * c3000) / 3.;
    let c0300 = f[1];
    let c1200 = (df21 + 3. * c0300) / 3.;
    let c0210 = (df23 + 3. * c0300) / 3.;
    let c0030 = f[2];
    let c1020 = (df31 + 3. * c0030) / 3.;
    let c0120 = (df32 + 3. * c0030) / 3.;

    let c2001 = (c2100 + c2010 + c3000) / 3.;
    let c0201 = (c1200 + c0300 + c0210) / 3.;
    let c0021 = (c1020 + c0120 + c0030) / 3.;

    // cross-boundary derivative linear along every edge
    let c0111 = (g[0] * (-c0300 + 3. * c0210 - 3. * c0120 + c0030)
        + (-c0300 + 2. * c0210 - c0120 + c0021 + c0201))
        / 2.;
    let c1011 = (g[1] * (-c0030 + 3. * c1020 - 3. * c2010 + c3000)
        + (-c0030 + 2. * c1020 - c2010 + c2001 + c0021))
        / 2.;
    let c1101 = (g[2] * (-c3000 + 3. * c2100 - 3. * c1200 + c0300)
        + (-c3000 + 2. * c2100 - c1200 + c2001 + c0201))
        / 2.;

    let c1002 = (c1101 + c1011 + c2001) / 3.;
    let c0102 = (c1101 + c0111 + c0201) / 3.;
    let c0012 = (c1011 + c0111 + c0021) / 3.;

    let c0003 = (c1002 + c0102 + c0012) / 3.;

    // barycentric coordinates in the sub-triangle opposite to the vertex
    // with the smallest coordinate
    let minval = b[0].min(b[1]).min(b[2]);
    let b1 = b[0] - minval;
    let b2 = b[1] - minval;
    let b3 = b[2] - minval;
    let b4 = 3. * minval;

    if b[0] == minval {
        b2.powi(3) * c0300
            + 3. * b2.powi(2) * b3 * c0210
            + 3. * b2.powi(2) * b4 * c0201
            + 3. * b2 * b3.powi(2) * c0120
            + 6. * b2 * b3 * b4 * c0111
            + 3. * b2 * b4.powi(2) * c0102
            + b3.powi(3) * c0030
            + 3. * b3.powi(2) * b4 * c0021
            + 3. * b3 * b4.powi(2) * c0012
            + b4.powi(3) * c0003
    } else if b[1] == minval {
        b1.powi(3) * c3000
            + 3. * b1.powi(2) * b3 * c2010
            + 3. * b1.powi(2) * b4 * c2001
            + 3. * b1 * b3.powi(2) * c1020
            + 6. * b1 * b3 * b4 * c1011
            + 3. * b1 * b4.powi(2) * c1002
            + b3.powi(3) * c0030
            + 3. * b3.powi(2) * b4 * c0021
            + 3. * b3 * b4.powi(2) * c0012
            + b4.powi(3) * c0003
    } else {
        b1.powi(3) * c3000
            + 3. * b1.powi(2) * b2 * c2100
            + 3. * b1.powi(2) * b4 * c2001
            + 3. * b1 * b2.powi(2) * c1200
            + 6. * b1 * b2 * b4 * c1101
            + 3. * b1 * b4.powi(2) * c1002
            + b2.powi(3) * c0300
            + 3. * b2.powi(2) * b4 * c0201
            + 3. * b2 * b4.powi(2) * c0102
            + b4.powi(3) * c0003
    }
}

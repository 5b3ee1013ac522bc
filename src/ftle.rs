//! Finite-time Lyapunov exponents from flow map Jacobians.

use nalgebra::{Matrix2, SymmetricEigen};
use ndarray::{Array1, ArrayView2, ArrayView3, Axis};

const EIGEN_MAX_ITERATIONS: usize = 100;

/// Right Cauchy-Green deformation tensor `C = J^T J` of one 2x2 Jacobian.
pub fn cauchy_green_tensor(jacobian: ArrayView2<f64>) -> Matrix2<f64> {
    let j = Matrix2::new(
        jacobian[[0, 0]],
        jacobian[[0, 1]],
        jacobian[[1, 0]],
        jacobian[[1, 1]],
    );

    j.transpose() * j
}

/// Largest eigenvalue of a symmetric 2x2 matrix, NaN if it cannot be
/// computed.
fn max_eigenvalue(c: Matrix2<f64>) -> f64 {
    if c.iter().any(|x| !x.is_finite()) {
        return f64::NAN;
    }

    match SymmetricEigen::try_new(c, f64::EPSILON, EIGEN_MAX_ITERATIONS) {
        Some(eigen) => eigen.eigenvalues.max(),
        None => f64::NAN,
    }
}

/// Computes `ln(sqrt(lambda_max(J^T J))) / map_period` for every (2, 2)
/// Jacobian of the (N, 2, 2) array.
///
/// Non-finite Jacobians give NaN. A singular Jacobian gives negative
/// infinity.
pub fn compute_ftle(jacobian: ArrayView3<f64>, map_period: f64) -> Array1<f64> {
    jacobian
        .axis_iter(Axis(0))
        .map(|j| {
            let lambda = max_eigenvalue(cauchy_green_tensor(j));
            lambda.sqrt().ln() / map_period
        })
        .collect()
}

//! Flow map Jacobian estimated from the deformation of particle clusters.

use crate::particles::NeighboringParticles;
use ndarray::{Array3, Zip};

/// Estimates the Jacobian of the flow map for every cluster by central
/// differences between the neighbor particles.
///
/// Returns an (N, 2, 2) array. Only the x component of the initial
/// left-right separation and the y component of the initial top-bottom
/// separation enter, so the seeds have to be laid out along the coordinate
/// axes. A zero initial separation gives non-finite entries.
pub fn compute_flow_map_jacobian(particles: &NeighboringParticles) -> Array3<f64> {
    let delta_rl = particles.delta_right_left();
    let delta_tb = particles.delta_top_bottom();
    let initial_rl = particles.initial_delta_right_left();
    let initial_tb = particles.initial_delta_top_bottom();

    let mut jacobian = Array3::zeros((particles.len(), 2, 2));

    Zip::from(jacobian.outer_iter_mut())
        .and(delta_rl.outer_iter())
        .and(delta_tb.outer_iter())
        .and(initial_rl.outer_iter())
        .and(initial_tb.outer_iter())
        .for_each(|mut j, rl, tb, rl0, tb0| {
            j[[0, 0]] = rl[0] / rl0[0];
            j[[0, 1]] = tb[0] / tb0[1];
            j[[1, 0]] = rl[1] / rl0[0];
            j[[1, 1]] = tb[1] / tb0[1];
        });

    jacobian
}

use super::IntegratorStrategy;
use crate::interpolate::InterpolationStrategy;
use crate::particles::NeighboringParticles;

/// Classical fourth order Runge-Kutta scheme.
///
/// The intermediate stages evaluate the field of the current snapshot instead
/// of one interpolated in time, so the scheme is only first order in time for
/// unsteady flows.
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl IntegratorStrategy for RungeKutta4 {
    fn integrate(
        &mut self,
        h: f64,
        particles: &mut NeighboringParticles,
        interpolator: &dyn InterpolationStrategy,
    ) {
        let x = particles.positions();

        let k1 = interpolator.interpolate(x);
        let k2 = interpolator.interpolate((&x + &(&k1 * (0.5 * h))).view());
        let k3 = interpolator.interpolate((&x + &(&k2 * (0.5 * h))).view());
        let k4 = interpolator.interpolate((&x + &(&k3 * h)).view());

        let slope = k1 + &(k2 * 2.) + &(k3 * 2.) + &k4;
        particles.positions_mut().scaled_add(h / 6., &slope);
    }
}

use super::IntegratorStrategy;
use crate::interpolate::InterpolationStrategy;
use crate::particles::NeighboringParticles;

/// Forward Euler, `x += h * v(x)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl IntegratorStrategy for Euler {
    fn integrate(
        &mut self,
        h: f64,
        particles: &mut NeighboringParticles,
        interpolator: &dyn InterpolationStrategy,
    ) {
        let v = interpolator.interpolate(particles.positions());
        particles.positions_mut().scaled_add(h, &v);
    }
}

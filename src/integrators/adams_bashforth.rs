use super::IntegratorStrategy;
use crate::interpolate::InterpolationStrategy;
use crate::particles::NeighboringParticles;
use ndarray::Array2;

/// Two-step Adams-Bashforth scheme,
/// `x += h * (3/2 v_n - 1/2 v_{n-1})`.
///
/// The first step after construction or `reset` has no history and falls back
/// to forward Euler. The history belongs to the particles the instance was
/// used with, so every window needs its own instance.
#[derive(Debug, Clone, Default)]
pub struct AdamsBashforth2 {
    previous_velocity: Option<Array2<f64>>,
}

impl AdamsBashforth2 {
    pub fn new() -> AdamsBashforth2 {
        AdamsBashforth2 {
            previous_velocity: None,
        }
    }

    /// Whether a velocity of a previous step is available.
    pub fn is_warmed(&self) -> bool {
        self.previous_velocity.is_some()
    }

    /// Forgets the history. The next step is an Euler step again.
    pub fn reset(&mut self) {
        self.previous_velocity = None;
    }
}

impl IntegratorStrategy for AdamsBashforth2 {
    fn integrate(
        &mut self,
        h: f64,
        particles: &mut NeighboringParticles,
        interpolator: &dyn InterpolationStrategy,
    ) {
        let v = interpolator.interpolate(particles.positions());

        match self.previous_velocity.take() {
            Some(previous) => {
                let slope = &v * 1.5 - &(previous * 0.5);
                particles.positions_mut().scaled_add(h, &slope);
            }
            None => particles.positions_mut().scaled_add(h, &v),
        }

        self.previous_velocity = Some(v);
    }
}

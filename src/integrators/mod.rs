//! Explicit time integrators advancing particle clusters through a velocity
//! field.
//!
//! An integrator only sees the interpolated field of the current snapshot, so
//! all stages of a multi-stage scheme evaluate the same, frozen field.


mod adams_bashforth;
mod euler;
mod runge_kutta;

pub use self::adams_bashforth::AdamsBashforth2;
pub use self::euler::Euler;
pub use self::runge_kutta::RungeKutta4;

use crate::errors::*;
use crate::interpolate::InterpolationStrategy;
use crate::particles::NeighboringParticles;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Advances all particle positions by one time step, in place.
///
/// A negative `h` integrates backward in time. Non-finite velocities are not
/// treated specially and leave non-finite positions behind.
pub trait IntegratorStrategy {
    fn integrate(
        &mut self,
        h: f64,
        particles: &mut NeighboringParticles,
        interpolator: &dyn InterpolationStrategy,
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    Euler,
    Rk4,
    Ab2,
}

impl IntegratorKind {
    pub const NAMES: [&'static str; 3] = ["euler", "rk4", "ab2"];

    pub fn name(self) -> &'static str {
        match self {
            IntegratorKind::Euler => "euler",
            IntegratorKind::Rk4 => "rk4",
            IntegratorKind::Ab2 => "ab2",
        }
    }

    /// Creates a fresh integrator of this kind.
    pub fn build(self) -> Box<dyn IntegratorStrategy> {
        match self {
            IntegratorKind::Euler => Box::new(Euler),
            IntegratorKind::Rk4 => Box::new(RungeKutta4),
            IntegratorKind::Ab2 => Box::new(AdamsBashforth2::new()),
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IntegratorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "euler" => Ok(IntegratorKind::Euler),
            "rk4" => Ok(IntegratorKind::Rk4),
            "ab2" => Ok(IntegratorKind::Ab2),
            _ => bail!(ErrorKind::InvalidIntegrator(s.to_string())),
        }
    }
}

/// Creates a fresh integrator from its case-insensitive name.
pub fn get_integrator(name: &str) -> Result<Box<dyn IntegratorStrategy>> {
    Ok(name.parse::<IntegratorKind>()?.build())
}

//! Spatial interpolation of velocity samples onto particle positions.
//!
//! All strategies are built from the coordinates and velocities of one
//! snapshot and answer queries for arbitrary positions. Positions the strategy
//! cannot answer for (outside the convex hull or the grid) get NaN velocities,
//! which then propagate to the FTLE of the affected clusters.

use crate::errors::*;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

mod cubic;
mod factory;
mod grid;
mod linear;
mod nearest;
pub mod triangulation;

pub use self::cubic::CubicInterpolator;
pub use self::factory::InterpolatorFactory;
pub use self::grid::GridInterpolator;
pub use self::linear::LinearInterpolator;
pub use self::nearest::NearestNeighborInterpolator;


/// Velocity field that can be evaluated at arbitrary positions.
pub trait InterpolationStrategy {
    /// Takes (K, 2) positions and returns the (K, 2) velocities at them, in
    /// the same row order.
    fn interpolate(&self, points: ArrayView2<f64>) -> Array2<f64>;
}

/// Available interpolation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolatorKind {
    Cubic,
    Linear,
    Nearest,
    Grid,
}

impl InterpolatorKind {
    pub const NAMES: [&'static str; 4] = ["cubic", "linear", "nearest", "grid"];

    pub fn name(self) -> &'static str {
        match self {
            InterpolatorKind::Cubic => "cubic",
            InterpolatorKind::Linear => "linear",
            InterpolatorKind::Nearest => "nearest",
            InterpolatorKind::Grid => "grid",
        }
    }
}

impl fmt::Display for InterpolatorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InterpolatorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cubic" => Ok(InterpolatorKind::Cubic),
            "linear" => Ok(InterpolatorKind::Linear),
            "nearest" => Ok(InterpolatorKind::Nearest),
            "grid" => Ok(InterpolatorKind::Grid),
            _ => bail!(ErrorKind::UnknownInterpolator(s.to_string())),
        }
    }
}

/// Builds the interpolator of the given kind for one snapshot.
pub fn build_interpolator(
    kind: InterpolatorKind,
    coordinates: ArrayView2<f64>,
    velocities: ArrayView2<f64>,
) -> Result<Rc<dyn InterpolationStrategy>> {
    let interpolator: Rc<dyn InterpolationStrategy> = match kind {
        InterpolatorKind::Cubic => Rc::new(CubicInterpolator::new(coordinates, velocities)?),
        InterpolatorKind::Linear => Rc::new(LinearInterpolator::new(coordinates, velocities)?),
        InterpolatorKind::Nearest => {
            Rc::new(NearestNeighborInterpolator::new(coordinates, velocities)?)
        }
        InterpolatorKind::Grid => Rc::new(GridInterpolator::new(coordinates, velocities)?),
    };

    Ok(interpolator)
}

/// Checks the shapes of a snapshot and returns its coordinates as points.
pub(crate) fn source_points(
    coordinates: ArrayView2<f64>,
    velocities: ArrayView2<f64>,
) -> Result<Vec<[f64; 2]>> {
    if coordinates.nrows() == 0 {
        bail!(ErrorKind::NoSourcePoints);
    }

    if coordinates.ncols() != 2 || velocities.ncols() != 2 {
        bail!(ErrorKind::ShapeMismatch(format!(
            "coordinates and velocities need two columns, got {:?} and {:?}",
            coordinates.shape(),
            velocities.shape()
        )));
    }

    if coordinates.nrows() != velocities.nrows() {
        bail!(ErrorKind::ShapeMismatch(format!(
            "{} coordinates but {} velocities",
            coordinates.nrows(),
            velocities.nrows()
        )));
    }

    Ok(coordinates.outer_iter().map(|c| [c[0], c[1]]).collect())
}

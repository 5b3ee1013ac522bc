//! This crate computes finite-time Lyapunov exponent (FTLE) fields from a time
//! series of 2D velocity snapshots. Clusters of four tracer particles are
//! advected through the interpolated flow over a finite window, the flow map
//! Jacobian is estimated from their deformation, and the largest eigenvalue of
//! the Cauchy-Green tensor yields one FTLE value per cluster.
//!
//! The pipeline is assembled in `windows`. Interpolation and time integration
//! are pluggable strategies, see `interpolate` and `integrators`.

#[macro_use]
extern crate error_chain;

pub mod caching;
pub mod cauchy_green;
pub mod double_gyre;
pub mod experiment;
pub mod file_utils;
pub mod ftle;
pub mod input;
pub mod integrators;
pub mod interpolate;
pub mod output;
pub mod particles;
pub mod settings;
pub mod windows;

#[cfg(test)]
mod test_helper;

pub mod errors {
    // Create the Error, ErrorKind, ResultExt, and Result types
    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            TomlDe(::toml::de::Error);
            TomlSer(::toml::ser::Error);
            Cbor(::serde_cbor::Error);
            Bincode(::bincode::Error);
        }

        errors {
            InvalidParticles(msg: String) {
                description("invalid particle clusters")
                display("invalid particle clusters: {}", msg)
            }
            ShapeMismatch(msg: String) {
                description("array shapes do not match")
                display("array shapes do not match: {}", msg)
            }
            NoSourcePoints {
                description("no points given")
                display("no points given to build the interpolator")
            }
            NotAGrid(msg: String) {
                description("source points are not a rectilinear grid")
                display("source points are not a rectilinear grid: {}", msg)
            }
            UnknownInterpolator(name: String) {
                description("unknown interpolation strategy")
                display(
                    "unknown interpolation strategy '{}', choose from {:?}",
                    name,
                    crate::interpolate::InterpolatorKind::NAMES
                )
            }
            InvalidIntegrator(name: String) {
                description("invalid integrator name")
                display(
                    "invalid integrator name '{}', choose from {:?}",
                    name,
                    crate::integrators::IntegratorKind::NAMES
                )
            }
            InputListMismatch(msg: String) {
                description("input file lists do not match")
                display("input file lists do not match: {}", msg)
            }
            InvalidSettings(msg: String) {
                description("invalid settings")
                display("invalid settings: {}", msg)
            }
            UnknownFileFormat(path: String) {
                description("unknown file format")
                display("cannot determine file format of '{}'", path)
            }
            WindowFailed(index: usize) {
                description("window failed")
                display("window {} failed", index)
            }
        }
    }
}

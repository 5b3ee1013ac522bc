//! Analytic time-periodic double gyre on the domain `[0, 2] x [0, 1]`.
//!
//! Used to generate synthetic inputs, velocity snapshots on a regular grid,
//! the grid itself and a lattice of seed clusters.
//!
//! ```text
//! f(x, t)  = ε sin(ωt) x² + (1 - 2ε sin(ωt)) x
//! u        = -π A sin(π f) cos(π y)
//! v        =  π A cos(π f) sin(π y) ∂f/∂x
//! ```

use crate::errors::*;
use crate::file_utils::write_input_lists;
use crate::input::{array_to_columns, write_to_file, FileFormat, GridFile, SeedFile, VelocityFile};
use log::info;
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

const DOMAIN_WIDTH: f64 = 2.;
const DOMAIN_HEIGHT: f64 = 1.;

/// Parameters of the double gyre flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleGyre {
    /// velocity magnitude
    pub amplitude: f64,
    /// amplitude of the oscillation of the separatrix
    pub epsilon: f64,
    /// angular frequency of the oscillation
    pub omega: f64,
}

impl Default for DoubleGyre {
    fn default() -> Self {
        DoubleGyre {
            amplitude: 0.1,
            epsilon: 0.25,
            omega: 2. * PI / 10.,
        }
    }
}

impl DoubleGyre {
    /// Velocity at `(x, y)` and time `t`.
    pub fn velocity(&self, x: f64, y: f64, t: f64) -> [f64; 2] {
        let a = self.epsilon * (self.omega * t).sin();
        let b = 1. - 2. * a;
        let f = a * x * x + b * x;
        let df = 2. * a * x + b;

        [
            -PI * self.amplitude * (PI * f).sin() * (PI * y).cos(),
            PI * self.amplitude * (PI * f).cos() * (PI * y).sin() * df,
        ]
    }

    /// Velocities at the points of an (M, 2) array.
    pub fn sample(&self, points: ArrayView2<f64>, t: f64) -> Array2<f64> {
        let mut v = Array2::zeros(points.raw_dim());

        Zip::from(v.axis_iter_mut(Axis(0)))
            .and(points.axis_iter(Axis(0)))
            .for_each(|mut v, p| {
                let [vx, vy] = self.velocity(p[0], p[1], t);
                v[0] = vx;
                v[1] = vy;
            });

        v
    }
}

/// `nx * ny` equally spaced nodes covering the domain including its
/// boundary, x running fastest.
pub fn sample_grid(nx: usize, ny: usize) -> Array2<f64> {
    let x = Array1::linspace(0., DOMAIN_WIDTH, nx);
    let y = Array1::linspace(0., DOMAIN_HEIGHT, ny);

    Array2::from_shape_fn((nx * ny, 2), |(i, c)| {
        if c == 0 {
            x[i % nx]
        } else {
            y[i / nx]
        }
    })
}

/// Lattice of roughly `approx_num` seed clusters whose neighbors lie
/// `spacing` away from the center. Centers keep a margin of two spacings to
/// the boundary of the domain.
pub fn seed_lattice(spacing: f64, approx_num: usize) -> Result<SeedFile> {
    let margin = 2. * spacing;

    if !(spacing > 0.) || 2. * margin >= DOMAIN_HEIGHT {
        bail!(ErrorKind::InvalidSettings(format!(
            "seed spacing {} does not fit into the domain",
            spacing
        )));
    }

    let num_x = ((approx_num as f64 * DOMAIN_WIDTH / DOMAIN_HEIGHT).sqrt() as usize).max(1);
    let num_y = (approx_num / num_x).max(1);

    let cx = Array1::linspace(margin, DOMAIN_WIDTH - margin, num_x);
    let cy = Array1::linspace(margin, DOMAIN_HEIGHT - margin, num_y);

    let mut seeds = SeedFile {
        left: Vec::with_capacity(num_x * num_y),
        right: Vec::with_capacity(num_x * num_y),
        top: Vec::with_capacity(num_x * num_y),
        bottom: Vec::with_capacity(num_x * num_y),
    };

    for &y in &cy {
        for &x in &cx {
            seeds.left.push([x - spacing, y]);
            seeds.right.push([x + spacing, y]);
            seeds.top.push([x, y + spacing]);
            seeds.bottom.push([x, y - spacing]);
        }
    }

    Ok(seeds)
}

/// Layout of a synthetic double gyre data set.
#[derive(Debug, Clone)]
pub struct DatasetSettings {
    pub nx: usize,
    pub ny: usize,
    pub num_snapshots: usize,
    /// time of the last snapshot, the first is at zero
    pub end_time: f64,
    pub seed_spacing: f64,
    pub num_particles: usize,
    pub format: FileFormat,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        DatasetSettings {
            nx: 100,
            ny: 50,
            num_snapshots: 501,
            end_time: 5.,
            seed_spacing: 0.025,
            num_particles: 100,
            format: FileFormat::CBOR,
        }
    }
}

/// Writes snapshots `velocities0000.*`, ..., a `grid.*` and a `particles.*`
/// file into `dir`, followed by the three input lists. Returns the snapshot
/// paths.
pub fn write_dataset(gyre: &DoubleGyre, s: &DatasetSettings, dir: &Path) -> Result<Vec<PathBuf>> {
    if s.num_snapshots < 1 {
        bail!(ErrorKind::InvalidSettings(
            "need at least one snapshot".to_string()
        ));
    }

    std::fs::create_dir_all(dir)
        .chain_err(|| format!("Unable to create directory '{}'.", dir.display()))?;

    let ext = s.format.extension();
    let grid = sample_grid(s.nx, s.ny);
    let (coordinate_x, coordinate_y) = array_to_columns(grid.view());

    let times = Array1::linspace(0., s.end_time, s.num_snapshots);
    let mut snapshots = Vec::with_capacity(times.len());

    for (i, &t) in times.iter().enumerate() {
        let (velocity_x, velocity_y) = array_to_columns(gyre.sample(grid.view(), t).view());
        let path = dir.join(format!("velocities{:04}.{}", i, ext));

        write_to_file(
            &VelocityFile {
                velocity_x,
                velocity_y,
                coordinate_x: None,
                coordinate_y: None,
            },
            &path,
        )?;
        snapshots.push(path);
    }

    write_to_file(
        &GridFile {
            coordinate_x,
            coordinate_y,
        },
        &dir.join(format!("grid.{}", ext)),
    )?;

    let seeds = seed_lattice(s.seed_spacing, s.num_particles)?;
    let num_clusters = seeds.left.len();
    write_to_file(&seeds, &dir.join(format!("particles.{}", ext)))?;

    info!(
        "Wrote {} double gyre snapshots on a {}x{} grid and {} seed clusters to '{}'.",
        snapshots.len(),
        s.nx,
        s.ny,
        num_clusters,
        dir.display()
    );

    write_input_lists(dir, dir)?;

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_utils::{read_files_list, GRID_LIST, PARTICLE_LIST, VELOCITY_LIST};
    use crate::input::{FileSource, SeedSource, SnapshotSource};
    use crate::test_helper::{close, equal_floats};
    use tempfile::tempdir;

    #[test]
    fn steady_at_time_zero() {
        let g = DoubleGyre::default();

        for &(x, y) in &[(0.3, 0.2), (1.5, 0.7), (0.9, 0.45)] {
            let [u, v] = g.velocity(x, y, 0.);
            assert!(close(u, -PI * 0.1 * (PI * x).sin() * (PI * y).cos(), 1e-14));
            assert!(close(v, PI * 0.1 * (PI * x).cos() * (PI * y).sin(), 1e-14));
        }
    }

    #[test]
    fn no_flow_through_the_boundary() {
        let g = DoubleGyre::default();

        for &t in &[0., 1.3, 2.5, 7.] {
            for &s in &[0.1, 0.5, 0.9] {
                assert!(g.velocity(0., s, t)[0].abs() < 1e-14);
                assert!(g.velocity(2., s, t)[0].abs() < 1e-14);
                assert!(g.velocity(2. * s, 0., t)[1].abs() < 1e-14);
                assert!(g.velocity(2. * s, 1., t)[1].abs() < 1e-14);
            }
        }
    }

    #[test]
    fn divergence_free() {
        let g = DoubleGyre::default();
        let h = 1e-5;

        for &(x, y, t) in &[(0.3, 0.2, 0.), (1.5, 0.7, 2.5), (0.9, 0.45, 4.1)] {
            let dudx = (g.velocity(x + h, y, t)[0] - g.velocity(x - h, y, t)[0]) / (2. * h);
            let dvdy = (g.velocity(x, y + h, t)[1] - g.velocity(x, y - h, t)[1]) / (2. * h);
            assert!((dudx + dvdy).abs() < 1e-8);
        }
    }

    #[test]
    fn grid_covers_domain() {
        let grid = sample_grid(5, 3);

        assert_eq!(grid.dim(), (15, 2));
        assert!(equal_floats(grid[[0, 0]], 0.));
        assert!(equal_floats(grid[[1, 0]], 0.5));
        assert!(equal_floats(grid[[4, 0]], 2.));
        assert!(equal_floats(grid[[5, 1]], 0.5));
        assert!(equal_floats(grid[[14, 1]], 1.));
    }

    #[test]
    fn lattice_of_seeds() {
        let seeds = seed_lattice(0.025, 100).unwrap();

        // 14 columns and 7 rows
        assert_eq!(seeds.left.len(), 98);
        assert!(close(seeds.left[0][0], 0.025, 1e-12));
        assert!(close(seeds.bottom[0][1], 0.025, 1e-12));

        for i in 0..seeds.left.len() {
            let cx = 0.5 * (seeds.left[i][0] + seeds.right[i][0]);
            let cy = 0.5 * (seeds.top[i][1] + seeds.bottom[i][1]);
            assert!(close(seeds.top[i][0], cx, 1e-12));
            assert!(close(seeds.left[i][1], cy, 1e-12));
            assert!(cx >= 0.05 - 1e-12 && cx <= 1.95 + 1e-12);
            assert!(cy >= 0.05 - 1e-12 && cy <= 0.95 + 1e-12);
        }

        assert!(seed_lattice(0., 100).is_err());
        assert!(seed_lattice(0.3, 100).is_err());
    }

    #[test]
    fn writes_readable_dataset() {
        let dir = tempdir().unwrap();
        let settings = DatasetSettings {
            nx: 9,
            ny: 5,
            num_snapshots: 3,
            end_time: 1.,
            seed_spacing: 0.05,
            num_particles: 8,
            format: FileFormat::CBOR,
        };
        let gyre = DoubleGyre::default();

        let snapshots = write_dataset(&gyre, &settings, dir.path()).unwrap();
        assert_eq!(snapshots.len(), 3);

        let listed = read_files_list(&dir.path().join(VELOCITY_LIST)).unwrap();
        assert_eq!(listed.len(), 3);
        let grid = read_files_list(&dir.path().join(GRID_LIST)).unwrap();
        assert_eq!(grid.len(), 1);
        let particles = read_files_list(&dir.path().join(PARTICLE_LIST)).unwrap();
        assert_eq!(particles.len(), 1);

        let coords = FileSource.read_coordinates(&grid[0]).unwrap();
        let v = FileSource.read_velocity(&listed[2]).unwrap();
        assert_eq!(coords.dim(), (45, 2));
        assert_eq!(v.dim(), (45, 2));

        let [u, w] = gyre.velocity(coords[[12, 0]], coords[[12, 1]], 1.);
        assert!(close(v[[12, 0]], u, 1e-14));
        assert!(close(v[[12, 1]], w, 1e-14));

        let seeds = FileSource.read_seed_clusters(&particles[0]).unwrap();
        assert_eq!(seeds.len(), 8);
    }
}

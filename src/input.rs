//! Reading snapshots and seed clusters.
//!
//! The pipeline only talks to the `SnapshotSource` and `SeedSource` traits.
//! `FileSource` implements both on top of serde-serialized files, whose
//! format is picked by the file extension.

use crate::errors::*;
use crate::particles::NeighboringParticles;
use ndarray::{Array2, ArrayView2};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Provides the velocity samples and their positions of a snapshot.
pub trait SnapshotSource {
    /// Returns the (M, 2) velocities stored in `file`.
    fn read_velocity(&self, file: &str) -> Result<Array2<f64>>;
    /// Returns the (M, 2) coordinates stored in `file`.
    fn read_coordinates(&self, file: &str) -> Result<Array2<f64>>;
}

/// Provides the initial particle clusters of a window.
pub trait SeedSource {
    fn read_seed_clusters(&self, file: &str) -> Result<NeighboringParticles>;
}

/// Serialization format of data files and FTLE artifacts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum FileFormat {
    CBOR,
    Bincode,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::CBOR => "cbor",
            FileFormat::Bincode => "bincode",
        }
    }

    /// Determines the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("cbor") => Ok(FileFormat::CBOR),
            Some("bincode") => Ok(FileFormat::Bincode),
            _ => bail!(ErrorKind::UnknownFileFormat(path.display().to_string())),
        }
    }
}

/// Velocity samples of one snapshot. Files may carry their coordinates as
/// well. A CBOR velocity file with coordinates can serve as its own grid
/// file, a Bincode one cannot, as Bincode does not store field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityFile {
    pub velocity_x: Vec<f64>,
    pub velocity_y: Vec<f64>,
    #[serde(default)]
    pub coordinate_x: Option<Vec<f64>>,
    #[serde(default)]
    pub coordinate_y: Option<Vec<f64>>,
}

/// Positions of the velocity samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridFile {
    pub coordinate_x: Vec<f64>,
    pub coordinate_y: Vec<f64>,
}

/// Initial positions of the four neighbors of every cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedFile {
    pub left: Vec<[f64; 2]>,
    pub right: Vec<[f64; 2]>,
    pub top: Vec<[f64; 2]>,
    pub bottom: Vec<[f64; 2]>,
}

impl SeedFile {
    pub fn into_particles(self) -> Result<NeighboringParticles> {
        NeighboringParticles::new(
            rows_to_array(&self.left).view(),
            rows_to_array(&self.right).view(),
            rows_to_array(&self.top).view(),
            rows_to_array(&self.bottom).view(),
        )
    }
}

/// Packs two columns into an (M, 2) array.
pub fn columns_to_array(x: &[f64], y: &[f64]) -> Result<Array2<f64>> {
    if x.len() != y.len() {
        bail!(ErrorKind::ShapeMismatch(format!(
            "x has {} entries, y has {}",
            x.len(),
            y.len()
        )));
    }

    Ok(Array2::from_shape_fn((x.len(), 2), |(i, c)| {
        if c == 0 {
            x[i]
        } else {
            y[i]
        }
    }))
}

/// Splits an (M, 2) array into its two columns.
pub fn array_to_columns(a: ArrayView2<f64>) -> (Vec<f64>, Vec<f64>) {
    (a.column(0).to_vec(), a.column(1).to_vec())
}

fn rows_to_array(rows: &[[f64; 2]]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), 2), |(i, c)| rows[i][c])
}

/// Deserializes a file in the format given by its extension.
pub fn read_from_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;

    let f = File::open(path)
        .chain_err(|| format!("Unable to open file '{}'.", path.display()))?;
    let r = BufReader::new(f);

    let value = match format {
        FileFormat::CBOR => serde_cbor::from_reader(r)
            .chain_err(|| format!("CBOR, cannot decode '{}'.", path.display()))?,
        FileFormat::Bincode => bincode::deserialize_from(r)
            .chain_err(|| format!("Bincode, cannot decode '{}'.", path.display()))?,
    };

    Ok(value)
}

/// Serializes `value` into a file in the format given by its extension.
pub fn write_to_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let format = FileFormat::from_path(path)?;

    let f = File::create(path)
        .chain_err(|| format!("Unable to create file '{}'.", path.display()))?;
    let mut w = BufWriter::new(f);

    match format {
        FileFormat::CBOR => serde_cbor::to_writer(&mut w, value)
            .chain_err(|| format!("CBOR, cannot encode '{}'.", path.display()))?,
        FileFormat::Bincode => bincode::serialize_into(&mut w, value)
            .chain_err(|| format!("Bincode, cannot encode '{}'.", path.display()))?,
    }

    w.flush()
        .chain_err(|| format!("Unable to write file '{}'.", path.display()))
}

/// Reads snapshots and seeds from files, file identifiers are paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl SnapshotSource for FileSource {
    fn read_velocity(&self, file: &str) -> Result<Array2<f64>> {
        let v: VelocityFile = read_from_file(Path::new(file))?;
        columns_to_array(&v.velocity_x, &v.velocity_y)
            .chain_err(|| format!("Velocity components in '{}' differ in length.", file))
    }

    fn read_coordinates(&self, file: &str) -> Result<Array2<f64>> {
        let g: GridFile = read_from_file(Path::new(file))?;
        columns_to_array(&g.coordinate_x, &g.coordinate_y)
            .chain_err(|| format!("Coordinates in '{}' differ in length.", file))
    }
}

impl SeedSource for FileSource {
    fn read_seed_clusters(&self, file: &str) -> Result<NeighboringParticles> {
        let s: SeedFile = read_from_file(Path::new(file))?;
        s.into_particles()
            .chain_err(|| format!("Invalid seed clusters in '{}'.", file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::equal_floats;
    use tempfile::tempdir;

    fn velocity_file() -> VelocityFile {
        VelocityFile {
            velocity_x: vec![1., 2., 3.],
            velocity_y: vec![-1., -2., -3.],
            coordinate_x: Some(vec![0., 1., 0.]),
            coordinate_y: Some(vec![0., 0., 1.]),
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b/v.cbor")).unwrap(),
            FileFormat::CBOR
        );
        assert_eq!(
            FileFormat::from_path(Path::new("v.bincode")).unwrap(),
            FileFormat::Bincode
        );

        for name in &["v.npy", "v"] {
            match FileFormat::from_path(Path::new(name)) {
                Err(Error(ErrorKind::UnknownFileFormat(p), _)) => assert_eq!(p, *name),
                _ => panic!("accepted {}", name),
            }
        }
    }

    #[test]
    fn reads_velocities_in_both_formats() {
        let dir = tempdir().unwrap();

        for ext in &["cbor", "bincode"] {
            let path = dir.path().join(format!("velocities.{}", ext));
            write_to_file(&velocity_file(), &path).unwrap();

            let source = FileSource;
            let file = path.to_str().unwrap();
            let v = source.read_velocity(file).unwrap();
            assert_eq!(v.shape(), &[3, 2]);
            assert!(equal_floats(v[[1, 0]], 2.));
            assert!(equal_floats(v[[2, 1]], -3.));

            if *ext == "cbor" {
                // the velocity file carries its coordinates
                let c = source.read_coordinates(file).unwrap();
                assert!(equal_floats(c[[2, 1]], 1.));
            }
        }
    }

    #[test]
    fn reads_seed_clusters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("particles.cbor");

        let seeds = SeedFile {
            left: vec![[0., 1.], [4., 1.]],
            right: vec![[2., 1.], [6., 1.]],
            top: vec![[1., 2.], [5., 2.]],
            bottom: vec![[1., 0.], [5., 0.]],
        };
        write_to_file(&seeds, &path).unwrap();

        let p = FileSource.read_seed_clusters(path.to_str().unwrap()).unwrap();
        assert_eq!(p.len(), 2);
        assert!(equal_floats(p.centroid()[[1, 0]], 5.));
        assert!(equal_floats(p.centroid()[[1, 1]], 1.));
    }

    #[test]
    fn rejects_inconsistent_files() {
        let dir = tempdir().unwrap();

        let path = dir.path().join("broken.cbor");
        let mut v = velocity_file();
        v.velocity_y.pop();
        write_to_file(&v, &path).unwrap();
        assert!(FileSource.read_velocity(path.to_str().unwrap()).is_err());

        let path = dir.path().join("seeds.bincode");
        let seeds = SeedFile {
            left: vec![[0., 1.]],
            right: vec![[2., 1.]],
            top: vec![[1., 2.]],
            bottom: vec![],
        };
        write_to_file(&seeds, &path).unwrap();
        assert!(FileSource.read_seed_clusters(path.to_str().unwrap()).is_err());

        assert!(FileSource.read_velocity("does/not/exist.cbor").is_err());
    }
}

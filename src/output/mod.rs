//! FTLE artifacts and the sinks they are written to.

pub mod path;
pub mod worker;

use crate::errors::*;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Describes how the FTLE field of one window was obtained and where its
/// values are located.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtleMetadata {
    pub integrator: String,
    pub interpolator: String,
    /// signed time step between snapshots
    pub timestep: f64,
    pub map_period: f64,
    pub first_snapshot: String,
    pub last_snapshot: String,
    /// centroids of the advected clusters
    pub coordinate_x: Vec<f64>,
    pub coordinate_y: Vec<f64>,
}

/// Everything written for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtleOutput {
    pub window_index: usize,
    pub ftle: Vec<f64>,
    pub metadata: FtleMetadata,
}

impl FtleOutput {
    pub fn new(window_index: usize, ftle: ArrayView1<f64>, metadata: &FtleMetadata) -> FtleOutput {
        FtleOutput {
            window_index,
            ftle: ftle.to_vec(),
            metadata: metadata.clone(),
        }
    }
}

/// Receives one FTLE field per window, possibly from several threads at once.
pub trait FtleSink: Sync {
    fn write_ftle(
        &self,
        window_index: usize,
        ftle: ArrayView1<f64>,
        metadata: &FtleMetadata,
    ) -> Result<()>;
}

/// Keeps all outputs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Mutex<Vec<FtleOutput>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// Returns the collected outputs ordered by window index.
    pub fn into_outputs(self) -> Vec<FtleOutput> {
        let mut outputs = match self.outputs.into_inner() {
            Ok(o) => o,
            Err(poisoned) => poisoned.into_inner(),
        };
        outputs.sort_by_key(|o| o.window_index);
        outputs
    }
}

impl FtleSink for MemorySink {
    fn write_ftle(
        &self,
        window_index: usize,
        ftle: ArrayView1<f64>,
        metadata: &FtleMetadata,
    ) -> Result<()> {
        let output = FtleOutput::new(window_index, ftle, metadata);
        match self.outputs.lock() {
            Ok(mut outputs) => outputs.push(output),
            Err(_) => bail!("Output collection is poisoned."),
        }
        Ok(())
    }
}

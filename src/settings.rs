//! This module handles a TOML settings file.

use crate::errors::*;
use crate::input::FileFormat;
use crate::integrators::IntegratorKind;
use crate::interpolate::InterpolatorKind;
use crate::windows::{WindowConfig, WindowErrorPolicy};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::prelude::*;

const DEFAULT_INTEGRATOR: &str = "euler";
const DEFAULT_INTERPOLATOR: &str = "cubic";
const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_NUM_PROCESSES: usize = 1;
const DEFAULT_CACHE_SIZE: usize = crate::caching::DEFAULT_CACHE_SIZE;
const DEFAULT_IO_QUEUE_SIZE: usize = 1;
const DEFAULT_OUTPUT_FORMAT: FileFormat = FileFormat::CBOR;
const DEFAULT_ON_WINDOW_ERROR: WindowErrorPolicy = WindowErrorPolicy::Abort;

/// Structure that holds settings, which are defined externally in a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub input: InputSettings,
    pub parameters: Parameters,
    pub environment: EnvironmentSettings,
}

/// Text files listing the input files, one path per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSettings {
    pub list_velocity_files: String,
    pub list_grid_files: String,
    pub list_particle_files: String,
}

/// Holds the parameters of the FTLE computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Time between consecutive snapshots. A negative value computes the
    /// backward FTLE.
    pub snapshot_timestep: f64,
    /// Integration time of one window
    pub flow_map_period: f64,
    #[serde(default = "default_integrator")]
    pub integrator: String,
    #[serde(default = "default_interpolator")]
    pub interpolator: String,
}

/// Holds environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSettings {
    pub experiment_name: String,
    /// crate version, written as metadata and ignored when read
    #[serde(default)]
    version: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Number of windows processed in parallel
    #[serde(default = "default_num_processes")]
    pub num_processes: usize,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default = "default_io_queue_size")]
    pub io_queue_size: usize,
    #[serde(default = "default_output_format")]
    pub output_format: FileFormat,
    #[serde(default = "default_on_window_error")]
    pub on_window_error: WindowErrorPolicy,
}

fn default_integrator() -> String {
    DEFAULT_INTEGRATOR.to_string()
}

fn default_interpolator() -> String {
    DEFAULT_INTERPOLATOR.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_num_processes() -> usize {
    DEFAULT_NUM_PROCESSES
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

/// Default value of IO queue size
fn default_io_queue_size() -> usize {
    DEFAULT_IO_QUEUE_SIZE
}

/// Default output format
fn default_output_format() -> FileFormat {
    DEFAULT_OUTPUT_FORMAT
}

fn default_on_window_error() -> WindowErrorPolicy {
    DEFAULT_ON_WINDOW_ERROR
}

/// Reads the content of a file `filename` into an string and return it.
fn read_from_file(filename: &str) -> Result<String> {
    let mut f = File::open(filename).chain_err(|| format!("Unable to open file '{}'.", filename))?;
    let mut content = String::new();

    f.read_to_string(&mut content)
        .chain_err(|| "Unable to read file.")?;

    Ok(content)
}

/// Reads content of a file `param_file`, that should point to a valid TOML
/// file, and parses it.
/// Then returns the deserialized data in form of a Settings struct.
pub fn read_parameter_file(param_file: &str) -> Result<Settings> {
    // read .toml file into string
    let toml_string = read_from_file(param_file).chain_err(|| "Unable to read parameter file.")?;

    let mut settings: Settings =
        toml::from_str(&toml_string).chain_err(|| "Unable to parse parameter file.")?;

    settings.environment.version = "".to_string();

    check_settings(&settings)?;

    Ok(settings)
}

/// Checks settings for sanity.
pub fn check_settings(s: &Settings) -> Result<()> {
    let p = &s.parameters;
    let env = &s.environment;

    if p.snapshot_timestep == 0. || !p.snapshot_timestep.is_finite() {
        bail!(ErrorKind::InvalidSettings(format!(
            "`snapshot_timestep` must be finite and non-zero, got {}",
            p.snapshot_timestep
        )));
    }

    if !(p.flow_map_period > 0.) || !p.flow_map_period.is_finite() {
        bail!(ErrorKind::InvalidSettings(format!(
            "`flow_map_period` must be positive, got {}",
            p.flow_map_period
        )));
    }

    p.integrator.parse::<IntegratorKind>()?;
    p.interpolator.parse::<InterpolatorKind>()?;

    if env.num_processes < 1 {
        bail!(ErrorKind::InvalidSettings(
            "`num_processes` must be at least 1".to_string()
        ));
    }

    if env.cache_size < 1 {
        bail!(ErrorKind::InvalidSettings(
            "`cache_size` must be at least 1".to_string()
        ));
    }

    if env.experiment_name.trim().is_empty() {
        bail!(ErrorKind::InvalidSettings(
            "`experiment_name` must not be empty".to_string()
        ));
    }

    Ok(())
}

impl Settings {
    pub fn set_version(&mut self, version: &str) {
        // save version to metadata
        self.environment.version = version.to_string();
    }

    pub fn version(&self) -> &str {
        &self.environment.version
    }

    /// Assembles the window configuration. Fails for unknown strategy names.
    pub fn window_config(&self) -> Result<WindowConfig> {
        Ok(WindowConfig {
            snapshot_timestep: self.parameters.snapshot_timestep,
            flow_map_period: self.parameters.flow_map_period,
            integrator: self.parameters.integrator.parse()?,
            interpolator: self.parameters.interpolator.parse()?,
            num_processes: self.environment.num_processes,
            cache_size: self.environment.cache_size,
            on_window_error: self.environment.on_window_error,
        })
    }

    /// Saves `Settings` to TOML file
    pub fn save_to_file(&self, filename: &str) -> Result<()> {
        let mut f =
            File::create(filename).chain_err(|| format!("Unable to create file '{}'.", filename))?;

        let s = toml::to_string_pretty(&self)
            .chain_err(|| "Failed to transform settings into TOML format.")?;

        f.write_all(s.as_bytes())
            .chain_err(|| "Failed to write settings to file.")?;

        Ok(())
    }
}

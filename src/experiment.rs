//! Runs a complete FTLE experiment described by a settings file.

use crate::errors::*;
use crate::file_utils::read_files_list;
use crate::input::FileSource;
use crate::output::path::OutputPath;
use crate::output::worker::Worker;
use crate::settings::Settings;
use crate::windows::{self, RunSummary, WindowPlan};
use log::info;
use std::path::Path;

/// Name of the copy of the settings written next to the artifacts.
pub const SETTINGS_FILE: &str = "parameters.toml";

/// Reads the input lists, computes the FTLE field of every window and
/// writes one artifact per window into `<output_dir>/<experiment_name>`.
pub fn run_experiment(settings: &Settings) -> Result<RunSummary> {
    let input = &settings.input;
    let env = &settings.environment;

    let snapshots = read_files_list(Path::new(&input.list_velocity_files))?;
    let grids = read_files_list(Path::new(&input.list_grid_files))?;
    let particles = read_files_list(Path::new(&input.list_particle_files))?;

    info!(
        "Read {} snapshot, {} grid and {} particle files.",
        snapshots.len(),
        grids.len(),
        particles.len()
    );

    let config = settings.window_config()?;
    let plan = WindowPlan::new(snapshots, grids, particles, &config)?;

    let output_path = OutputPath::new(Path::new(&env.output_dir), &env.experiment_name);
    output_path.create()?;

    let settings_file = output_path.file(SETTINGS_FILE);
    settings
        .save_to_file(&settings_file.to_string_lossy())
        .chain_err(|| "Cannot save settings next to the output.")?;

    info!("Writing output to '{}'.", output_path.dir().display());

    let worker = Worker::new(env.io_queue_size, &output_path, env.output_format)?;
    let result = windows::run(&plan, &config, &FileSource, &FileSource, &worker);

    // the queued artifacts are written in any case
    let io_result = worker.quit();
    let summary = result?;
    io_result.chain_err(|| "Writing the output failed.")?;

    info!(
        "{} of {} windows completed.",
        summary.completed, summary.num_windows
    );

    Ok(summary)
}

#![crate_type = "bin"]

mod timedisplay;

use clap::{Parser, Subcommand};
use lagrangian::double_gyre::{write_dataset, DatasetSettings, DoubleGyre};
use lagrangian::errors::*;
use lagrangian::experiment::run_experiment;
use lagrangian::file_utils::write_input_lists;
use lagrangian::input::FileFormat;
use lagrangian::settings;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::time::Instant;
use time::Duration;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Finite-time Lyapunov exponents of time-varying 2D flows
#[derive(Parser)]
#[command(name = "lagrangian")]
#[command(version = VERSION)]
#[command(about = "Computes FTLE fields from velocity snapshots", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Computes the FTLE fields described by a parameter file
    Run {
        /// TOML parameter file
        parameter_file: String,
    },
    /// Writes lists of the velocity, grid and particle files below a directory
    ListInputs {
        /// directory searched recursively
        root: PathBuf,
        /// directory the three lists are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Writes a synthetic double gyre data set including its input lists
    DoubleGyre {
        /// target directory
        output_dir: PathBuf,
        #[arg(long, default_value_t = 100)]
        nx: usize,
        #[arg(long, default_value_t = 50)]
        ny: usize,
        #[arg(long, default_value_t = 501)]
        num_snapshots: usize,
        /// time of the last snapshot
        #[arg(long, default_value_t = 5.)]
        end_time: f64,
        /// distance of the neighbors to the cluster center
        #[arg(long, default_value_t = 0.025)]
        spacing: f64,
        /// approximate number of seed clusters
        #[arg(long, default_value_t = 100)]
        num_particles: usize,
        /// write Bincode instead of CBOR
        #[arg(long)]
        bincode: bool,
    },
}

fn init_logging(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn run(parameter_file: &str) -> Result<()> {
    let mut settings = settings::read_parameter_file(parameter_file)
        .chain_err(|| "Error reading parameter file.")?;
    settings.set_version(VERSION);

    info!(
        "Running experiment '{}' with lagrangian {}.",
        settings.environment.experiment_name, VERSION
    );

    let summary = run_experiment(&settings)?;

    if !summary.skipped.is_empty() {
        info!("Skipped windows: {:?}", summary.skipped);
    }

    Ok(())
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run { parameter_file } => run(&parameter_file),
        Commands::ListInputs { root, output_dir } => {
            write_input_lists(&root, &output_dir)?;
            Ok(())
        }
        Commands::DoubleGyre {
            output_dir,
            nx,
            ny,
            num_snapshots,
            end_time,
            spacing,
            num_particles,
            bincode,
        } => {
            let settings = DatasetSettings {
                nx,
                ny,
                num_snapshots,
                end_time,
                seed_spacing: spacing,
                num_particles,
                format: if bincode {
                    FileFormat::Bincode
                } else {
                    FileFormat::CBOR
                },
            };

            write_dataset(&DoubleGyre::default(), &settings, &output_dir)?;
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let start = Instant::now();

    if let Err(e) = execute(cli.command) {
        error!("{}", e);
        for cause in e.iter().skip(1) {
            error!("caused by: {}", cause);
        }
        std::process::exit(1);
    }

    let elapsed = Duration::try_from(start.elapsed()).unwrap_or(Duration::MAX);
    info!("Done after {}.", timedisplay::pretty_print_duration(elapsed));
}

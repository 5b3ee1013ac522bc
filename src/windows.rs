//! Splits the snapshot series into overlapping windows and computes the FTLE
//! field of every window.
//!
//! Window `i` starts at snapshot `i` and spans `snapshots_per_window`
//! consecutive snapshots. For each snapshot the particles are advanced by one
//! time step through the interpolated field of that snapshot. Windows do not
//! depend on each other and are processed in parallel.

// Move unit test into own file
#[cfg(test)]
#[path = "./windows_test.rs"]
mod windows_test;

use crate::caching::RollingCache;
use crate::cauchy_green::compute_flow_map_jacobian;
use crate::errors::*;
use crate::ftle::compute_ftle;
use crate::input::{SeedSource, SnapshotSource};
use crate::integrators::IntegratorKind;
use crate::interpolate::{InterpolatorFactory, InterpolatorKind};
use crate::output::{FtleMetadata, FtleSink};
use crate::particles::NeighboringParticles;
use error_chain::ChainedError;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What happens to the run when a window fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum WindowErrorPolicy {
    /// The run fails with the error of the window.
    Abort,
    /// The window is logged and left out, the others continue.
    Skip,
}

/// Parameters of a windowed FTLE run.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    /// signed time between snapshots, negative for backward FTLE
    pub snapshot_timestep: f64,
    pub flow_map_period: f64,
    pub integrator: IntegratorKind,
    pub interpolator: InterpolatorKind,
    pub num_processes: usize,
    pub cache_size: usize,
    pub on_window_error: WindowErrorPolicy,
}

impl WindowConfig {
    /// Configuration with a single worker, default cache size and abort on
    /// errors.
    pub fn new(
        snapshot_timestep: f64,
        flow_map_period: f64,
        integrator: IntegratorKind,
        interpolator: InterpolatorKind,
    ) -> WindowConfig {
        WindowConfig {
            snapshot_timestep,
            flow_map_period,
            integrator,
            interpolator,
            num_processes: 1,
            cache_size: crate::caching::DEFAULT_CACHE_SIZE,
            on_window_error: WindowErrorPolicy::Abort,
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.snapshot_timestep == 0. || !self.snapshot_timestep.is_finite() {
            bail!(ErrorKind::InvalidSettings(format!(
                "snapshot timestep must be finite and non-zero, got {}",
                self.snapshot_timestep
            )));
        }

        if !(self.flow_map_period > 0.) || !self.flow_map_period.is_finite() {
            bail!(ErrorKind::InvalidSettings(format!(
                "flow map period must be positive, got {}",
                self.flow_map_period
            )));
        }

        if self.num_processes < 1 {
            bail!(ErrorKind::InvalidSettings(
                "need at least one process".to_string()
            ));
        }

        Ok(())
    }

    /// `floor(flow_map_period / |snapshot_timestep|) + 1`, the ratio is
    /// truncated as computed in floating point.
    pub fn snapshots_per_window(&self) -> usize {
        (self.flow_map_period / self.snapshot_timestep.abs()).floor() as usize + 1
    }

    /// Integration time of one window, `(snapshots_per_window - 1) * |dt|`.
    pub fn map_period(&self) -> f64 {
        (self.snapshots_per_window() - 1) as f64 * self.snapshot_timestep.abs()
    }
}

/// Input files of every time step, ordered in integration direction.
#[derive(Debug, Clone)]
pub struct WindowPlan {
    snapshots: Vec<String>,
    grids: Vec<String>,
    particles: Vec<String>,
    window_size: usize,
}

/// Input files of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    pub index: usize,
    pub snapshots: &'a [String],
    pub grids: &'a [String],
    /// seed clusters the window starts from
    pub particles: &'a str,
}

impl WindowPlan {
    /// Grid and particle lists with a single entry are used for every
    /// snapshot, otherwise they need one entry per snapshot. For a negative
    /// timestep all lists are reversed.
    pub fn new(
        snapshots: Vec<String>,
        grids: Vec<String>,
        particles: Vec<String>,
        config: &WindowConfig,
    ) -> Result<WindowPlan> {
        config.check()?;

        if snapshots.is_empty() {
            bail!(ErrorKind::InputListMismatch(
                "no snapshot files given".to_string()
            ));
        }

        let n = snapshots.len();
        let mut snapshots = snapshots;
        let mut grids = repeat_to_length(grids, n, "grid")?;
        let mut particles = repeat_to_length(particles, n, "particle")?;

        if config.snapshot_timestep < 0. {
            debug!("Negative timestep, reversing input lists.");
            snapshots.reverse();
            grids.reverse();
            particles.reverse();
        }

        Ok(WindowPlan {
            snapshots,
            grids,
            particles,
            window_size: config.snapshots_per_window(),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn num_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Zero if a single window needs more snapshots than available.
    pub fn num_windows(&self) -> usize {
        (self.snapshots.len() + 1).saturating_sub(self.window_size)
    }

    /// Returns window `index`. Fails unless `index < num_windows()`.
    pub fn window(&self, index: usize) -> Result<Window> {
        if index >= self.num_windows() {
            bail!(ErrorKind::InputListMismatch(format!(
                "window {} requested, but {} snapshots only give {} windows",
                index,
                self.snapshots.len(),
                self.num_windows()
            )));
        }

        let range = index..index + self.window_size;

        Ok(Window {
            index,
            snapshots: &self.snapshots[range.clone()],
            grids: &self.grids[range],
            particles: &self.particles[index],
        })
    }
}

fn repeat_to_length(list: Vec<String>, n: usize, what: &str) -> Result<Vec<String>> {
    match list.len() {
        0 => bail!(ErrorKind::InputListMismatch(format!(
            "no {} files given",
            what
        ))),
        1 => Ok(vec![list[0].clone(); n]),
        len if len == n => Ok(list),
        len => bail!(ErrorKind::InputListMismatch(format!(
            "{} {} files given for {} snapshots, need one or {}",
            len, what, n, n
        ))),
    }
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub num_windows: usize,
    pub completed: usize,
    /// indices of windows left out after an error, ascending
    pub skipped: Vec<usize>,
}

/// Processes windows one after another, keeping recently used snapshots,
/// interpolators and seeds in rolling caches.
pub struct WindowProcessor<'a, S: SnapshotSource + ?Sized, P: SeedSource + ?Sized> {
    factory: InterpolatorFactory<'a, S>,
    seeds: &'a P,
    seed_cache: RollingCache<String, Rc<NeighboringParticles>>,
}

impl<'a, S: SnapshotSource + ?Sized, P: SeedSource + ?Sized> WindowProcessor<'a, S, P> {
    pub fn new(snapshots: &'a S, seeds: &'a P, cache_size: usize) -> Self {
        WindowProcessor {
            factory: InterpolatorFactory::new(snapshots, cache_size),
            seeds,
            seed_cache: RollingCache::new(cache_size),
        }
    }

    /// Advects the seeds of window `index` through its snapshots and hands
    /// the resulting FTLE field to `sink`.
    pub fn process_window<K: FtleSink + ?Sized>(
        &mut self,
        index: usize,
        plan: &WindowPlan,
        config: &WindowConfig,
        sink: &K,
    ) -> Result<()> {
        plan.window(index)
            .and_then(|window| self.compute(window, config, sink))
            .chain_err(|| ErrorKind::WindowFailed(index))
    }

    fn compute<K: FtleSink + ?Sized>(
        &mut self,
        window: Window,
        config: &WindowConfig,
        sink: &K,
    ) -> Result<()> {
        let seeds = self.seeds;
        let initial = self
            .seed_cache
            .get_or_compute(window.particles.to_string(), |file| {
                seeds.read_seed_clusters(file).map(Rc::new)
            })?;

        // the cached seeds stay untouched
        let mut particles = (*initial).clone();
        let mut integrator = config.integrator.build();

        for (snapshot, grid) in window.snapshots.iter().zip(window.grids) {
            let interpolator = self
                .factory
                .create_interpolator(snapshot, grid, config.interpolator)?;

            integrator.integrate(config.snapshot_timestep, &mut particles, &*interpolator);
        }

        let map_period = config.map_period();
        let jacobian = compute_flow_map_jacobian(&particles);
        let ftle = compute_ftle(jacobian.view(), map_period);

        let centroid = particles.centroid();
        let metadata = FtleMetadata {
            integrator: config.integrator.to_string(),
            interpolator: config.interpolator.to_string(),
            timestep: config.snapshot_timestep,
            map_period,
            first_snapshot: window.snapshots[0].clone(),
            last_snapshot: window.snapshots[window.snapshots.len() - 1].clone(),
            coordinate_x: centroid.column(0).to_vec(),
            coordinate_y: centroid.column(1).to_vec(),
        };

        sink.write_ftle(window.index, ftle.view(), &metadata)
    }
}

/// Computes all windows of `plan` on `config.num_processes` threads.
///
/// Every thread of the pool works with its own caches. With
/// `WindowErrorPolicy::Abort` the first failing window ends the run, with
/// `Skip` failing windows are logged and listed in the summary.
pub fn run<S, P, K>(
    plan: &WindowPlan,
    config: &WindowConfig,
    snapshots: &S,
    seeds: &P,
    sink: &K,
) -> Result<RunSummary>
where
    S: SnapshotSource + Sync + ?Sized,
    P: SeedSource + Sync + ?Sized,
    K: FtleSink + ?Sized,
{
    config.check()?;

    let total = plan.num_windows();
    if total == 0 {
        warn!(
            "No window fits into {} snapshots, a window needs {}.",
            plan.num_snapshots(),
            plan.window_size()
        );
    }

    info!(
        "Computing {} windows of {} snapshots on {} threads.",
        total,
        plan.window_size(),
        config.num_processes
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_processes)
        .build()
        .chain_err(|| "Cannot create thread pool.")?;

    let done = AtomicUsize::new(0);
    let policy = config.on_window_error;

    let results: Result<Vec<Option<usize>>> = pool.install(|| {
        (0..total)
            .into_par_iter()
            .map_init(
                || WindowProcessor::new(snapshots, seeds, config.cache_size),
                |processor, i| match processor.process_window(i, plan, config, sink) {
                    Ok(()) => {
                        let k = done.fetch_add(1, Ordering::SeqCst) + 1;
                        info!("window {} done ({}/{})", i, k, total);
                        Ok(None)
                    }
                    Err(e) => match policy {
                        WindowErrorPolicy::Abort => Err(e),
                        WindowErrorPolicy::Skip => {
                            warn!("Skipping window. {}", e.display_chain());
                            Ok(Some(i))
                        }
                    },
                },
            )
            .collect()
    });

    let mut skipped: Vec<usize> = results?.into_iter().flatten().collect();
    skipped.sort_unstable();

    Ok(RunSummary {
        num_windows: total,
        completed: total - skipped.len(),
        skipped,
    })
}

use super::{build_interpolator, InterpolationStrategy, InterpolatorKind};
use crate::caching::RollingCache;
use crate::errors::*;
use crate::input::SnapshotSource;
use log::debug;
use ndarray::Array2;
use std::rc::Rc;

type InterpolatorKey = (String, String, InterpolatorKind);

/// Builds interpolators for (snapshot, grid) pairs of one source.
///
/// Reads and finished interpolators are kept in rolling caches, so that
/// consecutive windows of one worker, which share all but one snapshot, do
/// not read and triangulate the same files again.
pub struct InterpolatorFactory<'a, S: SnapshotSource + ?Sized> {
    source: &'a S,
    velocities: RollingCache<String, Rc<Array2<f64>>>,
    coordinates: RollingCache<String, Rc<Array2<f64>>>,
    interpolators: RollingCache<InterpolatorKey, Rc<dyn InterpolationStrategy>>,
}

impl<'a, S: SnapshotSource + ?Sized> InterpolatorFactory<'a, S> {
    /// Every cache holds up to `cache_size` entries.
    pub fn new(source: &'a S, cache_size: usize) -> Self {
        InterpolatorFactory {
            source,
            velocities: RollingCache::new(cache_size),
            coordinates: RollingCache::new(cache_size),
            interpolators: RollingCache::new(cache_size),
        }
    }

    /// Returns the interpolator of velocity file `snapshot` on the coordinates
    /// of `grid`.
    pub fn create_interpolator(
        &mut self,
        snapshot: &str,
        grid: &str,
        kind: InterpolatorKind,
    ) -> Result<Rc<dyn InterpolationStrategy>> {
        let InterpolatorFactory {
            source,
            velocities,
            coordinates,
            interpolators,
        } = self;

        let key = (snapshot.to_string(), grid.to_string(), kind);

        interpolators.get_or_compute(key, |(snapshot, grid, kind)| {
            let v = velocities.get_or_compute(snapshot.clone(), |file| {
                debug!("Reading velocities from {}.", file);
                source.read_velocity(file).map(Rc::new)
            })?;

            let c = coordinates.get_or_compute(grid.clone(), |file| {
                debug!("Reading coordinates from {}.", file);
                source.read_coordinates(file).map(Rc::new)
            })?;

            debug!("Building {} interpolator for {}.", kind, snapshot);
            build_interpolator(*kind, c.view(), v.view())
                .chain_err(|| format!("cannot interpolate {} on {}", snapshot, grid))
        })
    }

    /// Like `create_interpolator`, with the strategy given by name.
    pub fn create_interpolator_by_name(
        &mut self,
        snapshot: &str,
        grid: &str,
        strategy: &str,
    ) -> Result<Rc<dyn InterpolationStrategy>> {
        let kind = strategy.parse::<InterpolatorKind>()?;
        self.create_interpolator(snapshot, grid, kind)
    }
}

use super::*;
use crate::output::MemorySink;
use crate::test_helper::close;
use ndarray::{arr2, Array2};
use std::collections::HashSet;
use std::sync::atomic::AtomicUsize;

fn names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect()
}

fn config(timestep: f64, period: f64) -> WindowConfig {
    WindowConfig::new(
        timestep,
        period,
        IntegratorKind::Euler,
        InterpolatorKind::Grid,
    )
}

#[test]
fn window_size_and_count() {
    let c = config(1., 2.);
    assert_eq!(c.snapshots_per_window(), 3);
    assert!(close(c.map_period(), 2., 1e-15));

    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();
    assert_eq!(plan.window_size(), 3);
    assert_eq!(plan.num_windows(), 8);

    let last = plan.window(7).unwrap();
    assert_eq!(last.snapshots, &names("v", 10)[7..10]);
}

#[test]
fn window_size_truncates_the_ratio() {
    // 0.3 / 0.1 evaluates to 2.9999999999999996
    let c = config(0.1, 0.3);
    assert_eq!(c.snapshots_per_window(), 3);
    assert!(close(c.map_period(), 0.2, 1e-12));

    let c = config(0.1, 0.7);
    assert_eq!(c.snapshots_per_window(), 7);

    // periods between snapshots are truncated
    let c = config(1., 2.5);
    assert_eq!(c.snapshots_per_window(), 3);
    assert!(close(c.map_period(), 2., 1e-15));
}

#[test]
fn window_out_of_range_is_an_error() {
    let plan = WindowPlan::new(names("v", 4), names("g", 1), names("p", 1), &config(1., 2.))
        .unwrap();
    assert_eq!(plan.num_windows(), 2);
    assert!(plan.window(1).is_ok());

    match plan.window(2) {
        Err(Error(ErrorKind::InputListMismatch(_), _)) => {}
        other => panic!("expected InputListMismatch, got {:?}", other.map(|w| w.index)),
    }

    let source = FieldSource::saddle(0.1);
    let mut processor = WindowProcessor::new(&source, &source, 2);
    match processor.process_window(5, &plan, &config(1., 2.), &MemorySink::new()) {
        Err(Error(ErrorKind::WindowFailed(5), _)) => {}
        _ => panic!("window outside of the plan accepted"),
    }
}

#[test]
fn period_longer_than_data_gives_no_windows() {
    let plan = WindowPlan::new(names("v", 3), names("g", 1), names("p", 1), &config(1., 5.))
        .unwrap();
    assert_eq!(plan.num_windows(), 0);

    let source = FieldSource::saddle(0.1);
    let sink = MemorySink::new();
    let summary = run(&plan, &config(1., 5.), &source, &source, &sink).unwrap();
    assert_eq!(summary.num_windows, 0);
    assert_eq!(summary.completed, 0);
    assert!(sink.into_outputs().is_empty());
}

#[test]
fn single_grid_and_seed_are_repeated() {
    let plan = WindowPlan::new(names("v", 5), names("g", 1), names("p", 1), &config(1., 1.))
        .unwrap();

    for i in 0..plan.num_windows() {
        let w = plan.window(i).unwrap();
        assert_eq!(w.index, i);
        assert_eq!(w.grids, &["g0".to_string(), "g0".to_string()]);
        assert_eq!(w.particles, "p0");
    }
}

#[test]
fn lists_per_snapshot() {
    let plan = WindowPlan::new(names("v", 5), names("g", 5), names("p", 5), &config(1., 1.))
        .unwrap();

    let w = plan.window(2).unwrap();
    assert_eq!(w.snapshots, &["v2".to_string(), "v3".to_string()]);
    assert_eq!(w.grids, &["g2".to_string(), "g3".to_string()]);
    assert_eq!(w.particles, "p2");
}

#[test]
fn negative_timestep_reverses_lists() {
    let plan = WindowPlan::new(names("v", 10), names("g", 10), names("p", 10), &config(-1., 2.))
        .unwrap();
    assert_eq!(plan.num_windows(), 8);

    let first = plan.window(0).unwrap();
    assert_eq!(
        first.snapshots,
        &["v9".to_string(), "v8".to_string(), "v7".to_string()]
    );
    assert_eq!(
        first.grids,
        &["g9".to_string(), "g8".to_string(), "g7".to_string()]
    );
    assert_eq!(first.particles, "p9");

    let last = plan.window(7).unwrap();
    assert_eq!(
        last.snapshots,
        &["v2".to_string(), "v1".to_string(), "v0".to_string()]
    );
    assert_eq!(last.particles, "p2");
}

#[test]
fn mismatched_lists() {
    let c = config(1., 2.);

    for (grids, particles) in &[(2, 1), (1, 9), (0, 1), (1, 0)] {
        match WindowPlan::new(names("v", 10), names("g", *grids), names("p", *particles), &c) {
            Err(Error(ErrorKind::InputListMismatch(_), _)) => {}
            _ => panic!("accepted {} grids and {} particle files", grids, particles),
        }
    }

    match WindowPlan::new(vec![], names("g", 1), names("p", 1), &c) {
        Err(Error(ErrorKind::InputListMismatch(_), _)) => {}
        _ => panic!("accepted empty snapshot list"),
    }
}

#[test]
fn invalid_parameters() {
    for c in &[config(0., 2.), config(1., 0.), config(1., -2.), config(f64::NAN, 1.)] {
        match WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), c) {
            Err(Error(ErrorKind::InvalidSettings(_), _)) => {}
            _ => panic!("accepted {:?}", c),
        }
    }

    let mut c = config(1., 2.);
    c.num_processes = 0;
    assert!(c.check().is_err());
}

/// Steady linear field `v = (a x, -a y)` sampled on a grid around the origin,
/// with one cluster of seeds at (0.5, 0.5) and one at (-1, 0.25).
struct FieldSource {
    a: f64,
    grid: Array2<f64>,
    corrupt: HashSet<String>,
    velocity_reads: AtomicUsize,
}

impl FieldSource {
    fn saddle(a: f64) -> FieldSource {
        let mut grid = Array2::zeros((121, 2));
        for i in 0..11 {
            for j in 0..11 {
                grid[[11 * i + j, 0]] = i as f64 - 5.;
                grid[[11 * i + j, 1]] = j as f64 - 5.;
            }
        }

        FieldSource {
            a,
            grid,
            corrupt: HashSet::new(),
            velocity_reads: AtomicUsize::new(0),
        }
    }
}

impl SnapshotSource for FieldSource {
    fn read_velocity(&self, file: &str) -> Result<Array2<f64>> {
        if self.corrupt.contains(file) {
            bail!("unexpected end of file '{}'", file);
        }
        self.velocity_reads.fetch_add(1, Ordering::SeqCst);

        let mut v = self.grid.clone();
        v.column_mut(0).mapv_inplace(|x| self.a * x);
        v.column_mut(1).mapv_inplace(|y| -self.a * y);
        Ok(v)
    }

    fn read_coordinates(&self, _file: &str) -> Result<Array2<f64>> {
        Ok(self.grid.clone())
    }
}

impl SeedSource for FieldSource {
    fn read_seed_clusters(&self, _file: &str) -> Result<NeighboringParticles> {
        NeighboringParticles::new(
            arr2(&[[0.4, 0.5], [-1.1, 0.25]]).view(),
            arr2(&[[0.6, 0.5], [-0.9, 0.25]]).view(),
            arr2(&[[0.5, 0.6], [-1., 0.35]]).view(),
            arr2(&[[0.5, 0.4], [-1., 0.15]]).view(),
        )
    }
}

#[test]
fn ftle_of_saddle_flow() {
    let source = FieldSource::saddle(0.1);
    let c = config(1., 2.);
    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    let summary = run(&plan, &c, &source, &source, &sink).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            num_windows: 8,
            completed: 8,
            skipped: vec![],
        }
    );

    // three Euler steps stretch x by 1.1 each, over a map period of 2
    let expected = 3. * 1.1f64.ln() / 2.;

    let outputs = sink.into_outputs();
    assert_eq!(outputs.len(), 8);
    for (i, out) in outputs.iter().enumerate() {
        assert_eq!(out.window_index, i);
        assert_eq!(out.ftle.len(), 2);
        for f in &out.ftle {
            assert!(close(*f, expected, 1e-12), "{} != {}", f, expected);
        }

        let m = &out.metadata;
        assert_eq!(m.integrator, "euler");
        assert_eq!(m.interpolator, "grid");
        assert_eq!(m.first_snapshot, format!("v{}", i));
        assert_eq!(m.last_snapshot, format!("v{}", i + 2));
        assert!(close(m.map_period, 2., 1e-15));

        // the centroid moved away from the origin along x
        assert!(close(m.coordinate_x[0], 0.5 * 1.1f64.powi(3), 1e-12));
        assert!(close(m.coordinate_y[0], 0.5 * 0.9f64.powi(3), 1e-12));
    }
}

#[test]
fn backward_ftle_of_saddle_flow() {
    let source = FieldSource::saddle(0.1);
    let c = config(-1., 2.);
    let plan = WindowPlan::new(names("v", 4), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    run(&plan, &c, &source, &source, &sink).unwrap();

    // backward in time y is stretched by 1.1 per step
    let expected = 3. * 1.1f64.ln() / 2.;
    let outputs = sink.into_outputs();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].metadata.first_snapshot, "v3");
    for out in &outputs {
        assert!(out.ftle.iter().all(|f| close(*f, expected, 1e-12)));
        assert!(close(out.metadata.timestep, -1., 0.));
    }
}

#[test]
fn every_window_starts_a_fresh_integrator() {
    let source = FieldSource::saddle(0.1);
    let mut c = config(0.5, 2.);
    c.integrator = IntegratorKind::Ab2;
    let plan = WindowPlan::new(names("v", 8), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    run(&plan, &c, &source, &source, &sink).unwrap();

    let outputs = sink.into_outputs();
    assert_eq!(outputs.len(), 4);
    for out in &outputs[1..] {
        assert_eq!(out.ftle, outputs[0].ftle);
    }
}

#[test]
fn parallel_run_matches_sequential_run() {
    let source = FieldSource::saddle(0.05);
    let mut c = config(1., 3.);
    c.integrator = IntegratorKind::Rk4;
    let plan = WindowPlan::new(names("v", 12), names("g", 1), names("p", 1), &c).unwrap();

    let sequential = MemorySink::new();
    run(&plan, &c, &source, &source, &sequential).unwrap();

    c.num_processes = 4;
    let parallel = MemorySink::new();
    run(&plan, &c, &source, &source, &parallel).unwrap();

    assert_eq!(sequential.into_outputs(), parallel.into_outputs());
}

#[test]
fn caches_snapshot_reads() {
    let source = FieldSource::saddle(0.1);
    let c = config(1., 2.);
    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    let mut processor = WindowProcessor::new(&source, &source, 3);
    for i in 0..plan.num_windows() {
        processor.process_window(i, &plan, &c, &sink).unwrap();
    }

    // consecutive windows share two of three snapshots
    assert_eq!(source.velocity_reads.load(Ordering::SeqCst), 10);
    assert_eq!(sink.into_outputs().len(), 8);
}

fn corrupt_source() -> FieldSource {
    let mut source = FieldSource::saddle(0.1);
    source.corrupt.insert("v4".to_string());
    source
}

#[test]
fn failing_windows_are_skipped() {
    let source = corrupt_source();
    let mut c = config(1., 2.);
    c.on_window_error = WindowErrorPolicy::Skip;
    c.num_processes = 2;
    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    let summary = run(&plan, &c, &source, &source, &sink).unwrap();

    assert_eq!(summary.num_windows, 8);
    assert_eq!(summary.completed, 5);
    assert_eq!(summary.skipped, vec![2, 3, 4]);

    let written: Vec<usize> = sink
        .into_outputs()
        .iter()
        .map(|o| o.window_index)
        .collect();
    assert_eq!(written, vec![0, 1, 5, 6, 7]);
}

#[test]
fn failing_window_aborts_run() {
    let source = corrupt_source();
    let c = config(1., 2.);
    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();

    let sink = MemorySink::new();
    match run(&plan, &c, &source, &source, &sink) {
        Err(Error(ErrorKind::WindowFailed(i), _)) => assert!((2..=4).contains(&i)),
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("corrupt snapshot went unnoticed"),
    }
}

#[test]
fn failing_window_names_its_cause() {
    let source = corrupt_source();
    let c = config(1., 2.);
    let plan = WindowPlan::new(names("v", 10), names("g", 1), names("p", 1), &c).unwrap();

    let mut processor = WindowProcessor::new(&source, &source, 2);
    let e = processor
        .process_window(3, &plan, &c, &MemorySink::new())
        .unwrap_err();

    assert_eq!(e.to_string(), "window 3 failed");
    assert!(e.iter().any(|cause| cause.to_string().contains("v4")));
}

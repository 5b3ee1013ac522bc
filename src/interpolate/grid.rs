use super::{source_points, InterpolationStrategy};
use crate::errors::*;
use lerp::Lerp;
use ndarray::{Array2, Array3, ArrayView2};

/// Relative tolerance, with respect to the grid extent, for two coordinates
/// to count as the same grid line.
const GRID_LINE_TOLERANCE: f64 = 1e-9;

/// Bilinear interpolation on an axis aligned rectilinear grid.
///
/// The source points may come in any order, but every node `(x_i, y_j)` has
/// to be present exactly once. Grid lines need not be equidistant. Query
/// points outside the grid bounds yield NaN.
#[derive(Debug)]
pub struct GridInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    /// velocities indexed by `[i, j, component]`
    values: Array3<f64>,
}

impl GridInterpolator {
    pub fn new(coordinates: ArrayView2<f64>, velocities: ArrayView2<f64>) -> Result<Self> {
        let points = source_points(coordinates, velocities)?;

        let x = grid_lines(points.iter().map(|p| p[0]))?;
        let y = grid_lines(points.iter().map(|p| p[1]))?;

        if x.len() < 2 || y.len() < 2 {
            bail!(ErrorKind::NotAGrid(format!(
                "need at least two grid lines per axis, got {} x {}",
                x.len(),
                y.len()
            )));
        }

        if x.len() * y.len() != points.len() {
            bail!(ErrorKind::NotAGrid(format!(
                "{} points do not fill a {} x {} grid",
                points.len(),
                x.len(),
                y.len()
            )));
        }

        let mut values = Array3::from_elem((x.len(), y.len(), 2), f64::NAN);
        let mut seen = Array2::from_elem((x.len(), y.len()), false);

        for (p, v) in points.iter().zip(velocities.outer_iter()) {
            let i = line_index(&x, p[0]);
            let j = line_index(&y, p[1]);

            if seen[[i, j]] {
                bail!(ErrorKind::NotAGrid(format!(
                    "node ({}, {}) given more than once",
                    x[i], y[j]
                )));
            }
            seen[[i, j]] = true;

            values[[i, j, 0]] = v[0];
            values[[i, j, 1]] = v[1];
        }

        Ok(GridInterpolator { x, y, values })
    }

    fn bilinear(&self, i: usize, j: usize, tx: f64, ty: f64, c: usize) -> f64 {
        let v = &self.values;
        let c0 = v[[i, j, c]].lerp(v[[i + 1, j, c]], tx);
        let c1 = v[[i, j + 1, c]].lerp(v[[i + 1, j + 1, c]], tx);

        c0.lerp(c1, ty)
    }
}

impl InterpolationStrategy for GridInterpolator {
    fn interpolate(&self, points: ArrayView2<f64>) -> Array2<f64> {
        let mut out = Array2::from_elem((points.nrows(), 2), f64::NAN);

        for (p, mut o) in points.outer_iter().zip(out.outer_iter_mut()) {
            if let (Some((i, tx)), Some((j, ty))) = (cell(&self.x, p[0]), cell(&self.y, p[1])) {
                o[0] = self.bilinear(i, j, tx, ty, 0);
                o[1] = self.bilinear(i, j, tx, ty, 1);
            }
        }

        out
    }
}

/// Sorted distinct coordinates along one axis. Values closer than the
/// tolerance are merged into the first of them.
fn grid_lines<I: Iterator<Item = f64>>(values: I) -> Result<Vec<f64>> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.iter().any(|v| !v.is_finite()) {
        bail!(ErrorKind::NotAGrid("non-finite coordinate".to_string()));
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let extent = sorted[sorted.len() - 1] - sorted[0];
    let tol = GRID_LINE_TOLERANCE * extent.max(1.);

    let mut lines: Vec<f64> = Vec::new();
    for v in sorted {
        match lines.last() {
            Some(&last) if v - last <= tol => {}
            _ => lines.push(v),
        }
    }

    Ok(lines)
}

/// Index of the grid line `v` was merged into.
fn line_index(lines: &[f64], v: f64) -> usize {
    let upper = lines.partition_point(|&l| l <= v);
    // `v` is at least the first line, so `upper >= 1`
    let i = upper.max(1) - 1;

    match lines.get(i + 1) {
        Some(&next) if next - v < v - lines[i] => i + 1,
        _ => i,
    }
}

/// Lower index of the cell containing `v` and the relative position of `v` in
/// it, or `None` outside the grid.
fn cell(lines: &[f64], v: f64) -> Option<(usize, f64)> {
    let first = lines[0];
    let last = lines[lines.len() - 1];
    if !(v >= first && v <= last) {
        return None;
    }

    let i = (lines.partition_point(|&l| l <= v).max(1) - 1).min(lines.len() - 2);
    let t = (v - lines[i]) / (lines[i + 1] - lines[i]);

    Some((i, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_close_grid_lines() {
        let lines = grid_lines(vec![1., 0., 1. + 1e-12, 0.5, 0.].into_iter()).unwrap();
        assert_eq!(lines, vec![0., 0.5, 1.]);

        assert_eq!(line_index(&lines, 1. + 1e-12), 2);
        assert_eq!(line_index(&lines, 0.5 - 1e-12), 1);
        assert_eq!(line_index(&lines, 0.), 0);
    }

    #[test]
    fn cell_lookup() {
        let lines = [0., 1., 3.];

        assert_eq!(cell(&lines, 0.5), Some((0, 0.5)));
        assert_eq!(cell(&lines, 2.), Some((1, 0.5)));
        assert_eq!(cell(&lines, 3.), Some((1, 1.)));
        assert_eq!(cell(&lines, 0.), Some((0, 0.)));
        assert_eq!(cell(&lines, -0.1), None);
        assert_eq!(cell(&lines, 3.1), None);
        assert_eq!(cell(&lines, f64::NAN), None);
    }
}

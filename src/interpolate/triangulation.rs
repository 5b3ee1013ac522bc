//! Delaunay triangulation of scattered source points with an R-tree for
//! locating the triangle that contains a query point.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Accepted undershoot of barycentric coordinates for points on an edge.
const BARYCENTRIC_TOLERANCE: f64 = 1e3 * f64::EPSILON;

/// Axis aligned bounding box of one triangle.
#[derive(Debug, Clone)]
struct TriangleEnvelope {
    triangle: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl TriangleEnvelope {
    fn new(triangle: usize, vertices: [[f64; 2]; 3]) -> TriangleEnvelope {
        let mut min = [f64::MAX; 2];
        let mut max = [f64::MIN; 2];

        for v in &vertices {
            for d in 0..2 {
                min[d] = min[d].min(v[d]);
                max[d] = max[d].max(v[d]);
            }
        }

        TriangleEnvelope { triangle, min, max }
    }
}

impl RTreeObject for TriangleEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl PointDistance for TriangleEnvelope {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let mut d2 = 0.;
        for d in 0..2 {
            let delta = if point[d] < self.min[d] {
                self.min[d] - point[d]
            } else if point[d] > self.max[d] {
                point[d] - self.max[d]
            } else {
                0.
            };
            d2 += delta * delta;
        }
        d2
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }
}

/// Triangulated source points.
///
/// `neighbors[t][k]` is the triangle sharing the edge opposite to the `k`-th
/// vertex of triangle `t`, or `None` on the convex hull.
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
    neighbors: Vec<[Option<usize>; 3]>,
    tree: RTree<TriangleEnvelope>,
}

impl Triangulation {
    /// Triangulates `points`. Fewer than three points, or only collinear ones,
    /// give a triangulation without triangles, in which every query lies
    /// outside.
    pub fn new(points: Vec<[f64; 2]>) -> Triangulation {
        let input: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p[0], y: p[1] })
            .collect();

        let delaunay = delaunator::triangulate(&input);
        let num_triangles = delaunay.triangles.len() / 3;

        let triangles: Vec<[usize; 3]> = delaunay
            .triangles
            .chunks(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        // Halfedge `3t + (k + 1) % 3` runs along the edge opposite to vertex k.
        let neighbors = (0..num_triangles)
            .map(|t| {
                let mut n = [None; 3];
                for (k, nk) in n.iter_mut().enumerate() {
                    let opposite = delaunay.halfedges[3 * t + (k + 1) % 3];
                    if opposite != delaunator::EMPTY {
                        *nk = Some(opposite / 3);
                    }
                }
                n
            })
            .collect();

        let envelopes = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| TriangleEnvelope::new(i, [points[t[0]], points[t[1]], points[t[2]]]))
            .collect();

        Triangulation {
            points,
            triangles,
            neighbors,
            tree: RTree::bulk_load(envelopes),
        }
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn neighbors(&self, triangle: usize) -> [Option<usize>; 3] {
        self.neighbors[triangle]
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the vertices of triangle `t` as coordinates.
    pub fn vertices(&self, t: usize) -> [[f64; 2]; 3] {
        let [a, b, c] = self.triangles[t];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Barycentric coordinates of `p` with respect to triangle `t`. Returns
    /// NaN coordinates for a degenerate triangle.
    pub fn barycentric(&self, t: usize, p: [f64; 2]) -> [f64; 3] {
        let [a, b, c] = self.vertices(t);

        let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
        let l1 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
        let l2 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;

        [l1, l2, 1. - l1 - l2]
    }

    /// Finds the triangle containing `p` and the barycentric coordinates of
    /// `p` in it. Points on a shared edge may belong to several triangles;
    /// the one where `p` lies deepest inside wins.
    pub fn find_triangle(&self, p: [f64; 2]) -> Option<(usize, [f64; 3])> {
        if !(p[0].is_finite() && p[1].is_finite()) {
            return None;
        }

        let mut best: Option<(usize, [f64; 3])> = None;
        let mut best_min = f64::NEG_INFINITY;

        for candidate in self.tree.locate_all_at_point(&p) {
            let b = self.barycentric(candidate.triangle, p);
            let min = b[0].min(b[1]).min(b[2]);

            if min >= -BARYCENTRIC_TOLERANCE && min > best_min {
                best_min = min;
                best = Some((candidate.triangle, b));
            }
        }

        best
    }

    /// Lists for every point the points it shares a triangle edge with.
    pub fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.points.len()];

        for t in &self.triangles {
            for k in 0..3 {
                let (i, j) = (t[k], t[(k + 1) % 3]);
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }

        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        adjacency
    }
}

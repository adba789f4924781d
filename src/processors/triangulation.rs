//! Delaunay triangulation of scattered 2D sites (Bowyer-Watson).
//!
//! Used by the surface reconstruction to partition the convex hull of the
//! sample positions into triangles. Triangles are stored counter-clockwise.

use std::collections::HashMap;

/// Relative tolerance used for orientation and in-circle decisions.
const GEOM_EPS: f64 = 1e-12;

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
#[inline]
pub fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    v: [usize; 3],
    center: [f64; 2],
    radius_sq: f64,
}

impl Cell {
    fn new(pts: &[[f64; 2]], v: [usize; 3]) -> Self {
        let (center, radius_sq) = circumcircle(pts[v[0]], pts[v[1]], pts[v[2]]);
        Self {
            v,
            center,
            radius_sq,
        }
    }

    fn contains_in_circle(&self, p: [f64; 2]) -> bool {
        let dx = p[0] - self.center[0];
        let dy = p[1] - self.center[1];
        dx * dx + dy * dy <= self.radius_sq * (1.0 + GEOM_EPS)
    }

    fn edges(&self) -> [(usize, usize); 3] {
        [
            (self.v[0], self.v[1]),
            (self.v[1], self.v[2]),
            (self.v[2], self.v[0]),
        ]
    }
}

fn circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let d = 2.0 * orient(a, b, c);
    if d.abs() < f64::MIN_POSITIVE {
        // Degenerate sliver: treat the circle as unbounded so it is always replaced.
        return ([a[0], a[1]], f64::INFINITY);
    }
    let a2 = a[0] * a[0] + a[1] * a[1];
    let b2 = b[0] * b[0] + b[1] * b[1];
    let c2 = c[0] * c[0] + c[1] * c[1];
    let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
    let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
    let dx = a[0] - ux;
    let dy = a[1] - uy;
    ([ux, uy], dx * dx + dy * dy)
}

/// Triangulated site set.
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub points: Vec<[f64; 2]>,
    /// Counter-clockwise vertex indices into `points`.
    pub triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Neighbouring vertex indices of every site, sorted and deduplicated.
    pub fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.points.len()];
        for t in &self.triangles {
            for k in 0..3 {
                let a = t[k];
                neighbors[a].push(t[(k + 1) % 3]);
                neighbors[a].push(t[(k + 2) % 3]);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }
}

/// Triangulate `points`. Sites are expected to be distinct.
///
/// Returns no triangles for fewer than three sites or fully collinear input.
pub fn triangulate(points: &[[f64; 2]]) -> Triangulation {
    let n = points.len();
    if n < 3 {
        return Triangulation {
            points: points.to_vec(),
            triangles: Vec::new(),
        };
    }

    let (mut x_min, mut x_max, mut y_min, mut y_max) =
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        x_min = x_min.min(p[0]);
        x_max = x_max.max(p[0]);
        y_min = y_min.min(p[1]);
        y_max = y_max.max(p[1]);
    }
    let span = (x_max - x_min).max(y_max - y_min).max(f64::MIN_POSITIVE);
    let mid = [(x_min + x_max) / 2.0, (y_min + y_max) / 2.0];

    // Enclosing counter-clockwise triangle, far enough that its vertices never become
    // Delaunay neighbours of hull sites in practice.
    let mut pts = points.to_vec();
    pts.push([mid[0] - 40.0 * span, mid[1] - 20.0 * span]);
    pts.push([mid[0] + 40.0 * span, mid[1] - 20.0 * span]);
    pts.push([mid[0], mid[1] + 40.0 * span]);

    let mut cells = vec![Cell::new(&pts, [n, n + 1, n + 2])];

    for i in 0..n {
        let p = pts[i];

        let mut in_cavity: Vec<bool> = cells.iter().map(|c| c.contains_in_circle(p)).collect();
        grow_cavity(&pts, &cells, &mut in_cavity, p);

        let boundary = cavity_boundary(&cells, &in_cavity);

        let mut kept: Vec<Cell> = (0..cells.len())
            .filter(|&k| !in_cavity[k])
            .map(|k| cells[k])
            .collect();
        for (a, b) in boundary {
            kept.push(Cell::new(&pts, [a, b, i]));
        }
        cells = kept;
    }

    let triangles = cells
        .into_iter()
        .filter(|c| c.v.iter().all(|&v| v < n))
        .filter(|c| orient(pts[c.v[0]], pts[c.v[1]], pts[c.v[2]]) > GEOM_EPS * span * span)
        .map(|c| c.v)
        .collect();

    Triangulation {
        points: points.to_vec(),
        triangles,
    }
}

/// Boundary edges of the cavity, oriented as in their owning (counter-clockwise) cell.
fn cavity_boundary(cells: &[Cell], in_cavity: &[bool]) -> Vec<(usize, usize)> {
    let bad: Vec<&Cell> = (0..cells.len())
        .filter(|&k| in_cavity[k])
        .map(|k| &cells[k])
        .collect();

    let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
    for cell in &bad {
        for (a, b) in cell.edges() {
            *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let mut boundary = Vec::new();
    for cell in &bad {
        for (a, b) in cell.edges() {
            if edge_count[&(a.min(b), a.max(b))] == 1 {
                boundary.push((a, b));
            }
        }
    }
    boundary
}

/// Grow the cavity until the new site sees every boundary edge from its inner side.
///
/// Rounding in the in-circle test can leave a cavity that is not star-shaped
/// around `p`; re-triangulating such a cavity would fold triangles over.
fn grow_cavity(pts: &[[f64; 2]], cells: &[Cell], in_cavity: &mut [bool], p: [f64; 2]) {
    if !in_cavity.iter().any(|&bad| bad) {
        if let Some(host) = cells.iter().position(|c| {
            c.edges()
                .iter()
                .all(|&(a, b)| orient(pts[a], pts[b], p) >= 0.0)
        }) {
            in_cavity[host] = true;
        }
    }

    loop {
        let offending = cavity_boundary(cells, in_cavity)
            .into_iter()
            .find(|&(a, b)| orient(pts[a], pts[b], p) <= 0.0);

        let Some((a, b)) = offending else {
            break;
        };

        let neighbor = (0..cells.len()).find(|&k| {
            !in_cavity[k] && cells[k].edges().iter().any(|&(u, v)| u == b && v == a)
        });
        match neighbor {
            Some(k) => in_cavity[k] = true,
            None => break,
        }
    }
}

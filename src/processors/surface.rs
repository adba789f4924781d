//! Surface reconstruction from polar gain samples.
//!
//! Samples are placed in the plane at (r cos θ, r sin θ) with height r and a
//! smooth height field is interpolated over a fixed regular grid spanning
//! their bounding box. The interpolant is a cubic Bézier patch per Delaunay
//! triangle built from estimated vertex gradients; it reproduces linear data
//! exactly. Grid nodes outside the convex hull of the samples are NaN.

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

use super::triangulation::{triangulate, Triangulation};
use crate::core::transforms::{min_max, polar_to_cartesian, PatternPoints};

/// Nodes per grid axis.
pub const GRID_RESOLUTION: usize = 100;

/// Minimum number of distinct sample positions for cubic interpolation.
pub const MIN_SURFACE_POINTS: usize = 4;

/// Barycentric slack accepted when deciding whether a node lies in a triangle.
const INSIDE_EPS: f64 = 1e-9;

/// Reasons a surface cannot be reconstructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("degenerate geometry: bounding box is {width} x {height}")]
    DegenerateBounds { width: f64, height: f64 },

    #[error("degenerate geometry: {distinct} distinct sample positions, need at least {MIN_SURFACE_POINTS}")]
    InsufficientPoints { distinct: usize },

    #[error("degenerate geometry: sample positions are collinear")]
    Collinear,
}

/// Result type for surface reconstruction.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Interpolated height field on a regular grid.
#[derive(Debug, Clone)]
pub struct SurfaceGrid {
    /// Grid node x coordinates, ascending, endpoints included.
    pub xs: Vec<f64>,
    /// Grid node y coordinates, ascending, endpoints included.
    pub ys: Vec<f64>,
    /// Heights indexed `[ix * ys.len() + iy]`; NaN marks "no surface".
    pub z: Vec<f64>,
    /// The sample positions the surface was built from.
    pub samples: PatternPoints,
}

impl SurfaceGrid {
    #[inline]
    pub fn at(&self, ix: usize, iy: usize) -> f64 {
        self.z[ix * self.ys.len() + iy]
    }

    /// Number of nodes carrying a height.
    pub fn defined_count(&self) -> usize {
        self.z.iter().filter(|v| !v.is_nan()).count()
    }

    /// Lowest and highest defined height.
    pub fn z_range(&self) -> Option<(f64, f64)> {
        let defined: Vec<f64> = self.z.iter().copied().filter(|v| !v.is_nan()).collect();
        (!defined.is_empty()).then(|| min_max(&defined))
    }
}

/// `count` evenly spaced values from `lo` to `hi`, both included.
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|k| lo + k as f64 * step).collect();
            values[count - 1] = hi;
            values
        }
    }
}

/// Reconstruct the height field of a normalized series scaled by `scale`.
///
/// # Errors
///
/// Returns a [`SurfaceError`] when the bounding box has zero width or height,
/// when fewer than four distinct positions remain, or when all positions are
/// collinear.
pub fn reconstruct_surface(values: &[f64], scale: f64) -> Result<SurfaceGrid> {
    let samples = polar_to_cartesian(values, scale);

    let (x_min, x_max, y_min, y_max) = samples
        .xy_bounds()
        .ok_or(SurfaceError::InsufficientPoints { distinct: 0 })?;

    let width = x_max - x_min;
    let height = y_max - y_min;
    let magnitude = [x_min, x_max, y_min, y_max]
        .iter()
        .fold(1.0_f64, |m, v| m.max(v.abs()));
    if width <= f64::EPSILON * magnitude || height <= f64::EPSILON * magnitude {
        return Err(SurfaceError::DegenerateBounds { width, height });
    }

    let (sites, heights) = distinct_sites(&samples, width.max(height) * 1e-9);
    if sites.len() < MIN_SURFACE_POINTS {
        return Err(SurfaceError::InsufficientPoints {
            distinct: sites.len(),
        });
    }

    let interpolator = CubicInterpolator::new(triangulate(&sites), heights);
    if interpolator.patches.is_empty() {
        return Err(SurfaceError::Collinear);
    }

    let xs = linspace(x_min, x_max, GRID_RESOLUTION);
    let ys = linspace(y_min, y_max, GRID_RESOLUTION);

    let rows: Vec<Vec<f64>> = xs
        .par_iter()
        .map(|&x| ys.iter().map(|&y| interpolator.evaluate([x, y])).collect())
        .collect();
    let z: Vec<f64> = rows.into_iter().flatten().collect();
    let grid = SurfaceGrid { xs, ys, z, samples };

    debug!(
        "Reconstructed surface from {} sites: {} triangles, {} of {} nodes defined",
        interpolator.triangulation.points.len(),
        interpolator.patches.len(),
        grid.defined_count(),
        grid.z.len()
    );

    Ok(grid)
}

/// Drop positions closer than `tolerance` to an earlier one; the first height wins.
fn distinct_sites(samples: &PatternPoints, tolerance: f64) -> (Vec<[f64; 2]>, Vec<f64>) {
    let mut sites: Vec<[f64; 2]> = Vec::with_capacity(samples.len());
    let mut heights = Vec::with_capacity(samples.len());
    let tol_sq = tolerance * tolerance;

    for i in 0..samples.len() {
        let p = [samples.x[i], samples.y[i]];
        let duplicate = sites.iter().any(|s| {
            let dx = s[0] - p[0];
            let dy = s[1] - p[1];
            dx * dx + dy * dy <= tol_sq
        });
        if !duplicate {
            sites.push(p);
            heights.push(samples.z[i]);
        }
    }

    (sites, heights)
}

/// Cubic Bézier triangle with its inverse barycentric map.
#[derive(Debug, Clone)]
struct Patch {
    vertices: [[f64; 2]; 3],
    /// Row-major inverse of [[x1-x3, x2-x3], [y1-y3, y2-y3]].
    inverse: [f64; 4],
    bbox: [f64; 4],
    /// b300, b030, b003, b210, b120, b201, b102, b021, b012, b111
    control: [f64; 10],
}

impl Patch {
    fn barycentric(&self, p: [f64; 2]) -> [f64; 3] {
        let [_, _, c] = self.vertices;
        let dx = p[0] - c[0];
        let dy = p[1] - c[1];
        let u = self.inverse[0] * dx + self.inverse[1] * dy;
        let v = self.inverse[2] * dx + self.inverse[3] * dy;
        [u, v, 1.0 - u - v]
    }

    fn evaluate(&self, [u, v, w]: [f64; 3]) -> f64 {
        let b = &self.control;
        b[0] * u * u * u
            + b[1] * v * v * v
            + b[2] * w * w * w
            + 3.0 * b[3] * u * u * v
            + 3.0 * b[4] * u * v * v
            + 3.0 * b[5] * u * u * w
            + 3.0 * b[6] * u * w * w
            + 3.0 * b[7] * v * v * w
            + 3.0 * b[8] * v * w * w
            + 6.0 * b[9] * u * v * w
    }
}

/// Piecewise cubic interpolant over a Delaunay triangulation.
struct CubicInterpolator {
    triangulation: Triangulation,
    patches: Vec<Patch>,
}

impl CubicInterpolator {
    fn new(triangulation: Triangulation, heights: Vec<f64>) -> Self {
        let gradients = estimate_gradients(&triangulation, &heights);
        let pts = &triangulation.points;

        let patches = triangulation
            .triangles
            .iter()
            .map(|&[i, j, k]| {
                let (p1, p2, p3) = (pts[i], pts[j], pts[k]);
                let (f1, f2, f3) = (heights[i], heights[j], heights[k]);
                let (g1, g2, g3) = (gradients[i], gradients[j], gradients[k]);

                // Edge control points move a third of the way along each edge
                // following the vertex tangent plane.
                let toward = |f: f64, g: [f64; 2], from: [f64; 2], to: [f64; 2]| {
                    f + (g[0] * (to[0] - from[0]) + g[1] * (to[1] - from[1])) / 3.0
                };
                let b210 = toward(f1, g1, p1, p2);
                let b120 = toward(f2, g2, p2, p1);
                let b201 = toward(f1, g1, p1, p3);
                let b102 = toward(f3, g3, p3, p1);
                let b021 = toward(f2, g2, p2, p3);
                let b012 = toward(f3, g3, p3, p2);

                let edge_mean = (b210 + b120 + b201 + b102 + b021 + b012) / 6.0;
                let corner_mean = (f1 + f2 + f3) / 3.0;
                let b111 = edge_mean + (edge_mean - corner_mean) / 2.0;

                let a = p1[0] - p3[0];
                let b = p2[0] - p3[0];
                let c = p1[1] - p3[1];
                let d = p2[1] - p3[1];
                let det = a * d - b * c;

                Patch {
                    vertices: [p1, p2, p3],
                    inverse: [d / det, -b / det, -c / det, a / det],
                    bbox: [
                        p1[0].min(p2[0]).min(p3[0]),
                        p1[0].max(p2[0]).max(p3[0]),
                        p1[1].min(p2[1]).min(p3[1]),
                        p1[1].max(p2[1]).max(p3[1]),
                    ],
                    control: [f1, f2, f3, b210, b120, b201, b102, b021, b012, b111],
                }
            })
            .collect();

        Self {
            triangulation,
            patches,
        }
    }

    /// Height at `p`, NaN outside the triangulated hull.
    fn evaluate(&self, p: [f64; 2]) -> f64 {
        for patch in &self.patches {
            let [x0, x1, y0, y1] = patch.bbox;
            let slack = INSIDE_EPS * (x1 - x0).max(y1 - y0);
            if p[0] < x0 - slack || p[0] > x1 + slack || p[1] < y0 - slack || p[1] > y1 + slack {
                continue;
            }
            let bary = patch.barycentric(p);
            if bary.iter().all(|&l| l >= -INSIDE_EPS) {
                return patch.evaluate(bary);
            }
        }
        f64::NAN
    }
}

/// Per-vertex gradient by inverse-square-distance weighted least squares over
/// the triangulation neighbours. Vertices without a well-conditioned fit get a
/// flat gradient.
fn estimate_gradients(triangulation: &Triangulation, heights: &[f64]) -> Vec<[f64; 2]> {
    let pts = &triangulation.points;

    triangulation
        .vertex_neighbors()
        .iter()
        .enumerate()
        .map(|(i, neighbors)| {
            let (mut sxx, mut sxy, mut syy, mut sxf, mut syf) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for &j in neighbors {
                let dx = pts[j][0] - pts[i][0];
                let dy = pts[j][1] - pts[i][1];
                let df = heights[j] - heights[i];
                let w = 1.0 / (dx * dx + dy * dy);
                sxx += w * dx * dx;
                sxy += w * dx * dy;
                syy += w * dy * dy;
                sxf += w * dx * df;
                syf += w * dy * df;
            }

            let det = sxx * syy - sxy * sxy;
            let trace = sxx + syy;
            if neighbors.len() < 2 || det <= 1e-12 * trace * trace {
                return [0.0, 0.0];
            }
            [(syy * sxf - sxy * syf) / det, (sxx * syf - sxy * sxf) / det]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn lattice_interpolator(f: impl Fn(f64, f64) -> f64) -> CubicInterpolator {
        let mut sites = Vec::new();
        let mut heights = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                let (x, y) = (i as f64 + 0.1 * j as f64, j as f64 - 0.05 * i as f64);
                sites.push([x, y]);
                heights.push(f(x, y));
            }
        }
        CubicInterpolator::new(triangulate(&sites), heights)
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(-1.0, 1.0, 5);
        assert_eq!(v, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert_eq!(linspace(-0.3, 0.7, 100)[99], 0.7);
    }

    #[test]
    fn test_interpolates_sites_exactly() {
        let f = |x: f64, y: f64| x * x - 2.0 * x * y + 0.5 * y;
        let interp = lattice_interpolator(f);
        for p in &interp.triangulation.points {
            assert!((interp.evaluate(*p) - f(p[0], p[1])).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reproduces_linear_data() {
        let f = |x: f64, y: f64| 3.0 * x - 1.5 * y + 2.0;
        let interp = lattice_interpolator(f);
        for &(x, y) in &[(1.3, 1.7), (2.5, 0.4), (3.1, 2.9), (0.6, 3.2)] {
            assert!((interp.evaluate([x, y]) - f(x, y)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_outside_hull_is_nan() {
        let interp = lattice_interpolator(|x, _| x);
        assert!(interp.evaluate([-5.0, -5.0]).is_nan());
        assert!(interp.evaluate([10.0, 2.0]).is_nan());
    }

    #[test]
    fn test_constant_radius_surface() {
        let values = vec![5.0; 36];
        let surface = reconstruct_surface(&values, 1.0).unwrap();

        assert_eq!(surface.xs.len(), GRID_RESOLUTION);
        assert_eq!(surface.ys.len(), GRID_RESOLUTION);
        assert_eq!(surface.z.len(), GRID_RESOLUTION * GRID_RESOLUTION);
        assert!(surface.defined_count() > 0);
        for &z in surface.z.iter().filter(|z| !z.is_nan()) {
            assert!((z - 5.0).abs() < 1e-9);
        }
        // Corners of the bounding box lie outside the circle.
        assert!(surface.at(0, 0).is_nan());
        assert!(surface.at(GRID_RESOLUTION - 1, GRID_RESOLUTION - 1).is_nan());
    }

    #[test]
    fn test_grid_spans_bounding_box() {
        let values: Vec<f64> = (0..12).map(|i| 2.0 + (i as f64 * TAU / 12.0).cos()).collect();
        let surface = reconstruct_surface(&values, 2.0).unwrap();
        let (x_min, x_max, y_min, y_max) = surface.samples.xy_bounds().unwrap();

        assert_eq!(surface.xs[0], x_min);
        assert_eq!(surface.xs[GRID_RESOLUTION - 1], x_max);
        assert_eq!(surface.ys[0], y_min);
        assert_eq!(surface.ys[GRID_RESOLUTION - 1], y_max);

        let (lo, hi) = surface.z_range().unwrap();
        assert!(lo.is_finite() && hi.is_finite() && lo <= hi);
    }

    #[test]
    fn test_all_zero_series_is_degenerate() {
        let err = reconstruct_surface(&[0.0; 8], 1.0).unwrap_err();
        assert!(matches!(err, SurfaceError::DegenerateBounds { .. }));
    }

    #[test]
    fn test_too_few_points() {
        let err = reconstruct_surface(&[1.0, 2.0, 3.0], 1.0).unwrap_err();
        assert_eq!(err, SurfaceError::InsufficientPoints { distinct: 3 });

        let err = reconstruct_surface(&[], 1.0).unwrap_err();
        assert_eq!(err, SurfaceError::InsufficientPoints { distinct: 0 });
    }

    #[test]
    fn test_samples_on_one_axis_are_degenerate() {
        // 0° and 180° land on the x axis, 90° and 270° on the origin.
        let err = reconstruct_surface(&[1.0, 0.0, 1.0, 0.0], 1.0).unwrap_err();
        assert!(matches!(err, SurfaceError::DegenerateBounds { .. }));
    }
}

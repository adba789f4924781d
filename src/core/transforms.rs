//! Coordinate transformations for gain series.
//!
//! Sample `i` of an N-sample series sits at angle `i * 2π / N`; its radius is
//! the sample value times the scale factor.

use std::f64::consts::TAU;

/// One projected sample in polar coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarPoint {
    pub angle_rad: f64,
    pub radius: f64,
}

/// Sample positions in Cartesian coordinates, with the radius as height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternPoints {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl PatternPoints {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Bounds of the horizontal plane as (x_min, x_max, y_min, y_max).
    pub fn xy_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let (x_min, x_max) = min_max(&self.x);
        let (y_min, y_max) = min_max(&self.y);
        Some((x_min, x_max, y_min, y_max))
    }
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Angle of sample `index` in an N-sample series.
#[inline]
pub fn sample_angle(index: usize, count: usize) -> f64 {
    index as f64 * TAU / count as f64
}

/// Map a series onto (angle, scaled radius) pairs, angles evenly spaced over [0, 2π).
pub fn project_polar(values: &[f64], scale: f64) -> Vec<PolarPoint> {
    let n = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| PolarPoint {
            angle_rad: sample_angle(i, n),
            radius: v * scale,
        })
        .collect()
}

/// Convert a series to Cartesian sample positions: x = r cos θ, y = r sin θ, z = r.
pub fn polar_to_cartesian(values: &[f64], scale: f64) -> PatternPoints {
    let mut points = PatternPoints {
        x: Vec::with_capacity(values.len()),
        y: Vec::with_capacity(values.len()),
        z: Vec::with_capacity(values.len()),
    };

    for p in project_polar(values, scale) {
        let (sin_a, cos_a) = p.angle_rad.sin_cos();
        points.x.push(p.radius * cos_a);
        points.y.push(p.radius * sin_a);
        points.z.push(p.radius);
    }

    points
}

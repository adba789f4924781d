//! 2D polar rendering on a cartesian canvas with a hand-drawn polar grid.

use std::f64::consts::TAU;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::style::{dash_pattern, dash_unit, split_dashes};
use super::{plotting_error, PreparedSeries, Result};
use crate::config::{RenderConfig, RenderParameters};
use crate::core::transforms::project_polar;

const RING_COUNT: usize = 4;
const SPOKE_STEP_DEGREES: usize = 30;
const RING_SEGMENTS: usize = 120;
const GRID_COLOR: RGBColor = RGBColor(200, 200, 200);
const PADDING: f64 = 1.1;

/// Plot geometry shared by every series: radii are drawn relative to `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PolarFrame {
    pub origin: f64,
    pub extent: f64,
}

impl PolarFrame {
    /// Frame with the radial origin at `min(0, lowest radius)` and the
    /// outer ring at the largest plotted radius.
    pub fn fit(series: &[Vec<(f64, f64)>]) -> Self {
        let lowest = series
            .iter()
            .flatten()
            .map(|&(_, r)| r)
            .fold(f64::INFINITY, f64::min);
        let origin = if lowest.is_finite() { lowest.min(0.0) } else { 0.0 };

        let mut extent = series
            .iter()
            .flatten()
            .map(|&(_, r)| r - origin)
            .fold(0.0_f64, f64::max);
        if extent < f64::EPSILON {
            extent = 1.0;
        }

        Self { origin, extent }
    }

    fn to_xy(&self, angle: f64, radius: f64) -> (f64, f64) {
        let rho = radius - self.origin;
        (rho * angle.cos(), rho * angle.sin())
    }

    /// Closed outline through all samples, back to the first one.
    pub fn outline(&self, samples: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut points: Vec<(f64, f64)> = samples
            .iter()
            .map(|&(a, r)| self.to_xy(a, r))
            .collect();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        points
    }
}

pub(super) fn draw_polar<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    prepared: &[PreparedSeries],
    params: &RenderParameters,
    config: &RenderConfig,
) -> Result<()> {
    root.fill(&WHITE).map_err(plotting_error)?;

    let polar: Vec<Vec<(f64, f64)>> = prepared
        .iter()
        .map(|p| {
            project_polar(&p.series.values, params.scale_factor)
                .into_iter()
                .map(|pt| (pt.angle_rad, pt.radius))
                .collect()
        })
        .collect();
    let frame = PolarFrame::fit(&polar);
    let limit = frame.extent * PADDING;

    // Square plotting area centered on the canvas
    let (w, h) = root.dim_in_pixel();
    let side = w.min(h);
    let area = root.margin((h - side) / 2, (h - side) / 2, (w - side) / 2, (w - side) / 2);

    let mut chart = ChartBuilder::on(&area)
        .margin(10)
        .build_cartesian_2d(-limit..limit, -limit..limit)
        .map_err(plotting_error)?;

    draw_grid(&mut chart, &frame, config.draw_text)?;

    let width = params.line_thickness.round().max(1.0) as u32;
    let pattern: Option<Vec<f64>> = dash_pattern(params.line_style).map(|p| {
        let unit = dash_unit(2.0 * limit, params.line_thickness);
        p.iter().map(|l| l * unit).collect()
    });

    for (series, samples) in prepared.iter().zip(&polar) {
        let outline = frame.outline(samples);
        let pieces = match &pattern {
            Some(p) => split_dashes(&outline, p),
            None => vec![outline],
        };

        let color = series.color;
        let line_style = color.stroke_width(width);
        chart
            .draw_series(pieces.into_iter().map(|piece| PathElement::new(piece, line_style)))
            .map_err(plotting_error)?
            .label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if config.draw_text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plotting_error)?;
    }

    Ok(())
}

fn draw_grid<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    frame: &PolarFrame,
    draw_text: bool,
) -> Result<()> {
    let rings = (1..=RING_COUNT).map(|k| {
        let rho = frame.extent * k as f64 / RING_COUNT as f64;
        let circle: Vec<(f64, f64)> = (0..=RING_SEGMENTS)
            .map(|s| {
                let a = TAU * s as f64 / RING_SEGMENTS as f64;
                (rho * a.cos(), rho * a.sin())
            })
            .collect();
        PathElement::new(circle, GRID_COLOR.stroke_width(1))
    });
    chart.draw_series(rings).map_err(plotting_error)?;

    let spokes = (0..360).step_by(SPOKE_STEP_DEGREES).map(|deg| {
        let a = (deg as f64).to_radians();
        PathElement::new(
            vec![(0.0, 0.0), (frame.extent * a.cos(), frame.extent * a.sin())],
            GRID_COLOR.stroke_width(1),
        )
    });
    chart.draw_series(spokes).map_err(plotting_error)?;

    if draw_text {
        let style = ("sans-serif", 12).into_font().color(&BLACK);
        let ring_labels = (1..=RING_COUNT).map(|k| {
            let rho = frame.extent * k as f64 / RING_COUNT as f64;
            Text::new(format!("{:.1}", frame.origin + rho), (rho, 0.0), style.clone())
        });
        chart.draw_series(ring_labels).map_err(plotting_error)?;

        let angle_labels = (0..360).step_by(SPOKE_STEP_DEGREES).map(|deg| {
            let a = (deg as f64).to_radians();
            let rho = frame.extent * 1.04;
            Text::new(format!("{}°", deg), (rho * a.cos(), rho * a.sin()), style.clone())
        });
        chart.draw_series(angle_labels).map_err(plotting_error)?;
    }

    Ok(())
}

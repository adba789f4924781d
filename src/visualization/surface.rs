//! Pseudo-3D rendering of interpolated gain surfaces.

use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::style::plasma;
use super::{plotting_error, PreparedSeries, Result};
use crate::config::{RenderConfig, RenderParameters};
use crate::core::transforms::{min_max, polar_to_cartesian, PatternPoints};
use crate::processors::surface::{reconstruct_surface, SurfaceGrid};

const COLOR_BAR_STEPS: usize = 100;
const PROJECTION_SCALE: f64 = 0.8;

/// A series ready for 3D drawing: its sample ring and, when the geometry
/// allows, the reconstructed surface.
struct SurfaceLayer<'a> {
    series: &'a PreparedSeries,
    ring: PatternPoints,
    grid: Option<SurfaceGrid>,
}

/// Axis ranges shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    x: (f64, f64),
    y: (f64, f64),
    z: (f64, f64),
}

fn widen(range: (f64, f64)) -> (f64, f64) {
    if (range.1 - range.0).abs() < f64::EPSILON {
        (range.0 - 1.0, range.1 + 1.0)
    } else {
        range
    }
}

fn compute_bounds(layers: &[SurfaceLayer<'_>]) -> Bounds {
    let xs: Vec<f64> = layers.iter().flat_map(|l| l.ring.x.iter().copied()).collect();
    let ys: Vec<f64> = layers.iter().flat_map(|l| l.ring.y.iter().copied()).collect();
    let mut zs: Vec<f64> = layers.iter().flat_map(|l| l.ring.z.iter().copied()).collect();
    for grid in layers.iter().filter_map(|l| l.grid.as_ref()) {
        if let Some((lo, hi)) = grid.z_range() {
            zs.push(lo);
            zs.push(hi);
        }
    }

    let fallback = |values: &[f64]| {
        if values.is_empty() {
            (0.0, 0.0)
        } else {
            min_max(values)
        }
    };

    Bounds {
        x: widen(fallback(&xs)),
        y: widen(fallback(&ys)),
        z: widen(fallback(&zs)),
    }
}

/// Quadrilateral cells of a grid whose four corners all carry a height,
/// as (corners in chart order (x, z, y), mean height).
fn grid_cells(grid: &SurfaceGrid) -> Vec<([(f64, f64, f64); 4], f64)> {
    let mut cells = Vec::new();
    for ix in 0..grid.xs.len().saturating_sub(1) {
        for iy in 0..grid.ys.len().saturating_sub(1) {
            let z = [
                grid.at(ix, iy),
                grid.at(ix + 1, iy),
                grid.at(ix + 1, iy + 1),
                grid.at(ix, iy + 1),
            ];
            if z.iter().any(|v| v.is_nan()) {
                continue;
            }
            let (x0, x1) = (grid.xs[ix], grid.xs[ix + 1]);
            let (y0, y1) = (grid.ys[iy], grid.ys[iy + 1]);
            cells.push((
                [(x0, z[0], y0), (x1, z[1], y0), (x1, z[2], y1), (x0, z[3], y1)],
                z.iter().sum::<f64>() / 4.0,
            ));
        }
    }
    cells
}

fn build_layers<'a>(prepared: &'a [PreparedSeries], scale: f64) -> Vec<SurfaceLayer<'a>> {
    prepared
        .iter()
        .map(|series| {
            let ring = polar_to_cartesian(&series.series.values, scale);
            let grid = match reconstruct_surface(&series.series.values, scale) {
                Ok(grid) => {
                    debug!(
                        "{}: surface with {} defined nodes",
                        series.label,
                        grid.defined_count()
                    );
                    Some(grid)
                }
                Err(e) => {
                    warn!(
                        "{} ({}): {}, drawing sample ring only",
                        series.label,
                        series.series.source.display(),
                        e
                    );
                    None
                }
            };
            SurfaceLayer { series, ring, grid }
        })
        .collect()
}

pub(super) fn draw_surfaces<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    prepared: &[PreparedSeries],
    params: &RenderParameters,
    config: &RenderConfig,
) -> Result<()> {
    root.fill(&WHITE).map_err(plotting_error)?;

    let layers = build_layers(prepared, params.scale_factor);
    let bounds = compute_bounds(&layers);
    let (z_lo, z_hi) = bounds.z;
    let shade = |z: f64| plasma((z - z_lo) / (z_hi - z_lo));

    let (w, _) = root.dim_in_pixel();
    let bar_width = (w / 10).max(40);
    let (plot_area, bar_area) = root.split_horizontally(w.saturating_sub(bar_width));

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .build_cartesian_3d(
            bounds.x.0..bounds.x.1,
            bounds.z.0..bounds.z.1,
            bounds.y.0..bounds.y.1,
        )
        .map_err(plotting_error)?;

    let yaw = params.azimuth.to_radians();
    let pitch = params.elevation.to_radians();
    chart.with_projection(|mut pb| {
        pb.yaw = yaw;
        pb.pitch = pitch;
        pb.scale = PROJECTION_SCALE;
        pb.into_matrix()
    });

    if config.draw_text {
        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()
            .map_err(plotting_error)?;
    }

    for layer in &layers {
        if let Some(grid) = &layer.grid {
            chart
                .draw_series(
                    grid_cells(grid)
                        .into_iter()
                        .map(|(corners, z)| Polygon::new(corners.to_vec(), shade(z).filled())),
                )
                .map_err(plotting_error)?;
        }

        let mut ring: Vec<(f64, f64, f64)> = (0..layer.ring.len())
            .map(|i| (layer.ring.x[i], layer.ring.z[i], layer.ring.y[i]))
            .collect();
        if let Some(&first) = ring.first() {
            ring.push(first);
        }

        let color = layer.series.color;
        chart
            .draw_series(std::iter::once(PathElement::new(ring, color.stroke_width(2))))
            .map_err(plotting_error)?
            .label(layer.series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    if config.draw_text {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plotting_error)?;
    }

    draw_color_bar(&bar_area, bounds.z, config.draw_text)
}

fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    (lo, hi): (f64, f64),
    draw_text: bool,
) -> Result<()> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if draw_text {
        builder.set_label_area_size(LabelAreaPosition::Right, 40);
    }
    let mut bar = builder
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(plotting_error)?;

    if draw_text {
        bar.configure_mesh()
            .disable_x_axis()
            .disable_mesh()
            .y_label_formatter(&|v| format!("{:.1}", v))
            .draw()
            .map_err(plotting_error)?;
    }

    let delta = (hi - lo) / COLOR_BAR_STEPS as f64;
    bar.draw_series((0..COLOR_BAR_STEPS).map(|step| {
        let v0 = lo + delta * step as f64;
        let t = (step as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        Rectangle::new([(0.0, v0), (1.0, v0 + delta)], plasma(t).filled())
    }))
    .map_err(plotting_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::GainSeries;
    use plotters::style::RGBColor;

    fn prepared(values: Vec<f64>) -> PreparedSeries {
        PreparedSeries {
            series: GainSeries::new("test.txt", values),
            label: "Graph 1".to_string(),
            color_token: "red".to_string(),
            color: RGBColor(255, 0, 0),
        }
    }

    #[test]
    fn test_degenerate_series_keeps_ring() {
        let series = vec![prepared(vec![0.0; 8])];
        let layers = build_layers(&series, 1.0);

        assert_eq!(layers.len(), 1);
        assert!(layers[0].grid.is_none());
        assert_eq!(layers[0].ring.len(), 8);
    }

    #[test]
    fn test_bounds_widened_for_flat_rings() {
        let series = vec![prepared(vec![0.0; 8])];
        let layers = build_layers(&series, 1.0);
        let bounds = compute_bounds(&layers);

        assert_eq!(bounds.x, (-1.0, 1.0));
        assert_eq!(bounds.y, (-1.0, 1.0));
        assert_eq!(bounds.z, (-1.0, 1.0));
    }

    #[test]
    fn test_cells_only_inside_hull() {
        let series = vec![prepared(vec![5.0; 36])];
        let layers = build_layers(&series, 1.0);
        let grid = layers[0].grid.as_ref().unwrap();
        let cells = grid_cells(grid);

        assert!(!cells.is_empty());
        // Corners of the bounding box lie outside the circle of samples
        assert!(cells.len() < 99 * 99);
        for (_, z) in &cells {
            assert!((z - 5.0).abs() < 1e-6);
        }
    }
}

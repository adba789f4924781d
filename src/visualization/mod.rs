//! Rendering of gain series into a single composed image.
//!
//! Every render loads and normalizes all requested series before the image
//! file is created, so a bad input never leaves a partial artifact behind.
//! Series are then drawn on one shared chart, either as polar curves or as
//! interpolated surfaces, with one legend entry per series.

mod polar;
pub mod style;
mod surface;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use plotters::style::RGBColor;
use plotters_bitmap::BitMapBackend;
use plotters::prelude::IntoDrawingArea;
use serde::Serialize;
use thiserror::Error;

use crate::config::{ParameterError, Projection, RenderConfig, RenderParameters};
use crate::core::loaders::{load_series, GainSeries, LoaderError};
use crate::core::writers::{ensure_parent_dirs, WriteError};
use crate::processors::normalize::{normalize, NormalizationMode};

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no files loaded")]
    NoDataLoaded,

    #[error("error processing file: {0}")]
    Load(#[from] LoaderError),

    #[error("error processing file {}: series is empty", .0.display())]
    EmptySeries(PathBuf),

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("invalid parameters: {0}")]
    InvalidParameter(#[from] ParameterError),

    #[error("output error: {0}")]
    Write(#[from] WriteError),

    #[error("plotting error: {0}")]
    PlottingError(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

pub(crate) fn plotting_error<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::PlottingError(e.to_string())
}

/// One legend line of a rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// "Graph {index + 1}"
    pub label: String,
    /// Color token the series was drawn with
    pub color: String,
    /// Base name of the source file
    pub file: String,
}

/// Everything needed for one render call.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub files: &'a [PathBuf],
    /// Explicit colors, matched to series by position
    pub colors: &'a [String],
    /// Fallback colors cycled by series index
    pub palette: &'a [String],
    pub params: &'a RenderParameters,
    pub config: &'a RenderConfig,
}

/// A loaded, normalized series with its resolved style.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSeries {
    pub series: GainSeries,
    pub label: String,
    pub color_token: String,
    pub color: RGBColor,
}

impl PreparedSeries {
    fn legend_entry(&self) -> LegendEntry {
        LegendEntry {
            label: self.label.clone(),
            color: self.color_token.clone(),
            file: self.series.file_name(),
        }
    }
}

/// Load and normalize one series. Empty files are rejected in every mode.
pub fn load_normalized(path: &Path, mode: NormalizationMode) -> Result<GainSeries> {
    let raw = load_series(path).map_err(|e| {
        warn!("Rejecting {}: {}", e.path().display(), e);
        e
    })?;
    if raw.is_empty() {
        return Err(RenderError::EmptySeries(path.to_path_buf()));
    }
    let values =
        normalize(&raw.values, mode).map_err(|_| RenderError::EmptySeries(path.to_path_buf()))?;
    Ok(GainSeries::new(raw.source, values))
}

/// Load, normalize and color every requested series, stopping at the first failure.
pub(crate) fn prepare_series(request: &RenderRequest<'_>) -> Result<Vec<PreparedSeries>> {
    let mode = request.params.normalization_mode();

    request
        .files
        .iter()
        .enumerate()
        .map(|(i, path)| -> Result<PreparedSeries> {
            let series = load_normalized(path, mode)?;
            let token = style::series_color_token(i, request.colors, request.palette);
            let color = style::resolve_color(token)
                .ok_or_else(|| RenderError::InvalidColor(token.to_string()))?;
            debug!(
                "Series {} from {}: {} samples every {:.2}°, color {}",
                i + 1,
                path.display(),
                series.len(),
                series.angular_step_degrees().unwrap_or_default(),
                token
            );
            Ok(PreparedSeries {
                series,
                label: format!("Graph {}", i + 1),
                color_token: token.to_string(),
                color,
            })
        })
        .collect()
}

/// Render all requested series into one image at `output`.
///
/// The image format follows the extension of `output` (PNG or JPEG).
///
/// # Errors
///
/// Fails with [`RenderError::NoDataLoaded`] when no files are requested, and
/// with the error of the first file that cannot be loaded or normalized. A
/// failure while drawing removes the partially written image.
pub fn render_to_file(request: &RenderRequest<'_>, output: &Path) -> Result<Vec<LegendEntry>> {
    if request.files.is_empty() {
        return Err(RenderError::NoDataLoaded);
    }
    request.params.validate()?;

    let prepared = prepare_series(request)?;
    ensure_parent_dirs(output)?;

    if let Err(e) = draw(&prepared, request, output) {
        if output.exists() {
            if let Err(remove_err) = fs::remove_file(output) {
                warn!(
                    "Failed to remove partial image {}: {}",
                    output.display(),
                    remove_err
                );
            }
        }
        return Err(e);
    }

    info!(
        "Rendered {} series ({:?}) to {}",
        prepared.len(),
        request.params.projection,
        output.display()
    );

    Ok(prepared.iter().map(PreparedSeries::legend_entry).collect())
}

fn draw(prepared: &[PreparedSeries], request: &RenderRequest<'_>, output: &Path) -> Result<()> {
    let config = request.config;
    let root = BitMapBackend::new(output, (config.width, config.height)).into_drawing_area();

    match request.params.projection {
        Projection::Polar2d => polar::draw_polar(&root, prepared, request.params, config)?,
        Projection::Surface3d => surface::draw_surfaces(&root, prepared, request.params, config)?,
    }

    root.present().map_err(plotting_error)?;
    Ok(())
}

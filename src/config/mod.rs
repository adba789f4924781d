//! Configuration types for the pattern plotter.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processors::normalize::NormalizationMode;

/// Fallback series colors, cycled by series index when explicit colors run out.
pub const DEFAULT_PALETTE: [&str; 5] = ["red", "blue", "green", "orange", "purple"];

/// Rejected parameter values.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("scale factor must be positive, got {0}")]
    InvalidScale(f64),

    #[error("line thickness must be positive, got {0}")]
    InvalidThickness(f64),

    #[error("unknown line style '{0}'")]
    UnknownLineStyle(String),
}

/// Stroke pattern used for 2D pattern curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    #[serde(alias = "dash-dot")]
    DashDot,
}

impl FromStr for LineStyle {
    type Err = ParameterError;

    /// Accepts the style names as well as the short `-`, `--`, `:`, `-.` forms.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" | "-" => Ok(LineStyle::Solid),
            "dashed" | "--" => Ok(LineStyle::Dashed),
            "dotted" | ":" => Ok(LineStyle::Dotted),
            "dashdot" | "dash-dot" | "-." => Ok(LineStyle::DashDot),
            _ => Err(ParameterError::UnknownLineStyle(s.to_string())),
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
            LineStyle::DashDot => "dashdot",
        };
        f.write_str(name)
    }
}

/// Which kind of chart a render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Projection {
    #[default]
    Polar2d,
    Surface3d,
}

/// Parameters shared by every render and stats call of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParameters {
    /// Value added to every sample in manual offset mode
    #[serde(default)]
    pub offset_value: f64,

    /// Manual offset requested
    #[serde(default)]
    pub offset_manual: bool,

    /// Peak-to-zero offset with rotation requested (wins over manual)
    #[serde(default = "default_true")]
    pub offset_auto: bool,

    /// Radius multiplier, strictly positive
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    #[serde(default)]
    pub line_style: LineStyle,

    /// Stroke width in pixels, strictly positive
    #[serde(default = "default_line_thickness")]
    pub line_thickness: f64,

    #[serde(default)]
    pub projection: Projection,

    /// 3D view azimuth in degrees
    #[serde(default = "default_azimuth")]
    pub azimuth: f64,

    /// 3D view elevation in degrees
    #[serde(default = "default_elevation")]
    pub elevation: f64,
}

fn default_true() -> bool {
    true
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_line_thickness() -> f64 {
    2.0
}

fn default_azimuth() -> f64 {
    45.0
}

fn default_elevation() -> f64 {
    30.0
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            offset_value: 0.0,
            offset_manual: false,
            offset_auto: default_true(),
            scale_factor: default_scale_factor(),
            line_style: LineStyle::Solid,
            line_thickness: default_line_thickness(),
            projection: Projection::Polar2d,
            azimuth: default_azimuth(),
            elevation: default_elevation(),
        }
    }
}

impl RenderParameters {
    /// The normalization implied by the offset flags. Auto takes precedence over manual.
    pub fn normalization_mode(&self) -> NormalizationMode {
        if self.offset_auto {
            NormalizationMode::AutoRotate
        } else if self.offset_manual {
            NormalizationMode::Manual(self.offset_value)
        } else {
            NormalizationMode::None
        }
    }

    pub fn is_3d(&self) -> bool {
        self.projection == Projection::Surface3d
    }

    /// Check the strictly-positive invariants.
    pub fn validate(&self) -> std::result::Result<(), ParameterError> {
        if !(self.scale_factor > 0.0 && self.scale_factor.is_finite()) {
            return Err(ParameterError::InvalidScale(self.scale_factor));
        }
        if !(self.line_thickness > 0.0 && self.line_thickness.is_finite()) {
            return Err(ParameterError::InvalidThickness(self.line_thickness));
        }
        Ok(())
    }

    /// Produce the parameters that result from applying `update` on top of `self`.
    ///
    /// View angles are only replaced when the update carries them.
    pub fn updated(&self, update: &ParameterUpdate) -> std::result::Result<Self, ParameterError> {
        let next = Self {
            offset_value: update.offset_value,
            offset_manual: update.offset_manual,
            offset_auto: update.offset_auto,
            scale_factor: update.scale_factor,
            line_style: update.line_style,
            line_thickness: update.line_thickness,
            projection: if update.is_3d {
                Projection::Surface3d
            } else {
                Projection::Polar2d
            },
            azimuth: update.azimuth.unwrap_or(self.azimuth),
            elevation: update.elevation.unwrap_or(self.elevation),
        };
        next.validate()?;
        Ok(next)
    }
}

/// Parameter object sent by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUpdate {
    pub offset_value: f64,
    pub offset_manual: bool,
    pub offset_auto: bool,
    pub scale_factor: f64,
    pub line_style: LineStyle,
    pub line_thickness: f64,
    #[serde(rename = "is3D")]
    pub is_3d: bool,
    #[serde(default)]
    pub azimuth: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
}

impl From<&RenderParameters> for ParameterUpdate {
    fn from(params: &RenderParameters) -> Self {
        Self {
            offset_value: params.offset_value,
            offset_manual: params.offset_manual,
            offset_auto: params.offset_auto,
            scale_factor: params.scale_factor,
            line_style: params.line_style,
            line_thickness: params.line_thickness,
            is_3d: params.is_3d(),
            azimuth: Some(params.azimuth),
            elevation: Some(params.elevation),
        }
    }
}

/// Canvas and output settings for rendered artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Directory receiving `graph_<id>.png` artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Draw legend, ring and axis labels. Needs a system font when enabled.
    #[serde(default = "default_true")]
    pub draw_text: bool,
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    800
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            output_dir: default_output_dir(),
            draw_text: true,
        }
    }
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

/// Main configuration combining all sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotterConfig {
    #[serde(default)]
    pub render: RenderConfig,

    /// Parameters a fresh or reset session starts from
    #[serde(default)]
    pub defaults: RenderParameters,

    /// Fallback colors cycled by series index
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            defaults: RenderParameters::default(),
            palette: default_palette(),
        }
    }
}

impl PlotterConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PlotterConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .defaults
            .validate()
            .with_context(|| format!("invalid defaults in {}", path.display()))?;
        if config.palette.is_empty() {
            anyhow::bail!("palette in {} must list at least one color", path.display());
        }
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_parameters() {
        let params = RenderParameters::default();
        assert_eq!(params.offset_value, 0.0);
        assert!(!params.offset_manual);
        assert!(params.offset_auto);
        assert_eq!(params.scale_factor, 1.0);
        assert_eq!(params.line_style, LineStyle::Solid);
        assert_eq!(params.line_thickness, 2.0);
        assert_eq!(params.projection, Projection::Polar2d);
        assert_eq!(params.azimuth, 45.0);
        assert_eq!(params.elevation, 30.0);
    }

    #[test]
    fn test_auto_wins_over_manual() {
        let params = RenderParameters {
            offset_manual: true,
            offset_auto: true,
            offset_value: 3.0,
            ..Default::default()
        };
        assert_eq!(params.normalization_mode(), NormalizationMode::AutoRotate);

        let manual = RenderParameters {
            offset_auto: false,
            ..params
        };
        assert_eq!(manual.normalization_mode(), NormalizationMode::Manual(3.0));
    }

    #[test]
    fn test_update_keeps_view_angles_when_absent() {
        let params = RenderParameters {
            azimuth: 10.0,
            ..Default::default()
        };
        let update: ParameterUpdate = serde_json::from_str(
            r#"{"offsetValue": -2, "offsetManual": true, "offsetAuto": false,
                "scaleFactor": 1.5, "lineStyle": "dashed", "lineThickness": 3,
                "is3D": true}"#,
        )
        .unwrap();

        let next = params.updated(&update).unwrap();
        assert_eq!(next.azimuth, 10.0);
        assert_eq!(next.elevation, 30.0);
        assert_eq!(next.projection, Projection::Surface3d);
        assert_eq!(next.line_style, LineStyle::Dashed);
        assert_eq!(next.normalization_mode(), NormalizationMode::Manual(-2.0));
    }

    #[test]
    fn test_update_rejects_non_positive_scale() {
        let mut update = ParameterUpdate::from(&RenderParameters::default());
        update.scale_factor = 0.0;
        assert_eq!(
            RenderParameters::default().updated(&update),
            Err(ParameterError::InvalidScale(0.0))
        );

        update.scale_factor = 1.0;
        update.line_thickness = -1.0;
        assert_eq!(
            RenderParameters::default().updated(&update),
            Err(ParameterError::InvalidThickness(-1.0))
        );
    }

    #[test]
    fn test_line_style_parsing() {
        assert_eq!("--".parse::<LineStyle>().unwrap(), LineStyle::Dashed);
        assert_eq!("Dotted".parse::<LineStyle>().unwrap(), LineStyle::Dotted);
        assert_eq!("-.".parse::<LineStyle>().unwrap(), LineStyle::DashDot);
        assert!("wavy".parse::<LineStyle>().is_err());
    }

    #[test]
    fn test_yaml_round_trip_with_partial_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plotter.yaml");
        std::fs::write(&path, "render:\n  width: 640\ndefaults:\n  scale_factor: 2.0\n").unwrap();

        let config = PlotterConfig::from_yaml(&path).unwrap();
        assert_eq!(config.render.width, 640);
        assert_eq!(config.render.height, 800);
        assert_eq!(config.defaults.scale_factor, 2.0);
        assert!(config.defaults.offset_auto);
        assert_eq!(config.palette.len(), 5);

        let out = dir.path().join("saved.yaml");
        config.to_yaml(&out).unwrap();
        let reloaded = PlotterConfig::from_yaml(&out).unwrap();
        assert_eq!(reloaded.render.width, 640);
    }

    #[test]
    fn test_yaml_rejects_invalid_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plotter.yaml");
        std::fs::write(&path, "defaults:\n  scale_factor: -1.0\n").unwrap();

        assert!(PlotterConfig::from_yaml(&path).is_err());
    }
}

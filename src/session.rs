//! Explicit session state: loaded files, colors and render parameters.
//!
//! A [`Session`] owns everything that persists between calls. Series are
//! re-read from disk on every render or statistics request and are never
//! cached.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::config::{ParameterError, ParameterUpdate, PlotterConfig, Projection, RenderParameters};
use crate::core::loaders::{preview_file, DataPreview, LoaderError};
use crate::core::writers::{artifact_path, fresh_artifact_id};
use crate::processors::stats::{peak_summary, PeakStat};
use crate::visualization::{self, load_normalized, LegendEntry, RenderError, RenderRequest};

/// Errors returned by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no files selected")]
    NoFilesSelected,

    #[error("no files loaded")]
    NoDataLoaded,

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Render(RenderError),

    #[error("error reading file: {0}")]
    Preview(#[from] LoaderError),
}

impl From<RenderError> for SessionError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::NoDataLoaded => SessionError::NoDataLoaded,
            other => SessionError::Render(other),
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Lifecycle of the render parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Configured,
    Rendered,
}

/// A rendered image and what it shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderArtifact {
    /// Random identifier, different from the previous render's
    pub id: String,
    pub path: PathBuf,
    pub projection: Projection,
    pub legend: Vec<LegendEntry>,
}

/// Single-caller plotting session.
#[derive(Debug, Clone)]
pub struct Session {
    config: PlotterConfig,
    files: Vec<PathBuf>,
    colors: Vec<String>,
    params: RenderParameters,
    state: SessionState,
    last_artifact_id: Option<String>,
}

impl Session {
    /// New idle session starting from the configured defaults.
    pub fn new(config: PlotterConfig) -> Self {
        let params = config.defaults.clone();
        Self {
            config,
            files: Vec::new(),
            colors: Vec::new(),
            params,
            state: SessionState::Idle,
            last_artifact_id: None,
        }
    }

    pub fn config(&self) -> &PlotterConfig {
        &self.config
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Replace the loaded file list. Files are only read when rendering.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFilesSelected`] for an empty list; the
    /// previous selection is kept in that case.
    pub fn load_files<I, P>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if files.is_empty() {
            return Err(SessionError::NoFilesSelected);
        }
        info!("Selected {} file(s)", files.len());
        self.files = files;
        Ok(self.files.len())
    }

    /// Append a color token to the explicit color list.
    pub fn add_color(&mut self, token: impl Into<String>) -> &[String] {
        self.colors.push(token.into());
        &self.colors
    }

    /// Remove the color at `index`; out-of-range indices are ignored.
    pub fn remove_color(&mut self, index: usize) -> &[String] {
        if index < self.colors.len() {
            self.colors.remove(index);
        } else {
            debug!("Ignoring removal of color {} (have {})", index, self.colors.len());
        }
        &self.colors
    }

    /// Apply a parameter update and move to `Configured`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive scale or thickness and leaves the session unchanged.
    pub fn set_params(&mut self, update: &ParameterUpdate) -> Result<&RenderParameters> {
        self.params = self.params.updated(update)?;
        self.state = SessionState::Configured;
        debug!("Parameters updated: {:?}", self.params);
        Ok(&self.params)
    }

    fn request(&self) -> RenderRequest<'_> {
        RenderRequest {
            files: &self.files,
            colors: &self.colors,
            palette: &self.config.palette,
            params: &self.params,
            config: &self.config.render,
        }
    }

    /// Render all loaded series into a fresh `graph_<id>.png` in the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoDataLoaded`] without changing state when no
    /// files are loaded; any file failure aborts the render.
    pub fn render(&mut self) -> Result<RenderArtifact> {
        if self.files.is_empty() {
            return Err(SessionError::NoDataLoaded);
        }

        let id = fresh_artifact_id(&mut rand::thread_rng(), self.last_artifact_id.as_deref());
        let path = artifact_path(&self.config.render.output_dir, &id);
        let legend = visualization::render_to_file(&self.request(), &path)?;

        self.last_artifact_id = Some(id.clone());
        self.state = SessionState::Rendered;

        Ok(RenderArtifact {
            id,
            path,
            projection: self.params.projection,
            legend,
        })
    }

    /// Render the current data to a caller-chosen path. State is not changed.
    pub fn export(&self, path: &Path) -> Result<Vec<LegendEntry>> {
        if self.files.is_empty() {
            return Err(SessionError::NoDataLoaded);
        }
        let legend = visualization::render_to_file(&self.request(), path)?;
        info!("Exported graph to {}", path.display());
        Ok(legend)
    }

    /// Peak gain and angle of every loaded file under the active normalization.
    ///
    /// # Errors
    ///
    /// Fails as a whole when no files are loaded or any file cannot be used.
    pub fn stats(&self) -> Result<Vec<PeakStat>> {
        if self.files.is_empty() {
            return Err(SessionError::NoDataLoaded);
        }
        let mode = self.params.normalization_mode();

        self.files
            .iter()
            .map(|path| -> Result<PeakStat> {
                let series = load_normalized(path, mode)?;
                let summary = peak_summary(&series.values)
                    .map_err(|_| RenderError::EmptySeries(path.clone()))?;
                Ok(PeakStat::new(series.file_name(), summary))
            })
            .collect()
    }

    /// Raw summary of one data file.
    pub fn preview(&self, path: &Path) -> Result<DataPreview> {
        Ok(preview_file(path)?)
    }

    /// Drop loaded files and colors, restore the canonical parameters and return to `Idle`.
    ///
    /// The last artifact id is kept so the next render still gets a fresh one.
    pub fn reset(&mut self) -> &RenderParameters {
        self.files.clear();
        self.colors.clear();
        self.params = RenderParameters::default();
        self.state = SessionState::Idle;
        info!("Session reset to defaults");
        &self.params
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PlotterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineStyle;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile, TempDir};

    fn write_series(values: &[f64]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for v in values {
            writeln!(file, "{}", v).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn lobe(n: usize, shift: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let a = ((i + n - shift) % n) as f64 * std::f64::consts::TAU / n as f64;
                -25.0 + 20.0 * a.cos().max(0.0)
            })
            .collect()
    }

    fn quiet_session() -> (Session, TempDir) {
        let dir = tempdir().unwrap();
        let mut config = PlotterConfig::default();
        config.render.width = 320;
        config.render.height = 240;
        config.render.output_dir = dir.path().join("assets");
        config.render.draw_text = false;
        (Session::new(config), dir)
    }

    fn update(params: &RenderParameters) -> ParameterUpdate {
        ParameterUpdate::from(params)
    }

    #[test]
    fn test_render_without_data() {
        let (mut session, _dir) = quiet_session();

        assert!(matches!(session.render(), Err(SessionError::NoDataLoaded)));
        assert_eq!(session.state(), SessionState::Idle);

        let mut u = update(session.params());
        u.is_3d = true;
        session.set_params(&u).unwrap();
        assert!(matches!(session.render(), Err(SessionError::NoDataLoaded)));
        assert_eq!(session.state(), SessionState::Configured);
    }

    #[test]
    fn test_load_files_rejects_empty_selection() {
        let (mut session, _dir) = quiet_session();
        assert!(matches!(
            session.load_files(Vec::<PathBuf>::new()),
            Err(SessionError::NoFilesSelected)
        ));
        assert!(session.files().is_empty());
    }

    #[test]
    fn test_render_creates_fresh_artifacts() {
        let (mut session, _dir) = quiet_session();
        let a = write_series(&lobe(36, 0));
        let b = write_series(&lobe(36, 9));
        session.load_files([a.path(), b.path()]).unwrap();

        let first = session.render().unwrap();
        assert!(first.path.exists());
        assert_eq!(session.state(), SessionState::Rendered);
        assert_eq!(first.legend.len(), 2);
        assert_eq!(first.legend[0].label, "Graph 1");
        assert_eq!(first.projection, Projection::Polar2d);

        let second = session.render().unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.path, second.path);
        let name = second.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("graph_") && name.ends_with(".png"));
    }

    #[test]
    fn test_three_series_one_color() {
        let (mut session, _dir) = quiet_session();
        let files: Vec<NamedTempFile> = (0..3).map(|k| write_series(&lobe(24, k * 4))).collect();
        session
            .load_files(files.iter().map(|f| f.path().to_path_buf()))
            .unwrap();
        session.add_color("#00aa00");

        let artifact = session.render().unwrap();
        let colors: Vec<&str> = artifact.legend.iter().map(|e| e.color.as_str()).collect();
        assert_eq!(colors, vec!["#00aa00", "blue", "green"]);
    }

    #[test]
    fn test_failing_file_is_named() {
        let (mut session, _dir) = quiet_session();
        let good = write_series(&lobe(12, 0));
        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "0.5\nabc\n").unwrap();
        bad.flush().unwrap();
        session.load_files([good.path(), bad.path()]).unwrap();

        let err = session.render().unwrap_err();
        assert!(err.to_string().contains(&bad.path().display().to_string()));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_color_list_edits() {
        let (mut session, _dir) = quiet_session();
        session.add_color("red");
        session.add_color("#123456");
        assert_eq!(session.remove_color(5), ["red", "#123456"]);
        assert_eq!(session.remove_color(0), ["#123456"]);
    }

    #[test]
    fn test_stats_follow_normalization() {
        let (mut session, _dir) = quiet_session();
        let file = write_series(&[1.0, 4.0, 9.0, 2.0]);
        session.load_files([file.path()]).unwrap();

        // Auto-rotate puts the peak at 0 dB and 0°
        let stats = session.stats().unwrap();
        assert_eq!(stats[0].peak_gain, 0.0);
        assert_eq!(stats[0].peak_angle_degrees, 0.0);

        let mut u = update(session.params());
        u.offset_auto = false;
        u.offset_manual = true;
        u.offset_value = 1.0;
        session.set_params(&u).unwrap();

        let stats = session.stats().unwrap();
        assert_eq!(stats[0].peak_gain, 10.0);
        assert_eq!(stats[0].peak_angle_degrees, 180.0);
        assert_eq!(stats[0].file, file.path().file_name().unwrap().to_string_lossy());
    }

    #[test]
    fn test_stats_fail_as_batch() {
        let (mut session, _dir) = quiet_session();
        assert!(matches!(session.stats(), Err(SessionError::NoDataLoaded)));

        let good = write_series(&[1.0, 2.0]);
        let empty = write_series(&[]);
        session.load_files([good.path(), empty.path()]).unwrap();
        assert!(matches!(session.stats(), Err(SessionError::Render(_))));
    }

    #[test]
    fn test_invalid_params_leave_state() {
        let (mut session, _dir) = quiet_session();
        let mut u = update(session.params());
        u.scale_factor = 0.0;

        assert!(matches!(
            session.set_params(&u),
            Err(SessionError::Parameter(ParameterError::InvalidScale(_)))
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.params().scale_factor, 1.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let (mut session, _dir) = quiet_session();
        session.load_files(["a.txt", "b.txt"]).unwrap();
        session.add_color("red");
        let mut u = update(session.params());
        u.scale_factor = 3.0;
        u.line_style = LineStyle::Dotted;
        u.line_thickness = 5.0;
        u.is_3d = true;
        u.azimuth = Some(120.0);
        session.set_params(&u).unwrap();

        let params = session.reset().clone();
        assert_eq!(params, RenderParameters::default());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.files().is_empty());
        assert!(session.colors().is_empty());
        assert!(matches!(session.render(), Err(SessionError::NoDataLoaded)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_reset_ignores_configured_defaults() {
        let dir = tempdir().unwrap();
        let mut config = PlotterConfig::default();
        config.render.output_dir = dir.path().to_path_buf();
        config.defaults.scale_factor = 4.0;
        let mut session = Session::new(config);
        assert_eq!(session.params().scale_factor, 4.0);

        assert_eq!(session.reset().scale_factor, 1.0);
    }

    #[test]
    fn test_state_transitions() {
        let (mut session, _dir) = quiet_session();
        let file = write_series(&lobe(24, 5));
        session.load_files([file.path()]).unwrap();

        session.render().unwrap();
        assert_eq!(session.state(), SessionState::Rendered);

        let mut u = update(session.params());
        u.line_style = LineStyle::Dashed;
        session.set_params(&u).unwrap();
        assert_eq!(session.state(), SessionState::Configured);

        session.render().unwrap();
        assert_eq!(session.state(), SessionState::Rendered);

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.files().is_empty());
        assert!(session.colors().is_empty());
        assert_eq!(session.params(), &RenderParameters::default());
    }

    #[test]
    fn test_render_3d_constant_series() {
        let (mut session, _dir) = quiet_session();
        let constant = write_series(&[4.0; 36]);
        session.load_files([constant.path()]).unwrap();

        let mut u = update(session.params());
        u.is_3d = true;
        u.offset_auto = false;
        session.set_params(&u).unwrap();

        let artifact = session.render().unwrap();
        assert!(artifact.path.exists());
        assert_eq!(artifact.projection, Projection::Surface3d);
    }

    #[test]
    fn test_export_to_chosen_path() {
        let (mut session, dir) = quiet_session();
        let file = write_series(&lobe(18, 3));
        session.load_files([file.path()]).unwrap();

        let target = dir.path().join("exports").join("pattern.png");
        let legend = session.export(&target).unwrap();
        assert!(target.exists());
        assert_eq!(legend.len(), 1);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_preview() {
        let (session, _dir) = quiet_session();
        let file = write_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let preview = session.preview(file.path()).unwrap();
        assert_eq!(preview.points, 6);
        assert_eq!(preview.sample, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(preview.truncated);
        assert_eq!(preview.mean, 3.5);
    }
}

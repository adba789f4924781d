//! Loader for gain-sample files.
//!
//! The format is plain UTF-8 text with one floating-point gain value per
//! line. Blank lines are ignored; anything else that does not parse as a
//! finite number fails the whole file.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::processors::stats;

/// Number of leading samples included in a preview.
pub const PREVIEW_SAMPLES: usize = 5;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}, line {line}: '{value}' is not a finite number", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("no valid data in {}", .0.display())]
    EmptyFile(PathBuf),
}

impl LoaderError {
    /// The file the error is attributed to.
    pub fn path(&self) -> &Path {
        match self {
            LoaderError::Io { path, .. } => path,
            LoaderError::Parse { path, .. } => path,
            LoaderError::EmptyFile(path) => path,
        }
    }
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Gain samples of one measurement file, one per angular step.
#[derive(Debug, Clone, PartialEq)]
pub struct GainSeries {
    /// Source file path.
    pub source: PathBuf,
    /// Samples in file order.
    pub values: Vec<f64>,
}

impl GainSeries {
    pub fn new(source: impl Into<PathBuf>, values: Vec<f64>) -> Self {
        Self {
            source: source.into(),
            values,
        }
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Angular resolution in degrees, 360 / N.
    pub fn angular_step_degrees(&self) -> Option<f64> {
        (!self.is_empty()).then(|| 360.0 / self.len() as f64)
    }

    /// Base name of the source file.
    pub fn file_name(&self) -> String {
        base_name(&self.source)
    }
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse gain samples from file contents. `path` is only used for error attribution.
pub fn parse_series(path: &Path, content: &str) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(content.len() / 6);

    for (line_idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: f64 = trimmed
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| LoaderError::Parse {
                path: path.to_path_buf(),
                line: line_idx + 1,
                value: trimmed.to_string(),
            })?;
        values.push(value);
    }

    Ok(values)
}

/// Load a gain series from a text file.
///
/// An empty file yields an empty series; callers that need samples report
/// that themselves.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a number.
pub fn load_series<P: AsRef<Path>>(path: P) -> Result<GainSeries> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let values = parse_series(path, &content)?;
    debug!("Loaded {} samples from {}", values.len(), path.display());

    Ok(GainSeries::new(path, values))
}

/// Quick look at a data file before plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPreview {
    pub file_name: String,
    pub points: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// First samples of the file
    pub sample: Vec<f64>,
    /// More samples exist beyond `sample`
    pub truncated: bool,
}

/// Summarize a data file: count, min, max, mean and the first five samples.
pub fn preview_file<P: AsRef<Path>>(path: P) -> Result<DataPreview> {
    let series = load_series(path)?;
    let extent =
        stats::extent(&series.values).map_err(|_| LoaderError::EmptyFile(series.source.clone()))?;

    Ok(DataPreview {
        file_name: series.file_name(),
        points: series.len(),
        min: extent.min,
        max: extent.max,
        mean: extent.mean,
        sample: series.values.iter().take(PREVIEW_SAMPLES).copied().collect(),
        truncated: series.len() > PREVIEW_SAMPLES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_series_skips_blank_lines() -> Result<()> {
        let file = write_temp("1.5\n\n  -3\n2e1\n   \n");

        let series = load_series(file.path())?;
        assert_eq!(series.values, vec![1.5, -3.0, 20.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.angular_step_degrees(), Some(120.0));

        Ok(())
    }

    #[test]
    fn test_load_series_reports_bad_line() {
        let file = write_temp("1.0\n2.0\nabc\n");

        match load_series(file.path()) {
            Err(LoaderError::Parse { path, line, value }) => {
                assert_eq!(path, file.path());
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_series_rejects_non_finite() {
        let file = write_temp("1.0\nnan\n");
        assert!(matches!(
            load_series(file.path()),
            Err(LoaderError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_load_series_missing_file() {
        let err = load_series("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
        assert_eq!(err.path(), Path::new("/definitely/not/here.txt"));
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }

    #[test]
    fn test_empty_file_is_empty_series() -> Result<()> {
        let file = write_temp("\n\n");
        let series = load_series(file.path())?;
        assert!(series.is_empty());
        assert_eq!(series.angular_step_degrees(), None);
        Ok(())
    }

    #[test]
    fn test_preview() -> Result<()> {
        let file = write_temp("1\n2\n3\n4\n5\n6\n");

        let preview = preview_file(file.path())?;
        assert_eq!(preview.points, 6);
        assert_eq!(preview.min, 1.0);
        assert_eq!(preview.max, 6.0);
        assert_eq!(preview.mean, 3.5);
        assert_eq!(preview.sample, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(preview.truncated);

        Ok(())
    }

    #[test]
    fn test_preview_short_file_not_truncated() -> Result<()> {
        let file = write_temp("7\n-7\n");
        let preview = preview_file(file.path())?;
        assert_eq!(preview.sample, vec![7.0, -7.0]);
        assert!(!preview.truncated);
        Ok(())
    }

    #[test]
    fn test_preview_empty_file() {
        let file = write_temp("");
        assert!(matches!(
            preview_file(file.path()),
            Err(LoaderError::EmptyFile(_))
        ));
    }
}

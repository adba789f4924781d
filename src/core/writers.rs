//! Output helpers: artifact naming and statistics export.
//!
//! Rendered images are written as `graph_<id>.png` where `<id>` is a random
//! lowercase alphanumeric token, so a consumer that caches by path always
//! sees a new file after each render.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::processors::stats::PeakStat;

/// Length of the random artifact identifier.
pub const ARTIFACT_ID_LEN: usize = 8;

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create a directory.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates a directory and its parents if they don't exist.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| WriteError::CreateDirectory {
            path: dir.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Creates parent directories for a file path if they don't exist.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Random identifier of [`ARTIFACT_ID_LEN`] lowercase letters and digits.
pub fn generate_artifact_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ARTIFACT_ID_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

/// New identifier guaranteed to differ from `previous`.
pub fn fresh_artifact_id<R: Rng + ?Sized>(rng: &mut R, previous: Option<&str>) -> String {
    loop {
        let id = generate_artifact_id(rng);
        if previous != Some(id.as_str()) {
            return id;
        }
    }
}

/// Path of the artifact with identifier `id` inside `dir`.
pub fn artifact_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("graph_{id}.png"))
}

/// Write peak statistics to CSV with header `file,peak_gain,peak_angle_deg`.
///
/// Parent directories are created if needed.
pub fn write_stats_csv(path: &Path, stats: &[PeakStat]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut csv_writer = csv::Writer::from_writer(BufWriter::new(file));

    let path_str = path.display().to_string();

    csv_writer
        .write_record(["file", "peak_gain", "peak_angle_deg"])
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for stat in stats {
        csv_writer
            .write_record(&[
                stat.file.clone(),
                format!("{:.6}", stat.peak_gain),
                format!("{:.6}", stat.peak_angle_degrees),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

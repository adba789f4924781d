//! Offset and rotation normalization of gain series.

use thiserror::Error;

/// Raised when an operation needs at least one sample.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("series is empty")]
pub struct EmptySeriesError;

/// How raw gain samples are shifted before projection and statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationMode {
    /// Samples are used as read.
    None,
    /// Constant added to every sample.
    Manual(f64),
    /// Peak moved to 0 and rotated to index 0 (angle 0°).
    AutoRotate,
}

/// Index of the first maximum sample. NaN never wins a comparison.
pub fn first_peak_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Add `offset` to every sample.
pub fn apply_offset(values: &[f64], offset: f64) -> Vec<f64> {
    values.iter().map(|v| v + offset).collect()
}

/// Shift the series so its peak is exactly 0, then rotate left so the peak sits at index 0.
///
/// With several equal maxima the first one is the rotation pivot.
pub fn apply_offset_rotation(values: &[f64]) -> Result<Vec<f64>, EmptySeriesError> {
    let pivot = first_peak_index(values).ok_or(EmptySeriesError)?;
    let peak = values[pivot];

    let mut shifted = apply_offset(values, -peak);
    shifted.rotate_left(pivot);
    Ok(shifted)
}

/// Normalize `values` according to `mode`.
pub fn normalize(values: &[f64], mode: NormalizationMode) -> Result<Vec<f64>, EmptySeriesError> {
    match mode {
        NormalizationMode::None => Ok(values.to_vec()),
        NormalizationMode::Manual(offset) => Ok(apply_offset(values, offset)),
        NormalizationMode::AutoRotate => apply_offset_rotation(values),
    }
}

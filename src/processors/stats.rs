//! Peak statistics over normalized series.

use serde::Serialize;

use super::normalize::{first_peak_index, EmptySeriesError};

/// Peak gain and the angle it occurs at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakSummary {
    pub peak_gain: f64,
    /// Degrees in [0, 360)
    pub peak_angle_degrees: f64,
}

/// Peak statistics of one loaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakStat {
    /// Base name of the source file
    pub file: String,
    pub peak_gain: f64,
    pub peak_angle_degrees: f64,
}

impl PeakStat {
    pub fn new(file: impl Into<String>, summary: PeakSummary) -> Self {
        Self {
            file: file.into(),
            peak_gain: summary.peak_gain,
            peak_angle_degrees: summary.peak_angle_degrees,
        }
    }
}

/// Peak gain and angle of the first maximum, angle = index / N * 360.
pub fn peak_summary(values: &[f64]) -> Result<PeakSummary, EmptySeriesError> {
    let index = first_peak_index(values).ok_or(EmptySeriesError)?;
    Ok(PeakSummary {
        peak_gain: values[index],
        peak_angle_degrees: index as f64 / values.len() as f64 * 360.0,
    })
}

/// Summary values for a raw series preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn extent(values: &[f64]) -> Result<Extent, EmptySeriesError> {
    if values.is_empty() {
        return Err(EmptySeriesError);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Ok(Extent { min, max, mean })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_at_start() {
        let summary = peak_summary(&[10.0, 3.0, 7.0, 2.0]).unwrap();
        assert_eq!(summary.peak_gain, 10.0);
        assert_eq!(summary.peak_angle_degrees, 0.0);
    }

    #[test]
    fn test_peak_angle_from_index() {
        let summary = peak_summary(&[0.0, 1.0, 4.0, 4.0]).unwrap();
        assert_eq!(summary.peak_gain, 4.0);
        assert_eq!(summary.peak_angle_degrees, 180.0);
    }

    #[test]
    fn test_peak_empty() {
        assert_eq!(peak_summary(&[]), Err(EmptySeriesError));
    }

    #[test]
    fn test_extent() {
        let e = extent(&[2.0, -1.0, 5.0]).unwrap();
        assert_eq!(e.min, -1.0);
        assert_eq!(e.max, 5.0);
        assert_eq!(e.mean, 2.0);
        assert!(extent(&[]).is_err());
    }
}

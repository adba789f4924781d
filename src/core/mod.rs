//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{load_series, preview_file, DataPreview, GainSeries, LoaderError};
pub use transforms::{polar_to_cartesian, project_polar, PatternPoints, PolarPoint};
pub use writers::{write_stats_csv, WriteError};

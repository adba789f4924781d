//! Antenna radiation-pattern normalization, statistics and rendering.
//!
//! This crate provides tools for:
//! - Loading gain-sample files (one value per line)
//! - Offset and peak-rotation normalization of gain series
//! - Peak gain / peak angle statistics
//! - Polar 2D plots and interpolated 3D surface plots of several series
//!
//! # Example
//!
//! ```no_run
//! use antenna_pattern::{PlotterConfig, Session};
//!
//! let mut session = Session::new(PlotterConfig::default());
//! session.load_files(["horn.txt", "dipole.txt"]).unwrap();
//! let artifact = session.render().unwrap();
//! println!("{}", artifact.path.display());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod session;
pub mod visualization;

pub use config::{LineStyle, ParameterUpdate, PlotterConfig, Projection, RenderParameters};
pub use core::loaders::{DataPreview, GainSeries};
pub use processors::stats::PeakStat;
pub use session::{RenderArtifact, Session, SessionError, SessionState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Data processing modules.

pub mod normalize;
pub mod stats;
pub mod surface;
pub mod triangulation;

// Re-export key types for convenience
pub use normalize::{normalize, EmptySeriesError, NormalizationMode};
pub use stats::{peak_summary, PeakStat, PeakSummary};
pub use surface::{reconstruct_surface, SurfaceError, SurfaceGrid, GRID_RESOLUTION};

//! Turns scatter samples (integer x bucket, real y in [-1, 1]) into a grid of
//! per-column frequencies, one row per y bucket.

pub mod error;
pub mod heatmap;
pub mod instrumented_reader;
pub mod parse;

pub use error::{HeatmapError, HeatmapResult};
pub use heatmap::{render, ColumnSums, HeatmapBuilder};
pub use parse::{ParseMode, Sample};

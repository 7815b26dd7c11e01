use std::path::PathBuf;

/// Everything that can stop a heatmap run.
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sample whose y value lands outside the 0..=100 bucket range.
    #[error("{}:{line}: y value {y_value} maps to bucket {scaled}, outside 0..=100", path.display())]
    OutOfRange {
        path: PathBuf,
        line: usize,
        y_value: f64,
        scaled: f64,
    },

    /// Only raised in strict parse mode.
    #[error("{}:{line}: malformed {field} field {text:?}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        field: &'static str,
        text: String,
    },

    #[error("largest x bucket {xmax} is too wide to build a grid for")]
    GridTooWide { xmax: i64 },
}

impl HeatmapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HeatmapError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type HeatmapResult<T> = Result<T, HeatmapError>;

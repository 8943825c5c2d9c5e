//! Error type shared by the I/O, configuration and position-store layers.
//!
//! The layout engine itself never fails: bad records are skipped and
//! overflows degrade visually. Only the edges that touch the filesystem or
//! parse foreign data return `Result`.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoadmapError>;

#[derive(Debug, Error)]
pub enum RoadmapError {
    #[error("I/O error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV header row lacks one of the columns a task needs.
    #[error("CSV is missing required columns (found {found:?}); need task name and at least one date column")]
    MissingColumns { found: Vec<String> },

    #[error("no valid tasks found ({skipped} rows skipped)")]
    NoTasks { skipped: usize },

    #[error("config version {found} is newer than supported version {supported}")]
    UnsupportedConfigVersion { found: u32, supported: u32 },

    #[error("could not determine a configuration directory for this platform")]
    NoConfigDir,
}

impl RoadmapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

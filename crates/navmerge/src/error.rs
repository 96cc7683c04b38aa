// error.rs - error types for the geometry core

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    /// Region bounds with min > max (or NaN) on an axis
    #[error("invalid bounds on axis {axis}: min {min} > max {max}")]
    InvalidBounds { axis: char, min: f32, max: f32 },

    #[error("navmesh origin transform is not invertible")]
    NonInvertibleTransform,

    #[error("invalid unit scale {0}: must be finite and non-zero")]
    InvalidUnitScale(f32),

    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("invalid terrain data: {0}")]
    TerrainData(String),

    #[error("could not read height file {path}: {source}")]
    HeightFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;

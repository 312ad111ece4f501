//! Error types for Benthic

use thiserror::Error;

/// Main error type for Benthic operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Inputs that must line up (layer grids, rule arity, table columns) do not.
    #[error("Schema mismatch in {subject}: {reason}")]
    SchemaMismatch { subject: String, reason: String },

    /// A rule table row is malformed. `position` is the 1-based rule index,
    /// or 0 when the table as a whole is unusable.
    #[error("Invalid rule at position {position}: {reason}")]
    InvalidRule { position: usize, reason: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::SchemaMismatch`]
    pub fn schema(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::SchemaMismatch {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`Error::InvalidRule`]
    pub fn rule(position: usize, reason: impl Into<String>) -> Self {
        Error::InvalidRule {
            position,
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for Benthic operations
pub type Result<T> = std::result::Result<T, Error>;

//! # Benthic Core
//!
//! Core types and I/O for benthic terrain classification.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid with a nodata sentinel
//! - `GeoTransform`: origin and cell size, used to check that layers line up
//! - `Error`: the shared error taxonomy (schema, rule and I/O failures)
//! - GeoTIFF reading and writing (native `tiff` codec, or GDAL behind a feature)

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Common shape of every raster algorithm in Benthic.
///
/// Algorithms are pure functions of their input and parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Short algorithm name
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
